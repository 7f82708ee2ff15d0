//! JavaScript and TypeScript scanner, including JSX.
//!
//! The tokenizer is context-sensitive in two ways. The input-element
//! goal decides whether `/` begins a regex literal or a division
//! operator, and is updated after every token. JSX is recognized by
//! trial-parsing a tag with arbitrary lookahead; only a complete tag
//! commits to JSX, otherwise `<` stays the less-than operator.

use glint_util::{ascii, utf8};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::escape::{match_common_escape, CommonEscape, EscapeResult};
use crate::highlighter::{Coalescing, Highlighter};
use crate::parse::{match_enclosed, EnclosedResult};
use crate::scan::html::match_character_reference;
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};

const DIGIT_SEPARATOR: u8 = b'_';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    JavaScript,
    TypeScript,
}

/// Which dialect a keyword belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Feature {
    /// Both dialects.
    JsTs,
    /// TypeScript only.
    Ts,
}

fn is_available(feature: Feature, mode: Mode) -> bool {
    match feature {
        Feature::JsTs => true,
        Feature::Ts => mode == Mode::TypeScript,
    }
}

use Feature::{JsTs, Ts};
use HighlightKind::{Bool, Keyword, KeywordControl, KeywordType, Null, This};

#[rustfmt::skip]
static KEYWORDS: Lazy<FxHashMap<&'static [u8], (HighlightKind, Feature)>> = Lazy::new(|| {
    let entries: &[(&[u8], HighlightKind, Feature)] = &[
        (b"abstract", Keyword, Ts),
        (b"any", KeywordType, Ts),
        (b"as", Keyword, JsTs),
        (b"asserts", Keyword, Ts),
        (b"async", Keyword, JsTs),
        (b"await", Keyword, JsTs),
        (b"bigint", KeywordType, Ts),
        (b"boolean", KeywordType, Ts),
        (b"break", KeywordControl, JsTs),
        (b"case", KeywordControl, JsTs),
        (b"catch", KeywordControl, JsTs),
        (b"class", Keyword, JsTs),
        (b"const", Keyword, JsTs),
        (b"continue", KeywordControl, JsTs),
        (b"debugger", Keyword, JsTs),
        (b"declare", Keyword, Ts),
        (b"default", KeywordControl, JsTs),
        (b"delete", Keyword, JsTs),
        (b"do", KeywordControl, JsTs),
        (b"else", KeywordControl, JsTs),
        (b"enum", Keyword, JsTs),
        (b"export", Keyword, JsTs),
        (b"extends", Keyword, JsTs),
        (b"false", Bool, JsTs),
        (b"finally", KeywordControl, JsTs),
        (b"for", KeywordControl, JsTs),
        (b"from", Keyword, JsTs),
        (b"function", Keyword, JsTs),
        (b"get", Keyword, JsTs),
        (b"if", KeywordControl, JsTs),
        (b"implements", Keyword, Ts),
        (b"import", Keyword, JsTs),
        (b"in", Keyword, JsTs),
        (b"infer", Keyword, Ts),
        (b"instanceof", Keyword, JsTs),
        (b"interface", Keyword, Ts),
        (b"is", Keyword, Ts),
        (b"keyof", Keyword, Ts),
        (b"let", Keyword, JsTs),
        (b"namespace", Keyword, Ts),
        (b"never", KeywordType, Ts),
        (b"new", Keyword, JsTs),
        (b"null", Null, JsTs),
        (b"number", KeywordType, Ts),
        (b"object", KeywordType, Ts),
        (b"of", Keyword, JsTs),
        (b"out", Keyword, Ts),
        (b"override", Keyword, Ts),
        (b"package", Keyword, Ts),
        (b"private", Keyword, Ts),
        (b"protected", Keyword, Ts),
        (b"public", Keyword, Ts),
        (b"readonly", Keyword, Ts),
        (b"return", KeywordControl, JsTs),
        (b"satisfies", Keyword, Ts),
        (b"set", Keyword, JsTs),
        (b"static", Keyword, JsTs),
        (b"string", KeywordType, Ts),
        (b"super", Keyword, JsTs),
        (b"switch", KeywordControl, JsTs),
        (b"symbol", KeywordType, Ts),
        (b"this", This, JsTs),
        (b"throw", KeywordControl, JsTs),
        (b"true", Bool, JsTs),
        (b"try", KeywordControl, JsTs),
        (b"type", Keyword, Ts),
        (b"typeof", Keyword, JsTs),
        (b"undefined", Null, JsTs),
        (b"unique", Keyword, Ts),
        (b"unknown", KeywordType, Ts),
        (b"var", Keyword, JsTs),
        (b"void", Keyword, JsTs),
        (b"while", KeywordControl, JsTs),
        (b"with", KeywordControl, JsTs),
        (b"yield", Keyword, JsTs),
    ];
    entries.iter().map(|&(code, kind, feature)| (code, (kind, feature))).collect()
});

/// Keywords after which an expression (and thus a regex) may begin.
fn is_expr_keyword(id: &[u8]) -> bool {
    matches!(
        id,
        b"return"
            | b"throw"
            | b"case"
            | b"delete"
            | b"void"
            | b"typeof"
            | b"yield"
            | b"await"
            | b"instanceof"
            | b"in"
            | b"is"
            | b"new"
    )
}

// Character classification per the ECMA-262 grammar summary. The
// Unicode ranges are an approximation of the ID_Start/ID_Continue
// properties, which is sufficient for highlighting.

fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t'
            | '\x0B'
            | '\x0C'
            | '\n'
            | '\r'
            | '\u{00A0}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{FEFF}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    ) || ('\u{1680}'..='\u{180E}').contains(&c)
        || ('\u{2000}'..='\u{200A}').contains(&c)
}

fn is_js_identifier_start(c: char) -> bool {
    c == '$'
        || c == '_'
        || c.is_ascii_alphabetic()
        || ('\u{00C0}'..='\u{00D6}').contains(&c)
        || ('\u{00D8}'..='\u{00F6}').contains(&c)
        || ('\u{00F8}'..='\u{02FF}').contains(&c)
        || ('\u{0370}'..='\u{037D}').contains(&c)
        || ('\u{037F}'..='\u{1FFF}').contains(&c)
        || ('\u{200C}'..='\u{200D}').contains(&c)
        || ('\u{2070}'..='\u{218F}').contains(&c)
        || ('\u{2C00}'..='\u{2FEF}').contains(&c)
        || ('\u{3001}'..='\u{D7FF}').contains(&c)
        || ('\u{F900}'..='\u{FDCF}').contains(&c)
        || ('\u{FDF0}'..='\u{FFFD}').contains(&c)
        || ('\u{10000}'..='\u{EFFFF}').contains(&c)
}

fn is_js_identifier_part(c: char) -> bool {
    is_js_identifier_start(c)
        || c.is_ascii_digit()
        || ('\u{0300}'..='\u{036F}').contains(&c)
        || ('\u{1DC0}'..='\u{1DFF}').contains(&c)
        || ('\u{20D0}'..='\u{20FF}').contains(&c)
        || ('\u{FE20}'..='\u{FE2F}').contains(&c)
        || ('\u{0660}'..='\u{0669}').contains(&c)
        || ('\u{06F0}'..='\u{06F9}').contains(&c)
        || ('\u{07C0}'..='\u{07C9}').contains(&c)
        || ('\u{0966}'..='\u{096F}').contains(&c)
}

fn starts_with_line_terminator(str: &[u8]) -> bool {
    str.starts_with(b"\n")
        || str.starts_with(b"\r")
        || str.starts_with("\u{2028}".as_bytes())
        || str.starts_with("\u{2029}".as_bytes())
}

pub(crate) fn match_whitespace(str: &[u8]) -> usize {
    utf8::length_if(str, is_js_whitespace)
}

pub(crate) fn match_line_comment(str: &[u8]) -> usize {
    if !str.starts_with(b"//") {
        return 0;
    }
    let mut length = 2;
    while length < str.len() && !starts_with_line_terminator(&str[length..]) {
        length += 1;
    }
    length
}

pub(crate) fn match_block_comment(str: &[u8]) -> EnclosedResult {
    match_enclosed(str, b"/*", b"*/")
}

fn match_hashbang_comment(str: &[u8]) -> usize {
    if !str.starts_with(b"#!") {
        return 0;
    }
    let mut length = 2;
    while length < str.len() && !starts_with_line_terminator(&str[length..]) {
        length += 1;
    }
    length
}

pub(crate) fn match_escape_sequence(str: &[u8]) -> EscapeResult {
    if str.len() < 2 || str[0] != b'\\' {
        return EscapeResult::default();
    }
    match str[1] {
        b'x' => match_common_escape(CommonEscape::Hex2, str, 2),
        b'u' => {
            if str[2..].starts_with(b"{") {
                match_common_escape(CommonEscape::HexBraced, str, 2)
            } else {
                match_common_escape(CommonEscape::Hex4, str, 2)
            }
        }
        b'0'..=b'3' => {
            // LegacyOctalEscapeSequence, up to three digits total.
            let length = if str.len() >= 3 && ascii::is_octal_digit(str[2]) {
                if str.len() >= 4 && ascii::is_octal_digit(str[3]) {
                    4
                } else {
                    3
                }
            } else {
                2
            };
            EscapeResult {
                length,
                erroneous: false,
            }
        }
        b'4'..=b'7' => {
            let length = if str.len() >= 3 && ascii::is_octal_digit(str[2]) {
                3
            } else {
                2
            };
            EscapeResult {
                length,
                erroneous: false,
            }
        }
        _ => EscapeResult {
            length: 2,
            erroneous: false,
        },
    }
}

/// A matched quoted string literal.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct StringMatch {
    pub(crate) length: usize,
    pub(crate) terminated: bool,
}

impl StringMatch {
    pub(crate) fn matched(&self) -> bool {
        self.length != 0
    }
}

pub(crate) fn match_string_literal(str: &[u8]) -> StringMatch {
    let Some(&quote) = str.first() else {
        return StringMatch::default();
    };
    if quote != b'\'' && quote != b'"' {
        return StringMatch::default();
    }
    let mut length = 1;
    let mut escaped = false;
    while length < str.len() {
        let c = str[length];
        if escaped {
            escaped = false;
        } else if c == b'\\' {
            escaped = true;
        } else if c == quote {
            return StringMatch {
                length: length + 1,
                terminated: true,
            };
        } else if c == b'\n' {
            return StringMatch {
                length,
                terminated: false,
            };
        }
        length += 1;
    }
    StringMatch {
        length,
        terminated: false,
    }
}

fn match_numeric_literal(str: &[u8]) -> crate::numeric::NumberResult {
    use crate::numeric::*;
    static PREFIXES: &[NumberPrefix] = &[
        NumberPrefix { text: b"0b", base: 2 },
        NumberPrefix { text: b"0B", base: 2 },
        NumberPrefix { text: b"0o", base: 8 },
        NumberPrefix { text: b"0O", base: 8 },
        NumberPrefix {
            text: b"0x",
            base: 16,
        },
        NumberPrefix {
            text: b"0X",
            base: 16,
        },
    ];
    static EXPONENTS: &[ExponentSeparator] = &[
        ExponentSeparator {
            text: b"E+",
            base: 10,
        },
        ExponentSeparator {
            text: b"E-",
            base: 10,
        },
        ExponentSeparator { text: b"E", base: 10 },
        ExponentSeparator {
            text: b"e+",
            base: 10,
        },
        ExponentSeparator {
            text: b"e-",
            base: 10,
        },
        ExponentSeparator { text: b"e", base: 10 },
    ];
    static OPTIONS: NumberOptions = NumberOptions {
        signs: MatchedSigns::None,
        prefixes: PREFIXES,
        exponent_separators: EXPONENTS,
        suffixes: &[b"n"],
        default_leading_zero_base: 8,
        digit_separator: DIGIT_SEPARATOR,
        nonempty_integer: false,
    };
    let mut result = match_common_number(str, &OPTIONS);
    // BigInt only exists for integers.
    result.erroneous |= result.suffix != 0 && result.is_non_integer();
    result
}

fn match_line_continuation(str: &[u8]) -> usize {
    if !str.starts_with(b"\\") {
        return 0;
    }
    let rest = &str[1..];
    if rest.starts_with(b"\r\n") {
        3
    } else if starts_with_line_terminator(rest) {
        if rest.starts_with(b"\n") || rest.starts_with(b"\r") {
            2
        } else {
            // LS and PS are three bytes long.
            4
        }
    } else {
        0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NameKind {
    Identifier,
    JsxAttribute,
    JsxElement,
}

fn match_name(str: &[u8], kind: NameKind) -> usize {
    let Some((first, first_units)) = utf8::decode(str) else {
        return 0;
    };
    if !is_js_identifier_start(first) {
        return 0;
    }
    let is_part = |c: char| {
        is_js_identifier_part(c)
            || match kind {
                NameKind::Identifier => false,
                NameKind::JsxAttribute => c == '-' || c == ':',
                NameKind::JsxElement => c == '-' || c == ':' || c == '.',
            }
    };
    first_units + utf8::length_if(&str[first_units..], is_part)
}

pub(crate) fn match_identifier(str: &[u8]) -> usize {
    match_name(str, NameKind::Identifier)
}

fn match_regex_flags(str: &[u8]) -> usize {
    utf8::length_if(str, is_js_identifier_part)
}

fn match_private_identifier(str: &[u8]) -> usize {
    if !str.starts_with(b"#") {
        return 0;
    }
    match match_identifier(&str[1..]) {
        0 => 0,
        n => n + 1,
    }
}

/// Skips whitespace and comments; used inside JSX tags and braced
/// expressions where both are insignificant.
fn match_ws_comment_sequence(str: &[u8]) -> usize {
    let mut length = 0;
    loop {
        let rest = &str[length..];
        let white = match_whitespace(rest);
        if white != 0 {
            length += white;
            continue;
        }
        let block = match_block_comment(rest);
        if block.matched() {
            length += block.length;
            continue;
        }
        let line = match_line_comment(rest);
        if line != 0 {
            length += line;
            continue;
        }
        return length;
    }
}

/// Matches a brace-balanced `{...}` span, skipping strings so that
/// braces inside them do not count.
fn match_jsx_braced(str: &[u8]) -> EnclosedResult {
    if !str.starts_with(b"{") {
        return EnclosedResult::default();
    }
    let mut length = 1;
    let mut level = 1u32;
    while length < str.len() {
        length += match_ws_comment_sequence(&str[length..]);
        if length >= str.len() {
            break;
        }
        match str[length] {
            b'{' => {
                level += 1;
                length += 1;
            }
            b'}' => {
                length += 1;
                level -= 1;
                if level == 0 {
                    return EnclosedResult {
                        length,
                        is_terminated: true,
                    };
                }
            }
            b'\'' | b'"' => {
                let string = match_string_literal(&str[length..]);
                length += if string.matched() { string.length } else { 1 };
            }
            _ => length += 1,
        }
    }
    EnclosedResult {
        length,
        is_terminated: false,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JsxType {
    Opening,
    Closing,
    SelfClosing,
    FragmentOpening,
    FragmentClosing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JsxSubset {
    All,
    NonClosing,
}

/// Trial-parses a JSX tag. Only a structurally complete tag matches;
/// anything else falls back to ordinary JS operators.
fn match_jsx_tag(str: &[u8], subset: JsxSubset) -> Option<(usize, JsxType)> {
    if !str.starts_with(b"<") {
        return None;
    }
    let mut pos = 1;
    pos += match_ws_comment_sequence(&str[pos..]);

    if str[pos..].starts_with(b">") {
        return Some((pos + 1, JsxType::FragmentOpening));
    }
    let mut closing = false;
    if str[pos..].starts_with(b"/") {
        if subset == JsxSubset::NonClosing {
            return None;
        }
        closing = true;
        pos += 1;
        pos += match_ws_comment_sequence(&str[pos..]);
        if str[pos..].starts_with(b">") {
            return Some((pos + 1, JsxType::FragmentClosing));
        }
    }
    pos += match_name(&str[pos..], NameKind::JsxElement);

    while pos < str.len() {
        pos += match_ws_comment_sequence(&str[pos..]);
        if str[pos..].starts_with(b">") {
            let ty = if closing {
                JsxType::Closing
            } else {
                JsxType::Opening
            };
            return Some((pos + 1, ty));
        }
        if str[pos..].starts_with(b"/>") {
            if closing {
                return None;
            }
            return Some((pos + 2, JsxType::SelfClosing));
        }
        // Spread attribute or braced value as a bare attribute.
        let spread = match_jsx_braced(&str[pos..]);
        if spread.matched() {
            if !spread.is_terminated {
                return None;
            }
            pos += spread.length;
            continue;
        }
        let attr = match_name(&str[pos..], NameKind::JsxAttribute);
        if attr != 0 {
            pos += attr;
            pos += match_ws_comment_sequence(&str[pos..]);
            if !str[pos..].starts_with(b"=") {
                continue;
            }
            pos += 1;
            pos += match_ws_comment_sequence(&str[pos..]);
            let string = match_string_literal(&str[pos..]);
            if string.matched() {
                pos += string.length;
                continue;
            }
            let braced = match_jsx_braced(&str[pos..]);
            if braced.matched() {
                if !braced.is_terminated {
                    return None;
                }
                pos += braced.length;
                continue;
            }
        }
        return None;
    }
    None
}

/// The input-element goal symbol of the tokenizer, deciding whether a
/// `/` begins a regex literal or a division operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InputElement {
    /// Start of file: hashbang and regex are both possible.
    HashbangOrRegex,
    Regex,
    Div,
}

impl InputElement {
    fn has_hashbang(self) -> bool {
        self == InputElement::HashbangOrRegex
    }

    fn has_regex(self) -> bool {
        self != InputElement::Div
    }
}

struct Scanner<'s, 'o, 'a> {
    hl: Highlighter<'s, 'o, 'a>,
    input_element: InputElement,
    mode: Mode,
}

impl Scanner<'_, '_, '_> {
    fn run(&mut self) {
        while !self.hl.eof() {
            self.consume_token();
        }
    }

    fn consume_token(&mut self) {
        if self.expect_whitespace()
            || self.expect_hashbang_comment()
            || self.expect_line_comment()
            || self.expect_block_comment()
            || self.expect_jsx_in_js()
            || self.expect_string_literal()
            || self.expect_template()
            || self.expect_regex()
            || self.expect_numeric_literal()
            || self.expect_private_identifier()
            || self.expect_identifier()
            || self.expect_operator_or_punctuation()
        {
            return;
        }
        let length = utf8::decode(self.hl.remainder()).map_or(1, |(_, units)| units);
        self.hl
            .emit_and_advance(length, HighlightKind::Error, Coalescing::Normal);
        self.input_element = InputElement::Regex;
    }

    /// Consumes JS up to, but not including, the `}` that closes the
    /// surrounding template substitution or JSX braced expression.
    /// Braces opened inside are balanced; ones inside strings or
    /// templates never reach this level.
    fn consume_js_before_closing_brace(&mut self) {
        self.input_element = InputElement::Regex;
        let mut brace_level = 0u32;
        while !self.hl.eof() {
            match self.hl.remainder()[0] {
                b'{' => {
                    brace_level += 1;
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);
                    self.input_element = InputElement::Regex;
                }
                b'}' => {
                    if brace_level == 0 {
                        return;
                    }
                    brace_level -= 1;
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);
                    self.input_element = InputElement::Div;
                }
                _ => self.consume_token(),
            }
        }
    }

    fn expect_whitespace(&mut self) -> bool {
        let length = match_whitespace(self.hl.remainder());
        self.hl.advance(length);
        length != 0
    }

    fn expect_hashbang_comment(&mut self) -> bool {
        if !self.input_element.has_hashbang() {
            return false;
        }
        let length = match_hashbang_comment(self.hl.remainder());
        if length == 0 {
            return false;
        }
        self.hl
            .emit_and_advance(2, HighlightKind::CommentDelim, Coalescing::Normal);
        if length > 2 {
            self.hl
                .emit_and_advance(length - 2, HighlightKind::Comment, Coalescing::Normal);
        }
        true
    }

    fn expect_line_comment(&mut self) -> bool {
        let length = match_line_comment(self.hl.remainder());
        if length == 0 {
            return false;
        }
        self.highlight_line_comment(length);
        true
    }

    fn highlight_line_comment(&mut self, length: usize) {
        self.hl
            .emit_and_advance(2, HighlightKind::CommentDelim, Coalescing::Normal);
        if length > 2 {
            self.hl
                .emit_and_advance(length - 2, HighlightKind::Comment, Coalescing::Normal);
        }
        self.input_element = InputElement::Regex;
    }

    fn expect_block_comment(&mut self) -> bool {
        let comment = match_block_comment(self.hl.remainder());
        if !comment.matched() {
            return false;
        }
        self.highlight_block_comment(comment);
        true
    }

    fn highlight_block_comment(&mut self, comment: EnclosedResult) {
        self.hl.highlight_enclosed_comment(comment, 2, 2);
        self.input_element = InputElement::Regex;
    }

    fn expect_jsx_in_js(&mut self) -> bool {
        // Closing tags cannot begin JSX from expression position.
        let Some((_, ty)) = match_jsx_tag(self.hl.remainder(), JsxSubset::NonClosing) else {
            return false;
        };
        self.consume_jsx_tag();
        if ty != JsxType::SelfClosing {
            debug_assert!(matches!(ty, JsxType::Opening | JsxType::FragmentOpening));
            self.consume_jsx_children_and_closing_tag();
        }
        self.input_element = InputElement::Div;
        true
    }

    /// Emits one already-validated JSX tag from the current position.
    /// Mirrors the decisions of [`match_jsx_tag`], but works on the
    /// live remainder so nested consumption stays in sync.
    fn consume_jsx_tag(&mut self) {
        debug_assert!(self.hl.remainder().starts_with(b"<"));
        self.hl
            .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
        self.consume_ws_comments();

        if self.hl.remainder().starts_with(b">") {
            self.hl
                .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
            return;
        }
        if self.hl.remainder().starts_with(b"/") {
            self.hl
                .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
            self.consume_ws_comments();
            if self.hl.remainder().starts_with(b">") {
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                return;
            }
        }
        let name = match_name(self.hl.remainder(), NameKind::JsxElement);
        if name != 0 {
            self.hl
                .emit_and_advance(name, HighlightKind::MarkupTag, Coalescing::Normal);
        }

        while !self.hl.eof() {
            self.consume_ws_comments();
            let rem = self.hl.remainder();
            if rem.starts_with(b">") {
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                return;
            }
            if rem.starts_with(b"/>") {
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                return;
            }
            if rem.starts_with(b"{") {
                self.highlight_jsx_braced();
                continue;
            }
            let attr = match_name(rem, NameKind::JsxAttribute);
            if attr != 0 {
                self.hl
                    .emit_and_advance(attr, HighlightKind::MarkupAttr, Coalescing::Normal);
                self.consume_ws_comments();
                if !self.hl.remainder().starts_with(b"=") {
                    continue;
                }
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                self.consume_ws_comments();
                let string = match_string_literal(self.hl.remainder());
                if string.matched() {
                    self.highlight_string_literal(string);
                    continue;
                }
                if self.hl.remainder().starts_with(b"{") {
                    self.highlight_jsx_braced();
                    continue;
                }
            }
            return;
        }
    }

    /// Consumes JSX child content after an opening tag, up to and
    /// including the matching closing tag.
    fn consume_jsx_children_and_closing_tag(&mut self) {
        let mut depth = 0i32;
        while !self.hl.eof() {
            let rem = self.hl.remainder();
            let Some(safe) = ascii::find_any(rem, b"&{}<>") else {
                self.hl.advance(rem.len());
                return;
            };
            self.hl.advance(safe);
            let rem = &rem[safe..];

            match rem[0] {
                b'&' => {
                    let reference = match_character_reference(rem);
                    if reference != 0 {
                        self.hl.emit_and_advance(
                            reference,
                            HighlightKind::StringEscape,
                            Coalescing::Normal,
                        );
                    } else {
                        self.hl.advance(1);
                    }
                }
                b'<' => match match_jsx_tag(rem, JsxSubset::All) {
                    Some((_, ty)) => {
                        self.consume_jsx_tag();
                        match ty {
                            JsxType::Opening | JsxType::FragmentOpening => depth += 1,
                            JsxType::Closing | JsxType::FragmentClosing => {
                                depth -= 1;
                                if depth < 0 {
                                    return;
                                }
                            }
                            JsxType::SelfClosing => {}
                        }
                    }
                    None => {
                        self.hl
                            .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
                    }
                },
                b'{' => {
                    if match_jsx_braced(rem).matched() {
                        self.highlight_jsx_braced();
                    } else {
                        self.hl
                            .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
                    }
                }
                // Stray '>' or '}' that should have been part of a tag
                // or braced child.
                _ => {
                    self.hl
                        .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
                }
            }
        }
    }

    /// Emits a `{...}` JSX expression: braces as brace symbols, the
    /// inside as regular JS.
    fn highlight_jsx_braced(&mut self) {
        debug_assert!(self.hl.remainder().starts_with(b"{"));
        self.hl
            .emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);
        self.consume_js_before_closing_brace();
        if self.hl.remainder().starts_with(b"}") {
            self.hl
                .emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);
        }
    }

    /// Whitespace and comments inside JSX tags, emitted like anywhere
    /// else.
    fn consume_ws_comments(&mut self) {
        loop {
            let rem = self.hl.remainder();
            let white = match_whitespace(rem);
            if white != 0 {
                self.hl.advance(white);
                continue;
            }
            let block = match_block_comment(rem);
            if block.matched() {
                self.highlight_block_comment(block);
                continue;
            }
            let line = match_line_comment(rem);
            if line != 0 {
                self.highlight_line_comment(line);
                continue;
            }
            return;
        }
    }

    fn expect_string_literal(&mut self) -> bool {
        let string = match_string_literal(self.hl.remainder());
        if !string.matched() {
            return false;
        }
        self.highlight_string_literal(string);
        true
    }

    fn highlight_string_literal(&mut self, string: StringMatch) {
        self.hl
            .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);

        let content_length = string.length - if string.terminated { 2 } else { 1 };
        let mut remaining = content_length;
        let mut chars = 0;
        let flush = |scanner: &mut Self, chars: &mut usize| {
            if *chars != 0 {
                let begin = scanner.hl.index() - *chars;
                scanner
                    .hl
                    .emit(begin, *chars, HighlightKind::String, Coalescing::Normal);
                *chars = 0;
            }
        };

        while remaining > 0 {
            let rem = self.hl.remainder();
            if rem.starts_with(b"\\") {
                let escape = match_escape_sequence(rem);
                if escape.matched() {
                    flush(self, &mut chars);
                    let kind = if escape.erroneous {
                        HighlightKind::Error
                    } else {
                        HighlightKind::StringEscape
                    };
                    let length = escape.length.min(remaining);
                    self.hl.emit_and_advance(length, kind, Coalescing::Normal);
                    remaining -= length;
                    continue;
                }
            }
            let next = ascii::find_byte(&rem[..remaining], b'\\')
                .filter(|&n| n != 0)
                .unwrap_or(if rem[..remaining].starts_with(b"\\") {
                    1
                } else {
                    remaining
                });
            self.hl.advance(next);
            chars += next;
            remaining -= next;
        }
        flush(self, &mut chars);

        if string.terminated {
            self.hl
                .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
        }
        self.input_element = InputElement::Div;
    }

    fn expect_template(&mut self) -> bool {
        if !self.hl.remainder().starts_with(b"`") {
            return false;
        }
        self.consume_template();
        true
    }

    fn consume_template(&mut self) {
        self.hl
            .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);

        let mut chars = 0;
        let flush = |scanner: &mut Self, chars: &mut usize| {
            if *chars != 0 {
                let begin = scanner.hl.index() - *chars;
                scanner
                    .hl
                    .emit(begin, *chars, HighlightKind::String, Coalescing::Normal);
                *chars = 0;
            }
        };

        while !self.hl.eof() {
            let rem = self.hl.remainder();
            match rem[0] {
                b'`' => {
                    flush(self, &mut chars);
                    self.hl
                        .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
                    self.input_element = InputElement::Div;
                    return;
                }
                b'$' => {
                    if rem.starts_with(b"${") {
                        flush(self, &mut chars);
                        self.hl.emit_and_advance(
                            2,
                            HighlightKind::StringInterpolationDelim,
                            Coalescing::Normal,
                        );
                        self.consume_js_before_closing_brace();
                        if !self.hl.eof() {
                            debug_assert!(self.hl.remainder().starts_with(b"}"));
                            self.hl.emit_and_advance(
                                1,
                                HighlightKind::StringInterpolationDelim,
                                Coalescing::Normal,
                            );
                        }
                        // Otherwise the substitution is unterminated.
                        continue;
                    }
                    self.hl.advance(1);
                    chars += 1;
                }
                b'\\' => {
                    let continuation = match_line_continuation(rem);
                    if continuation != 0 {
                        flush(self, &mut chars);
                        self.hl.emit_and_advance(
                            1,
                            HighlightKind::StringEscape,
                            Coalescing::Normal,
                        );
                        self.hl.advance(continuation - 1);
                        continue;
                    }
                    let escape = match_escape_sequence(rem);
                    if escape.matched() {
                        flush(self, &mut chars);
                        let kind = if escape.erroneous {
                            HighlightKind::Error
                        } else {
                            HighlightKind::StringEscape
                        };
                        self.hl
                            .emit_and_advance(escape.length, kind, Coalescing::Normal);
                        continue;
                    }
                    self.hl.advance(1);
                    chars += 1;
                }
                _ => {
                    self.hl.advance(1);
                    chars += 1;
                }
            }
        }
        flush(self, &mut chars);
        // Unterminated template.
    }

    fn expect_regex(&mut self) -> bool {
        if !self.input_element.has_regex() {
            return false;
        }
        let rem = self.hl.remainder();
        if !rem.starts_with(b"/") || rem.starts_with(b"/*") || rem.starts_with(b"//") {
            return false;
        }
        let body = &rem[1..];
        let mut escaped = false;
        for size in 0..body.len() {
            let c = body[size];
            if escaped {
                escaped = false;
            } else if c == b'\\' {
                escaped = true;
            } else if c == b'/' {
                self.hl
                    .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
                if size != 0 {
                    self.hl
                        .emit_and_advance(size, HighlightKind::String, Coalescing::Normal);
                }
                self.hl
                    .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
                let flags = match_regex_flags(self.hl.remainder());
                if flags != 0 {
                    self.hl
                        .emit_and_advance(flags, HighlightKind::StringDecor, Coalescing::Normal);
                }
                self.input_element = InputElement::Div;
                return true;
            } else if starts_with_line_terminator(&body[size..]) {
                break;
            }
        }
        false
    }

    fn expect_numeric_literal(&mut self) -> bool {
        let number = match_numeric_literal(self.hl.remainder());
        if !number.matched() {
            return false;
        }
        self.hl.highlight_number(number, Some(DIGIT_SEPARATOR));
        self.input_element = InputElement::Div;
        true
    }

    fn expect_private_identifier(&mut self) -> bool {
        let length = match_private_identifier(self.hl.remainder());
        if length == 0 {
            return false;
        }
        self.hl
            .emit_and_advance(length, HighlightKind::Name, Coalescing::Normal);
        self.input_element = InputElement::Div;
        true
    }

    fn expect_identifier(&mut self) -> bool {
        let length = match_identifier(self.hl.remainder());
        if length == 0 {
            return false;
        }
        let id = &self.hl.remainder()[..length];
        let keyword = KEYWORDS
            .get(id)
            .filter(|&&(_, feature)| is_available(feature, self.mode));
        match keyword {
            Some(&(kind, _)) => {
                let is_expr = is_expr_keyword(id);
                self.hl.emit_and_advance(length, kind, Coalescing::Normal);
                self.input_element = if is_expr {
                    InputElement::Regex
                } else {
                    InputElement::Div
                };
            }
            None => {
                self.hl
                    .emit_and_advance(length, HighlightKind::Name, Coalescing::Normal);
                self.input_element = InputElement::Div;
            }
        }
        true
    }

    fn expect_operator_or_punctuation(&mut self) -> bool {
        let Some((length, kind)) = match_operator(self.hl.remainder()) else {
            return false;
        };
        let blocks_regex = matches!(
            &self.hl.remainder()[..length],
            b"++" | b"--" | b")" | b"]" | b"}" | b"+" | b"-"
        );
        self.hl.emit_and_advance(length, kind, Coalescing::Normal);
        self.input_element = if blocks_regex {
            InputElement::Div
        } else {
            InputElement::Regex
        };
        true
    }
}

/// Maximal-munch operator and punctuation match.
#[rustfmt::skip]
fn match_operator(str: &[u8]) -> Option<(usize, HighlightKind)> {
    use HighlightKind::{SymbolBrace, SymbolOp, SymbolParens, SymbolPunc, SymbolSquare};
    let first = *str.first()?;
    let op = |n| Some((n, SymbolOp));
    match first {
        b'!' => op(if str.starts_with(b"!==") { 3 } else if str.starts_with(b"!=") { 2 } else { 1 }),
        b'%' => op(if str.starts_with(b"%=") { 2 } else { 1 }),
        b'&' => op(if str.starts_with(b"&&=") { 3 } else if str.starts_with(b"&&") || str.starts_with(b"&=") { 2 } else { 1 }),
        b'(' | b')' => Some((1, SymbolParens)),
        b'*' => op(if str.starts_with(b"**=") { 3 } else if str.starts_with(b"**") || str.starts_with(b"*=") { 2 } else { 1 }),
        b'+' => op(if str.starts_with(b"++") || str.starts_with(b"+=") { 2 } else { 1 }),
        b',' => Some((1, SymbolPunc)),
        b'-' => op(if str.starts_with(b"--") || str.starts_with(b"-=") { 2 } else { 1 }),
        b'.' => op(if str.starts_with(b"...") { 3 } else { 1 }),
        b'/' => op(if str.starts_with(b"/=") { 2 } else { 1 }),
        b':' => op(1),
        b';' => Some((1, SymbolPunc)),
        b'<' => op(if str.starts_with(b"<<=") { 3 } else if str.starts_with(b"<<") || str.starts_with(b"<=") { 2 } else { 1 }),
        b'=' => op(if str.starts_with(b"===") { 3 } else if str.starts_with(b"==") || str.starts_with(b"=>") { 2 } else { 1 }),
        b'>' => op(
            if str.starts_with(b">>>=") { 4 }
            else if str.starts_with(b">>>") { 3 }
            else if str.starts_with(b">>=") { 3 }
            else if str.starts_with(b">>") || str.starts_with(b">=") { 2 }
            else { 1 },
        ),
        b'?' => op(if str.starts_with(b"??=") { 3 } else if str.starts_with(b"??") || str.starts_with(b"?.") { 2 } else { 1 }),
        b'@' => op(1),
        b'[' | b']' => Some((1, SymbolSquare)),
        b'^' => op(if str.starts_with(b"^=") { 2 } else { 1 }),
        b'{' | b'}' => Some((1, SymbolBrace)),
        b'|' => op(if str.starts_with(b"||=") { 3 } else if str.starts_with(b"||") || str.starts_with(b"|=") { 2 } else { 1 }),
        b'~' => op(1),
        _ => None,
    }
}

fn highlight_impl(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions, mode: Mode) {
    Scanner {
        hl: Highlighter::new(source, out, *options),
        input_element: InputElement::HashbangOrRegex,
        mode,
    }
    .run();
}

pub(crate) fn highlight_javascript(
    source: &[u8],
    out: &mut TokenBuffer<'_>,
    options: &HighlightOptions,
) {
    highlight_impl(source, out, options, Mode::JavaScript);
}

pub(crate) fn highlight_typescript(
    source: &[u8],
    out: &mut TokenBuffer<'_>,
    options: &HighlightOptions,
) {
    highlight_impl(source, out, options, Mode::TypeScript);
}

#[cfg(test)]
mod tests {
    use crate::scan::testing::{dump, tokens};
    use crate::Lang;

    #[test]
    fn test_simple_string() {
        let toks = tokens(b"\"use strict\"", Lang::JavaScript);
        assert_eq!(
            dump(&toks),
            vec![(0, 1, "str_del"), (1, 10, "str"), (11, 1, "str_del")]
        );
    }

    #[test]
    fn test_template_with_substitution() {
        let toks = tokens(b"`a${1}b`", Lang::JavaScript);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 1, "str_del"),
                (1, 1, "str"),
                (2, 2, "str_intp_del"),
                (4, 1, "num"),
                (5, 1, "str_intp_del"),
                (6, 1, "str"),
                (7, 1, "str_del"),
            ]
        );
    }

    #[test]
    fn test_nested_template_braces() {
        let toks = tokens(b"`${ {a:1} }`", Lang::JavaScript);
        let ids: Vec<&str> = toks.iter().map(|t| t.kind.id()).collect();
        assert_eq!(
            ids,
            vec![
                "str_del",
                "str_intp_del",
                "sym_brace",
                "name",
                "sym_op",
                "num",
                "sym_brace",
                "str_intp_del",
                "str_del",
            ]
        );
    }

    #[test]
    fn test_regex_after_equals() {
        let toks = tokens(b"x=/a/g", Lang::JavaScript);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 1, "name"),
                (1, 1, "sym_op"),
                (2, 1, "str_del"),
                (3, 1, "str"),
                (4, 1, "str_del"),
                (5, 1, "str_dec"),
            ]
        );
    }

    #[test]
    fn test_division_not_regex() {
        let toks = tokens(b"a/b", Lang::JavaScript);
        assert_eq!(
            dump(&toks),
            vec![(0, 1, "name"), (1, 1, "sym_op"), (2, 1, "name")]
        );
    }

    #[test]
    fn test_hashbang_only_at_start() {
        let toks = tokens(b"#!/usr/bin/env node\n1", Lang::JavaScript);
        assert_eq!(
            dump(&toks),
            vec![(0, 2, "cmt_del"), (2, 17, "cmt"), (20, 1, "num")]
        );
    }

    #[test]
    fn test_bigint_suffix() {
        let toks = tokens(b"10n", Lang::JavaScript);
        assert_eq!(dump(&toks), vec![(0, 2, "num"), (2, 1, "num_dec")]);
        // BigInt suffix is invalid on a fractional literal.
        let toks = tokens(b"1.5n", Lang::JavaScript);
        assert_eq!(dump(&toks), vec![(0, 4, "err")]);
    }

    #[test]
    fn test_digit_separator_split() {
        let toks = tokens(b"1_000", Lang::JavaScript);
        assert_eq!(
            dump(&toks),
            vec![(0, 1, "num"), (1, 1, "num_del"), (2, 3, "num")]
        );
    }

    #[test]
    fn test_private_identifier() {
        let toks = tokens(b"this.#x", Lang::JavaScript);
        assert_eq!(
            dump(&toks),
            vec![(0, 4, "this"), (4, 1, "sym_op"), (5, 2, "name")]
        );
    }

    #[test]
    fn test_keyword_kinds() {
        let toks = tokens(b"return null", Lang::JavaScript);
        assert_eq!(dump(&toks), vec![(0, 6, "kw_ctrl"), (7, 4, "null")]);
    }

    #[test]
    fn test_regex_after_return() {
        // `return` is an expression keyword, so a regex may follow.
        let toks = tokens(b"return /a/", Lang::JavaScript);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 6, "kw_ctrl"),
                (7, 1, "str_del"),
                (8, 1, "str"),
                (9, 1, "str_del"),
            ]
        );
    }

    #[test]
    fn test_typescript_keywords() {
        let toks = tokens(b"let x: string", Lang::TypeScript);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 3, "kw"),
                (4, 1, "name"),
                (5, 1, "sym_op"),
                (7, 6, "kw_type"),
            ]
        );
        // The same word is a plain name in JavaScript.
        let toks = tokens(b"string", Lang::JavaScript);
        assert_eq!(dump(&toks), vec![(0, 6, "name")]);
    }

    #[test]
    fn test_jsx_self_closing() {
        let toks = tokens(b"<br/>", Lang::JavaScript);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 1, "sym_punc"),
                (1, 2, "markup_tag"),
                (3, 1, "sym_punc"),
                (4, 1, "sym_punc"),
            ]
        );
    }

    #[test]
    fn test_jsx_element_with_attribute_and_children() {
        let toks = tokens(b"<a href=\"x\">t</a>", Lang::JavaScript);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 1, "sym_punc"),
                (1, 1, "markup_tag"),
                (3, 4, "markup_attr"),
                (7, 1, "sym_punc"),
                (8, 1, "str_del"),
                (9, 1, "str"),
                (10, 1, "str_del"),
                (11, 1, "sym_punc"),
                (13, 1, "sym_punc"),
                (14, 1, "sym_punc"),
                (15, 1, "markup_tag"),
                (16, 1, "sym_punc"),
            ]
        );
    }

    #[test]
    fn test_jsx_braced_child() {
        let toks = tokens(b"<a>{x}</a>", Lang::JavaScript);
        let ids: Vec<&str> = toks.iter().map(|t| t.kind.id()).collect();
        assert_eq!(
            ids,
            vec![
                "sym_punc",
                "markup_tag",
                "sym_punc",
                "sym_brace",
                "name",
                "sym_brace",
                "sym_punc",
                "sym_punc",
                "markup_tag",
                "sym_punc",
            ]
        );
    }

    #[test]
    fn test_less_than_stays_operator() {
        let toks = tokens(b"a < b", Lang::JavaScript);
        assert_eq!(
            dump(&toks),
            vec![(0, 1, "name"), (2, 1, "sym_op"), (4, 1, "name")]
        );
    }

    #[test]
    fn test_unterminated_template() {
        let toks = tokens(b"`ab", Lang::JavaScript);
        assert_eq!(dump(&toks), vec![(0, 1, "str_del"), (1, 2, "str")]);
    }

    #[test]
    fn test_unterminated_substitution() {
        let toks = tokens(b"`${1", Lang::JavaScript);
        assert_eq!(
            dump(&toks),
            vec![(0, 1, "str_del"), (1, 2, "str_intp_del"), (3, 1, "num")]
        );
    }

    #[test]
    fn test_string_escapes() {
        let toks = tokens(br#"'a\u0041b'"#, Lang::JavaScript);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 1, "str_del"),
                (1, 1, "str"),
                (2, 6, "str_esc"),
                (8, 1, "str"),
                (9, 1, "str_del"),
            ]
        );
    }
}
