//! CSS scanner.
//!
//! A CSS snippet could be a whole stylesheet, block contents, or a
//! single value, so the scanner keeps a best-guess context and picks
//! the highlight of ident-like tokens from it: selectors at top level,
//! at-rule names in preludes, property names in blocks, and values
//! after a `:` inside a block.

use glint_util::{ascii, utf8};

use crate::highlighter::{Coalescing, Highlighter};
use crate::scan::html;
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};

fn is_css_newline(c: u8) -> bool {
    matches!(c, b'\n' | b'\r' | b'\x0C')
}

fn is_css_identifier_start(c: u8) -> bool {
    c >= 0x80 || c.is_ascii_alphabetic() || c == b'_'
}

fn is_css_identifier(c: u8) -> bool {
    is_css_identifier_start(c) || c.is_ascii_digit() || c == b'-'
}

fn starts_with_number(str: &[u8]) -> bool {
    let str = if str.starts_with(b"+") || str.starts_with(b"-") {
        &str[1..]
    } else {
        str
    };
    match str {
        [d, ..] if d.is_ascii_digit() => true,
        [b'.', d, ..] if d.is_ascii_digit() => true,
        _ => false,
    }
}

fn starts_with_valid_escape(str: &[u8]) -> bool {
    str.len() >= 2 && str[0] == b'\\' && !is_css_newline(str[1])
}

fn starts_with_ident_sequence(str: &[u8]) -> bool {
    match str.first() {
        None => false,
        Some(b'-') => {
            (str.len() > 1 && (is_css_identifier_start(str[1]) || str[1] == b'-'))
                || starts_with_valid_escape(&str[1..])
        }
        Some(&c) => is_css_identifier_start(c) || starts_with_valid_escape(str),
    }
}

/// Per css-syntax-3 "consume a number".
fn match_number(str: &[u8]) -> usize {
    let mut length = 0;
    let digits = |str: &[u8], from: usize| from + ascii::length_if(&str[from..], ascii::is_digit);

    if str.starts_with(b"+") || str.starts_with(b"-") {
        length += 1;
    }
    length = digits(str, length);
    if length + 1 < str.len() && str[length] == b'.' && str[length + 1].is_ascii_digit() {
        length = digits(str, length + 2);
    }
    if length + 1 < str.len() && matches!(str[length], b'e' | b'E') {
        let has_sign = matches!(str[length + 1], b'+' | b'-');
        if has_sign && length + 2 < str.len() && str[length + 2].is_ascii_digit() {
            length = digits(str, length + 3);
        } else if !has_sign && str[length + 1].is_ascii_digit() {
            length = digits(str, length + 2);
        }
    }
    length
}

/// Per css-syntax-3 "consume an escaped code point": up to six hex
/// digits plus one optional whitespace byte, or a single code point.
fn match_escaped_code_point(str: &[u8]) -> usize {
    if str.is_empty() {
        return 0;
    }
    let hex = ascii::length_if(str, ascii::is_hex_digit).min(6);
    if hex != 0 {
        let trailing_space =
            usize::from(str.len() > hex && html::is_html_whitespace(str[hex]));
        return hex + trailing_space;
    }
    utf8::sequence_length(str[0]).max(1)
}

fn match_ident_sequence(str: &[u8]) -> usize {
    let mut length = 0;
    while length < str.len() {
        if starts_with_valid_escape(&str[length..]) {
            length += 1;
            length += match_escaped_code_point(&str[length..]);
        } else if is_css_identifier(str[length]) {
            length += 1;
        } else {
            break;
        }
    }
    length
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IdentType {
    Ident,
    Function,
    Url,
}

fn match_ident_like_token(str: &[u8]) -> (usize, IdentType) {
    let length = match_ident_sequence(str);
    if length == str.len() || str[length] != b'(' {
        return (length, IdentType::Ident);
    }
    if ascii::equals_ignore_case(&str[..length], b"url") {
        return (length, IdentType::Url);
    }
    (length, IdentType::Function)
}

/// The scanner's best guess at what it is currently inside of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Context {
    /// Stylesheet level: selectors and at-rules.
    TopLevel,
    /// The prelude of an at-rule, like `@media screen`.
    AtPrelude,
    /// Declaration block contents: property names.
    Block,
    /// A property value, after `:` inside a block.
    Value,
}

const SELECTOR_KIND: HighlightKind = HighlightKind::MarkupTag;

struct Scanner<'s, 'o, 'a> {
    hl: Highlighter<'s, 'o, 'a>,
    brace_level: usize,
    context: Context,
}

impl Scanner<'_, '_, '_> {
    fn contextual_kind(&self) -> HighlightKind {
        match self.context {
            Context::TopLevel => SELECTOR_KIND,
            Context::AtPrelude => HighlightKind::NameMacro,
            Context::Block => HighlightKind::MarkupAttr,
            Context::Value => HighlightKind::Name,
        }
    }

    fn run(&mut self) {
        while !self.hl.eof() {
            self.consume_comments();
            if self.hl.eof() {
                break;
            }
            let rem = self.hl.remainder();
            match rem[0] {
                b' ' | b'\t' | b'\r' | b'\n' | b'\x0C' => {
                    self.hl.advance(html::match_whitespace(rem));
                }
                c @ (b'"' | b'\'') => self.consume_string_token(c),
                b'#' => {
                    if rem.len() > 1
                        && (is_css_identifier(rem[1]) || starts_with_valid_escape(&rem[1..]))
                    {
                        let kind = if self.context == Context::Value {
                            HighlightKind::Value
                        } else {
                            self.contextual_kind()
                        };
                        self.hl.emit_and_advance(1, kind, Coalescing::Normal);
                        self.consume_ident_like_token(kind);
                    } else {
                        self.hl.advance(1);
                    }
                }
                b'(' | b')' => {
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolParens, Coalescing::Normal);
                }
                b'.' => {
                    if starts_with_number(rem) {
                        self.consume_numeric_token();
                    } else if self.context == Context::TopLevel {
                        self.hl.emit_and_advance(1, SELECTOR_KIND, Coalescing::Forced);
                    } else {
                        self.hl.advance(1);
                    }
                }
                c @ (b'+' | b'-') => {
                    if starts_with_number(rem) {
                        self.consume_numeric_token();
                    } else if c == b'-' && rem.starts_with(b"-->") {
                        self.hl
                            .emit_and_advance(3, HighlightKind::CommentDelim, Coalescing::Normal);
                    } else if c == b'-' && starts_with_ident_sequence(rem) {
                        self.consume_ident_like_token(self.contextual_kind());
                    } else {
                        self.hl
                            .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
                    }
                }
                b',' => {
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                }
                b':' => match self.context {
                    // Pseudo-classes and -elements coalesce with the
                    // preceding selector, as in `li::before`.
                    Context::TopLevel => {
                        self.hl.emit_and_advance(1, SELECTOR_KIND, Coalescing::Forced);
                    }
                    Context::Block => {
                        self.context = Context::Value;
                        self.hl
                            .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                    }
                    Context::AtPrelude | Context::Value => {
                        self.hl
                            .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                    }
                },
                b';' => {
                    if self.context == Context::Value {
                        self.context = Context::Block;
                    } else if self.context == Context::AtPrelude {
                        self.context = Context::TopLevel;
                    }
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                }
                b'<' => {
                    if rem.starts_with(b"<!--") {
                        self.hl
                            .emit_and_advance(4, HighlightKind::CommentDelim, Coalescing::Normal);
                    } else {
                        self.hl
                            .emit_and_advance(1, HighlightKind::SymbolOp, Coalescing::Normal);
                    }
                }
                b'>' | b'~' | b'*' => {
                    if self.context == Context::TopLevel {
                        // Combinators like `ul > li`.
                        self.hl.emit_and_advance(1, SELECTOR_KIND, Coalescing::Forced);
                    } else {
                        self.hl
                            .emit_and_advance(1, HighlightKind::SymbolOp, Coalescing::Normal);
                    }
                }
                b'@' => {
                    self.context = Context::AtPrelude;
                    if starts_with_ident_sequence(&rem[1..]) {
                        self.hl.emit_and_advance(
                            1,
                            HighlightKind::NameMacroDelim,
                            Coalescing::Normal,
                        );
                        self.consume_ident_like_token(HighlightKind::NameMacro);
                    } else {
                        self.hl
                            .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
                    }
                }
                b'!' => {
                    // `!important`, possibly with interior whitespace.
                    let white = html::match_whitespace(&rem[1..]);
                    let name = match_ident_sequence(&rem[1 + white..]);
                    if name != 0
                        && ascii::starts_with_ignore_case(&rem[1 + white..1 + white + name], b"important")
                    {
                        self.hl.emit_and_advance(
                            1 + white + b"important".len(),
                            HighlightKind::Keyword,
                            Coalescing::Normal,
                        );
                    } else {
                        self.hl.advance(1);
                    }
                }
                b'[' | b']' => {
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolSquare, Coalescing::Normal);
                }
                b'\\' => {
                    if starts_with_valid_escape(rem) {
                        self.consume_ident_like_token(self.contextual_kind());
                    } else {
                        self.hl
                            .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
                    }
                }
                b'{' => {
                    self.brace_level += 1;
                    self.context = Context::Block;
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);
                }
                b'}' => {
                    self.brace_level = self.brace_level.saturating_sub(1);
                    if self.brace_level == 0 {
                        self.context = Context::TopLevel;
                    }
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);
                }
                b'0'..=b'9' => self.consume_numeric_token(),
                c => {
                    if is_css_identifier_start(c) {
                        self.consume_ident_like_token(self.contextual_kind());
                    } else {
                        self.hl.advance(utf8::sequence_length(c).max(1));
                    }
                }
            }
        }
    }

    fn consume_comments(&mut self) {
        loop {
            let comment = crate::parse::match_enclosed(self.hl.remainder(), b"/*", b"*/");
            if !comment.matched() {
                return;
            }
            self.hl.highlight_enclosed_comment(comment, 2, 2);
        }
    }

    fn consume_numeric_token(&mut self) {
        let length = match_number(self.hl.remainder());
        debug_assert!(length != 0);
        self.hl
            .emit_and_advance(length, HighlightKind::Number, Coalescing::Normal);
        if starts_with_ident_sequence(self.hl.remainder()) {
            // A dimension unit like `px` or `rem`.
            self.consume_ident_like_token(HighlightKind::NumberDecor);
        } else if self.hl.remainder().starts_with(b"%") {
            self.hl
                .emit_and_advance(1, HighlightKind::NumberDecor, Coalescing::Normal);
        }
    }

    /// Strings keep their quotes as part of the `string` runs; only
    /// escapes are split out.
    fn consume_string_token(&mut self, quote: u8) {
        let mut length = 1;
        loop {
            let rem = self.hl.remainder();
            if length >= rem.len() {
                break;
            }
            if rem[length] == quote {
                length += 1;
                break;
            }
            if is_css_newline(rem[length]) {
                break;
            }
            if rem[length] == b'\\' {
                self.flush_string(&mut length);
                let escape = 1 + match_escaped_code_point(&self.hl.remainder()[1..]);
                self.hl
                    .emit_and_advance(escape, HighlightKind::StringEscape, Coalescing::Normal);
                continue;
            }
            length += 1;
        }
        self.flush_string(&mut length);
    }

    fn flush_string(&mut self, length: &mut usize) {
        if *length != 0 {
            self.hl
                .emit_and_advance(*length, HighlightKind::String, Coalescing::Normal);
            *length = 0;
        }
    }

    fn consume_ident_like_token(&mut self, default_kind: HighlightKind) {
        let (_, ident_type) = match_ident_like_token(self.hl.remainder());
        let kind = if default_kind != HighlightKind::Name {
            default_kind
        } else {
            match ident_type {
                IdentType::Function => HighlightKind::NameFunction,
                IdentType::Url => HighlightKind::Keyword,
                IdentType::Ident => HighlightKind::Name,
            }
        };

        let mut length = 0;
        loop {
            let rem = self.hl.remainder();
            if length >= rem.len() {
                break;
            }
            if starts_with_valid_escape(&rem[length..]) {
                if length != 0 {
                    self.hl.emit_and_advance(length, kind, Coalescing::Forced);
                    length = 0;
                }
                let escape = 1 + match_escaped_code_point(&self.hl.remainder()[1..]);
                self.hl
                    .emit_and_advance(escape, HighlightKind::StringEscape, Coalescing::Normal);
            } else if is_css_identifier(rem[length]) {
                length += 1;
            } else {
                break;
            }
        }
        if length != 0 {
            self.hl.emit_and_advance(length, kind, Coalescing::Forced);
        }
    }
}

pub(crate) fn highlight(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    Scanner {
        hl: Highlighter::new(source, out, *options),
        brace_level: 0,
        context: Context::TopLevel,
    }
    .run();
}

#[cfg(test)]
mod tests {
    use crate::scan::testing::{dump, tokens};
    use crate::Lang;

    #[test]
    fn test_rule() {
        let toks = tokens(b"a{color:red}", Lang::Css);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 1, "markup_tag"),
                (1, 1, "sym_brace"),
                (2, 5, "markup_attr"),
                (7, 1, "sym_punc"),
                (8, 3, "name"),
                (11, 1, "sym_brace"),
            ]
        );
    }

    #[test]
    fn test_pseudo_class_coalesces_with_selector() {
        let toks = tokens(b"li::before{}", Lang::Css);
        assert_eq!(
            dump(&toks),
            vec![(0, 10, "markup_tag"), (10, 1, "sym_brace"), (11, 1, "sym_brace")]
        );
    }

    #[test]
    fn test_class_selector_coalesces() {
        let toks = tokens(b".cute{}", Lang::Css);
        assert_eq!(
            dump(&toks),
            vec![(0, 5, "markup_tag"), (5, 1, "sym_brace"), (6, 1, "sym_brace")]
        );
    }

    #[test]
    fn test_at_rule() {
        let toks = tokens(b"@media screen{}", Lang::Css);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 1, "name_macro_del"),
                (1, 5, "name_macro"),
                (7, 6, "name_macro"),
                (13, 1, "sym_brace"),
                (14, 1, "sym_brace"),
            ]
        );
    }

    #[test]
    fn test_dimension_and_percentage() {
        let toks = tokens(b"a{width:10px;top:5%}", Lang::Css);
        let ids = dump(&toks);
        assert!(ids.contains(&(8, 2, "num")));
        assert!(ids.contains(&(10, 2, "num_dec")));
        assert!(ids.contains(&(17, 1, "num")));
        assert!(ids.contains(&(18, 1, "num_dec")));
    }

    #[test]
    fn test_function_and_hex_color() {
        let toks = tokens(b"a{c:var(--x);b:#fff}", Lang::Css);
        let ids = dump(&toks);
        assert!(ids.contains(&(4, 3, "name_fn")));
        assert!(ids.contains(&(8, 3, "name")));
        assert!(ids.contains(&(15, 1, "val")));
        assert!(ids.contains(&(16, 3, "val")));
    }

    #[test]
    fn test_comment() {
        let toks = tokens(b"/*c*/a{}", Lang::Css);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 2, "cmt_del"),
                (2, 1, "cmt"),
                (3, 2, "cmt_del"),
                (5, 1, "markup_tag"),
                (6, 1, "sym_brace"),
                (7, 1, "sym_brace"),
            ]
        );
    }

    #[test]
    fn test_important() {
        let toks = tokens(b"a{c:red!important}", Lang::Css);
        let ids = dump(&toks);
        assert!(ids.contains(&(7, 10, "kw")));
    }

    #[test]
    fn test_string_with_escape() {
        let toks = tokens(br#"a{c:"x\41 y"}"#, Lang::Css);
        let ids = dump(&toks);
        assert!(ids.contains(&(6, 4, "str_esc")));
    }

    #[test]
    fn test_cdo_cdc_tokens() {
        let toks = tokens(b"<!-- a{} -->", Lang::Css);
        assert_eq!(toks[0].kind.id(), "cmt_del");
        assert_eq!(toks[toks.len() - 1].kind.id(), "cmt_del");
    }

    #[test]
    fn test_semicolon_returns_to_block() {
        let toks = tokens(b"a{x:1;y:2}", Lang::Css);
        let ids = dump(&toks);
        assert!(ids.contains(&(2, 1, "markup_attr")));
        assert!(ids.contains(&(6, 1, "markup_attr")));
    }
}
