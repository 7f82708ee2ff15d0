//! C and C++ scanner.
//!
//! Highlighting approximately follows C++ tokenization: logical lines
//! (backslash splices), pp-numbers, raw strings with D-char sequences,
//! and preprocessing directives that only start on a fresh line.

use glint_util::{ascii, utf8};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::escape::{match_common_escape, CommonEscape, EscapeResult};
use crate::highlighter::{Coalescing, Highlighter};
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};

/// Which standard a keyword or operator belongs to. `strict` mode
/// suppresses features foreign to the language being highlighted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FeatureSource {
    /// Compiler extensions; neither standard C nor standard C++.
    Ext,
    /// Standard C only.
    C,
    /// Standard C++ only.
    Cpp,
    /// Common to both.
    CCpp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    C,
    Cpp,
}

fn is_available(source: FeatureSource, mode: Mode, strict: bool) -> bool {
    if !strict {
        return true;
    }
    match source {
        FeatureSource::Ext => false,
        FeatureSource::C => mode == Mode::C,
        FeatureSource::Cpp => mode == Mode::Cpp,
        FeatureSource::CCpp => true,
    }
}

use FeatureSource::{CCpp, Cpp, Ext, C};
use HighlightKind::{Bool, Keyword, KeywordControl, KeywordType, Null, This};

#[rustfmt::skip]
static KEYWORDS: Lazy<FxHashMap<&'static [u8], (HighlightKind, FeatureSource)>> = Lazy::new(|| {
    let entries: &[(&[u8], HighlightKind, FeatureSource)] = &[
        (b"_Alignas", Keyword, C),
        (b"_Alignof", Keyword, C),
        (b"_Atomic", Keyword, CCpp),
        (b"_BitInt", KeywordType, C),
        (b"_Bool", KeywordType, C),
        (b"_Complex", Keyword, C),
        (b"_Decimal128", KeywordType, C),
        (b"_Decimal32", KeywordType, C),
        (b"_Decimal64", KeywordType, C),
        (b"_Float128", KeywordType, C),
        (b"_Float128x", KeywordType, C),
        (b"_Float16", KeywordType, C),
        (b"_Float32", KeywordType, C),
        (b"_Float32x", KeywordType, C),
        (b"_Float64", KeywordType, C),
        (b"_Float64x", KeywordType, C),
        (b"_Generic", Keyword, C),
        (b"_Imaginary", Keyword, C),
        (b"_Noreturn", Keyword, C),
        (b"_Pragma", Keyword, CCpp),
        (b"_Static_assert", Keyword, C),
        (b"_Thread_local", Keyword, C),
        (b"__asm__", Keyword, Ext),
        (b"__attribute__", Keyword, Ext),
        (b"__extension__", Keyword, Ext),
        (b"__float128", KeywordType, Ext),
        (b"__float80", KeywordType, Ext),
        (b"__fp16", KeywordType, Ext),
        (b"__ibm128", KeywordType, Ext),
        (b"__imag__", Keyword, Ext),
        (b"__int128", KeywordType, Ext),
        (b"__int16", KeywordType, Ext),
        (b"__int256", KeywordType, Ext),
        (b"__int32", KeywordType, Ext),
        (b"__int64", KeywordType, Ext),
        (b"__int8", KeywordType, Ext),
        (b"__label__", Keyword, Ext),
        (b"__m128", KeywordType, Ext),
        (b"__m128d", KeywordType, Ext),
        (b"__m128i", KeywordType, Ext),
        (b"__m256", KeywordType, Ext),
        (b"__m256d", KeywordType, Ext),
        (b"__m256i", KeywordType, Ext),
        (b"__m512", KeywordType, Ext),
        (b"__m512d", KeywordType, Ext),
        (b"__m512i", KeywordType, Ext),
        (b"__m64", KeywordType, Ext),
        (b"__mmask16", KeywordType, Ext),
        (b"__mmask32", KeywordType, Ext),
        (b"__mmask64", KeywordType, Ext),
        (b"__mmask8", KeywordType, Ext),
        (b"__ptr32", KeywordType, Ext),
        (b"__ptr64", KeywordType, Ext),
        (b"__real__", Keyword, Ext),
        (b"__restrict", Keyword, Ext),
        (b"alignas", Keyword, CCpp),
        (b"alignof", Keyword, CCpp),
        (b"and", Keyword, CCpp),
        (b"and_eq", Keyword, CCpp),
        (b"asm", KeywordControl, CCpp),
        (b"auto", Keyword, CCpp),
        (b"bitand", Keyword, CCpp),
        (b"bitor", Keyword, CCpp),
        (b"bool", KeywordType, CCpp),
        (b"break", KeywordControl, CCpp),
        (b"case", KeywordControl, CCpp),
        (b"catch", KeywordControl, Cpp),
        (b"char", KeywordType, CCpp),
        (b"char16_t", KeywordType, Cpp),
        (b"char32_t", KeywordType, Cpp),
        (b"char8_t", KeywordType, Cpp),
        (b"class", Keyword, Cpp),
        (b"co_await", KeywordControl, Cpp),
        (b"co_return", KeywordControl, Cpp),
        (b"co_yield", KeywordControl, Cpp),
        (b"compl", Keyword, CCpp),
        (b"complex", Keyword, C),
        (b"concept", Keyword, Cpp),
        (b"const", Keyword, CCpp),
        (b"const_cast", Keyword, Cpp),
        (b"consteval", Keyword, Cpp),
        (b"constexpr", Keyword, CCpp),
        (b"constinit", Keyword, Cpp),
        (b"continue", KeywordControl, CCpp),
        (b"contract_assert", Keyword, Cpp),
        (b"decltype", Keyword, Cpp),
        (b"default", Keyword, CCpp),
        (b"delete", Keyword, Cpp),
        (b"do", KeywordControl, CCpp),
        (b"double", KeywordType, CCpp),
        (b"dynamic_cast", Keyword, Cpp),
        (b"else", KeywordControl, CCpp),
        (b"enum", Keyword, CCpp),
        (b"explicit", Keyword, Cpp),
        (b"export", Keyword, Cpp),
        (b"extern", Keyword, CCpp),
        (b"false", Bool, CCpp),
        (b"final", Keyword, Cpp),
        (b"float", KeywordType, CCpp),
        (b"for", KeywordControl, CCpp),
        (b"friend", Keyword, Cpp),
        (b"goto", KeywordControl, CCpp),
        (b"if", KeywordControl, CCpp),
        (b"imaginary", Keyword, C),
        (b"import", Keyword, Cpp),
        (b"inline", Keyword, CCpp),
        (b"int", KeywordType, CCpp),
        (b"long", KeywordType, CCpp),
        (b"module", Keyword, Cpp),
        (b"mutable", Keyword, Cpp),
        (b"namespace", Keyword, Cpp),
        (b"new", Keyword, Cpp),
        (b"noexcept", Keyword, Cpp),
        (b"noreturn", Keyword, C),
        (b"not", Keyword, CCpp),
        (b"not_eq", Keyword, CCpp),
        (b"nullptr", Null, CCpp),
        (b"operator", Keyword, Cpp),
        (b"or", Keyword, CCpp),
        (b"or_eq", Keyword, CCpp),
        (b"override", Keyword, Cpp),
        (b"post", Keyword, Cpp),
        (b"pre", Keyword, Cpp),
        (b"private", Keyword, Cpp),
        (b"protected", Keyword, Cpp),
        (b"public", Keyword, Cpp),
        (b"register", Keyword, CCpp),
        (b"reinterpret_cast", Keyword, Cpp),
        (b"replaceable_if_eligible", Keyword, Cpp),
        (b"requires", Keyword, Cpp),
        (b"restrict", Keyword, C),
        (b"return", KeywordControl, CCpp),
        (b"short", KeywordType, CCpp),
        (b"signed", KeywordType, CCpp),
        (b"sizeof", Keyword, CCpp),
        (b"static", Keyword, CCpp),
        (b"static_assert", Keyword, CCpp),
        (b"static_cast", Keyword, Cpp),
        (b"struct", Keyword, CCpp),
        (b"switch", KeywordControl, CCpp),
        (b"template", Keyword, Cpp),
        (b"this", This, Cpp),
        (b"thread_local", Keyword, CCpp),
        (b"throw", Keyword, Cpp),
        (b"trivially_relocatable_if_eligible", Keyword, Cpp),
        (b"true", Bool, CCpp),
        (b"try", Keyword, Cpp),
        (b"typedef", Keyword, CCpp),
        (b"typeid", Keyword, Cpp),
        (b"typename", Keyword, Cpp),
        (b"typeof", Keyword, C),
        (b"typeof_unqual", Keyword, C),
        (b"union", Keyword, CCpp),
        (b"unsigned", KeywordType, CCpp),
        (b"using", Keyword, Cpp),
        (b"virtual", Keyword, Cpp),
        (b"void", KeywordType, CCpp),
        (b"volatile", Keyword, CCpp),
        (b"wchar_t", KeywordType, Cpp),
        (b"while", KeywordControl, CCpp),
        (b"xor", Keyword, CCpp),
        (b"xor_eq", Keyword, CCpp),
    ];
    entries.iter().map(|&(code, kind, source)| (code, (kind, source))).collect()
});

fn is_cpp_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | b'\x0B' | b'\x0C')
}

fn match_whitespace(str: &[u8]) -> usize {
    ascii::length_if(str, is_cpp_whitespace)
}

/// Matches `\` + optional non-newline whitespace + newline, the line
/// splice of translation phase 2.
fn match_newline_escape(str: &[u8]) -> usize {
    if !str.starts_with(b"\\") {
        return 0;
    }
    let mut length = 1;
    while length < str.len() {
        match str[length] {
            b'\n' => return length + 1,
            c if is_cpp_whitespace(c) => length += 1,
            _ => return 0,
        }
    }
    0
}

/// Matches a `//` comment, folding in backslash-newline continuations.
/// The terminating newline is not part of the comment.
fn match_line_comment(str: &[u8]) -> usize {
    if !str.starts_with(b"//") {
        return 0;
    }
    let mut length = 2;
    while length < str.len() {
        let rest = &str[length..];
        if rest.starts_with(b"\n") || rest.starts_with(b"\r\n") {
            return length;
        }
        let escape = match_newline_escape(rest);
        length += if escape != 0 { escape } else { 1 };
    }
    length
}

fn match_block_comment(str: &[u8]) -> crate::parse::EnclosedResult {
    crate::parse::match_enclosed(str, b"/*", b"*/")
}

/// Matches a preprocessing directive from the `#` up to the end of the
/// logical line, honoring splices and stopping before a comment.
fn match_directive(str: &[u8]) -> usize {
    let mut length = 1;
    while length < str.len() {
        let rest = &str[length..];
        if rest.starts_with(b"\n")
            || rest.starts_with(b"\r\n")
            || rest.starts_with(b"//")
            || rest.starts_with(b"/*")
        {
            return length;
        }
        let escape = match_newline_escape(rest);
        length += if escape != 0 { escape } else { 1 };
    }
    length
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic() || (!c.is_ascii() && c.is_alphabetic())
}

fn is_identifier_continue(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit()
}

pub(crate) fn match_identifier(str: &[u8]) -> usize {
    let Some((first, first_units)) = utf8::decode(str) else {
        return 0;
    };
    if !is_identifier_start(first) {
        return 0;
    }
    first_units + utf8::length_if(&str[first_units..], is_identifier_continue)
}

/// Matches a pp-number: `\.?[0-9]('[0-9a-zA-Z_]|[eEpP][+-]|\.|id-continue)*`.
/// A superset of integer and floating literals, matched as one token.
fn match_pp_number(str: &[u8]) -> usize {
    let mut length = if str.len() >= 2 && str[0] == b'.' && ascii::is_digit(str[1]) {
        2
    } else if !str.is_empty() && ascii::is_digit(str[0]) {
        1
    } else {
        return 0;
    };

    while length < str.len() {
        match str[length] {
            b'\'' => {
                // Digit separator, only before another identifier byte.
                if str.len() > length + 1
                    && (str[length + 1] == b'_' || str[length + 1].is_ascii_alphanumeric())
                {
                    length += 2;
                } else {
                    return length;
                }
            }
            b'e' | b'E' | b'p' | b'P' => {
                if str.len() > length + 1 && matches!(str[length + 1], b'+' | b'-') {
                    length += 2;
                } else {
                    length += 1;
                }
            }
            b'.' => length += 1,
            _ => {
                let Some((c, units)) = utf8::decode(&str[length..]) else {
                    return length;
                };
                if !is_identifier_continue(c) {
                    return length;
                }
                length += units;
            }
        }
    }
    length
}

/// The type of a matched escape sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EscapeType {
    Simple,
    Octal,
    Hexadecimal,
    Universal,
    Conditional,
    Newline,
}

fn match_escape_sequence(str: &[u8]) -> (EscapeResult, EscapeType) {
    let none = (EscapeResult::default(), EscapeType::Simple);
    if str.len() < 2 || str[0] != b'\\' {
        return none;
    }
    match str[1] {
        b'\'' | b'"' | b'?' | b'\\' | b'a' | b'b' | b'f' | b'n' | b'r' | b't' | b'v' => (
            EscapeResult {
                length: 2,
                erroneous: false,
            },
            EscapeType::Simple,
        ),
        b'0'..=b'7' => (
            match_common_escape(CommonEscape::Octal3, str, 1),
            EscapeType::Octal,
        ),
        b'o' => (
            match_common_escape(CommonEscape::HexBraced, str, 2),
            EscapeType::Octal,
        ),
        b'x' => {
            if str[2..].starts_with(b"{") {
                (
                    match_common_escape(CommonEscape::HexBraced, str, 2),
                    EscapeType::Hexadecimal,
                )
            } else {
                // Any positive number of hex digits.
                let digits = ascii::length_if(&str[2..], ascii::is_hex_digit);
                (
                    EscapeResult {
                        length: 2 + digits,
                        erroneous: digits == 0,
                    },
                    EscapeType::Hexadecimal,
                )
            }
        }
        b'u' => {
            if str[2..].starts_with(b"{") {
                (
                    match_common_escape(CommonEscape::HexBraced, str, 2),
                    EscapeType::Universal,
                )
            } else {
                (
                    match_common_escape(CommonEscape::Hex4, str, 2),
                    EscapeType::Universal,
                )
            }
        }
        b'U' => (
            match_common_escape(CommonEscape::Hex8, str, 2),
            EscapeType::Universal,
        ),
        b'N' => {
            if str[2..].starts_with(b"{") {
                let close = ascii::find_byte(&str[3..], b'}');
                match close {
                    Some(i) => (
                        EscapeResult {
                            length: 4 + i,
                            erroneous: i == 0,
                        },
                        EscapeType::Universal,
                    ),
                    None => (
                        EscapeResult {
                            length: str.len(),
                            erroneous: true,
                        },
                        EscapeType::Universal,
                    ),
                }
            } else {
                (
                    EscapeResult {
                        length: 2,
                        erroneous: true,
                    },
                    EscapeType::Universal,
                )
            }
        }
        _ => {
            if match_newline_escape(str) != 0 {
                (
                    EscapeResult {
                        length: match_newline_escape(str),
                        erroneous: false,
                    },
                    EscapeType::Newline,
                )
            } else {
                (
                    EscapeResult {
                        length: 2,
                        erroneous: false,
                    },
                    EscapeType::Conditional,
                )
            }
        }
    }
}

/// A matched string or character literal.
#[derive(Clone, Copy, Debug, Default)]
struct LiteralMatch {
    length: usize,
    /// Length of the encoding prefix (`u8`, `u`, `U`, `L`), if any.
    encoding_prefix: usize,
    /// Length of the full opening delimiter, including the quote and,
    /// for raw strings, the D-char sequence and `(`.
    open_delimiter: usize,
    /// Length of the closing delimiter, zero when unterminated.
    close_delimiter: usize,
    raw: bool,
}

impl LiteralMatch {
    fn matched(&self) -> bool {
        self.length != 0
    }
}

fn match_encoding_prefix(str: &[u8]) -> usize {
    if str.starts_with(b"u8") {
        2
    } else if str.starts_with(b"u") || str.starts_with(b"U") || str.starts_with(b"L") {
        1
    } else {
        0
    }
}

fn is_d_char(c: u8) -> bool {
    c.is_ascii() && !is_cpp_whitespace(c) && c != b'(' && c != b')' && c != b'\\'
}

fn match_string_literal(str: &[u8]) -> LiteralMatch {
    let encoding_prefix = match_encoding_prefix(str);
    let mut length = encoding_prefix;

    let raw = str[length..].starts_with(b"R");
    if raw {
        length += 1;
    }
    if !str[length..].starts_with(b"\"") {
        return LiteralMatch::default();
    }
    length += 1;

    if raw {
        let d_chars = ascii::length_if(&str[length..], is_d_char).min(16);
        if !str[length + d_chars..].starts_with(b"(") {
            return LiteralMatch::default();
        }
        let d_seq = &str[length..length + d_chars];
        let open_delimiter = length + d_chars + 1 - encoding_prefix;
        length += d_chars + 1;

        let mut terminator = Vec::with_capacity(d_chars + 2);
        terminator.push(b')');
        terminator.extend_from_slice(d_seq);
        terminator.push(b'"');
        match ascii::find_subslice(str, &terminator, length) {
            Some(i) => LiteralMatch {
                length: i + terminator.len(),
                encoding_prefix,
                open_delimiter,
                close_delimiter: terminator.len(),
                raw,
            },
            None => LiteralMatch {
                length: str.len(),
                encoding_prefix,
                open_delimiter,
                close_delimiter: 0,
                raw,
            },
        }
    } else {
        match_quoted_tail(str, length, b'"', encoding_prefix)
    }
}

fn match_character_literal(str: &[u8]) -> LiteralMatch {
    let encoding_prefix = match_encoding_prefix(str);
    if !str[encoding_prefix..].starts_with(b"'") {
        return LiteralMatch::default();
    }
    match_quoted_tail(str, encoding_prefix + 1, b'\'', encoding_prefix)
}

/// Scans the body of a quoted literal starting just past the opening
/// quote, stopping at the quote, an unescaped newline, or end of input.
fn match_quoted_tail(str: &[u8], start: usize, quote: u8, encoding_prefix: usize) -> LiteralMatch {
    let mut length = start;
    while length < str.len() {
        match str[length] {
            c if c == quote => {
                return LiteralMatch {
                    length: length + 1,
                    encoding_prefix,
                    open_delimiter: start - encoding_prefix,
                    close_delimiter: 1,
                    raw: false,
                }
            }
            b'\\' => {
                length += if length + 1 < str.len() { 2 } else { 1 };
            }
            b'\n' => break,
            _ => length += 1,
        }
    }
    LiteralMatch {
        length,
        encoding_prefix,
        open_delimiter: start - encoding_prefix,
        close_delimiter: 0,
        raw: false,
    }
}

/// A matched operator or punctuator.
struct OpMatch {
    length: usize,
    kind: HighlightKind,
    /// `#` or `%:`, which may begin a directive on a fresh line.
    pound: bool,
}

fn op(length: usize, kind: HighlightKind) -> Option<OpMatch> {
    Some(OpMatch {
        length,
        kind,
        pound: false,
    })
}

/// Maximal-munch match of a preprocessing-op-or-punc.
#[rustfmt::skip]
fn match_op(str: &[u8]) -> Option<OpMatch> {
    use HighlightKind::{NameMacroDelim, SymbolBrace, SymbolOp, SymbolParens, SymbolPunc, SymbolSquare};
    let first = *str.first()?;
    match first {
        b'#' => {
            let length = if str.starts_with(b"##") { 2 } else { 1 };
            Some(OpMatch { length, kind: NameMacroDelim, pound: length == 1 })
        }
        b'%' => {
            if str.starts_with(b"%:%:") {
                Some(OpMatch { length: 4, kind: NameMacroDelim, pound: false })
            } else if str.starts_with(b"%:") {
                Some(OpMatch { length: 2, kind: NameMacroDelim, pound: true })
            } else if str.starts_with(b"%=") {
                op(2, SymbolOp)
            } else if str.starts_with(b"%>") {
                op(2, SymbolBrace)
            } else {
                op(1, SymbolOp)
            }
        }
        b'{' | b'}' => op(1, SymbolBrace),
        b'[' | b']' => op(1, SymbolSquare),
        b'(' | b')' => op(1, SymbolParens),
        b'<' => {
            // A "<::" not followed by ':' or '>' is "<" "::", per the
            // pp-token disambiguation rule.
            if str.starts_with(b"<::") && !str.starts_with(b"<:::") && !str.starts_with(b"<::>") {
                op(1, SymbolOp)
            } else if str.starts_with(b"<=>") {
                op(3, SymbolOp)
            } else if str.starts_with(b"<<=") {
                op(3, SymbolOp)
            } else if str.starts_with(b"<=") {
                op(2, SymbolOp)
            } else if str.starts_with(b"<<") {
                op(2, SymbolOp)
            } else if str.starts_with(b"<%") {
                op(2, SymbolBrace)
            } else if str.starts_with(b"<:") {
                op(2, SymbolSquare)
            } else {
                op(1, SymbolOp)
            }
        }
        b';' | b',' => op(1, SymbolPunc),
        b':' => {
            if str.starts_with(b":>") {
                op(2, SymbolSquare)
            } else if str.starts_with(b"::") {
                op(2, SymbolOp)
            } else {
                op(1, SymbolPunc)
            }
        }
        b'.' => {
            if str.starts_with(b"...") {
                op(3, SymbolOp)
            } else if str.starts_with(b".*") {
                op(2, SymbolOp)
            } else {
                op(1, SymbolOp)
            }
        }
        b'?' => op(1, SymbolOp),
        b'-' => {
            if str.starts_with(b"->*") {
                op(3, SymbolOp)
            } else if str.starts_with(b"->") {
                op(2, SymbolOp)
            } else if str.starts_with(b"-=") || str.starts_with(b"--") {
                op(2, SymbolOp)
            } else {
                op(1, SymbolOp)
            }
        }
        b'>' => {
            if str.starts_with(b">>=") {
                op(3, SymbolOp)
            } else if str.starts_with(b">=") || str.starts_with(b">>") {
                op(2, SymbolOp)
            } else {
                op(1, SymbolOp)
            }
        }
        b'~' => op(1, SymbolOp),
        b'!' => op(if str.starts_with(b"!=") { 2 } else { 1 }, SymbolOp),
        b'+' => op(
            if str.starts_with(b"++") || str.starts_with(b"+=") { 2 } else { 1 },
            SymbolOp,
        ),
        b'*' => op(if str.starts_with(b"*=") { 2 } else { 1 }, SymbolOp),
        b'/' => op(if str.starts_with(b"/=") { 2 } else { 1 }, SymbolOp),
        b'^' => {
            if str.starts_with(b"^^") {
                op(2, SymbolOp)
            } else {
                op(if str.starts_with(b"^=") { 2 } else { 1 }, SymbolOp)
            }
        }
        b'&' => op(
            if str.starts_with(b"&=") || str.starts_with(b"&&") { 2 } else { 1 },
            SymbolOp,
        ),
        b'|' => op(
            if str.starts_with(b"|=") || str.starts_with(b"||") { 2 } else { 1 },
            SymbolOp,
        ),
        b'=' => op(if str.starts_with(b"==") { 2 } else { 1 }, SymbolOp),
        _ => None,
    }
}

struct Scanner<'s, 'o, 'a> {
    hl: Highlighter<'s, 'o, 'a>,
    mode: Mode,
    /// Nothing but whitespace has appeared on the current line yet;
    /// governs whether `#` begins a preprocessing directive.
    fresh_line: bool,
}

impl Scanner<'_, '_, '_> {
    fn run(&mut self) {
        while !self.hl.eof() {
            let rem = self.hl.remainder();

            let white = match_whitespace(rem);
            if white != 0 {
                self.fresh_line |= rem[..white].contains(&b'\n');
                self.hl.advance(white);
                continue;
            }
            if self.expect_line_comment()
                || self.expect_block_comment()
                || self.expect_string_literal()
                || self.expect_character_literal()
                || self.expect_pp_number()
                || self.expect_identifier()
                || self.expect_op_or_directive()
            {
                continue;
            }
            // Stray backslash at the end of a line splices it away;
            // there is no earlier phase to remove these.
            let splice = match_newline_escape(rem);
            if splice != 0 {
                self.hl.advance(splice);
                continue;
            }
            let length = utf8::decode(rem).map_or(1, |(_, units)| units);
            self.hl
                .emit_and_advance(length, HighlightKind::Error, Coalescing::Normal);
            self.fresh_line = false;
        }
    }

    fn keyword_of(&self, id: &[u8]) -> Option<HighlightKind> {
        let &(kind, source) = KEYWORDS.get(id)?;
        is_available(source, self.mode, self.hl.options().strict).then_some(kind)
    }

    fn expect_line_comment(&mut self) -> bool {
        let length = match_line_comment(self.hl.remainder());
        if length == 0 {
            return false;
        }
        self.hl
            .emit_and_advance(2, HighlightKind::CommentDelim, Coalescing::Normal);
        if length > 2 {
            self.hl
                .emit_and_advance(length - 2, HighlightKind::Comment, Coalescing::Normal);
        }
        self.fresh_line = true;
        true
    }

    fn expect_block_comment(&mut self) -> bool {
        let comment = match_block_comment(self.hl.remainder());
        if !comment.matched() {
            return false;
        }
        self.hl.highlight_enclosed_comment(comment, 2, 2);
        true
    }

    fn expect_string_literal(&mut self) -> bool {
        let literal = match_string_literal(self.hl.remainder());
        if !literal.matched() {
            return false;
        }
        self.consume_literal(literal);
        true
    }

    fn expect_character_literal(&mut self) -> bool {
        let literal = match_character_literal(self.hl.remainder());
        if !literal.matched() {
            return false;
        }
        self.consume_literal(literal);
        true
    }

    /// Emits prefix, delimiters, content (with escapes unless raw),
    /// and any ud-suffix of a string or character literal.
    fn consume_literal(&mut self, literal: LiteralMatch) {
        if literal.encoding_prefix != 0 {
            self.hl.emit_and_advance(
                literal.encoding_prefix,
                HighlightKind::StringDecor,
                Coalescing::Normal,
            );
        }
        self.hl.emit_and_advance(
            literal.open_delimiter,
            HighlightKind::StringDelim,
            Coalescing::Normal,
        );

        let content_length = literal.length
            - literal.encoding_prefix
            - literal.open_delimiter
            - literal.close_delimiter;
        if literal.raw {
            if content_length != 0 {
                self.hl
                    .emit_and_advance(content_length, HighlightKind::String, Coalescing::Normal);
            }
        } else {
            self.consume_literal_content(content_length);
        }

        if literal.close_delimiter != 0 {
            self.hl.emit_and_advance(
                literal.close_delimiter,
                HighlightKind::StringDelim,
                Coalescing::Normal,
            );
            // ud-suffix
            let suffix = match_identifier(self.hl.remainder());
            if suffix != 0 && self.keyword_of(&self.hl.remainder()[..suffix]).is_none() {
                self.hl
                    .emit_and_advance(suffix, HighlightKind::StringDecor, Coalescing::Normal);
            }
        }
        self.fresh_line = false;
    }

    fn consume_literal_content(&mut self, content_length: usize) {
        let mut remaining = content_length;
        let mut run = 0;
        while run < remaining {
            let rest = &self.hl.remainder()[run..];
            if rest.starts_with(b"\\") {
                let (escape, _) = match_escape_sequence(rest);
                if escape.matched() {
                    if run != 0 {
                        self.hl
                            .emit_and_advance(run, HighlightKind::String, Coalescing::Normal);
                        remaining -= run;
                        run = 0;
                    }
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
            run += 1;
        }
        if run != 0 {
            self.hl
                .emit_and_advance(run, HighlightKind::String, Coalescing::Normal);
        }
    }

    fn expect_pp_number(&mut self) -> bool {
        let length = match_pp_number(self.hl.remainder());
        if length == 0 {
            return false;
        }
        self.hl
            .emit_and_advance(length, HighlightKind::Number, Coalescing::Normal);
        self.fresh_line = false;
        true
    }

    fn expect_identifier(&mut self) -> bool {
        let length = match_identifier(self.hl.remainder());
        if length == 0 {
            return false;
        }
        let kind = self
            .keyword_of(&self.hl.remainder()[..length])
            .unwrap_or(HighlightKind::Name);
        self.hl.emit_and_advance(length, kind, Coalescing::Normal);
        self.fresh_line = false;
        true
    }

    fn expect_op_or_directive(&mut self) -> bool {
        let Some(op) = match_op(self.hl.remainder()) else {
            return false;
        };
        if self.fresh_line && op.pound {
            let directive = match_directive(self.hl.remainder());
            self.hl
                .emit_and_advance(directive, HighlightKind::NameMacro, Coalescing::Normal);
            // A directive owns its whole logical line, so the next
            // line starts fresh.
            return true;
        }
        self.hl
            .emit_and_advance(op.length, op.kind, Coalescing::Normal);
        self.fresh_line = false;
        true
    }
}

fn highlight_impl(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions, mode: Mode) {
    Scanner {
        hl: Highlighter::new(source, out, *options),
        mode,
        fresh_line: true,
    }
    .run();
}

pub(crate) fn highlight_c(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    highlight_impl(source, out, options, Mode::C);
}

pub(crate) fn highlight_cpp(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    highlight_impl(source, out, options, Mode::Cpp);
}
