//! Python scanner.
//!
//! String prefixes (`r`, `b`, `rb`, `f`, ...) are lexed as ordinary
//! identifiers and reinterpreted when a quote follows, so an unknown
//! prefix degrades to an error decoration while the string body still
//! highlights. Triple-quoted strings span lines; raw prefixes disable
//! escape interpretation except for byte-literal ASCII checking.

use glint_util::{ascii, utf8};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::escape::{match_common_escape, CommonEscape, EscapeResult};
use crate::highlighter::{Coalescing, Highlighter};
use crate::scan::c::match_identifier;
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};

const DIGIT_SEPARATOR: u8 = b'_';

fn is_python_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | b'\x0B' | b'\x0C')
}

fn is_python_newline(c: u8) -> bool {
    c == b'\n' || c == b'\r'
}

/// The classified meaning of a string prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StringPrefix {
    Unicode,
    Raw,
    Byte,
    RawByte,
    Formatted,
    RawFormatted,
}

impl StringPrefix {
    fn is_raw(self) -> bool {
        matches!(
            self,
            StringPrefix::Raw | StringPrefix::RawByte | StringPrefix::RawFormatted
        )
    }

    fn is_byte(self) -> bool {
        matches!(self, StringPrefix::Byte | StringPrefix::RawByte)
    }
}

/// Case-insensitive in each letter, so `rb`, `Rb`, `bR`, ... all map.
fn classify_string_prefix(prefix: &[u8]) -> Option<StringPrefix> {
    match prefix {
        b"" => Some(StringPrefix::Unicode),
        b"u" | b"U" => Some(StringPrefix::Unicode),
        b"r" | b"R" => Some(StringPrefix::Raw),
        b"b" | b"B" => Some(StringPrefix::Byte),
        b"f" | b"F" => Some(StringPrefix::Formatted),
        _ if prefix.len() == 2 => {
            let lower = [
                prefix[0].to_ascii_lowercase(),
                prefix[1].to_ascii_lowercase(),
            ];
            match &lower {
                b"rb" | b"br" => Some(StringPrefix::RawByte),
                b"rf" | b"fr" => Some(StringPrefix::RawFormatted),
                _ => None,
            }
        }
        _ => None,
    }
}

fn match_number(str: &[u8]) -> crate::numeric::NumberResult {
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
    // The imaginary suffix stays valid on floats: `1.5j` is a number.
    static OPTIONS: NumberOptions = NumberOptions {
        signs: MatchedSigns::None,
        prefixes: PREFIXES,
        exponent_separators: EXPONENTS,
        suffixes: &[b"j", b"J"],
        default_leading_zero_base: 0,
        digit_separator: DIGIT_SEPARATOR,
        nonempty_integer: true,
    };
    match_common_number(str, &OPTIONS)
}

fn match_escape_sequence(str: &[u8]) -> EscapeResult {
    if str.len() < 2 || str[0] != b'\\' {
        return EscapeResult::default();
    }
    match str[1] {
        b'\r' | b'\n' => match_common_escape(CommonEscape::LfCrCrlf, str, 1),
        b'0'..=b'7' => match_common_escape(CommonEscape::Octal3, str, 1),
        b'x' => match_common_escape(CommonEscape::Hex2, str, 2),
        b'u' => match_common_escape(CommonEscape::Hex4, str, 2),
        b'U' => match_common_escape(CommonEscape::Hex8, str, 2),
        b'\\' | b'\'' | b'"' | b'a' | b'b' | b'f' | b'n' | b'r' | b't' | b'v' => EscapeResult {
            length: 2,
            erroneous: false,
        },
        _ => EscapeResult::default(),
    }
}

use HighlightKind::{Bool, Keyword, KeywordControl, Null, This};

static KEYWORDS: Lazy<FxHashMap<&'static [u8], HighlightKind>> = Lazy::new(|| {
    let entries: &[(&[u8], HighlightKind)] = &[
        (b"False", Bool),
        (b"None", Null),
        (b"True", Bool),
        (b"and", Keyword),
        (b"as", Keyword),
        (b"assert", Keyword),
        (b"async", Keyword),
        (b"await", Keyword),
        (b"break", KeywordControl),
        (b"case", KeywordControl),
        (b"class", Keyword),
        (b"continue", KeywordControl),
        (b"def", Keyword),
        (b"del", Keyword),
        (b"elif", KeywordControl),
        (b"else", KeywordControl),
        (b"except", KeywordControl),
        (b"finally", KeywordControl),
        (b"for", KeywordControl),
        (b"from", Keyword),
        (b"global", Keyword),
        (b"if", KeywordControl),
        (b"import", Keyword),
        (b"in", Keyword),
        (b"is", Keyword),
        (b"lambda", Keyword),
        (b"match", KeywordControl),
        (b"nonlocal", Keyword),
        (b"not", Keyword),
        (b"or", Keyword),
        (b"pass", Keyword),
        (b"raise", KeywordControl),
        (b"return", KeywordControl),
        (b"self", This),
        (b"while", KeywordControl),
        (b"with", Keyword),
        (b"yield", KeywordControl),
        (b"try", KeywordControl),
    ];
    entries.iter().copied().collect()
});

/// Maximal-munch operator and delimiter match.
#[rustfmt::skip]
fn match_symbol(str: &[u8]) -> Option<(usize, HighlightKind)> {
    use HighlightKind::{SymbolBrace, SymbolOp, SymbolParens, SymbolPunc, SymbolSquare};
    let op = |n| Some((n, SymbolOp));
    match *str.first()? {
        b'!' => if str.starts_with(b"!=") { op(2) } else { None },
        b'%' => op(if str.starts_with(b"%=") { 2 } else { 1 }),
        b'&' => op(if str.starts_with(b"&=") { 2 } else { 1 }),
        b'(' | b')' => Some((1, SymbolParens)),
        b'*' => op(
            if str.starts_with(b"**=") { 3 }
            else if str.starts_with(b"**") || str.starts_with(b"*=") { 2 }
            else { 1 },
        ),
        b'+' => op(if str.starts_with(b"+=") { 2 } else { 1 }),
        b',' => Some((1, SymbolPunc)),
        b'-' => op(if str.starts_with(b"-=") || str.starts_with(b"->") { 2 } else { 1 }),
        b'.' => op(if str.starts_with(b"...") { 3 } else { 1 }),
        b'/' => op(
            if str.starts_with(b"//=") { 3 }
            else if str.starts_with(b"//") || str.starts_with(b"/=") { 2 }
            else { 1 },
        ),
        b':' => op(if str.starts_with(b":=") { 2 } else { 1 }),
        b';' => Some((1, SymbolPunc)),
        b'<' => op(
            if str.starts_with(b"<<=") { 3 }
            else if str.starts_with(b"<<") || str.starts_with(b"<=") { 2 }
            else { 1 },
        ),
        b'=' => op(if str.starts_with(b"==") { 2 } else { 1 }),
        b'>' => op(
            if str.starts_with(b">>=") || str.starts_with(b">>>") { 3 }
            else if str.starts_with(b">=") || str.starts_with(b">>") { 2 }
            else { 1 },
        ),
        b'@' => op(if str.starts_with(b"@=") { 2 } else { 1 }),
        b'[' | b']' => Some((1, SymbolSquare)),
        b'\\' => op(1),
        b'^' => op(if str.starts_with(b"^=") { 2 } else { 1 }),
        b'{' | b'}' => Some((1, SymbolBrace)),
        b'|' => op(if str.starts_with(b"|=") { 2 } else { 1 }),
        b'~' => op(1),
        _ => None,
    }
}

struct Scanner<'s, 'o, 'a> {
    hl: Highlighter<'s, 'o, 'a>,
}

impl Scanner<'_, '_, '_> {
    fn run(&mut self) {
        while !self.hl.eof() {
            let white = ascii::length_if(self.hl.remainder(), is_python_whitespace);
            self.hl.advance(white);
            if self.hl.eof() {
                break;
            }

            // Strings first: prefixes like the `r` in `r"awoo"` would
            // otherwise lex as separate identifiers.
            let matched = self.expect_comment()
                || self.expect_string_literal()
                || self.expect_identifier()
                || self.expect_number()
                || self.expect_symbol();
            if !matched {
                let length = utf8::decode(self.hl.remainder()).map_or(1, |(_, units)| units);
                self.hl
                    .emit_and_advance(length, HighlightKind::Error, Coalescing::Forced);
            }
        }
    }

    fn expect_comment(&mut self) -> bool {
        if !self.hl.remainder().starts_with(b"#") {
            return false;
        }
        self.hl
            .emit_and_advance(1, HighlightKind::CommentDelim, Coalescing::Normal);
        let length = ascii::length_if_not(self.hl.remainder(), is_python_newline);
        if length != 0 {
            self.hl
                .emit_and_advance(length, HighlightKind::Comment, Coalescing::Normal);
        }
        true
    }

    fn expect_identifier(&mut self) -> bool {
        let length = match_identifier(self.hl.remainder());
        if length == 0 {
            return false;
        }
        let kind = KEYWORDS
            .get(&self.hl.remainder()[..length])
            .copied()
            .unwrap_or(HighlightKind::Name);
        self.hl.emit_and_advance(length, kind, Coalescing::Normal);
        true
    }

    fn expect_string_literal(&mut self) -> bool {
        let rem = self.hl.remainder();
        let prefix_length = match_identifier(rem);
        let after_prefix = &rem[prefix_length..];
        if !after_prefix.starts_with(b"'") && !after_prefix.starts_with(b"\"") {
            return false;
        }

        let prefix = classify_string_prefix(&rem[..prefix_length]);
        if prefix_length != 0 {
            let kind = if prefix.is_some() {
                HighlightKind::StringDecor
            } else {
                HighlightKind::Error
            };
            self.hl
                .emit_and_advance(prefix_length, kind, Coalescing::Normal);
        }
        self.consume_string(prefix.unwrap_or(StringPrefix::Unicode));
        true
    }

    fn consume_string(&mut self, prefix: StringPrefix) {
        let rem = self.hl.remainder();
        debug_assert!(rem.starts_with(b"'") || rem.starts_with(b"\""));

        let (terminator, is_long): (&[u8], bool) = if rem.starts_with(b"'''") {
            (b"'''", true)
        } else if rem.starts_with(b"\"\"\"") {
            (b"\"\"\"", true)
        } else if rem.starts_with(b"'") {
            (b"'", false)
        } else {
            (b"\"", false)
        };
        self.hl
            .emit_and_advance(terminator.len(), HighlightKind::StringDelim, Coalescing::Normal);

        let mut run = 0;
        loop {
            let rem = self.hl.remainder();
            if run >= rem.len() {
                break;
            }
            if rem[run..].starts_with(terminator) {
                self.flush_run(&mut run);
                self.hl.emit_and_advance(
                    terminator.len(),
                    HighlightKind::StringDelim,
                    Coalescing::Normal,
                );
                return;
            }
            if rem[run] == b'\\' {
                self.flush_run(&mut run);
                self.consume_escape(prefix);
                continue;
            }
            if !is_long && is_python_newline(rem[run]) {
                // Only triple-quoted strings may span lines.
                self.flush_run(&mut run);
                return;
            }
            run += 1;
        }
        self.flush_run(&mut run);
    }

    fn consume_escape(&mut self, prefix: StringPrefix) {
        let rem = self.hl.remainder();
        if prefix.is_raw() {
            // Raw literals keep the backslash, but a byte literal may
            // still only escape ASCII; a non-ASCII code point after
            // the backslash is an error without splitting the point.
            let (_, units) = utf8::decode(&rem[1..]).unwrap_or(('\0', 0));
            let kind = if prefix.is_byte() && units > 1 {
                HighlightKind::Error
            } else {
                HighlightKind::StringEscape
            };
            self.hl
                .emit_and_advance(1 + units, kind, Coalescing::Normal);
            return;
        }
        let escape = match_escape_sequence(rem);
        if escape.matched() {
            let kind = if escape.erroneous {
                HighlightKind::Error
            } else {
                HighlightKind::StringEscape
            };
            self.hl
                .emit_and_advance(escape.length, kind, Coalescing::Normal);
        } else {
            self.hl
                .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
        }
    }

    fn flush_run(&mut self, run: &mut usize) {
        if *run != 0 {
            self.hl
                .emit_and_advance(*run, HighlightKind::String, Coalescing::Normal);
            *run = 0;
        }
    }

    fn expect_number(&mut self) -> bool {
        let number = match_number(self.hl.remainder());
        if !number.matched() {
            return false;
        }
        self.hl.highlight_number(number, Some(DIGIT_SEPARATOR));
        true
    }

    fn expect_symbol(&mut self) -> bool {
        let Some((length, kind)) = match_symbol(self.hl.remainder()) else {
            return false;
        };
        self.hl.emit_and_advance(length, kind, Coalescing::Normal);
        true
    }
}

pub(crate) fn highlight(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    Scanner {
        hl: Highlighter::new(source, out, *options),
    }
    .run();
}
