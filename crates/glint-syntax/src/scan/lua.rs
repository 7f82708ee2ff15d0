//! Lua scanner.
//!
//! The distinctive construct is the long bracket: `[[`, `[=[`, `[==[`
//! and so on, closed only by a `]` with the same number of `=` signs.
//! Long brackets serve both long strings and, prefixed with `--`,
//! long comments. The `<const>` and `<close>` variable attributes get
//! dedicated attribute highlighting.

use glint_util::{ascii, utf8};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::highlighter::{Coalescing, Highlighter};
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};

fn is_lua_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | b'\x0B' | b'\x0C')
}

fn is_lua_identifier_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic() || (!c.is_ascii() && c.is_alphabetic())
}

fn is_lua_identifier_continue(c: char) -> bool {
    is_lua_identifier_start(c) || c.is_ascii_digit()
}

/// A matched long bracket `[=*[ ... ]=*]`.
#[derive(Clone, Copy, Debug, Default)]
struct LongBracket {
    length: usize,
    /// Length of `[` + equals + `[`.
    delimiter: usize,
    terminated: bool,
}

impl LongBracket {
    fn matched(&self) -> bool {
        self.length != 0
    }
}

/// Matches a long bracket starting at `str`, at any level.
fn match_long_bracket(str: &[u8]) -> LongBracket {
    if !str.starts_with(b"[") {
        return LongBracket::default();
    }
    let level = ascii::length_if(&str[1..], |c| c == b'=');
    if !str[1 + level..].starts_with(b"[") {
        return LongBracket::default();
    }
    let delimiter = level + 2;

    let mut terminator = Vec::with_capacity(delimiter);
    terminator.push(b']');
    terminator.extend(std::iter::repeat(b'=').take(level));
    terminator.push(b']');

    match ascii::find_subslice(str, &terminator, delimiter) {
        Some(i) => LongBracket {
            length: i + delimiter,
            delimiter,
            terminated: true,
        },
        None => LongBracket {
            length: str.len(),
            delimiter,
            terminated: false,
        },
    }
}

/// A `--` comment that is not a long comment; runs to the newline.
fn match_line_comment(str: &[u8]) -> usize {
    if !str.starts_with(b"--") {
        return 0;
    }
    if match_long_bracket(&str[2..]).matched() {
        return 0;
    }
    match ascii::find_byte(&str[2..], b'\n') {
        Some(i) => i + 2,
        None => str.len(),
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct StringMatch {
    length: usize,
    terminated: bool,
}

/// A short string: single or double quotes, backslash escapes, no
/// embedded newlines.
fn match_short_string(str: &[u8]) -> StringMatch {
    let quote = str[0];
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

/// Decimal and hexadecimal literals, including hex floats with a `p`
/// exponent.
fn match_number(str: &[u8]) -> usize {
    if str.starts_with(b"0x") || str.starts_with(b"0X") {
        let mut length = 2 + ascii::length_if(&str[2..], ascii::is_hex_digit);
        if str[length..].starts_with(b".") {
            length += 1;
            length += ascii::length_if(&str[length..], ascii::is_hex_digit);
        }
        if matches!(str.get(length), Some(b'p' | b'P')) {
            let mut exponent = length + 1;
            if matches!(str.get(exponent), Some(b'+' | b'-')) {
                exponent += 1;
            }
            let digits = ascii::length_if(&str[exponent..], ascii::is_digit);
            if digits != 0 {
                length = exponent + digits;
            }
        }
        return length;
    }

    let integer = ascii::length_if(str, ascii::is_digit);
    let mut length = integer;
    if integer == 0 {
        if str.len() >= 2 && str[0] == b'.' && ascii::is_digit(str[1]) {
            length = 1 + ascii::length_if(&str[1..], ascii::is_digit);
        } else {
            return 0;
        }
    } else if str[length..].starts_with(b".") {
        length += 1;
        length += ascii::length_if(&str[length..], ascii::is_digit);
    }

    if matches!(str.get(length), Some(b'e' | b'E')) {
        let mut exponent = length + 1;
        if matches!(str.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let digits = ascii::length_if(&str[exponent..], ascii::is_digit);
        if digits != 0 {
            length = exponent + digits;
        }
    }
    length
}

fn match_identifier(str: &[u8]) -> usize {
    let Some((first, first_units)) = utf8::decode(str) else {
        return 0;
    };
    if !is_lua_identifier_start(first) {
        return 0;
    }
    first_units + utf8::length_if(&str[first_units..], is_lua_identifier_continue)
}

use HighlightKind::{Bool, Keyword, KeywordControl, Null};

static KEYWORDS: Lazy<FxHashMap<&'static [u8], HighlightKind>> = Lazy::new(|| {
    let entries: &[(&[u8], HighlightKind)] = &[
        (b"and", Keyword),
        (b"break", KeywordControl),
        (b"do", KeywordControl),
        (b"else", KeywordControl),
        (b"elseif", KeywordControl),
        (b"end", KeywordControl),
        (b"false", Bool),
        (b"for", KeywordControl),
        (b"function", Keyword),
        (b"goto", KeywordControl),
        (b"if", KeywordControl),
        (b"in", Keyword),
        (b"local", Keyword),
        (b"nil", Null),
        (b"not", Keyword),
        (b"or", Keyword),
        (b"repeat", KeywordControl),
        (b"return", KeywordControl),
        (b"then", KeywordControl),
        (b"until", KeywordControl),
        (b"while", KeywordControl),
    ];
    entries.iter().copied().collect()
});

/// Maximal-munch operator and punctuation match.
fn match_operator(str: &[u8]) -> Option<(usize, HighlightKind)> {
    use HighlightKind::{SymbolBrace, SymbolOp, SymbolParens, SymbolPunc, SymbolSquare};
    let op = |n| Some((n, SymbolOp));
    match *str.first()? {
        b'+' | b'-' | b'*' | b'%' | b'^' | b'#' | b'&' | b'|' => op(1),
        b'/' => op(if str.starts_with(b"//") { 2 } else { 1 }),
        b'=' => op(if str.starts_with(b"==") { 2 } else { 1 }),
        b'<' => op(if str.starts_with(b"<=") || str.starts_with(b"<<") {
            2
        } else {
            1
        }),
        b'>' => op(if str.starts_with(b">=") || str.starts_with(b">>") {
            2
        } else {
            1
        }),
        b'~' => op(if str.starts_with(b"~=") { 2 } else { 1 }),
        b'.' => op(if str.starts_with(b"...") {
            3
        } else if str.starts_with(b"..") {
            2
        } else {
            1
        }),
        b':' => op(if str.starts_with(b"::") { 2 } else { 1 }),
        b';' | b',' => Some((1, SymbolPunc)),
        b'(' | b')' => Some((1, SymbolParens)),
        b'{' | b'}' => Some((1, SymbolBrace)),
        b'[' | b']' => Some((1, SymbolSquare)),
        _ => None,
    }
}

/// `<const>` or `<close>` after a variable name.
fn match_attrib(str: &[u8]) -> usize {
    if str.starts_with(b"<const>") {
        b"<const>".len()
    } else if str.starts_with(b"<close>") {
        b"<close>".len()
    } else {
        0
    }
}

struct Scanner<'s, 'o, 'a> {
    hl: Highlighter<'s, 'o, 'a>,
}

impl Scanner<'_, '_, '_> {
    fn run(&mut self) {
        while !self.hl.eof() {
            let rem = self.hl.remainder();

            let attrib = match_attrib(rem);
            if attrib != 0 {
                self.hl
                    .emit_and_advance(1, HighlightKind::NameAttrDelim, Coalescing::Normal);
                self.hl.emit_and_advance(
                    attrib - 2,
                    HighlightKind::NameAttr,
                    Coalescing::Normal,
                );
                self.hl
                    .emit_and_advance(1, HighlightKind::NameAttrDelim, Coalescing::Normal);
                continue;
            }

            let white = ascii::length_if(rem, is_lua_whitespace);
            if white != 0 {
                self.hl.advance(white);
                continue;
            }

            let line_comment = match_line_comment(rem);
            if line_comment != 0 {
                self.hl
                    .emit_and_advance(2, HighlightKind::CommentDelim, Coalescing::Normal);
                if line_comment > 2 {
                    self.hl.emit_and_advance(
                        line_comment - 2,
                        HighlightKind::Comment,
                        Coalescing::Normal,
                    );
                }
                continue;
            }

            if rem.starts_with(b"--") {
                let bracket = match_long_bracket(&rem[2..]);
                if bracket.matched() {
                    self.highlight_long_bracket(
                        bracket,
                        2,
                        HighlightKind::Comment,
                        HighlightKind::CommentDelim,
                    );
                    continue;
                }
            }

            if rem[0] == b'\'' || rem[0] == b'"' {
                let string = match_short_string(rem);
                self.highlight_short_string(string);
                continue;
            }

            let bracket = match_long_bracket(rem);
            if bracket.matched() {
                self.highlight_long_bracket(
                    bracket,
                    0,
                    HighlightKind::String,
                    HighlightKind::StringDelim,
                );
                continue;
            }

            let number = match_number(rem);
            if number != 0 {
                self.hl
                    .emit_and_advance(number, HighlightKind::Number, Coalescing::Normal);
                continue;
            }

            let id = match_identifier(rem);
            if id != 0 {
                let kind = KEYWORDS
                    .get(&rem[..id])
                    .copied()
                    .unwrap_or(HighlightKind::Name);
                self.hl.emit_and_advance(id, kind, Coalescing::Normal);
                continue;
            }

            if let Some((length, kind)) = match_operator(rem) {
                self.hl.emit_and_advance(length, kind, Coalescing::Normal);
                continue;
            }

            let length = utf8::decode(rem).map_or(1, |(_, units)| units);
            self.hl
                .emit_and_advance(length, HighlightKind::Error, Coalescing::Normal);
        }
    }

    /// Emits a long bracket construct with `prefix` extra bytes in the
    /// opening delimiter (the `--` of a long comment).
    fn highlight_long_bracket(
        &mut self,
        bracket: LongBracket,
        prefix: usize,
        content_kind: HighlightKind,
        delimiter_kind: HighlightKind,
    ) {
        let open = prefix + bracket.delimiter;
        let close = if bracket.terminated {
            bracket.delimiter
        } else {
            0
        };
        let total = prefix + bracket.length;
        self.hl
            .emit_and_advance(open, delimiter_kind, Coalescing::Normal);
        let content = total - open - close;
        if content != 0 {
            self.hl
                .emit_and_advance(content, content_kind, Coalescing::Normal);
        }
        if close != 0 {
            self.hl
                .emit_and_advance(close, delimiter_kind, Coalescing::Normal);
        }
    }

    fn highlight_short_string(&mut self, string: StringMatch) {
        self.hl
            .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
        let content = string.length - 1 - usize::from(string.terminated);
        let mut remaining = content;
        let mut run = 0;
        while run < remaining {
            let rest = &self.hl.remainder()[run..];
            if rest.starts_with(b"\\") && rest.len() >= 2 {
                if run != 0 {
                    self.hl
                        .emit_and_advance(run, HighlightKind::String, Coalescing::Normal);
                    remaining -= run;
                    run = 0;
                }
                let escape = 2.min(remaining);
                self.hl
                    .emit_and_advance(escape, HighlightKind::StringEscape, Coalescing::Normal);
                remaining -= escape;
                continue;
            }
            run += 1;
        }
        if run != 0 {
            self.hl
                .emit_and_advance(run, HighlightKind::String, Coalescing::Normal);
        }
        if string.terminated {
            self.hl
                .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
        }
    }
}

pub(crate) fn highlight(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    Scanner {
        hl: Highlighter::new(source, out, *options),
    }
    .run();
}

#[cfg(test)]
mod tests {
    use crate::scan::testing::{dump, tokens};
    use crate::Lang;

    #[test]
    fn test_keywords_and_names() {
        let toks = tokens(b"local x = nil", Lang::Lua);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 5, "kw"),
                (6, 1, "name"),
                (8, 1, "sym_op"),
                (10, 3, "null"),
            ]
        );
    }

    #[test]
    fn test_line_comment() {
        let toks = tokens(b"-- hi\nx", Lang::Lua);
        assert_eq!(
            dump(&toks),
            vec![(0, 2, "cmt_del"), (2, 3, "cmt"), (6, 1, "name")]
        );
    }

    #[test]
    fn test_long_comment() {
        let toks = tokens(b"--[[ c ]]", Lang::Lua);
        assert_eq!(
            dump(&toks),
            vec![(0, 4, "cmt_del"), (4, 3, "cmt"), (7, 2, "cmt_del")]
        );
    }

    #[test]
    fn test_leveled_long_string() {
        let toks = tokens(b"[==[a]]b]==]", Lang::Lua);
        assert_eq!(
            dump(&toks),
            vec![(0, 4, "str_del"), (4, 4, "str"), (8, 4, "str_del")]
        );
    }

    #[test]
    fn test_unterminated_long_string() {
        let toks = tokens(b"[[abc", Lang::Lua);
        assert_eq!(dump(&toks), vec![(0, 2, "str_del"), (2, 3, "str")]);
    }

    #[test]
    fn test_short_string_with_escape() {
        let toks = tokens(br#""a\nb""#, Lang::Lua);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 1, "str_del"),
                (1, 1, "str"),
                (2, 2, "str_esc"),
                (4, 1, "str"),
                (5, 1, "str_del"),
            ]
        );
    }

    #[test]
    fn test_hex_float() {
        let toks = tokens(b"0x1.8p3", Lang::Lua);
        assert_eq!(dump(&toks), vec![(0, 7, "num")]);
    }

    #[test]
    fn test_operators_maximal_munch() {
        let toks = tokens(b"a..b ~= c", Lang::Lua);
        let ids = dump(&toks);
        assert!(ids.contains(&(1, 2, "sym_op")));
        assert!(ids.contains(&(5, 2, "sym_op")));
    }

    #[test]
    fn test_const_attribute() {
        let toks = tokens(b"local x <const> = 1", Lang::Lua);
        let ids = dump(&toks);
        assert!(ids.contains(&(8, 1, "name_attr_del")));
        assert!(ids.contains(&(9, 5, "name_attr")));
        assert!(ids.contains(&(14, 1, "name_attr_del")));
    }

    #[test]
    fn test_goto_label() {
        let toks = tokens(b"::top::", Lang::Lua);
        assert_eq!(
            dump(&toks),
            vec![(0, 2, "sym_op"), (2, 3, "name"), (5, 2, "sym_op")]
        );
    }
}
