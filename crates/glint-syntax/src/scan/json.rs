//! JSON and JSONC scanner.
//!
//! Expects one value, but keeps going on anything malformed: stray
//! bytes inside objects and arrays become coalesced error runs, raw
//! control bytes in strings are errors, and object keys highlight as
//! `markup_attr` to contrast with value strings. JSONC (or non-strict
//! JSON) also takes `//` and `/*` comments.

use glint_util::ascii;

use crate::highlighter::{Coalescing, Highlighter};
use crate::scan::js;
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};

fn is_json_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\x0B' | b'\x0C' | b'\n' | b'\r')
}

fn is_json_escapable(c: u8) -> bool {
    matches!(c, b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' | b'u')
}

/// A matched `\` escape. `\uXXXX` must have exactly four hex digits.
fn match_escape_sequence(str: &[u8]) -> (usize, bool) {
    if str.len() < 2 || str[0] != b'\\' || !is_json_escapable(str[1]) {
        return (0, false);
    }
    if str[1] != b'u' {
        return (2, false);
    }
    let digits = ascii::length_if(&str[2..], ascii::is_hex_digit).min(4);
    (2 + digits, digits != 4)
}

/// A JSON number: optional `-`, integer without leading zeros,
/// optional fraction and exponent. Violations are matched in full and
/// flagged, so `0123` is one erroneous token rather than four.
fn match_number(str: &[u8]) -> (usize, bool) {
    let mut length = 0;
    let mut erroneous = false;

    if str.starts_with(b"-") {
        length += 1;
    }
    let integer_digits = ascii::length_if(&str[length..], ascii::is_digit);
    erroneous |= integer_digits == 0;
    erroneous |= integer_digits >= 2 && str[length] == b'0';
    length += integer_digits;

    if str[length..].starts_with(b".") {
        length += 1;
        let fractional = ascii::length_if(&str[length..], ascii::is_digit);
        erroneous |= fractional == 0;
        length += fractional;
    }

    if matches!(str.get(length), Some(b'e' | b'E')) {
        length += 1;
        if matches!(str.get(length), Some(b'+' | b'-')) {
            length += 1;
        }
        let exponent = ascii::length_if(&str[length..], ascii::is_digit);
        erroneous |= exponent == 0;
        length += exponent;
    }

    (length, erroneous && length != 0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CommentPolicy {
    NotIfStrict,
    AlwaysAllow,
}

struct Scanner<'s, 'o, 'a> {
    hl: Highlighter<'s, 'o, 'a>,
    has_comments: bool,
}

impl Scanner<'_, '_, '_> {
    fn run(&mut self) {
        self.consume_whitespace_comments();
        self.expect_value();
        self.consume_whitespace_comments();
        // Trailing garbage after the single value.
        while !self.hl.eof() {
            if !self.expect_value() {
                self.hl
                    .emit_and_advance(1, HighlightKind::Error, Coalescing::Forced);
            }
            self.consume_whitespace_comments();
        }
    }

    fn consume_whitespace_comments(&mut self) {
        loop {
            let white = ascii::length_if(self.hl.remainder(), is_json_whitespace);
            self.hl.advance(white);
            if self.has_comments && (self.expect_line_comment() || self.expect_block_comment()) {
                continue;
            }
            break;
        }
    }

    fn expect_line_comment(&mut self) -> bool {
        let length = js::match_line_comment(self.hl.remainder());
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

    fn expect_block_comment(&mut self) -> bool {
        let comment = js::match_block_comment(self.hl.remainder());
        if !comment.matched() {
            return false;
        }
        self.hl.highlight_enclosed_comment(comment, 2, 2);
        true
    }

    fn expect_value(&mut self) -> bool {
        self.expect_string(HighlightKind::String)
            || self.expect_number()
            || self.expect_object()
            || self.expect_array()
            || self.expect_true_false_null()
    }

    /// Strings are shared between values (`string` with `string_delim`
    /// quotes) and object keys (`markup_attr` covering the quotes).
    fn expect_string(&mut self, highlight: HighlightKind) -> bool {
        debug_assert!(
            highlight == HighlightKind::String || highlight == HighlightKind::MarkupAttr
        );
        if !self.hl.remainder().starts_with(b"\"") {
            return false;
        }
        let mut run;
        if highlight == HighlightKind::String {
            self.hl
                .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
            run = 0;
        } else {
            run = 1;
        }

        loop {
            let rem = self.hl.remainder();
            if run >= rem.len() {
                break;
            }
            match rem[run] {
                b'"' => {
                    if highlight == HighlightKind::String {
                        self.flush(&mut run, highlight);
                        self.hl
                            .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
                    } else {
                        run += 1;
                        self.flush(&mut run, highlight);
                    }
                    return true;
                }
                // Line breaks end the string rather than leaking onto
                // the next line.
                b'\n' | b'\r' | b'\x0B' => {
                    self.flush(&mut run, highlight);
                    return true;
                }
                b'\\' => {
                    self.flush(&mut run, highlight);
                    let (length, erroneous) = match_escape_sequence(self.hl.remainder());
                    if length != 0 {
                        let kind = if erroneous {
                            HighlightKind::Error
                        } else {
                            HighlightKind::StringEscape
                        };
                        self.hl.emit_and_advance(length, kind, Coalescing::Normal);
                    } else {
                        self.hl
                            .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
                    }
                }
                c if c < 0x20 => {
                    // Raw control bytes are not allowed in strings.
                    self.flush(&mut run, highlight);
                    self.hl
                        .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
                }
                _ => run += 1,
            }
        }
        // Unterminated string.
        self.flush(&mut run, highlight);
        true
    }

    fn flush(&mut self, run: &mut usize, highlight: HighlightKind) {
        if *run != 0 {
            self.hl
                .emit_and_advance(*run, highlight, Coalescing::Normal);
            *run = 0;
        }
    }

    fn expect_number(&mut self) -> bool {
        let (length, erroneous) = match_number(self.hl.remainder());
        if length == 0 {
            return false;
        }
        let kind = if erroneous {
            HighlightKind::Error
        } else {
            HighlightKind::Number
        };
        self.hl.emit_and_advance(length, kind, Coalescing::Normal);
        true
    }

    fn expect_object(&mut self) -> bool {
        if !self.hl.remainder().starts_with(b"{") {
            return false;
        }
        self.hl
            .emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);

        while !self.hl.eof() {
            self.consume_member();
            let rem = self.hl.remainder();
            if rem.starts_with(b"}") {
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);
                return true;
            }
            if rem.starts_with(b",") {
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                continue;
            }
            if rem.is_empty() {
                break;
            }
            self.hl
                .emit_and_advance(1, HighlightKind::Error, Coalescing::Forced);
        }
        // Unterminated object.
        true
    }

    fn consume_member(&mut self) {
        let at_end = |scanner: &mut Self| {
            scanner.consume_whitespace_comments();
            let rem = scanner.hl.remainder();
            rem.is_empty() || rem.starts_with(b"}") || rem.starts_with(b",")
        };
        if at_end(self) {
            return;
        }
        self.expect_string(HighlightKind::MarkupAttr);
        if at_end(self) {
            return;
        }
        if self.hl.remainder().starts_with(b":") {
            self.hl
                .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
        } else {
            return;
        }
        if at_end(self) {
            return;
        }
        self.expect_value();
        let _ = at_end(self);
    }

    fn expect_array(&mut self) -> bool {
        if !self.hl.remainder().starts_with(b"[") {
            return false;
        }
        self.hl
            .emit_and_advance(1, HighlightKind::SymbolSquare, Coalescing::Normal);

        while !self.hl.eof() {
            self.consume_whitespace_comments();
            let rem = self.hl.remainder();
            if rem.starts_with(b"]") {
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolSquare, Coalescing::Normal);
                return true;
            }
            if rem.starts_with(b",") {
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                continue;
            }
            if rem.is_empty() {
                break;
            }
            if self.expect_value() {
                continue;
            }
            self.hl
                .emit_and_advance(1, HighlightKind::Error, Coalescing::Forced);
        }
        // Unterminated array.
        true
    }

    fn expect_true_false_null(&mut self) -> bool {
        let rem = self.hl.remainder();
        let length = ascii::length_if_head_tail(rem, ascii::is_alpha, ascii::is_alphanumeric);
        if length == 0 {
            return false;
        }
        let (kind, coalescing) = match &rem[..length] {
            b"null" => (HighlightKind::Null, Coalescing::Normal),
            b"true" | b"false" => (HighlightKind::Bool, Coalescing::Normal),
            _ => (HighlightKind::Error, Coalescing::Forced),
        };
        self.hl.emit_and_advance(length, kind, coalescing);
        true
    }
}

fn highlight_impl(
    source: &[u8],
    out: &mut TokenBuffer<'_>,
    options: &HighlightOptions,
    comments: CommentPolicy,
) {
    Scanner {
        has_comments: comments == CommentPolicy::AlwaysAllow || !options.strict,
        hl: Highlighter::new(source, out, *options),
    }
    .run();
}

pub(crate) fn highlight_json(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    highlight_impl(source, out, options, CommentPolicy::NotIfStrict);
}

pub(crate) fn highlight_jsonc(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    highlight_impl(source, out, options, CommentPolicy::AlwaysAllow);
}

#[cfg(test)]
mod tests {
    use crate::scan::testing::{dump, tokens, tokens_with};
    use crate::{HighlightOptions, Lang};

    #[test]
    fn test_object_with_key_and_value() {
        let toks = tokens(br#"{"a": 1}"#, Lang::Json);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 1, "sym_brace"),
                (1, 3, "markup_attr"),
                (4, 1, "sym_punc"),
                (6, 1, "num"),
                (7, 1, "sym_brace"),
            ]
        );
    }

    #[test]
    fn test_string_value_has_delimiters() {
        let toks = tokens(br#""hi""#, Lang::Json);
        assert_eq!(
            dump(&toks),
            vec![(0, 1, "str_del"), (1, 2, "str"), (3, 1, "str_del")]
        );
    }

    #[test]
    fn test_nested_value() {
        let toks = tokens(br#"{"a": {"b": [true, null]}}"#, Lang::Json);
        let ids: Vec<&str> = toks.iter().map(|t| t.kind.id()).collect();
        assert!(ids.contains(&"bool"));
        assert!(ids.contains(&"null"));
        assert!(!ids.contains(&"err"));
    }

    #[test]
    fn test_escapes() {
        let toks = tokens(br#""a\n\u0041""#, Lang::Json);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 1, "str_del"),
                (1, 1, "str"),
                (2, 2, "str_esc"),
                (4, 6, "str_esc"),
                (10, 1, "str_del"),
            ]
        );
    }

    #[test]
    fn test_invalid_escape_is_error() {
        let toks = tokens(br#""\q""#, Lang::Json);
        let ids = dump(&toks);
        assert!(ids.contains(&(1, 1, "err")));
    }

    #[test]
    fn test_truncated_unicode_escape() {
        let toks = tokens(br#""\u00""#, Lang::Json);
        let ids = dump(&toks);
        assert!(ids.contains(&(1, 4, "err")));
    }

    #[test]
    fn test_leading_zero_is_erroneous() {
        let toks = tokens(b"0123", Lang::Json);
        assert_eq!(dump(&toks), vec![(0, 4, "err")]);
    }

    #[test]
    fn test_comments_in_jsonc() {
        let toks = tokens(b"// c\n1", Lang::Jsonc);
        assert_eq!(
            dump(&toks),
            vec![(0, 2, "cmt_del"), (2, 2, "cmt"), (5, 1, "num")]
        );
    }

    #[test]
    fn test_comments_rejected_in_strict_json() {
        let strict = HighlightOptions {
            strict: true,
            ..HighlightOptions::default()
        };
        let toks = tokens_with(b"// c\n1", Lang::Json, strict);
        assert_eq!(toks[0].kind.id(), "err");
    }

    #[test]
    fn test_comments_allowed_in_lenient_json() {
        let toks = tokens(b"/*x*/ 1", Lang::Json);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 2, "cmt_del"),
                (2, 1, "cmt"),
                (3, 2, "cmt_del"),
                (6, 1, "num"),
            ]
        );
    }

    #[test]
    fn test_control_byte_in_string() {
        let toks = tokens(b"\"a\x01b\"", Lang::Json);
        let ids = dump(&toks);
        assert!(ids.contains(&(2, 1, "err")));
    }

    #[test]
    fn test_bad_identifier_is_error() {
        let toks = tokens(b"nope", Lang::Json);
        assert_eq!(dump(&toks), vec![(0, 4, "err")]);
    }
}
