//! HTML scanner.
//!
//! Permissive by design: a DOCTYPE runs to `>` or end of input, tags
//! tolerate malformed attribute lists, and raw-text elements hand
//! their contents to the CSS or JavaScript scanner.

use glint_util::{ascii, utf8};

use crate::highlighter::{Coalescing, Highlighter};
use crate::parse::EnclosedResult;
use crate::token::HighlightKind;
use crate::{HighlightOptions, Lang, TokenBuffer};

const COMMENT_PREFIX: &[u8] = b"<!--";
const COMMENT_SUFFIX: &[u8] = b"-->";
const COMMENT_DEGENERATE: &[u8] = b"<!-->";

const CDATA_PREFIX: &[u8] = b"<![CDATA[";
const CDATA_SUFFIX: &[u8] = b"]]>";

const DOCTYPE_PREFIX: &[u8] = b"<!DOCTYPE";

pub(crate) const BYTE_ORDER_MARK: &[u8] = b"\xEF\xBB\xBF";

pub(crate) fn is_html_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
}

pub(crate) fn match_whitespace(str: &[u8]) -> usize {
    ascii::length_if(str, is_html_whitespace)
}

fn is_tag_name_character(c: char) -> bool {
    !c.is_ascii()
        || c.is_ascii_alphanumeric()
        || matches!(c, '-' | '_' | '.' | ':')
}

fn is_attribute_name_character(c: char) -> bool {
    !c.is_ascii()
        || !(c.is_ascii_whitespace() || matches!(c, '"' | '\'' | '>' | '/' | '='))
            && !c.is_ascii_control()
}

fn is_unquoted_value_terminator(c: u8) -> bool {
    is_html_whitespace(c) || c == b'>'
}

fn match_tag_name(str: &[u8]) -> usize {
    utf8::length_if(str, is_tag_name_character)
}

fn match_attribute_name(str: &[u8]) -> usize {
    utf8::length_if(str, is_attribute_name_character)
}

/// Matches an `&name;`, `&#10;`, or `&#x1F600;` character reference.
/// Returns zero unless the reference is well-formed.
pub(crate) fn match_character_reference(str: &[u8]) -> usize {
    if !str.starts_with(b"&") {
        return 0;
    }
    let Some(end) = ascii::find_byte(&str[1..], b';') else {
        return 0;
    };
    let content = &str[1..1 + end];
    let well_formed = if let Some(digits) = content.strip_prefix(b"#x") {
        !digits.is_empty() && digits.iter().all(|&c| ascii::is_hex_digit(c))
    } else if let Some(digits) = content.strip_prefix(b"#") {
        !digits.is_empty() && digits.iter().all(|&c| ascii::is_digit(c))
    } else {
        !content.is_empty() && content.iter().all(|&c| ascii::is_alphanumeric(c))
    };
    if well_formed {
        end + 2
    } else {
        0
    }
}

/// Matches raw text up to, but not including, a `</name` that is
/// followed by whitespace, `>`, or `/`. Case-insensitive in the name.
fn match_raw_text(str: &[u8], closing_name: &[u8]) -> usize {
    let mut length = 0;
    loop {
        let rest = &str[length..];
        let Some(open) = ascii::find_subslice(rest, b"</", 0) else {
            return length + rest.len();
        };
        let candidate = &rest[open + 2..];
        if ascii::starts_with_ignore_case(candidate, closing_name) {
            let after = &candidate[closing_name.len()..];
            match after.first() {
                None => return length + open + 2 + closing_name.len(),
                Some(&c) if is_html_whitespace(c) || c == b'>' || c == b'/' => {
                    return length + open;
                }
                Some(_) => {}
            }
        }
        length += open + 2;
    }
}

/// One piece of escapable raw text: a plain span, then possibly a
/// character reference. `raw_length == 0 && ref_length == 0` means the
/// closing tag (or end of input) is next.
#[derive(Clone, Copy, Debug, Default)]
struct RawTextPiece {
    raw_length: usize,
    ref_length: usize,
}

fn match_escapable_raw_text_piece(str: &[u8], closing_name: &[u8]) -> RawTextPiece {
    let mut length = 0;
    loop {
        let rest = &str[length..];
        let Some(special) = ascii::find_any(rest, b"<&") else {
            return RawTextPiece {
                raw_length: length + rest.len(),
                ref_length: 0,
            };
        };
        length += special;
        let rest = &str[length..];
        let reference = match_character_reference(rest);
        if reference != 0 {
            return RawTextPiece {
                raw_length: length,
                ref_length: reference,
            };
        }
        if !rest.starts_with(b"</") {
            length += 1;
            continue;
        }
        let candidate = &rest[2..];
        if ascii::starts_with_ignore_case(candidate, closing_name) {
            let after = &candidate[closing_name.len()..];
            match after.first() {
                None => {
                    return RawTextPiece {
                        raw_length: length + 2 + closing_name.len(),
                        ref_length: 0,
                    }
                }
                Some(&c) if is_html_whitespace(c) || c == b'>' || c == b'/' => {
                    return RawTextPiece {
                        raw_length: length,
                        ref_length: 0,
                    };
                }
                Some(_) => {}
            }
        }
        length += 2;
    }
}

/// Matches an HTML comment. `<!-->` is accepted as a closed comment,
/// while `<!--` immediately followed by `>` or `->`, or a body
/// containing `<!--` or `--!>`, is rejected.
pub(crate) fn match_comment(str: &[u8]) -> EnclosedResult {
    if !str.starts_with(COMMENT_PREFIX) {
        return EnclosedResult::default();
    }
    let mut length = COMMENT_PREFIX.len();
    if str[length..].starts_with(b">") || str[length..].starts_with(b"->") {
        return EnclosedResult::default();
    }

    loop {
        let rest = &str[length..];
        let Some(special) = ascii::find_any(rest, b"<-") else {
            return EnclosedResult {
                length: str.len(),
                is_terminated: false,
            };
        };
        length += special;
        let rest = &str[length..];
        if rest.starts_with(COMMENT_SUFFIX) {
            return EnclosedResult {
                length: length + COMMENT_SUFFIX.len(),
                is_terminated: true,
            };
        }
        if rest.starts_with(b"<!--") {
            if rest.starts_with(COMMENT_DEGENERATE) {
                return EnclosedResult {
                    length: length + COMMENT_DEGENERATE.len(),
                    is_terminated: true,
                };
            }
            return EnclosedResult::default();
        }
        if rest.starts_with(b"--!>") {
            return EnclosedResult::default();
        }
        length += 1;
    }
}

pub(crate) fn match_doctype_permissive(str: &[u8]) -> EnclosedResult {
    if !ascii::starts_with_ignore_case(str, DOCTYPE_PREFIX) {
        return EnclosedResult::default();
    }
    match ascii::find_byte(&str[DOCTYPE_PREFIX.len()..], b'>') {
        Some(i) => EnclosedResult {
            length: DOCTYPE_PREFIX.len() + i + 1,
            is_terminated: true,
        },
        None => EnclosedResult {
            length: str.len(),
            is_terminated: false,
        },
    }
}

pub(crate) fn match_cdata(str: &[u8]) -> EnclosedResult {
    crate::parse::match_enclosed(str, CDATA_PREFIX, CDATA_SUFFIX)
}

/// A permissively matched `</name ...>` end tag.
#[derive(Clone, Copy, Debug, Default)]
struct EndTagMatch {
    length: usize,
    name_length: usize,
}

fn match_end_tag_permissive(str: &[u8]) -> EndTagMatch {
    if !str.starts_with(b"</") {
        return EndTagMatch::default();
    }
    let name_length = ascii::length_if_not(&str[2..], |c| is_html_whitespace(c) || c == b'>');
    if name_length == 0 || 2 + name_length >= str.len() {
        return EndTagMatch::default();
    }
    match ascii::find_byte(&str[2 + name_length..], b'>') {
        Some(i) => EndTagMatch {
            length: 2 + name_length + i + 1,
            name_length,
        },
        None => EndTagMatch::default(),
    }
}

struct Scanner<'s, 'o, 'a> {
    hl: Highlighter<'s, 'o, 'a>,
}

impl Scanner<'_, '_, '_> {
    fn run(&mut self) {
        if self.hl.remainder().starts_with(BYTE_ORDER_MARK) {
            self.hl.advance(BYTE_ORDER_MARK.len());
        }
        while !self.hl.eof() {
            let _ = self.expect_comment()
                || self.expect_doctype()
                || self.expect_cdata()
                || self.expect_end_tag()
                || self.expect_start_tag()
                || self.expect_normal_text();
        }
    }

    fn expect_comment(&mut self) -> bool {
        let comment = match_comment(self.hl.remainder());
        if !comment.matched() {
            return false;
        }
        self.hl.highlight_enclosed(
            comment,
            COMMENT_PREFIX.len(),
            COMMENT_SUFFIX.len(),
            HighlightKind::Comment,
            HighlightKind::CommentDelim,
        );
        true
    }

    fn expect_doctype(&mut self) -> bool {
        let doctype = match_doctype_permissive(self.hl.remainder());
        if !doctype.matched() {
            return false;
        }
        self.hl
            .emit_and_advance(doctype.length, HighlightKind::NameMacro, Coalescing::Normal);
        true
    }

    fn expect_cdata(&mut self) -> bool {
        let cdata = match_cdata(self.hl.remainder());
        if !cdata.matched() {
            return false;
        }
        self.hl.emit(
            self.hl.index(),
            CDATA_PREFIX.len(),
            HighlightKind::NameMacro,
            Coalescing::Normal,
        );
        if cdata.is_terminated {
            self.hl.emit(
                self.hl.index() + cdata.length - CDATA_SUFFIX.len(),
                CDATA_SUFFIX.len(),
                HighlightKind::NameMacro,
                Coalescing::Normal,
            );
        }
        self.hl.advance(cdata.length);
        true
    }

    fn expect_whitespace(&mut self) -> bool {
        let length = match_whitespace(self.hl.remainder());
        self.hl.advance(length);
        length != 0
    }

    fn expect_end_tag(&mut self) -> bool {
        let end_tag = match_end_tag_permissive(self.hl.remainder());
        if end_tag.length == 0 {
            return false;
        }
        self.hl.emit(
            self.hl.index(),
            2,
            HighlightKind::SymbolPunc,
            Coalescing::Normal,
        );
        self.hl.emit(
            self.hl.index() + 2,
            end_tag.name_length,
            HighlightKind::MarkupTag,
            Coalescing::Normal,
        );
        self.hl.emit(
            self.hl.index() + end_tag.length - 1,
            1,
            HighlightKind::SymbolPunc,
            Coalescing::Normal,
        );
        self.hl.advance(end_tag.length);
        true
    }

    fn expect_start_tag(&mut self) -> bool {
        if !self.hl.remainder().starts_with(b"<") {
            return false;
        }
        self.hl
            .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);

        let name_length = match_tag_name(self.hl.remainder());
        if name_length == 0 {
            return true;
        }
        // The name decides raw-text handling below, so keep a copy.
        let name: Vec<u8> = self.hl.remainder()[..name_length].to_vec();
        self.hl
            .emit_and_advance(name_length, HighlightKind::MarkupTag, Coalescing::Normal);

        while !self.hl.eof() {
            self.expect_whitespace();
            let rem = self.hl.remainder();
            if rem.starts_with(b"/>") {
                self.hl
                    .emit_and_advance(2, HighlightKind::SymbolPunc, Coalescing::Normal);
                break;
            }
            if rem.starts_with(b">") {
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                break;
            }
            if !self.expect_attribute() {
                return true;
            }
        }

        if ascii::equals_ignore_case(&name, b"textarea") || ascii::equals_ignore_case(&name, b"title")
        {
            self.consume_escapable_raw_text(&name);
            return true;
        }
        if ascii::equals_ignore_case(&name, b"script") {
            let length = match_raw_text(self.hl.remainder(), b"script");
            self.hl.consume_nested(Lang::JavaScript, length);
            return true;
        }
        if ascii::equals_ignore_case(&name, b"style") {
            let length = match_raw_text(self.hl.remainder(), b"style");
            self.hl.consume_nested(Lang::Css, length);
            return true;
        }
        true
    }

    fn consume_escapable_raw_text(&mut self, name: &[u8]) {
        loop {
            let piece = match_escapable_raw_text_piece(self.hl.remainder(), name);
            if piece.raw_length == 0 && piece.ref_length == 0 {
                return;
            }
            self.hl.advance(piece.raw_length);
            if piece.ref_length != 0 {
                self.hl.emit_and_advance(
                    piece.ref_length,
                    HighlightKind::StringEscape,
                    Coalescing::Normal,
                );
            }
        }
    }

    fn expect_attribute(&mut self) -> bool {
        let name_length = match_attribute_name(self.hl.remainder());
        if name_length == 0 {
            return false;
        }
        self.hl
            .emit_and_advance(name_length, HighlightKind::MarkupAttr, Coalescing::Normal);
        self.expect_whitespace();

        // Empty attribute syntax, e.g. <input disabled>.
        if !self.hl.remainder().starts_with(b"=") {
            return true;
        }
        self.hl
            .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
        self.expect_whitespace();

        self.expect_quoted_attribute_value(b'"')
            || self.expect_quoted_attribute_value(b'\'')
            || self.expect_unquoted_attribute_value()
    }

    fn expect_quoted_attribute_value(&mut self, quote: u8) -> bool {
        if self.hl.remainder().first() != Some(&quote) {
            return false;
        }
        self.hl
            .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
        let mut piece = 0;
        loop {
            let rem = self.hl.remainder();
            if piece >= rem.len() {
                break;
            }
            if rem[piece] == quote {
                self.flush_string_piece(&mut piece);
                self.hl
                    .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
                return true;
            }
            let reference = match_character_reference(&rem[piece..]);
            if reference != 0 {
                self.flush_string_piece(&mut piece);
                self.hl.emit_and_advance(
                    reference,
                    HighlightKind::StringEscape,
                    Coalescing::Normal,
                );
                continue;
            }
            piece += 1;
        }
        // Unterminated value.
        self.flush_string_piece(&mut piece);
        true
    }

    fn expect_unquoted_attribute_value(&mut self) -> bool {
        let mut piece = 0;
        loop {
            let rem = self.hl.remainder();
            if piece >= rem.len() || is_unquoted_value_terminator(rem[piece]) {
                break;
            }
            let reference = match_character_reference(&rem[piece..]);
            if reference != 0 {
                self.flush_string_piece(&mut piece);
                self.hl.emit_and_advance(
                    reference,
                    HighlightKind::StringEscape,
                    Coalescing::Normal,
                );
                continue;
            }
            piece += 1;
        }
        self.flush_string_piece(&mut piece);
        true
    }

    fn flush_string_piece(&mut self, piece: &mut usize) {
        if *piece != 0 {
            self.hl
                .emit_and_advance(*piece, HighlightKind::String, Coalescing::Normal);
            *piece = 0;
        }
    }

    /// Plain text between tags. Character references are the only
    /// highlighted spans; everything else is advanced silently.
    fn expect_normal_text(&mut self) -> bool {
        while !self.hl.eof() {
            let rem = self.hl.remainder();
            let Some(special) = ascii::find_any(rem, b"<&") else {
                self.hl.advance(rem.len());
                break;
            };
            if rem[special] == b'<' {
                self.hl.advance(special);
                break;
            }
            self.hl.advance(special);
            let reference = match_character_reference(&rem[special..]);
            if reference != 0 {
                self.hl
                    .emit_and_advance(reference, HighlightKind::StringEscape, Coalescing::Normal);
            } else {
                self.hl.advance(1);
            }
        }
        true
    }
}

pub(crate) fn highlight(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    // Anything the tag matchers reject is consumed as text, so the
    // scanner cannot get stuck even on degenerate input like `<!-->`.
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
    fn test_tag_with_attribute() {
        let toks = tokens(b"<a b='c'>x</a>", Lang::Html);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 1, "sym_punc"),
                (1, 1, "markup_tag"),
                (3, 1, "markup_attr"),
                (4, 1, "sym_punc"),
                (5, 1, "str_del"),
                (6, 1, "str"),
                (7, 1, "str_del"),
                (8, 1, "sym_punc"),
                (10, 2, "sym_punc"),
                (12, 1, "markup_tag"),
                (13, 1, "sym_punc"),
            ]
        );
    }

    #[test]
    fn test_comment() {
        let toks = tokens(b"<!-- c -->", Lang::Html);
        assert_eq!(
            dump(&toks),
            vec![(0, 4, "cmt_del"), (4, 3, "cmt"), (7, 3, "cmt_del")]
        );
    }

    #[test]
    fn test_degenerate_comment() {
        let toks = tokens(b"<!-->", Lang::Html);
        // `<!-->` is not a valid comment opener; it decays into a
        // stray tag open and text.
        assert!(!toks.is_empty());
        assert_eq!(toks[0].kind.id(), "sym_punc");
    }

    #[test]
    fn test_doctype() {
        let toks = tokens(b"<!DOCTYPE html>", Lang::Html);
        assert_eq!(dump(&toks), vec![(0, 15, "name_macro")]);
    }

    #[test]
    fn test_character_reference_in_text() {
        let toks = tokens(b"a &amp; b", Lang::Html);
        assert_eq!(dump(&toks), vec![(2, 5, "str_esc")]);
    }

    #[test]
    fn test_malformed_reference_is_text() {
        let toks = tokens(b"a & b", Lang::Html);
        assert!(toks.is_empty());
    }

    #[test]
    fn test_script_contents_highlighted_as_js() {
        let toks = tokens(b"<script>let x</script>", Lang::Html);
        let ids = crate::scan::testing::dump(&toks);
        assert_eq!(
            ids,
            vec![
                (0, 1, "sym_punc"),
                (1, 6, "markup_tag"),
                (7, 1, "sym_punc"),
                (8, 3, "kw"),
                (12, 1, "name"),
                (13, 2, "sym_punc"),
                (15, 6, "markup_tag"),
                (21, 1, "sym_punc"),
            ]
        );
    }

    #[test]
    fn test_style_contents_highlighted_as_css() {
        let toks = tokens(b"<style>a{}</style>", Lang::Html);
        let ids: Vec<&str> = toks.iter().map(|t| t.kind.id()).collect();
        assert_eq!(
            ids,
            vec![
                "sym_punc",
                "markup_tag",
                "sym_punc",
                "markup_tag",
                "sym_brace",
                "sym_brace",
                "sym_punc",
                "markup_tag",
                "sym_punc",
            ]
        );
    }

    #[test]
    fn test_bom_is_skipped() {
        let toks = tokens(b"\xEF\xBB\xBF<b>", Lang::Html);
        assert_eq!(
            dump(&toks),
            vec![(3, 1, "sym_punc"), (4, 1, "markup_tag"), (5, 1, "sym_punc")]
        );
    }

    #[test]
    fn test_unterminated_comment() {
        let toks = tokens(b"<!-- open", Lang::Html);
        assert_eq!(dump(&toks), vec![(0, 4, "cmt_del"), (4, 5, "cmt")]);
    }

    #[test]
    fn test_textarea_escapable_raw_text() {
        let toks = tokens(b"<textarea>a&lt;b</textarea>", Lang::Html);
        let ids = dump(&toks);
        assert!(ids.contains(&(11, 4, "str_esc")));
        // The inner `<` of `&lt;` must not start a tag.
        assert_eq!(
            ids.iter().filter(|&&(_, _, id)| id == "markup_tag").count(),
            2
        );
    }

    #[test]
    fn test_cdata() {
        let toks = tokens(b"<![CDATA[x]]>", Lang::Html);
        assert_eq!(
            dump(&toks),
            vec![(0, 9, "name_macro"), (10, 3, "name_macro")]
        );
    }
}
