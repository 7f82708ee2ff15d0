//! XML scanner.
//!
//! Stricter than the HTML scanner: names follow the XML name-start and
//! name ranges (offending bytes inside a name become error tokens),
//! attribute values must be quoted, a raw `<` or unescaped `&` in a
//! value is an error, and processing instructions are recognized.
//! There are no raw-text elements.

use glint_util::{ascii, utf8};

use crate::highlighter::{Coalescing, Highlighter};
use crate::parse::EnclosedResult;
use crate::scan::html;
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};

const COMMENT_PREFIX: &[u8] = b"<!--";
const COMMENT_SUFFIX: &[u8] = b"-->";
const CDATA_PREFIX: &[u8] = b"<![CDATA[";
const CDATA_SUFFIX: &[u8] = b"]]>";

fn is_xml_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r')
}

fn match_whitespace(str: &[u8]) -> usize {
    ascii::length_if(str, is_xml_whitespace)
}

fn is_xml_name_start(c: char) -> bool {
    c == ':'
        || c == '_'
        || c.is_ascii_alphabetic()
        || ('\u{C0}'..='\u{D6}').contains(&c)
        || ('\u{D8}'..='\u{F6}').contains(&c)
        || ('\u{F8}'..='\u{2FF}').contains(&c)
        || ('\u{370}'..='\u{37D}').contains(&c)
        || ('\u{37F}'..='\u{1FFF}').contains(&c)
        || ('\u{200C}'..='\u{200D}').contains(&c)
        || ('\u{2070}'..='\u{218F}').contains(&c)
        || ('\u{2C00}'..='\u{2FEF}').contains(&c)
        || ('\u{3001}'..='\u{D7FF}').contains(&c)
        || ('\u{F900}'..='\u{FDCF}').contains(&c)
        || ('\u{FDF0}'..='\u{FFFD}').contains(&c)
        || ('\u{10000}'..='\u{EFFFF}').contains(&c)
}

fn is_xml_name(c: char) -> bool {
    is_xml_name_start(c)
        || c == '-'
        || c == '.'
        || c.is_ascii_digit()
        || c == '\u{B7}'
        || ('\u{0300}'..='\u{036F}').contains(&c)
        || ('\u{203F}'..='\u{2040}').contains(&c)
}

/// An XML comment; `--` inside the body ends the match unterminated.
fn match_comment(str: &[u8]) -> EnclosedResult {
    if !str.starts_with(COMMENT_PREFIX) {
        return EnclosedResult::default();
    }
    let mut length = COMMENT_PREFIX.len();
    while length < str.len() {
        let rest = &str[length..];
        if rest.starts_with(COMMENT_SUFFIX) {
            return EnclosedResult {
                length: length + COMMENT_SUFFIX.len(),
                is_terminated: true,
            };
        }
        if rest.starts_with(b"--") {
            return EnclosedResult {
                length,
                is_terminated: false,
            };
        }
        length += 1;
    }
    EnclosedResult {
        length,
        is_terminated: false,
    }
}

struct Scanner<'s, 'o, 'a> {
    hl: Highlighter<'s, 'o, 'a>,
}

impl Scanner<'_, '_, '_> {
    fn run(&mut self) {
        if self.hl.remainder().starts_with(html::BYTE_ORDER_MARK) {
            self.hl.advance(html::BYTE_ORDER_MARK.len());
        }
        while !self.hl.eof() {
            let _ = self.expect_comment()
                || self.expect_cdata_section()
                || self.expect_processing_instruction()
                || self.expect_end_tag()
                || self.expect_start_tag()
                || self.expect_text();
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

    fn expect_cdata_section(&mut self) -> bool {
        let cdata = html::match_cdata(self.hl.remainder());
        if !cdata.matched() {
            return false;
        }
        let mut content = cdata.length - CDATA_PREFIX.len();
        if cdata.is_terminated {
            content -= CDATA_SUFFIX.len();
        }
        self.hl.emit_and_advance(
            CDATA_PREFIX.len(),
            HighlightKind::NameMacro,
            Coalescing::Normal,
        );
        self.hl.advance(content);
        if cdata.is_terminated {
            self.hl.emit_and_advance(
                CDATA_SUFFIX.len(),
                HighlightKind::NameMacro,
                Coalescing::Normal,
            );
        }
        true
    }

    fn expect_processing_instruction(&mut self) -> bool {
        if !self.hl.remainder().starts_with(b"<?") {
            return false;
        }
        self.hl
            .emit_and_advance(2, HighlightKind::SymbolPunc, Coalescing::Normal);

        let name_length = self.expect_name(HighlightKind::NameMacro, |str| {
            match_whitespace(str) != 0 || str.starts_with(b"?>")
        });
        if name_length == 0 {
            return true;
        }
        self.hl.advance(match_whitespace(self.hl.remainder()));

        // Instruction content is plain.
        while !self.hl.eof() && !self.hl.remainder().starts_with(b"?>") {
            self.hl.advance(1);
        }
        if self.hl.remainder().starts_with(b"?>") {
            self.hl
                .emit_and_advance(2, HighlightKind::SymbolPunc, Coalescing::Normal);
        }
        true
    }

    fn expect_end_tag(&mut self) -> bool {
        if !self.hl.remainder().starts_with(b"</") {
            return false;
        }
        self.hl
            .emit_and_advance(2, HighlightKind::SymbolPunc, Coalescing::Normal);

        let name_length = self.expect_name(HighlightKind::MarkupTag, |str| {
            match_whitespace(str) != 0 || str.starts_with(b">")
        });
        if name_length == 0 {
            return true;
        }
        self.hl.advance(match_whitespace(self.hl.remainder()));
        if self.hl.remainder().starts_with(b">") {
            self.hl
                .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
        }
        true
    }

    fn expect_start_tag(&mut self) -> bool {
        if !self.hl.remainder().starts_with(b"<") {
            return false;
        }
        self.hl
            .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);

        let name_length = self.expect_name(HighlightKind::MarkupTag, |str| {
            match_whitespace(str) != 0 || str.starts_with(b"/>") || str.starts_with(b">")
        });
        if name_length == 0 {
            return true;
        }

        while !self.hl.eof() {
            self.hl.advance(match_whitespace(self.hl.remainder()));
            let rem = self.hl.remainder();
            if rem.starts_with(b">") || rem.starts_with(b"/>") {
                break;
            }
            if !self.expect_attribute() {
                break;
            }
        }

        let rem = self.hl.remainder();
        if rem.starts_with(b"/>") {
            self.hl
                .emit_and_advance(2, HighlightKind::SymbolPunc, Coalescing::Normal);
        } else if rem.starts_with(b">") {
            self.hl
                .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
        }
        true
    }

    fn expect_attribute(&mut self) -> bool {
        self.expect_name(HighlightKind::MarkupAttr, |str| {
            match_whitespace(str) != 0
                || str.starts_with(b"/>")
                || str.starts_with(b">")
                || str.starts_with(b"=")
        });
        self.hl.advance(match_whitespace(self.hl.remainder()));

        if !self.hl.remainder().starts_with(b"=") {
            return true;
        }
        self.hl
            .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
        self.hl.advance(match_whitespace(self.hl.remainder()));

        self.expect_attribute_value()
    }

    fn expect_attribute_value(&mut self) -> bool {
        let quote = match self.hl.remainder().first() {
            Some(&c @ (b'"' | b'\'')) => c,
            _ => return false,
        };
        self.hl
            .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);

        let mut piece = 0;
        loop {
            let rem = self.hl.remainder();
            if piece >= rem.len() || rem[piece] == quote {
                break;
            }
            match rem[piece] {
                b'<' => {
                    self.flush_piece(&mut piece);
                    self.hl
                        .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
                }
                b'&' => {
                    self.flush_piece(&mut piece);
                    let reference = html::match_character_reference(self.hl.remainder());
                    if reference != 0 {
                        self.hl.emit_and_advance(
                            reference,
                            HighlightKind::StringEscape,
                            Coalescing::Normal,
                        );
                    } else {
                        self.hl
                            .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
                    }
                }
                _ => piece += 1,
            }
        }
        self.flush_piece(&mut piece);

        if self.hl.remainder().first() == Some(&quote) {
            self.hl
                .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
        }
        true
    }

    fn flush_piece(&mut self, piece: &mut usize) {
        if *piece != 0 {
            self.hl
                .emit_and_advance(*piece, HighlightKind::String, Coalescing::Normal);
            *piece = 0;
        }
    }

    /// Emits a name one well-formed run at a time; code points outside
    /// the XML name ranges become single error tokens inside the name.
    fn expect_name(&mut self, kind: HighlightKind, is_stop: impl Fn(&[u8]) -> bool) -> usize {
        let mut total = 0;
        let mut piece = 0;
        loop {
            let rem = self.hl.remainder();
            if piece >= rem.len() || is_stop(&rem[piece..]) {
                break;
            }
            let Some((c, units)) = utf8::decode(&rem[piece..]) else {
                break;
            };
            let valid = if total == 0 && piece == 0 {
                is_xml_name_start(c)
            } else {
                is_xml_name(c)
            };
            if valid {
                piece += units;
                total += units;
            } else {
                if piece != 0 {
                    self.hl.emit_and_advance(piece, kind, Coalescing::Normal);
                    piece = 0;
                }
                self.hl
                    .emit_and_advance(units, HighlightKind::Error, Coalescing::Normal);
                total += units;
            }
        }
        if piece != 0 {
            self.hl.emit_and_advance(piece, kind, Coalescing::Normal);
        }
        total
    }

    fn expect_text(&mut self) -> bool {
        let rem = self.hl.remainder();
        let text = ascii::length_if_not(rem, |c| c == b'<' || c == b'&');
        if text != 0 {
            self.hl.advance(text);
            return true;
        }
        if rem.starts_with(b"&") {
            let reference = html::match_character_reference(rem);
            if reference != 0 {
                self.hl.emit_and_advance(
                    reference,
                    HighlightKind::StringEscape,
                    Coalescing::Normal,
                );
            } else {
                self.hl
                    .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
            }
            return true;
        }
        if rem.starts_with(b"<") {
            self.hl
                .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
        }
        true
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
    fn test_simple_element() {
        let toks = tokens(b"<a k=\"v\">t</a>", Lang::Xml);
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
    fn test_processing_instruction() {
        let toks = tokens(b"<?xml-stylesheet href=\"a\"?>", Lang::Xml);
        assert_eq!(toks[0].kind.id(), "sym_punc");
        assert_eq!(toks[1].kind.id(), "name_macro");
        assert_eq!(toks[toks.len() - 1].kind.id(), "sym_punc");
    }

    #[test]
    fn test_comment_rejects_double_hyphen() {
        let toks = tokens(b"<!-- a -- b -->", Lang::Xml);
        // The comment ends unterminated at the inner `--`.
        assert_eq!(toks[0].kind.id(), "cmt_del");
        assert_eq!(toks[1].kind.id(), "cmt");
        assert_eq!(toks[1].length, 3);
    }

    #[test]
    fn test_raw_less_than_in_value_is_error() {
        let toks = tokens(b"<a k=\"x<y\"/>", Lang::Xml);
        let ids = dump(&toks);
        assert!(ids.contains(&(7, 1, "err")));
    }

    #[test]
    fn test_reference_in_value() {
        let toks = tokens(b"<a k=\"&#10;\"/>", Lang::Xml);
        let ids = dump(&toks);
        assert!(ids.contains(&(6, 5, "str_esc")));
    }

    #[test]
    fn test_bad_name_byte() {
        let toks = tokens(b"<a@b>", Lang::Xml);
        let ids = dump(&toks);
        assert!(ids.contains(&(2, 1, "err")));
    }

    #[test]
    fn test_cdata_section() {
        let toks = tokens(b"<![CDATA[1<2]]>", Lang::Xml);
        assert_eq!(
            dump(&toks),
            vec![(0, 9, "name_macro"), (12, 3, "name_macro")]
        );
    }

    #[test]
    fn test_stray_ampersand_is_error() {
        let toks = tokens(b"a & b", Lang::Xml);
        assert_eq!(dump(&toks), vec![(2, 1, "err")]);
    }

    #[test]
    fn test_self_closing() {
        let toks = tokens(b"<a/>", Lang::Xml);
        assert_eq!(
            dump(&toks),
            vec![(0, 1, "sym_punc"), (1, 1, "markup_tag"), (2, 2, "sym_punc")]
        );
    }
}
