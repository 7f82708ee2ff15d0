//! COWEL scanner.
//!
//! A document is plain text interleaved with escapes, comments, and
//! directives of the form `\name(args){body}`. Argument lists may be
//! named (`name = value`) or positional, and values are themselves
//! content sequences, so directive processing is mutually recursive
//! with content processing. Comments come in a `\:` line form and a
//! `\:: ... ::\` block form.

use glint_util::{ascii, utf8};

use crate::highlighter::{Coalescing, Highlighter};
use crate::parse::EnclosedResult;
use crate::scan::html;
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};

const LINE_COMMENT_PREFIX: &[u8] = b"\\:";
const BLOCK_COMMENT_PREFIX: &[u8] = b"\\::";
const BLOCK_COMMENT_SUFFIX: &[u8] = b"::\\";

fn is_directive_name_start(c: u8) -> bool {
    ascii::is_alpha(c)
}

fn is_directive_name(c: u8) -> bool {
    ascii::is_alphanumeric(c) || c == b'-' || c == b'_'
}

fn is_argument_name(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

/// Characters that form an escape sequence after a backslash.
/// `:` is excluded; `\:` introduces a comment instead.
fn is_escapable(c: u8) -> bool {
    (c.is_ascii_punctuation() && c != b':') || c == b'\r' || c == b'\n'
}

fn match_directive_name(str: &[u8]) -> usize {
    ascii::length_if_head_tail(str, is_directive_name_start, is_directive_name)
}

fn match_argument_name(str: &[u8]) -> usize {
    match str.first() {
        None => 0,
        Some(c) if c.is_ascii_digit() => 0,
        Some(_) => utf8::length_if(str, is_argument_name),
    }
}

fn match_escape(str: &[u8]) -> usize {
    if str.len() < 2 || str[0] != b'\\' || !is_escapable(str[1]) {
        return 0;
    }
    if str.starts_with(b"\\\r\n") {
        3
    } else {
        2
    }
}

fn match_whitespace(str: &[u8]) -> usize {
    ascii::length_if(str, html::is_html_whitespace)
}

/// `\:` up to the end of the line, unless it opens a block comment.
fn match_line_comment(str: &[u8]) -> usize {
    if !str.starts_with(LINE_COMMENT_PREFIX) || str.starts_with(BLOCK_COMMENT_PREFIX) {
        return 0;
    }
    2 + ascii::length_if_not(&str[2..], |c| c == b'\r' || c == b'\n')
}

/// `\:: ... ::\`.
fn match_block_comment(str: &[u8]) -> EnclosedResult {
    if !str.starts_with(BLOCK_COMMENT_PREFIX) {
        return EnclosedResult::default();
    }
    match ascii::find_subslice(str, BLOCK_COMMENT_SUFFIX, BLOCK_COMMENT_PREFIX.len()) {
        Some(i) => EnclosedResult {
            length: i + BLOCK_COMMENT_SUFFIX.len(),
            is_terminated: true,
        },
        None => EnclosedResult {
            length: str.len(),
            is_terminated: false,
        },
    }
}

/// Whether a backslash begins anything other than literal text.
fn starts_escape_comment_or_directive(str: &[u8]) -> bool {
    match_escape(str) != 0
        || match_line_comment(str) != 0
        || match_block_comment(str).matched()
        || (str.len() >= 2 && str[0] == b'\\' && is_directive_name_start(str[1]))
}

/// What kind of content sequence is being consumed, which decides the
/// bytes that terminate it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ContentContext {
    /// The whole document; nothing terminates it but the end.
    Document,
    /// A positional or named argument value inside `(...)`.
    ArgumentValue,
    /// A `{...}` block.
    Block,
}

fn is_terminated_by(context: ContentContext, c: u8) -> bool {
    match context {
        ContentContext::Document => false,
        ContentContext::ArgumentValue => matches!(c, b',' | b')' | b'}'),
        ContentContext::Block => c == b'}',
    }
}

/// Bracket balancing inside one argument value, so `\x(f(1, 2))` keeps
/// its inner commas and parentheses as text.
#[derive(Clone, Copy, Debug, Default)]
struct BracketLevels {
    arguments: usize,
    brace: usize,
}

struct Scanner<'s, 'o, 'a> {
    hl: Highlighter<'s, 'o, 'a>,
}

impl Scanner<'_, '_, '_> {
    fn run(&mut self) {
        self.consume_content_sequence(ContentContext::Document);
    }

    fn consume_content_sequence(&mut self, context: ContentContext) {
        let mut levels = BracketLevels::default();
        while !self.hl.eof() && !is_terminated_by(context, self.hl.remainder()[0]) {
            self.consume_content(context, &mut levels);
        }
    }

    /// One piece of content: an escape, a directive, a comment, or a
    /// run of plain text.
    fn consume_content(&mut self, context: ContentContext, levels: &mut BracketLevels) {
        let rem = self.hl.remainder();

        let escape = match_escape(rem);
        if escape != 0 {
            // Escaped newlines are real, but cross-line tokens are
            // ugly; report only the backslash.
            if rem[1] == b'\r' || rem[1] == b'\n' {
                self.hl
                    .emit_and_advance(1, HighlightKind::StringEscape, Coalescing::Normal);
                self.hl.advance(escape - 1);
            } else {
                self.hl
                    .emit_and_advance(escape, HighlightKind::StringEscape, Coalescing::Normal);
            }
            return;
        }
        if self.expect_directive() {
            return;
        }
        let line = match_line_comment(rem);
        if line != 0 {
            self.hl
                .emit_and_advance(2, HighlightKind::CommentDelim, Coalescing::Normal);
            if line > 2 {
                self.hl
                    .emit_and_advance(line - 2, HighlightKind::Comment, Coalescing::Normal);
            }
            return;
        }
        let block = match_block_comment(rem);
        if block.matched() {
            self.hl.highlight_enclosed_comment(
                block,
                BLOCK_COMMENT_PREFIX.len(),
                BLOCK_COMMENT_SUFFIX.len(),
            );
            return;
        }

        // Plain text up to the next construct or context terminator.
        let mut plain = 0;
        while plain < rem.len() {
            let c = rem[plain];
            if c == b'\\' {
                if starts_escape_comment_or_directive(&rem[plain..]) {
                    break;
                }
                plain += 1;
                continue;
            }
            if context == ContentContext::Document {
                plain += 1;
                continue;
            }
            if context == ContentContext::ArgumentValue && levels.brace == 0 {
                if levels.arguments == 0 && c == b',' {
                    break;
                }
                if c == b'(' {
                    levels.arguments += 1;
                }
                if c == b')' {
                    if levels.arguments == 0 {
                        break;
                    }
                    levels.arguments -= 1;
                }
            }
            if c == b'{' {
                levels.brace += 1;
            }
            if c == b'}' {
                if levels.brace == 0 {
                    break;
                }
                levels.brace -= 1;
            }
            plain += 1;
        }
        debug_assert!(plain != 0);
        self.hl.advance(plain);
    }

    fn expect_directive(&mut self) -> bool {
        let rem = self.hl.remainder();
        if !rem.starts_with(b"\\") {
            return false;
        }
        let name = match_directive_name(&rem[1..]);
        if name == 0 {
            return false;
        }
        self.hl
            .emit_and_advance(1 + name, HighlightKind::MarkupTag, Coalescing::Normal);
        self.consume_argument_list();
        self.consume_block();
        true
    }

    fn consume_argument_list(&mut self) {
        if !self.hl.remainder().starts_with(b"(") {
            return;
        }
        self.hl
            .emit_and_advance(1, HighlightKind::SymbolParens, Coalescing::Normal);

        while !self.hl.eof() {
            self.consume_argument();
            let rem = self.hl.remainder();
            match rem.first() {
                None => break,
                // A brace here means the argument list was never
                // closed; leave the brace to the caller.
                Some(b'}') => return,
                Some(b')') => {
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolParens, Coalescing::Normal);
                    return;
                }
                Some(b',') => {
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                }
                Some(_) => unreachable!("argument content stops only at , ) }}"),
            }
        }
    }

    fn consume_argument(&mut self) {
        // Trial-match a `name =` prefix; otherwise the argument is
        // positional and its whole extent is a value.
        let rem = self.hl.remainder();
        let leading = match_whitespace(rem);
        let name = match_argument_name(&rem[leading..]);
        if name != 0 {
            let trailing = match_whitespace(&rem[leading + name..]);
            if rem[leading + name + trailing..].starts_with(b"=") {
                self.hl.advance(leading);
                self.hl
                    .emit_and_advance(name, HighlightKind::MarkupAttr, Coalescing::Normal);
                self.hl.advance(trailing);
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                self.hl.advance(match_whitespace(self.hl.remainder()));
                self.consume_argument_value();
                return;
            }
        }
        self.hl.advance(leading);
        // Variadic ellipsis, as in `\macro(...)`.
        if self.hl.remainder().starts_with(b"...") {
            self.hl
                .emit_and_advance(3, HighlightKind::NameAttr, Coalescing::Normal);
        }
        self.consume_argument_value();
    }

    fn consume_argument_value(&mut self) {
        if self.hl.remainder().starts_with(b"(") {
            self.consume_argument_list();
        } else {
            self.consume_content_sequence(ContentContext::ArgumentValue);
        }
    }

    fn consume_block(&mut self) {
        if !self.hl.remainder().starts_with(b"{") {
            return;
        }
        self.hl
            .emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);
        self.consume_content_sequence(ContentContext::Block);
        if self.hl.remainder().starts_with(b"}") {
            self.hl
                .emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);
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
    fn test_directive_with_block() {
        let toks = tokens(br"\b{bold}", Lang::Cowel);
        assert_eq!(
            dump(&toks),
            vec![(0, 2, "markup_tag"), (2, 1, "sym_brace"), (7, 1, "sym_brace")]
        );
    }

    #[test]
    fn test_directive_with_named_argument() {
        let toks = tokens(br"\code(lang = cpp){int}", Lang::Cowel);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 5, "markup_tag"),
                (5, 1, "sym_parens"),
                (6, 4, "markup_attr"),
                (11, 1, "sym_punc"),
                (16, 1, "sym_parens"),
                (17, 1, "sym_brace"),
                (21, 1, "sym_brace"),
            ]
        );
    }

    #[test]
    fn test_positional_arguments() {
        let toks = tokens(br"\x(a, b)", Lang::Cowel);
        let ids = dump(&toks);
        assert!(ids.contains(&(4, 1, "sym_punc")));
    }

    #[test]
    fn test_escape() {
        let toks = tokens(br"a \{ b", Lang::Cowel);
        assert_eq!(dump(&toks), vec![(2, 2, "str_esc")]);
    }

    #[test]
    fn test_line_comment() {
        let toks = tokens(b"\\: note\ntext", Lang::Cowel);
        assert_eq!(dump(&toks), vec![(0, 2, "cmt_del"), (2, 5, "cmt")]);
    }

    #[test]
    fn test_block_comment() {
        let toks = tokens(b"\\::hi::\\x", Lang::Cowel);
        assert_eq!(
            dump(&toks),
            vec![(0, 3, "cmt_del"), (3, 2, "cmt"), (5, 3, "cmt_del")]
        );
    }

    #[test]
    fn test_nested_directives_in_block() {
        let toks = tokens(br"\a{\b{x}}", Lang::Cowel);
        let ids = dump(&toks);
        assert_eq!(ids[0], (0, 2, "markup_tag"));
        assert!(ids.contains(&(3, 2, "markup_tag")));
    }

    #[test]
    fn test_balanced_parens_in_argument() {
        let toks = tokens(br"\x(f(1, 2))", Lang::Cowel);
        // The inner parentheses and comma are argument text, so only
        // two paren tokens are emitted.
        let parens: Vec<_> = dump(&toks)
            .into_iter()
            .filter(|&(_, _, id)| id == "sym_parens")
            .collect();
        assert_eq!(parens, vec![(2, 1, "sym_parens"), (10, 1, "sym_parens")]);
    }

    #[test]
    fn test_escaped_newline_reports_backslash_only() {
        let toks = tokens(b"a\\\nb", Lang::Cowel);
        assert_eq!(dump(&toks), vec![(1, 1, "str_esc")]);
    }

    #[test]
    fn test_ellipsis_argument() {
        let toks = tokens(br"\m(...)", Lang::Cowel);
        let ids = dump(&toks);
        assert!(ids.contains(&(3, 3, "name_attr")));
    }

    #[test]
    fn test_unterminated_block() {
        let toks = tokens(br"\a{open", Lang::Cowel);
        let ids = dump(&toks);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[1], (2, 1, "sym_brace"));
    }
}
