//! ISO 14977 EBNF scanner.
//!
//! The scanner alternates between the left-hand side of a rule, where
//! meta-identifiers are nonterminal declarations, and the right-hand
//! side, where they are references. `=` switches to the right, `;` or
//! `.` back to the left. Identifier characters are emitted one at a
//! time with forced coalescing, which also makes space-separated
//! meta-identifiers like `digit sequence` form clean tokens.

use crate::highlighter::{Coalescing, Highlighter};
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};
use glint_util::ascii;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    LeftBeforeName,
    LeftInName,
    RightBeforeName,
    RightInName,
}

/// Characters tolerated inside relaxed meta-identifiers, where a `-`
/// may continue an identifier as in `digit-sequence`.
fn is_relaxed_meta_identifier(c: u8) -> bool {
    ascii::is_alphanumeric(c) || c == b'_' || c == b'-'
}

struct Scanner<'s, 'o, 'a> {
    hl: Highlighter<'s, 'o, 'a>,
    state: State,
}

impl Scanner<'_, '_, '_> {
    fn run(&mut self) {
        let mut previous = 0u8;
        while !self.hl.eof() {
            let rem = self.hl.remainder();
            let c = rem[0];
            match c {
                b',' | b'!' | b'|' => {
                    self.state = State::RightBeforeName;
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolOp, Coalescing::Normal);
                }
                b'*' => {
                    if rem.starts_with(b"*)") {
                        self.hl
                            .emit_and_advance(2, HighlightKind::CommentDelim, Coalescing::Normal);
                    } else {
                        self.state = State::RightBeforeName;
                        self.hl
                            .emit_and_advance(1, HighlightKind::SymbolOp, Coalescing::Normal);
                    }
                }
                b'/' => {
                    self.state = State::RightBeforeName;
                    if rem.starts_with(b"/)") {
                        self.hl
                            .emit_and_advance(2, HighlightKind::SymbolParens, Coalescing::Normal);
                    } else {
                        self.hl
                            .emit_and_advance(1, HighlightKind::SymbolOp, Coalescing::Normal);
                    }
                }
                b':' => {
                    self.state = State::RightBeforeName;
                    if rem.starts_with(b":)") {
                        self.hl
                            .emit_and_advance(2, HighlightKind::SymbolBrace, Coalescing::Normal);
                    } else {
                        self.hl
                            .emit_and_advance(1, HighlightKind::SymbolOp, Coalescing::Normal);
                    }
                }
                b'[' | b']' => {
                    self.state = State::RightBeforeName;
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolSquare, Coalescing::Normal);
                }
                b'{' | b'}' => {
                    self.state = State::RightBeforeName;
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);
                }
                b'\'' | b'"' | b'`' => {
                    self.state = State::RightBeforeName;
                    self.consume_string(c);
                }
                b';' | b'.' => {
                    self.state = State::LeftBeforeName;
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                }
                b'=' => {
                    self.state = State::RightBeforeName;
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                }
                b' ' | b'\t' | b'\r' | b'\n' | b'\x0B' => {
                    self.hl.advance(1);
                }
                b'(' => {
                    if rem.starts_with(b"(*") {
                        self.consume_comment();
                    } else if rem.starts_with(b"(:") {
                        self.state = State::RightBeforeName;
                        self.hl
                            .emit_and_advance(2, HighlightKind::SymbolBrace, Coalescing::Normal);
                    } else if rem.starts_with(b"(/") {
                        self.state = State::RightBeforeName;
                        self.hl
                            .emit_and_advance(2, HighlightKind::SymbolParens, Coalescing::Normal);
                    } else {
                        self.state = State::RightBeforeName;
                        self.hl
                            .emit_and_advance(1, HighlightKind::SymbolParens, Coalescing::Normal);
                    }
                }
                b')' => {
                    self.state = State::RightBeforeName;
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolParens, Coalescing::Normal);
                }
                b'?' => {
                    self.state = State::RightBeforeName;
                    self.consume_special_sequence();
                }
                b'0'..=b'9' => {
                    let kind = match self.state {
                        State::LeftInName => HighlightKind::NameNonterminalDecl,
                        State::RightInName => HighlightKind::NameNonterminal,
                        _ => HighlightKind::Number,
                    };
                    self.hl.emit_and_advance(1, kind, Coalescing::Forced);
                }
                c if c.is_ascii_alphabetic() || c == b'_' => {
                    let kind = match self.state {
                        State::LeftBeforeName => {
                            self.state = State::LeftInName;
                            HighlightKind::NameNonterminalDecl
                        }
                        State::LeftInName => HighlightKind::NameNonterminalDecl,
                        State::RightBeforeName => {
                            self.state = State::RightInName;
                            HighlightKind::NameNonterminal
                        }
                        State::RightInName => HighlightKind::NameNonterminal,
                    };
                    let coalescing = match self.state {
                        State::LeftInName | State::RightInName => Coalescing::Forced,
                        _ => Coalescing::Normal,
                    };
                    self.hl.emit_and_advance(1, kind, coalescing);
                }
                b'-' => {
                    // Not an ISO 14977 feature, but hyphens commonly
                    // continue identifiers in the wild; treat a hyphen
                    // directly preceded by an identifier character as
                    // part of the name, anything else as subtraction.
                    let in_name = matches!(self.state, State::LeftInName | State::RightInName);
                    if in_name && is_relaxed_meta_identifier(previous) {
                        let kind = if self.state == State::LeftInName {
                            HighlightKind::NameNonterminalDecl
                        } else {
                            HighlightKind::NameNonterminal
                        };
                        self.hl.emit_and_advance(1, kind, Coalescing::Forced);
                    } else {
                        self.state = State::RightBeforeName;
                        self.hl
                            .emit_and_advance(1, HighlightKind::SymbolOp, Coalescing::Normal);
                    }
                }
                _ => {
                    self.hl
                        .emit_and_advance(1, HighlightKind::Error, Coalescing::Forced);
                }
            }
            previous = c;
        }
    }

    fn consume_delimited(
        &mut self,
        open: &[u8],
        close: &[u8],
        open_kind: HighlightKind,
        content_kind: HighlightKind,
        close_kind: HighlightKind,
    ) {
        let rem = self.hl.remainder();
        debug_assert!(rem.starts_with(open));
        let closing = ascii::find_subslice(rem, close, open.len());
        self.hl
            .emit_and_advance(open.len(), open_kind, Coalescing::Normal);
        match closing {
            None => {
                let rest = self.hl.remainder().len();
                if rest != 0 {
                    self.hl.emit_and_advance(rest, content_kind, Coalescing::Normal);
                }
            }
            Some(at) => {
                if at > open.len() {
                    self.hl
                        .emit_and_advance(at - open.len(), content_kind, Coalescing::Normal);
                }
                self.hl
                    .emit_and_advance(close.len(), close_kind, Coalescing::Normal);
            }
        }
    }

    fn consume_comment(&mut self) {
        self.consume_delimited(
            b"(*",
            b"*)",
            HighlightKind::CommentDelim,
            HighlightKind::Comment,
            HighlightKind::CommentDelim,
        );
    }

    fn consume_string(&mut self, quote: u8) {
        let quote = [quote];
        self.consume_delimited(
            &quote,
            &quote,
            HighlightKind::StringDelim,
            HighlightKind::String,
            HighlightKind::StringDelim,
        );
    }

    /// A `? special sequence ?` is emitted whole, closing `?` included.
    fn consume_special_sequence(&mut self) {
        let rem = self.hl.remainder();
        let length = match ascii::find_byte(&rem[1..], b'?') {
            Some(i) => i + 2,
            None => rem.len(),
        };
        self.hl
            .emit_and_advance(length, HighlightKind::NameMacro, Coalescing::Normal);
    }
}

pub(crate) fn highlight(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    Scanner {
        hl: Highlighter::new(source, out, *options),
        state: State::LeftBeforeName,
    }
    .run();
}

#[cfg(test)]
mod tests {
    use crate::scan::testing::{dump, tokens};
    use crate::Lang;

    #[test]
    fn test_rule_sides() {
        let toks = tokens(b"digit = zero ;", Lang::Ebnf);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 5, "name_nt_dcl"),
                (6, 1, "sym_punc"),
                (8, 4, "name_nt"),
                (13, 1, "sym_punc"),
            ]
        );
    }

    #[test]
    fn test_terminal_string() {
        let toks = tokens(b"a = 'x' ;", Lang::Ebnf);
        let ids = dump(&toks);
        assert!(ids.contains(&(4, 1, "str_del")));
        assert!(ids.contains(&(5, 1, "str")));
        assert!(ids.contains(&(6, 1, "str_del")));
    }

    #[test]
    fn test_comment() {
        let toks = tokens(b"(* c *)", Lang::Ebnf);
        assert_eq!(
            dump(&toks),
            vec![(0, 2, "cmt_del"), (2, 3, "cmt"), (5, 2, "cmt_del")]
        );
    }

    #[test]
    fn test_alternation_resets_to_reference() {
        let toks = tokens(b"a = b | c ;", Lang::Ebnf);
        let ids = dump(&toks);
        assert!(ids.contains(&(4, 1, "name_nt")));
        assert!(ids.contains(&(8, 1, "name_nt")));
    }

    #[test]
    fn test_special_sequence() {
        let toks = tokens(b"a = ? magic ? ;", Lang::Ebnf);
        let ids = dump(&toks);
        assert!(ids.contains(&(4, 9, "name_macro")));
    }

    #[test]
    fn test_hyphenated_identifier() {
        let toks = tokens(b"digit-two = a ;", Lang::Ebnf);
        assert_eq!(dump(&toks)[0], (0, 9, "name_nt_dcl"));
    }

    #[test]
    fn test_number_outside_name() {
        let toks = tokens(b"a = 12 * b ;", Lang::Ebnf);
        let ids = dump(&toks);
        assert!(ids.contains(&(4, 2, "num")));
    }

    #[test]
    fn test_repetition_braces() {
        let toks = tokens(b"a = { b } ;", Lang::Ebnf);
        let ids = dump(&toks);
        assert!(ids.contains(&(4, 1, "sym_brace")));
        assert!(ids.contains(&(8, 1, "sym_brace")));
    }
}
