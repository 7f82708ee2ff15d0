//! TeX and LaTeX scanner.
//!
//! `\name` control sequences are markup tags, single-character control
//! sequences like `\{` are escapes, and the category-code specials
//! (`$ & # ^ _ % ~`) are operators. Ordinary prose is advanced over
//! without highlighting.

use glint_util::ascii;

use crate::highlighter::{Coalescing, Highlighter};
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};

fn is_command_name(c: u8) -> bool {
    ascii::is_alpha(c) || c == b'@'
}

fn is_special(c: u8) -> bool {
    matches!(c, b'$' | b'&' | b'#' | b'^' | b'_' | b'%' | b'~')
}

pub(crate) fn highlight(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    let mut hl = Highlighter::new(source, out, *options);
    let mut text = 0;

    macro_rules! flush_text {
        () => {
            if text != 0 {
                hl.advance(text);
                text = 0;
            }
        };
    }

    while text < hl.remainder().len() {
        let rem = hl.remainder();
        match rem[text] {
            b'[' | b']' => {
                flush_text!();
                hl.emit_and_advance(1, HighlightKind::SymbolSquare, Coalescing::Normal);
            }
            b'{' | b'}' => {
                flush_text!();
                hl.emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);
            }
            b'\\' => {
                flush_text!();
                let rem = hl.remainder();
                if rem.len() == 1 {
                    hl.emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
                    continue;
                }
                let name = 1 + ascii::length_if(&rem[1..], is_command_name);
                if name == 1 {
                    // A single-character control sequence like `\{`;
                    // not grammatically distinct in TeX, but useful to
                    // highlight as an escape.
                    hl.emit_and_advance(2, HighlightKind::StringEscape, Coalescing::Normal);
                } else {
                    hl.emit_and_advance(name, HighlightKind::MarkupTag, Coalescing::Normal);
                }
            }
            c if is_special(c) => {
                flush_text!();
                hl.emit_and_advance(1, HighlightKind::SymbolOp, Coalescing::Normal);
            }
            _ => text += 1,
        }
    }
    flush_text!();
}

#[cfg(test)]
mod tests {
    use crate::scan::testing::{dump, tokens};
    use crate::Lang;

    #[test]
    fn test_command() {
        let toks = tokens(br"\section{Intro}", Lang::Tex);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 8, "markup_tag"),
                (8, 1, "sym_brace"),
                (14, 1, "sym_brace"),
            ]
        );
    }

    #[test]
    fn test_single_char_escape() {
        let toks = tokens(br"a \% b", Lang::Tex);
        assert_eq!(dump(&toks), vec![(2, 2, "str_esc")]);
    }

    #[test]
    fn test_math_specials() {
        let toks = tokens(br"$x^2$", Lang::Tex);
        assert_eq!(
            dump(&toks),
            vec![(0, 1, "sym_op"), (2, 1, "sym_op"), (4, 1, "sym_op")]
        );
    }

    #[test]
    fn test_trailing_backslash_is_error() {
        let toks = tokens(br"a\", Lang::Tex);
        assert_eq!(dump(&toks), vec![(1, 1, "err")]);
    }

    #[test]
    fn test_latex_alias() {
        let toks = tokens(br"\begin{x}", Lang::Latex);
        assert_eq!(toks[0].kind.id(), "markup_tag");
    }

    #[test]
    fn test_at_command() {
        let toks = tokens(br"\@startsection", Lang::Tex);
        assert_eq!(dump(&toks), vec![(0, 14, "markup_tag")]);
    }
}
