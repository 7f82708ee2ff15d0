//! Diff scanner. Line-oriented: each line gets exactly one token whose
//! kind is decided by the leading characters, covering unified and
//! context formats.

use glint_util::ascii;

use crate::highlighter::{Coalescing, Highlighter};
use crate::parse::match_crlf_line;
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};

fn choose_line_highlight(line: &[u8]) -> HighlightKind {
    debug_assert!(!line.is_empty());
    match line[0] {
        b'-' => {
            if line.starts_with(b"--- ") {
                HighlightKind::DiffHeading
            } else {
                HighlightKind::DiffDeletion
            }
        }
        b'+' => {
            if line.starts_with(b"+++ ") {
                HighlightKind::DiffHeading
            } else {
                HighlightKind::DiffInsertion
            }
        }
        b'*' => {
            // `*** 1,4 ****` section headers and `*` separator runs.
            if line.starts_with(b"*** ") || ascii::length_if(line, |c| c == b'*') == line.len() {
                HighlightKind::DiffHeading
            } else {
                HighlightKind::DiffCommon
            }
        }
        b'!' => HighlightKind::DiffModification,
        b'@' => {
            if line.starts_with(b"@@ ") {
                HighlightKind::DiffHunk
            } else {
                HighlightKind::DiffCommon
            }
        }
        _ => HighlightKind::DiffCommon,
    }
}

pub(crate) fn highlight(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    let mut hl = Highlighter::new(source, out, *options);
    while !hl.eof() {
        let line = match_crlf_line(hl.remainder());
        if line.content_length != 0 {
            let kind = choose_line_highlight(&hl.remainder()[..line.content_length]);
            hl.emit_and_advance(line.content_length, kind, Coalescing::Normal);
        }
        hl.advance(line.terminator_length);
    }
}

#[cfg(test)]
mod tests {
    use crate::scan::testing::{dump, tokens};
    use crate::Lang;

    #[test]
    fn test_unified_diff() {
        let toks = tokens(b"--- a\n+++ b\n-x\n+y\n", Lang::Diff);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 5, "diff_h"),
                (6, 5, "diff_h"),
                (12, 2, "diff_del"),
                (15, 2, "diff_ins"),
            ]
        );
    }

    #[test]
    fn test_hunk_header() {
        let toks = tokens(b"@@ -1 +1 @@\n ctx\n", Lang::Diff);
        assert_eq!(
            dump(&toks),
            vec![(0, 11, "diff_hunk"), (12, 4, "diff_common")]
        );
    }

    #[test]
    fn test_context_format() {
        let toks = tokens(b"*** 1,4 ****\n! changed\n", Lang::Diff);
        assert_eq!(
            dump(&toks),
            vec![(0, 12, "diff_h"), (13, 9, "diff_mod")]
        );
    }

    #[test]
    fn test_star_separator_run() {
        let toks = tokens(b"***************\n", Lang::Diff);
        assert_eq!(dump(&toks), vec![(0, 15, "diff_h")]);
    }

    #[test]
    fn test_blank_lines_emit_nothing() {
        let toks = tokens(b"\n\r\n", Lang::Diff);
        assert!(toks.is_empty());
    }

    #[test]
    fn test_crlf_line() {
        let toks = tokens(b"+a\r\n+b", Lang::Diff);
        assert_eq!(dump(&toks), vec![(0, 2, "diff_ins"), (4, 2, "diff_ins")]);
    }

    #[test]
    fn test_stray_at_line() {
        let toks = tokens(b"@x\n", Lang::Diff);
        assert_eq!(dump(&toks), vec![(0, 2, "diff_common")]);
    }
}
