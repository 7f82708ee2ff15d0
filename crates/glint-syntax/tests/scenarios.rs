//! Token-level scenarios pinning down the exact output for small,
//! hand-checked inputs across several languages.

use glint_syntax::{highlight, HighlightKind, HighlightOptions, Lang, Token, TokenBuffer};

fn tokens(source: &[u8], lang: Lang) -> Vec<Token> {
    let mut collected = Vec::new();
    let mut backing = [Token::default(); 256];
    let mut sink = |flushed: &[Token]| collected.extend_from_slice(flushed);
    let mut out = TokenBuffer::new(&mut backing, &mut sink);
    highlight(source, lang, &mut out, &HighlightOptions::default()).unwrap();
    out.flush();
    drop(out);
    collected
}

fn triples(tokens: &[Token]) -> Vec<(u32, u32, HighlightKind)> {
    tokens.iter().map(|t| (t.begin, t.length, t.kind)).collect()
}

#[test]
fn c_declaration() {
    use HighlightKind::*;
    assert_eq!(
        triples(&tokens(b"int x;\n", Lang::C)),
        vec![(0, 3, KeywordType), (4, 1, Name), (5, 1, SymbolPunc)]
    );
}

#[test]
fn cpp_block_comment() {
    use HighlightKind::*;
    assert_eq!(
        triples(&tokens(b"/*a*/", Lang::Cpp)),
        vec![(0, 2, CommentDelim), (2, 1, Comment), (3, 2, CommentDelim)]
    );
}

#[test]
fn cpp_unterminated_string_stops_before_newline() {
    use HighlightKind::*;
    // The newline is unconsumed-by-token whitespace.
    assert_eq!(
        triples(&tokens(b"\"a\n", Lang::Cpp)),
        vec![(0, 1, StringDelim), (1, 1, String)]
    );
}

#[test]
fn javascript_string() {
    use HighlightKind::*;
    assert_eq!(
        triples(&tokens(b"\"use strict\"", Lang::JavaScript)),
        vec![(0, 1, StringDelim), (1, 10, String), (11, 1, StringDelim)]
    );
}

#[test]
fn javascript_template_substitution() {
    use HighlightKind::*;
    assert_eq!(
        triples(&tokens(b"`a${1}b`", Lang::JavaScript)),
        vec![
            (0, 1, StringDelim),
            (1, 1, String),
            (2, 2, StringInterpolationDelim),
            (4, 1, Number),
            (5, 1, StringInterpolationDelim),
            (6, 1, String),
            (7, 1, StringDelim),
        ]
    );
}

#[test]
fn html_tag_with_attribute() {
    use HighlightKind::*;
    // Byte 9 (`x`) is text and produces no token.
    assert_eq!(
        triples(&tokens(b"<a b='c'>x</a>", Lang::Html)),
        vec![
            (0, 1, SymbolPunc),
            (1, 1, MarkupTag),
            (3, 1, MarkupAttr),
            (4, 1, SymbolPunc),
            (5, 1, StringDelim),
            (6, 1, String),
            (7, 1, StringDelim),
            (8, 1, SymbolPunc),
            (10, 2, SymbolPunc),
            (12, 1, MarkupTag),
            (13, 1, SymbolPunc),
        ]
    );
}

#[test]
fn diff_headings_and_changes() {
    use HighlightKind::*;
    assert_eq!(
        triples(&tokens(b"--- a\n+++ b\n-x\n+y\n", Lang::Diff)),
        vec![
            (0, 5, DiffHeading),
            (6, 5, DiffHeading),
            (12, 2, DiffDeletion),
            (15, 2, DiffInsertion),
        ]
    );
}

#[test]
fn txt_produces_nothing() {
    assert!(tokens(b"anything at all", Lang::Txt).is_empty());
}

#[test]
fn kotlin_reports_unsupported() {
    let mut backing = [Token::default(); 8];
    let mut sink = |_: &[Token]| panic!("nothing may be emitted");
    let mut out = TokenBuffer::new(&mut backing, &mut sink);
    let result = highlight(b"fun main() {}", Lang::Kotlin, &mut out, &HighlightOptions::default());
    assert_eq!(result, Err(glint_syntax::HighlightError::UnsupportedLanguage));
}

#[test]
fn zero_capacity_buffer_is_rejected() {
    let mut backing: [Token; 0] = [];
    let mut sink = |_: &[Token]| {};
    let mut out = TokenBuffer::new(&mut backing, &mut sink);
    let result = highlight(b"1", Lang::Json, &mut out, &HighlightOptions::default());
    assert_eq!(result, Err(glint_syntax::HighlightError::ZeroCapacityBuffer));
}

#[test]
fn bom_is_error_outside_markup() {
    let toks = tokens(b"\xEF\xBB\xBF1", Lang::Json);
    assert_eq!(toks[0].kind, HighlightKind::Error);
}

#[test]
fn latex_dispatches_to_tex() {
    let toks = tokens(b"\\frac{1}{2}", Lang::Latex);
    assert_eq!(toks[0].kind, HighlightKind::MarkupTag);
}
