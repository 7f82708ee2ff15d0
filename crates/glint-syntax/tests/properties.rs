//! Property tests for the invariants every scanner must uphold, run
//! over arbitrary byte soup and arbitrary Unicode text for every
//! supported language.

use glint_syntax::{highlight, HighlightKind, HighlightOptions, Lang, Token, TokenBuffer};
use proptest::prelude::*;

/// Every language with a scanner (`Kotlin` intentionally reports
/// unsupported and `Txt` trivially emits nothing, but both stay in).
const LANGS: &[Lang] = &[
    Lang::Bash,
    Lang::C,
    Lang::Cowel,
    Lang::Cpp,
    Lang::Css,
    Lang::Diff,
    Lang::Ebnf,
    Lang::Html,
    Lang::JavaScript,
    Lang::Json,
    Lang::Jsonc,
    Lang::Latex,
    Lang::Llvm,
    Lang::Lua,
    Lang::Nasm,
    Lang::Python,
    Lang::Tex,
    Lang::Txt,
    Lang::TypeScript,
    Lang::Xml,
];

fn collect(source: &[u8], lang: Lang, coalescing: bool, capacity: usize) -> Vec<Token> {
    let mut collected = Vec::new();
    let mut backing = vec![Token::default(); capacity];
    let mut sink = |flushed: &[Token]| collected.extend_from_slice(flushed);
    let mut out = TokenBuffer::new(&mut backing, &mut sink);
    let options = HighlightOptions {
        coalescing,
        strict: false,
    };
    highlight(source, lang, &mut out, &options).unwrap();
    out.flush();
    drop(out);
    collected
}

/// Run-length merge of adjacent, touching, same-kind tokens.
fn rle(tokens: &[Token]) -> Vec<Token> {
    let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());
    for &token in tokens {
        match merged.last_mut() {
            Some(last) if last.kind == token.kind && last.end() == token.begin => {
                last.length += token.length;
            }
            _ => merged.push(token),
        }
    }
    merged
}

fn check_stream_invariants(source: &[u8], lang: Lang, tokens: &[Token]) {
    let mut previous_end = 0u32;
    let mut covered = 0u64;
    for token in tokens {
        // Non-empty.
        assert!(token.length > 0, "{lang:?}: empty token {token:?}");
        // In-bounds.
        assert!(
            token.end() as usize <= source.len(),
            "{lang:?}: token out of bounds {token:?}"
        );
        // Monotonic and non-overlapping.
        assert!(
            token.begin >= previous_end,
            "{lang:?}: token overlaps predecessor {token:?}"
        );
        previous_end = token.end();
        covered += u64::from(token.length);
    }
    // Coverage: emitted plus unemitted spans account for the input.
    assert!(covered <= source.len() as u64);
}

proptest! {
    #[test]
    fn invariants_on_arbitrary_bytes(source in proptest::collection::vec(any::<u8>(), 0..256)) {
        for &lang in LANGS {
            let tokens = collect(&source, lang, false, 512);
            check_stream_invariants(&source, lang, &tokens);
        }
    }

    #[test]
    fn invariants_on_arbitrary_text(source in ".{0,120}") {
        for &lang in LANGS {
            let tokens = collect(source.as_bytes(), lang, false, 512);
            check_stream_invariants(source.as_bytes(), lang, &tokens);
        }
    }

    /// Coalescing commutes with run-length merging of the
    /// uncoalesced stream.
    #[test]
    fn coalescing_is_run_length_merge(source in proptest::collection::vec(any::<u8>(), 0..200)) {
        for &lang in LANGS {
            let plain = collect(&source, lang, false, 512);
            let coalesced = collect(&source, lang, true, 512);
            prop_assert_eq!(rle(&plain), coalesced, "lang {:?}", lang);
        }
    }

    /// The buffer capacity must not change what is highlighted.
    /// Forced coalescing cannot merge across a flush boundary, so the
    /// comparison is modulo run-length merging.
    #[test]
    fn buffer_capacity_is_transparent(source in proptest::collection::vec(any::<u8>(), 0..200)) {
        for &lang in LANGS {
            let tiny = collect(&source, lang, false, 1);
            let large = collect(&source, lang, false, 512);
            prop_assert_eq!(rle(&tiny), rle(&large), "lang {:?}", lang);
        }
    }
}

/// Inputs drawn from each language's accepted grammar must never
/// produce an error token.
#[test]
fn no_errors_on_valid_input() {
    let cases: &[(Lang, &[u8])] = &[
        (Lang::Bash, b"ls -la | grep foo > out.txt\n"),
        (Lang::C, b"int main(void) { return 0; }\n"),
        (Lang::Cowel, b"\\b{bold} text \\code(lang = cpp){int}\n"),
        (Lang::Cpp, b"auto x = std::max(1, 2); // pick\n"),
        (Lang::Css, b"a:hover { color: #fff; width: 10px; }\n"),
        (Lang::Diff, b"--- a\n+++ b\n@@ -1 +1 @@\n-x\n+y\n"),
        (Lang::Ebnf, b"digit = \"0\" | \"1\" ; (* binary *)\n"),
        (Lang::Html, b"<!DOCTYPE html><a href=\"x\">t&amp;</a>"),
        (
            Lang::JavaScript,
            b"const f = (x) => `v=${x + 1}`; // done\n",
        ),
        (Lang::Json, b"{\"a\": [1, 2.5e3, true, null]}"),
        (Lang::Jsonc, b"// c\n{\"a\": 1}"),
        (Lang::Llvm, b"entry:\n  %x = add i32 1, 2\n  ret void\n"),
        (Lang::Lua, b"local t = { [1] = 'a', n = 0x1F }\n"),
        (Lang::Nasm, b"start:\n  mov eax, 0x10\n  ret\n"),
        (Lang::Python, b"def f(x):\n    return f\"v={x!r}\"\n"),
        (Lang::Tex, b"\\section{One} $x^2$\n"),
        (Lang::TypeScript, b"let x: string = \"a\";\n"),
        (Lang::Xml, b"<a k=\"v\">t&#10;</a>"),
    ];
    for &(lang, source) in cases {
        let tokens = collect(source, lang, false, 512);
        let errors: Vec<&Token> = tokens
            .iter()
            .filter(|t| t.kind == HighlightKind::Error)
            .collect();
        assert!(
            errors.is_empty(),
            "{lang:?}: unexpected error tokens {errors:?} in {:?}",
            String::from_utf8_lossy(source)
        );
    }
}

/// Unterminated constructs reach the end of input without a closing
/// delimiter token and without failing.
#[test]
fn unterminated_constructs_end_at_eof() {
    let cases: &[(Lang, &[u8])] = &[
        (Lang::Cpp, b"/* open"),
        (Lang::Cpp, b"\"open"),
        (Lang::JavaScript, b"`open ${1"),
        (Lang::Lua, b"[[open"),
        (Lang::Html, b"<!-- open"),
        (Lang::Python, b"'''open"),
        (Lang::Json, b"{\"a\": "),
        (Lang::Bash, b"'open"),
    ];
    for &(lang, source) in cases {
        let tokens = collect(source, lang, false, 512);
        check_stream_invariants(source, lang, &tokens);
    }
}
