//! glint-syntax - a streaming syntax highlighter.
//!
//! The core consumes UTF-8 source bytes in one of the supported
//! languages and emits classified highlight tokens into a bounded,
//! caller-provided [`TokenBuffer`] that flushes to a sink as it fills.
//! Highlighting is a single pass, total over arbitrary byte input, and
//! linear in the source length: malformed input degrades to `error`
//! tokens instead of failing.
//!
//! # Example
//!
//! ```
//! use glint_syntax::{highlight, HighlightOptions, Lang, Token};
//!
//! let mut tokens = Vec::new();
//! let mut backing = [Token::default(); 64];
//! let mut sink = |flushed: &[Token]| tokens.extend_from_slice(flushed);
//! let mut buffer = glint_syntax::TokenBuffer::new(&mut backing, &mut sink);
//!
//! highlight(b"int x;", Lang::C, &mut buffer, &HighlightOptions::default()).unwrap();
//! buffer.flush();
//!
//! assert_eq!(tokens[0].kind, glint_syntax::HighlightKind::KeywordType);
//! ```

use thiserror::Error;

mod buffer;
mod escape;
mod highlighter;
pub mod html;
mod lang;
mod numeric;
mod parse;
mod scan;
mod token;

pub use buffer::TokenBuffer;
pub use lang::Lang;
pub use token::{HighlightKind, Token};

/// Options shared by all language scanners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HighlightOptions {
    /// Merge adjacent tokens of the same kind into one.
    pub coalescing: bool,
    /// Do not highlight features from other standards or related
    /// languages, such as C keywords when highlighting C++, or
    /// comments in plain JSON.
    pub strict: bool,
}

/// The ways a highlight call can fail before emitting anything.
///
/// Classification problems are never errors; they appear inline as
/// [`HighlightKind::Error`] tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum HighlightError {
    /// The language tag has no scanner in this build.
    #[error("language is not supported")]
    UnsupportedLanguage,
    /// The token buffer cannot hold even a single token.
    #[error("token buffer has zero capacity")]
    ZeroCapacityBuffer,
}

/// Highlights `source` as `lang`, streaming tokens through `out`.
///
/// Tokens are delivered to the buffer's sink in strictly increasing
/// `begin` order. The final flush is left to the caller so that
/// several sources can share one buffer. On error, nothing has been
/// emitted.
pub fn highlight(
    source: &[u8],
    lang: Lang,
    out: &mut TokenBuffer<'_>,
    options: &HighlightOptions,
) -> Result<(), HighlightError> {
    if out.capacity() == 0 {
        return Err(HighlightError::ZeroCapacityBuffer);
    }
    match lang {
        Lang::Bash => scan::bash::highlight(source, out, options),
        Lang::C => scan::c::highlight_c(source, out, options),
        Lang::Cowel => scan::cowel::highlight(source, out, options),
        Lang::Cpp => scan::c::highlight_cpp(source, out, options),
        Lang::Css => scan::css::highlight(source, out, options),
        Lang::Diff => scan::diff::highlight(source, out, options),
        Lang::Ebnf => scan::ebnf::highlight(source, out, options),
        Lang::Html => scan::html::highlight(source, out, options),
        Lang::JavaScript => scan::js::highlight_javascript(source, out, options),
        Lang::Json => scan::json::highlight_json(source, out, options),
        Lang::Jsonc => scan::json::highlight_jsonc(source, out, options),
        Lang::Kotlin => return Err(HighlightError::UnsupportedLanguage),
        Lang::Latex | Lang::Tex => scan::tex::highlight(source, out, options),
        Lang::Llvm => scan::llvm::highlight(source, out, options),
        Lang::Lua => scan::lua::highlight(source, out, options),
        Lang::Nasm => scan::nasm::highlight(source, out, options),
        Lang::Python => scan::python::highlight(source, out, options),
        Lang::Txt => {}
        Lang::TypeScript => scan::js::highlight_typescript(source, out, options),
        Lang::Xml => scan::xml::highlight(source, out, options),
    }
    Ok(())
}
