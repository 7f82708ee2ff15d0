//! One scanner module per supported language.
//!
//! Every scanner follows the same skeleton: a loop over the unconsumed
//! remainder that tries matchers in a fixed priority order and either
//! advances silently (whitespace, plain text), emits structured
//! tokens, or emits an `error` token for input that matches nothing.
//! Scanners are total: they terminate on any byte sequence.

pub(crate) mod bash;
pub(crate) mod c;
pub(crate) mod cowel;
pub(crate) mod css;
pub(crate) mod diff;
pub(crate) mod ebnf;
pub(crate) mod html;
pub(crate) mod js;
pub(crate) mod json;
pub(crate) mod llvm;
pub(crate) mod lua;
pub(crate) mod nasm;
pub(crate) mod python;
pub(crate) mod tex;
pub(crate) mod xml;
