//! glint-util - Character-level utilities for the glint highlighter.
//!
//! This crate holds the lowest layer of the highlighting pipeline:
//! stateless predicates over bytes and code points, byte-slice scanning
//! helpers, and forward UTF-8 decoding that degrades gracefully on
//! malformed input instead of failing.

pub mod ascii;
pub mod utf8;
