//! LLVM IR scanner.
//!
//! Ordinary identifiers carry a `%` or `@` sigil, so any bare word
//! that could lexically be a keyword is treated as one; only a short
//! table of specially-kinded words (types, terminators, constants)
//! needs maintaining. `iN` integer types and `label:` declarations are
//! recognized structurally.

use glint_util::ascii;

use crate::escape::{match_common_escape, CommonEscape};
use crate::highlighter::{Coalescing, Highlighter};
use crate::parse::{match_crlf_line, match_enclosed};
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};

const BLOCK_COMMENT_PREFIX: &[u8] = b"/*";
const BLOCK_COMMENT_SUFFIX: &[u8] = b"*/";

fn is_identifier_char(c: u8) -> bool {
    ascii::is_alphanumeric(c) || matches!(c, b'-' | b'$' | b'.' | b'_')
}

fn is_keyword_char(c: u8) -> bool {
    ascii::is_alphanumeric(c) || c == b'_' || c == b'.'
}

/// `%name` or `@name`, sigil included.
fn match_identifier(str: &[u8]) -> usize {
    if !str.starts_with(b"%") && !str.starts_with(b"@") {
        return 0;
    }
    1 + ascii::length_if(&str[1..], is_identifier_char)
}

use HighlightKind::{Bool, KeywordControl, KeywordType, Null, StringDecor, SymbolPunc};

/// Words with a more specific kind than the blanket `keyword`.
/// Sorted for binary search.
#[rustfmt::skip]
static SPECIAL_KEYWORDS: &[(&[u8], HighlightKind)] = &[
    (b"bfloat", KeywordType),
    (b"br", KeywordControl),
    // A `c"..."` constant has a string-decor prefix.
    (b"c", StringDecor),
    (b"call", KeywordControl),
    (b"callbr", KeywordControl),
    (b"catchpad", KeywordControl),
    (b"catchret", KeywordControl),
    (b"catchswitch", KeywordControl),
    (b"cleanuppad", KeywordControl),
    (b"cleanupret", KeywordControl),
    (b"double", KeywordType),
    (b"false", Bool),
    (b"float", KeywordType),
    (b"fp128", KeywordType),
    (b"half", KeywordType),
    (b"indirectbr", KeywordControl),
    (b"invoke", KeywordControl),
    (b"label", KeywordType),
    (b"landingpad", KeywordControl),
    (b"metadata", KeywordType),
    (b"none", Null),
    (b"null", Null),
    (b"poison", Null),
    (b"ppc_fp128", KeywordType),
    (b"ptr", KeywordType),
    (b"resume", KeywordControl),
    (b"ret", KeywordControl),
    (b"switch", KeywordControl),
    (b"target", KeywordType),
    (b"token", KeywordType),
    (b"true", Bool),
    (b"undef", Null),
    (b"unreachable", KeywordControl),
    (b"void", KeywordType),
    (b"vscale", KeywordType),
    (b"x", SymbolPunc),
    (b"x86_amx", KeywordType),
    (b"x86_fp80", KeywordType),
];

fn classify_keyword(word: &[u8]) -> HighlightKind {
    debug_assert!(!word.is_empty());
    // Arbitrary-width integer types: `i1`, `i32`, `i1942652`.
    let is_integer_type = word[0] == b'i'
        && word.len() >= 2
        && word[1..].iter().all(|&c| ascii::is_digit(c));
    if is_integer_type {
        return HighlightKind::KeywordType;
    }
    match SPECIAL_KEYWORDS.binary_search_by_key(&word, |&(w, _)| w) {
        Ok(i) => SPECIAL_KEYWORDS[i].1,
        Err(_) => HighlightKind::Keyword,
    }
}

struct Scanner<'s, 'o, 'a> {
    hl: Highlighter<'s, 'o, 'a>,
}

impl Scanner<'_, '_, '_> {
    fn run(&mut self) {
        while !self.hl.eof() {
            self.consume_anything();
        }
    }

    fn consume_anything(&mut self) {
        let rem = self.hl.remainder();
        match rem[0] {
            b' ' | b'\t' | b'\r' | b'\n' => self.hl.advance(1),
            b'0'..=b'9' | b'-' => {
                if !self.expect_number() {
                    self.hl
                        .emit_and_advance(1, HighlightKind::Error, Coalescing::Forced);
                }
            }
            b'"' => self.consume_string(),
            b'(' | b')' => {
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolParens, Coalescing::Normal);
            }
            b'[' | b']' => {
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolSquare, Coalescing::Normal);
            }
            b'{' | b'}' => {
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);
            }
            b',' | b':' | b'<' | b'=' | b'>' | b'*' | b'!' | b'#' => {
                self.hl
                    .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
            }
            b';' => self.consume_line_comment(),
            b'/' => {
                if !self.expect_block_comment() {
                    self.hl
                        .emit_and_advance(1, HighlightKind::Error, Coalescing::Forced);
                }
            }
            b'%' | b'@' => self.consume_identifier(),
            b's' | b'u' => {
                // s0x / u0x signed and unsigned hex integer constants.
                if !self.expect_number() && !self.expect_keyword_or_label() {
                    self.hl
                        .emit_and_advance(1, HighlightKind::Error, Coalescing::Forced);
                }
            }
            _ => {
                if !self.expect_keyword_or_label() {
                    self.hl
                        .emit_and_advance(1, HighlightKind::Error, Coalescing::Forced);
                }
            }
        }
    }

    fn consume_line_comment(&mut self) {
        self.hl
            .emit_and_advance(1, HighlightKind::CommentDelim, Coalescing::Normal);
        let line = match_crlf_line(self.hl.remainder());
        if line.content_length != 0 {
            self.hl.emit_and_advance(
                line.content_length,
                HighlightKind::Comment,
                Coalescing::Normal,
            );
        }
        self.hl.advance(line.terminator_length);
    }

    fn expect_block_comment(&mut self) -> bool {
        let comment = match_enclosed(self.hl.remainder(), BLOCK_COMMENT_PREFIX, BLOCK_COMMENT_SUFFIX);
        if !comment.matched() {
            return false;
        }
        self.hl.highlight_enclosed_comment(
            comment,
            BLOCK_COMMENT_PREFIX.len(),
            BLOCK_COMMENT_SUFFIX.len(),
        );
        true
    }

    fn consume_identifier(&mut self) {
        let length = match_identifier(self.hl.remainder());
        debug_assert!(length != 0);
        // `%` marks locals and `@` globals; highlighting them as
        // variables and functions is close enough for IR.
        let (sigil_kind, name_kind) = if self.hl.remainder().starts_with(b"%") {
            (HighlightKind::NameVarDelim, HighlightKind::NameVar)
        } else {
            (HighlightKind::NameFunctionDelim, HighlightKind::NameFunction)
        };
        self.hl.emit_and_advance(1, sigil_kind, Coalescing::Normal);
        if length > 1 {
            self.hl
                .emit_and_advance(length - 1, name_kind, Coalescing::Normal);
        }
    }

    fn expect_keyword_or_label(&mut self) -> bool {
        let length = ascii::length_if(self.hl.remainder(), is_keyword_char);
        if length == 0 {
            return false;
        }
        if self.hl.remainder()[length..].starts_with(b":") {
            self.hl
                .emit_and_advance(length, HighlightKind::NameLabelDecl, Coalescing::Normal);
            self.hl
                .emit_and_advance(1, HighlightKind::NameLabelDelim, Coalescing::Normal);
            return true;
        }
        let kind = classify_keyword(&self.hl.remainder()[..length]);
        self.hl.emit_and_advance(length, kind, Coalescing::Normal);
        true
    }

    fn consume_string(&mut self) {
        self.hl
            .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);

        let mut run = 0;
        loop {
            let rem = self.hl.remainder();
            if run >= rem.len() {
                break;
            }
            match rem[run] {
                b'"' => {
                    self.flush_run(&mut run);
                    self.hl
                        .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
                    return;
                }
                b'\\' => {
                    self.flush_run(&mut run);
                    let rem = self.hl.remainder();
                    if rem.starts_with(b"\\\\") {
                        self.hl.emit_and_advance(
                            2,
                            HighlightKind::StringEscape,
                            Coalescing::Normal,
                        );
                    } else {
                        // `\xx` with two hex digits.
                        let escape = match_common_escape(CommonEscape::Hex2, rem, 1);
                        if escape.matched() && !escape.erroneous {
                            self.hl.emit_and_advance(
                                escape.length,
                                HighlightKind::StringEscape,
                                Coalescing::Normal,
                            );
                        } else {
                            self.hl
                                .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
                        }
                    }
                }
                _ => run += 1,
            }
        }
        // Unterminated string.
        self.flush_run(&mut run);
    }

    fn flush_run(&mut self, run: &mut usize) {
        if *run != 0 {
            self.hl
                .emit_and_advance(*run, HighlightKind::String, Coalescing::Normal);
            *run = 0;
        }
    }

    fn expect_number(&mut self) -> bool {
        use crate::numeric::*;
        static PREFIXES: &[NumberPrefix] = &[
            NumberPrefix {
                text: b"0x",
                base: 16,
            },
            NumberPrefix {
                text: b"0xK",
                base: 16,
            },
            NumberPrefix {
                text: b"0xL",
                base: 16,
            },
            NumberPrefix {
                text: b"0xM",
                base: 16,
            },
            NumberPrefix {
                text: b"0xR",
                base: 16,
            },
            NumberPrefix {
                text: b"s0x",
                base: 16,
            },
            NumberPrefix {
                text: b"u0x",
                base: 16,
            },
        ];
        static EXPONENTS: &[ExponentSeparator] = &[
            ExponentSeparator { text: b"e", base: 10 },
            ExponentSeparator {
                text: b"e+",
                base: 10,
            },
            ExponentSeparator {
                text: b"e-",
                base: 10,
            },
            ExponentSeparator { text: b"E", base: 10 },
            ExponentSeparator {
                text: b"E+",
                base: 10,
            },
            ExponentSeparator {
                text: b"E-",
                base: 10,
            },
        ];
        static OPTIONS: NumberOptions = NumberOptions {
            signs: MatchedSigns::MinusOnly,
            prefixes: PREFIXES,
            exponent_separators: EXPONENTS,
            suffixes: &[],
            default_leading_zero_base: 0,
            digit_separator: 0,
            nonempty_integer: false,
        };
        let number = match_common_number(self.hl.remainder(), &OPTIONS);
        if !number.matched() {
            return false;
        }
        self.hl.highlight_number(number, None);
        true
    }
}

pub(crate) fn highlight(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    Scanner {
        hl: Highlighter::new(source, out, *options),
    }
    .run();
}
