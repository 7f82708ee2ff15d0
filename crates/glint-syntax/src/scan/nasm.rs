//! NASM assembly scanner.
//!
//! Line-structured like all assemblers: an optional label, a mnemonic
//! or directive, then operands. Labels are recognized by lookahead for
//! a trailing `:`; `%` starts a preprocessor directive; `$` and `$$`
//! refer to the current position. Numeric literals accept both prefix
//! (`0x`, `0b`, `0o`) and suffix (`h`, `q`, `o`, `b`, `d`) radix
//! notation.

use glint_util::ascii;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::highlighter::{Coalescing, Highlighter};
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};

fn is_label_start(c: u8) -> bool {
    ascii::is_alpha(c) || matches!(c, b'.' | b'_' | b'?')
}

fn is_label_char(c: u8) -> bool {
    ascii::is_alphanumeric(c) || matches!(c, b'_' | b'$' | b'#' | b'@' | b'~' | b'.' | b'?')
}

fn is_identifier_start(c: u8) -> bool {
    ascii::is_alpha(c) || matches!(c, b'.' | b'_')
}

fn is_identifier_char(c: u8) -> bool {
    ascii::is_alphanumeric(c) || matches!(c, b'_' | b'.')
}

/// A `name:` at the start of a line. The colon must actually end the
/// label: a label character (or second colon) right after it means
/// this was not a line label after all.
fn match_line_label(str: &[u8]) -> usize {
    if str.is_empty() || !is_label_start(str[0]) {
        return 0;
    }
    let length = ascii::length_if(str, is_label_char);
    if !str[length..].starts_with(b":") {
        return 0;
    }
    match str.get(length + 1) {
        Some(&c) if is_label_char(c) || c == b':' => 0,
        _ => length + 1,
    }
}

fn match_line_comment(str: &[u8]) -> usize {
    if !str.starts_with(b";") {
        return 0;
    }
    ascii::length_if_not(str, |c| c == b'\n' || c == b'\r')
}

/// Integer and float formats: radix prefixes, `h`/`q`/`o`/`b`/`d`
/// radix suffixes, and `1.5e3` floats. Returns `(length, erroneous)`.
fn match_number(str: &[u8]) -> (usize, bool) {
    if str.is_empty() || !ascii::is_digit(str[0]) && str[0] != b'$' {
        return (0, false);
    }
    // `$0A` is the legacy hex form; require a digit after the `$`.
    let start = usize::from(str[0] == b'$');
    if start == 1 && !str[1..].first().is_some_and(|c| ascii::is_digit(*c)) {
        return (0, false);
    }

    if str[start..].starts_with(b"0x")
        || str[start..].starts_with(b"0X")
        || str[start..].starts_with(b"0h")
    {
        let digits = ascii::length_if(&str[start + 2..], |c| {
            ascii::is_hex_digit(c) || c == b'_'
        });
        return (start + 2 + digits, digits == 0);
    }
    if str[start..].starts_with(b"0b") || str[start..].starts_with(b"0o") || str[start..].starts_with(b"0q")
    {
        let digits = ascii::length_if(&str[start + 2..], |c| {
            c.is_ascii_digit() || c == b'_'
        });
        return (start + 2 + digits, digits == 0);
    }

    // Digits with a possible radix suffix or float tail. Hex digits
    // are accepted throughout so that `0DEADh` scans as one token.
    let digits = ascii::length_if(&str[start..], |c| ascii::is_hex_digit(c) || c == b'_');
    let mut length = start + digits;
    if str[length..].starts_with(b"h") || str[length..].starts_with(b"H") {
        return (length + 1, false);
    }
    // A decimal-looking run may continue as a float.
    let decimal = ascii::length_if(&str[start..], |c| ascii::is_digit(c) || c == b'_');
    if decimal == digits {
        if str[length..].starts_with(b".") {
            length += 1;
            length += ascii::length_if(&str[length..], |c| ascii::is_digit(c) || c == b'_');
        }
        if matches!(str.get(length), Some(b'e' | b'E')) {
            let mut exponent = length + 1;
            if matches!(str.get(exponent), Some(b'+' | b'-')) {
                exponent += 1;
            }
            let exponent_digits = ascii::length_if(&str[exponent..], ascii::is_digit);
            if exponent_digits != 0 {
                length = exponent + exponent_digits;
            }
        }
    }
    (length, false)
}

use HighlightKind::{Keyword, KeywordType, NameVar};

static KEYWORDS: Lazy<FxHashMap<&'static [u8], HighlightKind>> = Lazy::new(|| {
    let mut map: FxHashMap<&'static [u8], HighlightKind> = FxHashMap::default();
    // Assembler directives.
    const DIRECTIVES: &[&[u8]] = &[
        b"absolute", b"align", b"alignb", b"bits", b"common", b"cpu", b"default", b"equ",
        b"extern", b"global", b"incbin", b"istruc", b"iend", b"org", b"section", b"segment",
        b"static", b"struc", b"endstruc", b"times", b"use16", b"use32", b"use64",
    ];
    // Data definition and reservation pseudo-instructions.
    const DATA: &[&[u8]] = &[
        b"db", b"dw", b"dd", b"dq", b"dt", b"do", b"dy", b"dz", //
        b"resb", b"resw", b"resd", b"resq", b"rest", b"reso", b"resy", b"resz",
    ];
    // General-purpose, segment, and vector registers.
    const REGISTERS: &[&[u8]] = &[
        b"al", b"ah", b"ax", b"eax", b"rax", //
        b"bl", b"bh", b"bx", b"ebx", b"rbx", //
        b"cl", b"ch", b"cx", b"ecx", b"rcx", //
        b"dl", b"dh", b"dx", b"edx", b"rdx", //
        b"si", b"esi", b"rsi", b"di", b"edi", b"rdi", //
        b"sp", b"esp", b"rsp", b"bp", b"ebp", b"rbp", //
        b"r8", b"r9", b"r10", b"r11", b"r12", b"r13", b"r14", b"r15", //
        b"cs", b"ds", b"es", b"fs", b"gs", b"ss", //
        b"xmm0", b"xmm1", b"xmm2", b"xmm3", b"xmm4", b"xmm5", b"xmm6", b"xmm7", //
        b"ymm0", b"ymm1", b"ymm2", b"ymm3", //
        b"rip",
    ];
    // Operand size specifiers.
    const SIZES: &[&[u8]] = &[
        b"byte", b"word", b"dword", b"qword", b"tword", b"oword", b"yword", b"zword",
    ];
    for &d in DIRECTIVES {
        map.insert(d, Keyword);
    }
    for &d in DATA {
        map.insert(d, KeywordType);
    }
    for &r in REGISTERS {
        map.insert(r, NameVar);
    }
    for &s in SIZES {
        map.insert(s, KeywordType);
    }
    map
});

struct Scanner<'s, 'o, 'a> {
    hl: Highlighter<'s, 'o, 'a>,
    /// Only whitespace has appeared on this line so far, so a label
    /// may still start here.
    fresh_line: bool,
}

impl Scanner<'_, '_, '_> {
    fn run(&mut self) {
        while !self.hl.eof() {
            let rem = self.hl.remainder();
            match rem[0] {
                b' ' | b'\t' | b'\r' => self.hl.advance(1),
                b'\n' => {
                    self.hl.advance(1);
                    self.fresh_line = true;
                }
                b';' => {
                    let length = match_line_comment(rem);
                    self.hl
                        .emit_and_advance(1, HighlightKind::CommentDelim, Coalescing::Normal);
                    if length > 1 {
                        self.hl.emit_and_advance(
                            length - 1,
                            HighlightKind::Comment,
                            Coalescing::Normal,
                        );
                    }
                }
                b'%' => self.consume_preprocessor(),
                b'\'' | b'"' | b'`' => self.consume_string(rem[0]),
                b'$' => self.consume_dollar(),
                b'0'..=b'9' => self.consume_number(),
                b',' | b':' => {
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolPunc, Coalescing::Normal);
                    self.fresh_line = false;
                }
                b'[' | b']' => {
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolSquare, Coalescing::Normal);
                    self.fresh_line = false;
                }
                b'+' | b'-' | b'*' | b'/' | b'<' | b'>' | b'=' | b'&' | b'|' | b'^' | b'~'
                | b'!' => {
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolOp, Coalescing::Normal);
                    self.fresh_line = false;
                }
                _ => self.consume_word(),
            }
        }
    }

    fn consume_preprocessor(&mut self) {
        // `%define`, `%macro`, `%%local_label`, ...
        let rem = self.hl.remainder();
        let name = ascii::length_if(&rem[1..], |c| {
            ascii::is_alphanumeric(c) || c == b'_' || c == b'%'
        });
        if name == 0 {
            self.hl
                .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
            return;
        }
        self.hl
            .emit_and_advance(1, HighlightKind::NameMacroDelim, Coalescing::Normal);
        self.hl
            .emit_and_advance(name, HighlightKind::NameMacro, Coalescing::Normal);
        self.fresh_line = false;
    }

    fn consume_dollar(&mut self) {
        let rem = self.hl.remainder();
        let (number, erroneous) = match_number(rem);
        if number != 0 {
            let kind = if erroneous {
                HighlightKind::Error
            } else {
                HighlightKind::Number
            };
            self.hl.emit_and_advance(number, kind, Coalescing::Normal);
        } else {
            // `$` and `$$`: the start of the current line or section.
            let length = if rem.starts_with(b"$$") { 2 } else { 1 };
            self.hl
                .emit_and_advance(length, HighlightKind::NameVar, Coalescing::Normal);
        }
        self.fresh_line = false;
    }

    fn consume_number(&mut self) {
        let (length, erroneous) = match_number(self.hl.remainder());
        debug_assert!(length != 0);
        let kind = if erroneous {
            HighlightKind::Error
        } else {
            HighlightKind::Number
        };
        self.hl.emit_and_advance(length, kind, Coalescing::Normal);
        self.fresh_line = false;
    }

    fn consume_string(&mut self, quote: u8) {
        let rem = self.hl.remainder();
        let close = ascii::find_byte(&rem[1..], quote);
        self.hl
            .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
        match close {
            Some(content) => {
                if content != 0 {
                    self.hl
                        .emit_and_advance(content, HighlightKind::String, Coalescing::Normal);
                }
                self.hl
                    .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
            }
            None => {
                let rest = self.hl.remainder().len();
                if rest != 0 {
                    self.hl
                        .emit_and_advance(rest, HighlightKind::String, Coalescing::Normal);
                }
            }
        }
        self.fresh_line = false;
    }

    fn consume_word(&mut self) {
        let rem = self.hl.remainder();

        if self.fresh_line {
            let label = match_line_label(rem);
            if label != 0 {
                self.hl.emit_and_advance(
                    label - 1,
                    HighlightKind::NameLabelDecl,
                    Coalescing::Normal,
                );
                self.hl
                    .emit_and_advance(1, HighlightKind::NameLabelDelim, Coalescing::Normal);
                self.fresh_line = false;
                return;
            }
        }

        if is_identifier_start(rem[0]) {
            let length = ascii::length_if(rem, is_identifier_char);
            let word = rem[..length].to_ascii_lowercase();
            let kind = KEYWORDS
                .get(word.as_slice())
                .copied()
                .unwrap_or(HighlightKind::Name);
            self.hl.emit_and_advance(length, kind, Coalescing::Normal);
            self.fresh_line = false;
            return;
        }

        self.hl
            .emit_and_advance(1, HighlightKind::Error, Coalescing::Forced);
        self.fresh_line = false;
    }
}

pub(crate) fn highlight(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    Scanner {
        hl: Highlighter::new(source, out, *options),
        fresh_line: true,
    }
    .run();
}

#[cfg(test)]
mod tests {
    use crate::scan::testing::{dump, tokens};
    use crate::Lang;

    #[test]
    fn test_label_and_instruction() {
        let toks = tokens(b"start:\n  mov eax, 1\n", Lang::Nasm);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 5, "name_label_dcl"),
                (5, 1, "name_label_del"),
                (9, 3, "name"),
                (13, 3, "name_var"),
                (16, 1, "sym_punc"),
                (18, 1, "num"),
            ]
        );
    }

    #[test]
    fn test_comment() {
        let toks = tokens(b"; this is a nasm comment", Lang::Nasm);
        assert_eq!(dump(&toks), vec![(0, 1, "cmt_del"), (1, 23, "cmt")]);
    }

    #[test]
    fn test_directive() {
        let toks = tokens(b"section .text\nglobal _start", Lang::Nasm);
        let ids = dump(&toks);
        assert!(ids.contains(&(0, 7, "kw")));
        assert!(ids.contains(&(14, 6, "kw")));
        assert!(ids.contains(&(21, 6, "name")));
    }

    #[test]
    fn test_dotted_label() {
        let toks = tokens(b".another_nasm_label:", Lang::Nasm);
        assert_eq!(
            dump(&toks),
            vec![(0, 19, "name_label_dcl"), (19, 1, "name_label_del")]
        );
    }

    #[test]
    fn test_label_with_question_marks() {
        let toks = tokens(b".is_this_a_nasm_label??:", Lang::Nasm);
        assert_eq!(toks[0].kind.id(), "name_label_dcl");
        assert_eq!(toks[0].length, 23);
    }

    #[test]
    fn test_embedded_colon_disqualifies_label() {
        let toks = tokens(b".invalid:_nasm_label:", Lang::Nasm);
        // Not a line label; the name decays to a plain identifier.
        assert_eq!(dump(&toks)[0], (0, 8, "name"));
    }

    #[test]
    fn test_preprocessor_directive() {
        let toks = tokens(b"%define X 1", Lang::Nasm);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 1, "name_macro_del"),
                (1, 6, "name_macro"),
                (8, 1, "name"),
                (10, 1, "num"),
            ]
        );
    }

    #[test]
    fn test_hex_suffix_number() {
        let toks = tokens(b"mov ax, 0DEADh", Lang::Nasm);
        let ids = dump(&toks);
        assert!(ids.contains(&(8, 6, "num")));
    }

    #[test]
    fn test_hex_prefix_number() {
        let toks = tokens(b"0x1F", Lang::Nasm);
        assert_eq!(dump(&toks), vec![(0, 4, "num")]);
    }

    #[test]
    fn test_string() {
        let toks = tokens(b"db 'hi', 0", Lang::Nasm);
        assert_eq!(
            dump(&toks),
            vec![
                (0, 2, "kw_type"),
                (3, 1, "str_del"),
                (4, 2, "str"),
                (6, 1, "str_del"),
                (7, 1, "sym_punc"),
                (9, 1, "num"),
            ]
        );
    }

    #[test]
    fn test_dollar_position() {
        let toks = tokens(b"len equ $ - msg", Lang::Nasm);
        let ids = dump(&toks);
        assert!(ids.contains(&(8, 1, "name_var")));
        assert!(ids.contains(&(4, 3, "kw")));
    }
}
