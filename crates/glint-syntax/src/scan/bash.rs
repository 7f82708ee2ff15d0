//! Bash scanner.
//!
//! Word classification is positional: the first word of a command is a
//! command name, later words are arguments, and `-`-words in argument
//! position are options. Parameter and command substitutions recurse
//! with a context that decides which closer (`}` or `)`) ends them.

use glint_util::ascii;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::highlighter::{Coalescing, Highlighter};
use crate::token::HighlightKind;
use crate::{HighlightOptions, TokenBuffer};

fn is_bash_blank(c: u8) -> bool {
    c == b' ' || c == b'\t'
}

fn is_bash_identifier_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_bash_identifier(c: u8) -> bool {
    is_bash_identifier_start(c) || c.is_ascii_digit()
}

/// Bytes that end an unquoted word. Braces are not terminators; a
/// brace only matters at the start of a token or as the closer of a
/// parameter substitution.
fn is_unquoted_terminator(c: u8) -> bool {
    matches!(
        c,
        b' ' | b'\t'
            | b'\n'
            | b'\r'
            | b'\x0B'
            | b'\''
            | b'"'
            | b'\\'
            | b'#'
            | b'|'
            | b'&'
            | b';'
            | b'('
            | b')'
            | b'<'
            | b'>'
    )
}

/// `$0`, `$?`, `$#` and friends.
fn is_special_parameter(c: u8) -> bool {
    matches!(
        c,
        b'*' | b'@' | b'#' | b'?' | b'-' | b'$' | b'!' | b'0'..=b'9'
    )
}

fn starts_with_substitution(str: &[u8]) -> bool {
    str.len() >= 2
        && str[0] == b'$'
        && (str[1] == b'{'
            || str[1] == b'('
            || is_special_parameter(str[1])
            || is_bash_identifier_start(str[1]))
}

pub(crate) fn match_identifier(str: &[u8]) -> usize {
    ascii::length_if_head_tail(str, is_bash_identifier_start, is_bash_identifier)
}

/// A single-quoted string: no escapes of any kind.
fn match_single_quoted(str: &[u8]) -> (usize, bool) {
    debug_assert!(str.starts_with(b"'"));
    match ascii::find_byte(&str[1..], b'\'') {
        Some(i) => (i + 2, true),
        None => (str.len(), false),
    }
}

fn match_comment(str: &[u8]) -> usize {
    debug_assert!(str.starts_with(b"#"));
    match ascii::find_byte(&str[1..], b'\n') {
        Some(i) => i + 1,
        None => str.len(),
    }
}

/// Characters whose backslash escape is honored inside double quotes.
fn is_escapable_in_double_quotes(c: u8) -> bool {
    matches!(c, b'$' | b'`' | b'"' | b'\\' | b'\n')
}

use HighlightKind::{Keyword, KeywordControl};

static KEYWORDS: Lazy<FxHashMap<&'static [u8], HighlightKind>> = Lazy::new(|| {
    let entries: &[(&[u8], HighlightKind)] = &[
        (b"case", KeywordControl),
        (b"coproc", KeywordControl),
        (b"do", KeywordControl),
        (b"done", KeywordControl),
        (b"elif", KeywordControl),
        (b"else", KeywordControl),
        (b"esac", KeywordControl),
        (b"fi", KeywordControl),
        (b"for", KeywordControl),
        (b"function", Keyword),
        (b"if", KeywordControl),
        (b"in", Keyword),
        (b"select", Keyword),
        (b"then", KeywordControl),
        (b"time", Keyword),
        (b"until", KeywordControl),
        (b"while", KeywordControl),
    ];
    entries.iter().copied().collect()
});

/// Two-character redirections and control operators, longest first.
fn match_operator(str: &[u8]) -> usize {
    let Some(&first) = str.first() else { return 0 };
    match first {
        b'&' => {
            if str.starts_with(b"&>>") {
                3
            } else if str.starts_with(b"&&") || str.starts_with(b"&>") {
                2
            } else {
                1
            }
        }
        b'<' => {
            if str.starts_with(b"<<<") {
                3
            } else if str.starts_with(b"<<") || str.starts_with(b"<&") || str.starts_with(b"<>") {
                2
            } else {
                1
            }
        }
        b'>' => {
            if str.starts_with(b">>") || str.starts_with(b">&") {
                2
            } else {
                1
            }
        }
        b'|' => {
            if str.starts_with(b"||") {
                2
            } else {
                1
            }
        }
        _ => 1,
    }
}

/// Where the scanner currently is relative to substitutions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Context {
    File,
    ParameterSub,
    CommandSub,
}

/// Word position within the current simple command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    BeforeCommand,
    InCommand,
    BeforeArgument,
    InArgument,
    ParameterSub,
}

struct Scanner<'s, 'o, 'a> {
    hl: Highlighter<'s, 'o, 'a>,
    state: State,
}

impl Scanner<'_, '_, '_> {
    fn run(&mut self) {
        self.consume_commands(Context::File);
    }

    fn consume_commands(&mut self, context: Context) {
        while !self.hl.eof() {
            let rem = self.hl.remainder();
            match rem[0] {
                b'\\' => self.consume_escape_character(),
                b'\'' => {
                    let (length, terminated) = match_single_quoted(rem);
                    self.highlight_single_quoted(length, terminated);
                }
                b'"' => {
                    self.hl
                        .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
                    self.consume_double_quoted();
                }
                b'#' => {
                    let length = match_comment(rem);
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
                b' ' | b'\t' => {
                    self.hl.advance(ascii::length_if(rem, is_bash_blank));
                    if self.state == State::InCommand || self.state == State::InArgument {
                        self.state = State::BeforeArgument;
                    }
                }
                b'\x0B' | b'\r' | b'\n' => {
                    self.hl.advance(1);
                    self.state = State::BeforeCommand;
                }
                b'$' => {
                    if starts_with_substitution(rem) {
                        self.consume_substitution();
                    } else {
                        self.consume_word(context);
                    }
                }
                b'|' | b'&' | b';' | b'(' | b'<' | b'>' => {
                    let length = match_operator(rem);
                    self.hl
                        .emit_and_advance(length, HighlightKind::SymbolOp, Coalescing::Normal);
                }
                b')' => {
                    if context == Context::CommandSub {
                        self.hl.emit_and_advance(
                            1,
                            HighlightKind::StringInterpolationDelim,
                            Coalescing::Normal,
                        );
                        return;
                    }
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolParens, Coalescing::Normal);
                }
                b'}' => {
                    if context == Context::ParameterSub {
                        self.hl.emit_and_advance(
                            1,
                            HighlightKind::StringInterpolationDelim,
                            Coalescing::Normal,
                        );
                        return;
                    }
                    self.hl
                        .emit_and_advance(1, HighlightKind::SymbolBrace, Coalescing::Normal);
                }
                _ => self.consume_word(context),
            }
        }
    }

    fn consume_word(&mut self, context: Context) {
        let rem = self.hl.remainder();
        let mut length = 0;
        while length < rem.len() {
            if is_unquoted_terminator(rem[length]) {
                break;
            }
            if starts_with_substitution(&rem[length..]) {
                break;
            }
            if context == Context::ParameterSub && rem[length] == b'}' {
                break;
            }
            length += 1;
        }
        if length == 0 {
            // Every dispatch case covers the terminator bytes, so this
            // is unreachable in practice; stay total regardless.
            self.hl
                .emit_and_advance(1, HighlightKind::Error, Coalescing::Normal);
            return;
        }
        let word = &rem[..length];
        match self.state {
            State::BeforeCommand | State::InCommand => {
                let kind = if self.state == State::BeforeCommand {
                    KEYWORDS.get(word).copied()
                } else {
                    None
                };
                self.hl.emit_and_advance(
                    length,
                    kind.unwrap_or(HighlightKind::NameShellCommand),
                    Coalescing::Normal,
                );
                self.state = State::InCommand;
            }
            State::BeforeArgument => {
                let kind = if word.starts_with(b"-") {
                    HighlightKind::NameShellOption
                } else {
                    HighlightKind::String
                };
                self.hl.emit_and_advance(length, kind, Coalescing::Normal);
                self.state = State::InArgument;
            }
            State::InArgument => {
                self.hl
                    .emit_and_advance(length, HighlightKind::String, Coalescing::Normal);
            }
            State::ParameterSub => {
                self.hl.emit_and_advance(
                    length,
                    HighlightKind::StringInterpolation,
                    Coalescing::Normal,
                );
            }
        }
    }

    fn consume_escape_character(&mut self) {
        let rem = self.hl.remainder();
        if rem.starts_with(b"\\\n") {
            // Line continuation: only the backslash is a token.
            self.hl
                .emit_and_advance(1, HighlightKind::StringEscape, Coalescing::Normal);
            self.hl.advance(1);
        } else {
            self.hl.emit_and_advance(
                2.min(rem.len()),
                HighlightKind::StringEscape,
                Coalescing::Normal,
            );
        }
    }

    fn highlight_single_quoted(&mut self, length: usize, terminated: bool) {
        self.hl
            .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
        let content = length - 1 - usize::from(terminated);
        if content != 0 {
            self.hl
                .emit_and_advance(content, HighlightKind::String, Coalescing::Normal);
        }
        if terminated {
            self.hl
                .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
        }
    }

    /// The body of a `"..."` string: limited escapes and `$`
    /// substitutions remain live.
    fn consume_double_quoted(&mut self) {
        let mut chars = 0;
        loop {
            let rem = self.hl.remainder();
            if chars >= rem.len() {
                break;
            }
            match rem[chars] {
                b'"' => {
                    self.flush_chars(&mut chars);
                    self.hl
                        .emit_and_advance(1, HighlightKind::StringDelim, Coalescing::Normal);
                    return;
                }
                b'\\' if chars + 1 < rem.len() && is_escapable_in_double_quotes(rem[chars + 1]) => {
                    self.flush_chars(&mut chars);
                    self.hl
                        .emit_and_advance(2, HighlightKind::StringEscape, Coalescing::Normal);
                }
                b'$' if starts_with_substitution(&rem[chars..]) => {
                    self.flush_chars(&mut chars);
                    self.consume_substitution();
                }
                _ => chars += 1,
            }
        }
        self.flush_chars(&mut chars);
    }

    fn flush_chars(&mut self, chars: &mut usize) {
        if *chars != 0 {
            self.hl
                .emit_and_advance(*chars, HighlightKind::String, Coalescing::Normal);
            *chars = 0;
        }
    }

    fn consume_substitution(&mut self) {
        let rem = self.hl.remainder();
        debug_assert!(rem.len() >= 2 && rem[0] == b'$');
        match rem[1] {
            b'{' => {
                self.hl.emit_and_advance(
                    2,
                    HighlightKind::StringInterpolationDelim,
                    Coalescing::Normal,
                );
                self.state = State::ParameterSub;
                self.consume_commands(Context::ParameterSub);
            }
            b'(' => {
                self.hl.emit_and_advance(
                    2,
                    HighlightKind::StringInterpolationDelim,
                    Coalescing::Normal,
                );
                self.state = State::BeforeCommand;
                self.consume_commands(Context::CommandSub);
            }
            c if is_special_parameter(c) => {
                self.hl.emit_and_advance(
                    2,
                    HighlightKind::StringInterpolation,
                    Coalescing::Normal,
                );
                self.update_state_after_substitution();
            }
            _ => {
                let id = match_identifier(&rem[1..]);
                debug_assert!(id != 0);
                self.hl.emit_and_advance(
                    id + 1,
                    HighlightKind::StringInterpolation,
                    Coalescing::Normal,
                );
                self.update_state_after_substitution();
            }
        }
    }

    fn update_state_after_substitution(&mut self) {
        if self.state == State::BeforeCommand {
            self.state = State::InCommand;
        } else if self.state == State::BeforeArgument {
            self.state = State::InArgument;
        }
    }
}

pub(crate) fn highlight(source: &[u8], out: &mut TokenBuffer<'_>, options: &HighlightOptions) {
    Scanner {
        hl: Highlighter::new(source, out, *options),
        state: State::BeforeCommand,
    }
    .run();
}
