//! The scaffold shared by every language scanner.

use crate::buffer::TokenBuffer;
use crate::numeric::NumberResult;
use crate::parse::EnclosedResult;
use crate::token::{HighlightKind, Token};
use crate::{HighlightOptions, Lang};

/// How [`Highlighter::emit`] merges adjacent tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Coalescing {
    /// Coalesce only when the options ask for it.
    Normal,
    /// Always coalesce with a touching token of the same kind.
    /// Used at syntactic positions that form one logical token out of
    /// several lexical pieces, like CSS selector sequences.
    Forced,
}

/// Number of tokens buffered for one nested-language run before they
/// are forwarded to the outer buffer.
const NESTED_BUFFER_LEN: usize = 256;

/// Per-invocation scanner state shared by all languages: the source,
/// the consumption index, the output buffer, and the emit protocol.
///
/// Language scanners own one of these and drive it from their own
/// state machine. No state outlives the highlight call.
pub(crate) struct Highlighter<'s, 'o, 'a> {
    source: &'s [u8],
    index: usize,
    out: &'o mut TokenBuffer<'a>,
    options: HighlightOptions,
}

impl<'s, 'o, 'a> Highlighter<'s, 'o, 'a> {
    pub(crate) fn new(
        source: &'s [u8],
        out: &'o mut TokenBuffer<'a>,
        options: HighlightOptions,
    ) -> Self {
        Self {
            source,
            index: 0,
            out,
            options,
        }
    }

    /// The unconsumed suffix of the source.
    #[inline]
    pub(crate) fn remainder(&self) -> &'s [u8] {
        &self.source[self.index..]
    }

    /// Byte offset consumed so far.
    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub(crate) fn eof(&self) -> bool {
        self.index >= self.source.len()
    }

    #[inline]
    pub(crate) fn options(&self) -> HighlightOptions {
        self.options
    }

    /// Emits one token, or coalesces it into the previous one.
    ///
    /// Coalescing requires the previous token to have the same kind
    /// and to end exactly where this one begins. It never crosses a
    /// flush boundary because a flushed buffer has no previous token.
    pub(crate) fn emit(
        &mut self,
        begin: usize,
        length: usize,
        kind: HighlightKind,
        coalescing: Coalescing,
    ) {
        debug_assert!(length != 0);
        debug_assert!(begin + length <= self.source.len());

        if coalescing == Coalescing::Forced || self.options.coalescing {
            if let Some(last) = self.out.last_mut() {
                if last.kind == kind && last.end() as usize == begin {
                    last.length += length as u32;
                    return;
                }
            }
        }
        self.out.push(Token::new(begin, length, kind));
    }

    /// Advances past `length` bytes without emitting. Used for spans
    /// with no highlight, like plain text in markup languages.
    #[inline]
    pub(crate) fn advance(&mut self, length: usize) {
        debug_assert!(self.index + length <= self.source.len());
        self.index += length;
    }

    /// Emits the next `length` bytes as one token and advances.
    pub(crate) fn emit_and_advance(
        &mut self,
        length: usize,
        kind: HighlightKind,
        coalescing: Coalescing,
    ) {
        self.emit(self.index, length, kind, coalescing);
        self.advance(length);
    }

    /// Highlights a span of code in another language and advances past
    /// it. The nested scanner sees a source starting at offset zero;
    /// its tokens are shifted by the current index and forwarded to
    /// this highlighter's buffer in order.
    pub(crate) fn consume_nested(&mut self, lang: Lang, length: usize) {
        if length == 0 {
            return;
        }
        let nested_source = &self.source[self.index..self.index + length];
        let base = self.index as u32;
        let options = self.options;

        let mut collected: Vec<Token> = Vec::new();
        {
            let mut scratch = [Token::default(); NESTED_BUFFER_LEN];
            let mut sink = |tokens: &[Token]| {
                collected.extend(tokens.iter().map(|t| Token {
                    begin: t.begin + base,
                    ..*t
                }));
            };
            let mut sub = TokenBuffer::new(&mut scratch, &mut sink);
            let status = crate::highlight(nested_source, lang, &mut sub, &options);
            debug_assert!(status.is_ok());
            sub.flush();
        }
        self.out.extend_from_slice(&collected);
        self.advance(length);
    }

    /// Emits the structural pieces of a matched numeric literal.
    ///
    /// Erroneous literals become a single error token. Otherwise the
    /// sign and prefix are `number_decor`, digits are `number`, the
    /// radix point and exponent separator are `number_delim`, and the
    /// suffix is `number_decor`. With `digit_separator`, digit runs are
    /// further split around each separator byte.
    pub(crate) fn highlight_number(&mut self, result: NumberResult, digit_separator: Option<u8>) {
        debug_assert!(result.matched());
        if result.erroneous {
            self.emit_and_advance(result.length, HighlightKind::Error, Coalescing::Normal);
            return;
        }

        if result.sign + result.prefix != 0 {
            self.emit_and_advance(
                result.sign + result.prefix,
                HighlightKind::NumberDecor,
                Coalescing::Normal,
            );
        }
        self.highlight_digits(result.integer, digit_separator);
        if result.radix_point != 0 {
            self.emit_and_advance(
                result.radix_point,
                HighlightKind::NumberDelim,
                Coalescing::Normal,
            );
        }
        self.highlight_digits(result.fractional, digit_separator);
        if result.exponent_sep != 0 {
            self.emit_and_advance(
                result.exponent_sep,
                HighlightKind::NumberDelim,
                Coalescing::Normal,
            );
        }
        self.highlight_digits(result.exponent_digits, digit_separator);
        if result.suffix != 0 {
            self.emit_and_advance(result.suffix, HighlightKind::NumberDecor, Coalescing::Normal);
        }
    }

    /// Emits a digit run, splitting out separator bytes as
    /// `number_delim` when a separator is in use.
    fn highlight_digits(&mut self, length: usize, separator: Option<u8>) {
        if length == 0 {
            return;
        }
        let Some(separator) = separator else {
            self.emit_and_advance(length, HighlightKind::Number, Coalescing::Normal);
            return;
        };

        let digits = &self.source[self.index..self.index + length];
        let mut run = 0;
        for i in 0..digits.len() {
            if digits[i] == separator {
                if run != 0 {
                    self.emit_and_advance(run, HighlightKind::Number, Coalescing::Normal);
                    run = 0;
                }
                self.emit_and_advance(1, HighlightKind::NumberDelim, Coalescing::Normal);
            } else {
                run += 1;
            }
        }
        if run != 0 {
            self.emit_and_advance(run, HighlightKind::Number, Coalescing::Normal);
        }
    }

    /// Emits a delimited construct: prefix delimiter, content, and
    /// (only when terminated) suffix delimiter, then advances past it.
    pub(crate) fn highlight_enclosed(
        &mut self,
        enclosed: EnclosedResult,
        prefix_length: usize,
        suffix_length: usize,
        content_kind: HighlightKind,
        delimiter_kind: HighlightKind,
    ) {
        debug_assert!(enclosed.matched());
        debug_assert!(prefix_length <= enclosed.length);
        debug_assert!(!enclosed.is_terminated || prefix_length + suffix_length <= enclosed.length);

        self.emit(self.index, prefix_length, delimiter_kind, Coalescing::Normal);
        let suffix = if enclosed.is_terminated { suffix_length } else { 0 };
        let content_length = enclosed.length - prefix_length - suffix;
        if content_length != 0 {
            self.emit(
                self.index + prefix_length,
                content_length,
                content_kind,
                Coalescing::Normal,
            );
        }
        if enclosed.is_terminated {
            self.emit(
                self.index + prefix_length + content_length,
                suffix_length,
                delimiter_kind,
                Coalescing::Normal,
            );
        }
        self.advance(enclosed.length);
    }

    /// [`Self::highlight_enclosed`] with comment kinds.
    pub(crate) fn highlight_enclosed_comment(
        &mut self,
        enclosed: EnclosedResult,
        prefix_length: usize,
        suffix_length: usize,
    ) {
        self.highlight_enclosed(
            enclosed,
            prefix_length,
            suffix_length,
            HighlightKind::Comment,
            HighlightKind::CommentDelim,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{match_common_number, NumberOptions, NumberPrefix};

    fn run(source: &[u8], options: HighlightOptions, f: impl FnOnce(&mut Highlighter)) -> Vec<Token> {
        let mut collected = Vec::new();
        let mut backing = [Token::default(); 16];
        let mut sink = |tokens: &[Token]| collected.extend_from_slice(tokens);
        let mut out = TokenBuffer::new(&mut backing, &mut sink);
        let mut hl = Highlighter::new(source, &mut out, options);
        f(&mut hl);
        out.flush();
        drop(out);
        collected
    }

    #[test]
    fn test_emit_and_advance() {
        let tokens = run(b"abc", HighlightOptions::default(), |hl| {
            hl.emit_and_advance(1, HighlightKind::Name, Coalescing::Normal);
            hl.emit_and_advance(2, HighlightKind::Name, Coalescing::Normal);
        });
        assert_eq!(
            tokens,
            vec![
                Token::new(0, 1, HighlightKind::Name),
                Token::new(1, 2, HighlightKind::Name),
            ]
        );
    }

    #[test]
    fn test_coalescing_option_merges_touching_tokens() {
        let options = HighlightOptions {
            coalescing: true,
            ..HighlightOptions::default()
        };
        let tokens = run(b"abc", options, |hl| {
            hl.emit_and_advance(1, HighlightKind::Name, Coalescing::Normal);
            hl.emit_and_advance(2, HighlightKind::Name, Coalescing::Normal);
        });
        assert_eq!(tokens, vec![Token::new(0, 3, HighlightKind::Name)]);
    }

    #[test]
    fn test_forced_coalescing() {
        let tokens = run(b"li::x", HighlightOptions::default(), |hl| {
            hl.emit_and_advance(2, HighlightKind::MarkupTag, Coalescing::Normal);
            hl.emit_and_advance(2, HighlightKind::MarkupTag, Coalescing::Forced);
        });
        assert_eq!(tokens, vec![Token::new(0, 4, HighlightKind::MarkupTag)]);
    }

    #[test]
    fn test_no_coalescing_across_kinds() {
        let options = HighlightOptions {
            coalescing: true,
            ..HighlightOptions::default()
        };
        let tokens = run(b"ab", options, |hl| {
            hl.emit_and_advance(1, HighlightKind::Name, Coalescing::Normal);
            hl.emit_and_advance(1, HighlightKind::Keyword, Coalescing::Normal);
        });
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_highlight_number_with_separator() {
        const PREFIXES: &[NumberPrefix] = &[NumberPrefix {
            text: b"0x",
            base: 16,
        }];
        let options = NumberOptions {
            prefixes: PREFIXES,
            digit_separator: b'_',
            ..NumberOptions::default()
        };
        let result = match_common_number(b"0x1_2", &options);
        let tokens = run(b"0x1_2", HighlightOptions::default(), |hl| {
            hl.highlight_number(result, Some(b'_'));
        });
        assert_eq!(
            tokens,
            vec![
                Token::new(0, 2, HighlightKind::NumberDecor),
                Token::new(2, 1, HighlightKind::Number),
                Token::new(3, 1, HighlightKind::NumberDelim),
                Token::new(4, 1, HighlightKind::Number),
            ]
        );
    }

    #[test]
    fn test_highlight_enclosed_unterminated() {
        let enclosed = EnclosedResult {
            length: 4,
            is_terminated: false,
        };
        let tokens = run(b"/*ab", HighlightOptions::default(), |hl| {
            hl.highlight_enclosed_comment(enclosed, 2, 2);
        });
        assert_eq!(
            tokens,
            vec![
                Token::new(0, 2, HighlightKind::CommentDelim),
                Token::new(2, 2, HighlightKind::Comment),
            ]
        );
    }
}
