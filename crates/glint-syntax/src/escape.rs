//! Common escape-sequence sub-patterns shared by string scanners.

use glint_util::ascii;

/// A matched escape sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EscapeResult {
    /// Length of the sequence in bytes, including the backslash.
    /// Zero means no match.
    pub length: usize,
    /// The sequence was recognized but its contents are invalid, for
    /// example `\u{}` or `\x` with no digits.
    pub erroneous: bool,
}

impl EscapeResult {
    #[inline]
    pub fn matched(&self) -> bool {
        self.length != 0
    }
}

/// The common escape sub-patterns. `prefix` in the matchers below is
/// the number of bytes before the payload, e.g. 2 for `\x` or 1 for a
/// bare `\` in LLVM's `\NN` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommonEscape {
    /// Exactly two hex digits.
    Hex2,
    /// Exactly four hex digits.
    Hex4,
    /// Exactly eight hex digits.
    Hex8,
    /// One or more hex digits in braces, like `\u{1F600}`.
    HexBraced,
    /// One to three octal digits.
    Octal3,
    /// A line continuation: LF, CR, or CRLF.
    LfCrCrlf,
}

/// Matches the payload of an escape sequence after `prefix` bytes.
///
/// The result length covers the prefix and payload together. A match
/// with too few digits is reported with `erroneous == true` rather
/// than rejected, so the caller can emit an error token of the right
/// length.
pub fn match_common_escape(kind: CommonEscape, str: &[u8], prefix: usize) -> EscapeResult {
    debug_assert!(prefix <= str.len());
    let payload = &str[prefix..];
    match kind {
        CommonEscape::Hex2 => match_fixed_hex(payload, prefix, 2),
        CommonEscape::Hex4 => match_fixed_hex(payload, prefix, 4),
        CommonEscape::Hex8 => match_fixed_hex(payload, prefix, 8),
        CommonEscape::HexBraced => {
            if !payload.starts_with(b"{") {
                return EscapeResult {
                    length: prefix,
                    erroneous: true,
                };
            }
            let digits = ascii::length_if(&payload[1..], ascii::is_hex_digit);
            let after = 1 + digits;
            if payload[after..].starts_with(b"}") {
                EscapeResult {
                    length: prefix + after + 1,
                    erroneous: digits == 0,
                }
            } else {
                EscapeResult {
                    length: prefix + after,
                    erroneous: true,
                }
            }
        }
        CommonEscape::Octal3 => {
            let digits = ascii::length_if(payload, ascii::is_octal_digit).min(3);
            EscapeResult {
                length: prefix + digits,
                erroneous: digits == 0,
            }
        }
        CommonEscape::LfCrCrlf => {
            let terminator = if payload.starts_with(b"\r\n") {
                2
            } else if payload.starts_with(b"\n") || payload.starts_with(b"\r") {
                1
            } else {
                0
            };
            EscapeResult {
                length: prefix + terminator,
                erroneous: terminator == 0,
            }
        }
    }
}

fn match_fixed_hex(payload: &[u8], prefix: usize, expected: usize) -> EscapeResult {
    let digits = ascii::length_if(payload, ascii::is_hex_digit).min(expected);
    EscapeResult {
        length: prefix + digits,
        erroneous: digits != expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex2() {
        let r = match_common_escape(CommonEscape::Hex2, b"\\x41", 2);
        assert_eq!(r.length, 4);
        assert!(!r.erroneous);

        let r = match_common_escape(CommonEscape::Hex2, b"\\x4", 2);
        assert_eq!(r.length, 3);
        assert!(r.erroneous);
    }

    #[test]
    fn test_hex4() {
        let r = match_common_escape(CommonEscape::Hex4, b"\\u0041x", 2);
        assert_eq!(r.length, 6);
        assert!(!r.erroneous);
    }

    #[test]
    fn test_hex_braced() {
        let r = match_common_escape(CommonEscape::HexBraced, b"\\u{1F600}", 2);
        assert_eq!(r.length, 9);
        assert!(!r.erroneous);

        let r = match_common_escape(CommonEscape::HexBraced, b"\\u{}", 2);
        assert_eq!(r.length, 4);
        assert!(r.erroneous);

        let r = match_common_escape(CommonEscape::HexBraced, b"\\u{12", 2);
        assert_eq!(r.length, 5);
        assert!(r.erroneous);
    }

    #[test]
    fn test_octal3() {
        let r = match_common_escape(CommonEscape::Octal3, b"\\777x", 1);
        assert_eq!(r.length, 4);
        assert!(!r.erroneous);

        let r = match_common_escape(CommonEscape::Octal3, b"\\17", 1);
        assert_eq!(r.length, 3);
        assert!(!r.erroneous);
    }

    #[test]
    fn test_line_continuation() {
        let r = match_common_escape(CommonEscape::LfCrCrlf, b"\\\r\nx", 1);
        assert_eq!(r.length, 3);
        assert!(!r.erroneous);

        let r = match_common_escape(CommonEscape::LfCrCrlf, b"\\x", 1);
        assert_eq!(r.length, 1);
        assert!(r.erroneous);
    }
}
