//! Shared lexical matchers used by several scanners.

use glint_util::ascii;

/// A match for a prefix-delimited, suffix-delimited construct.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnclosedResult {
    /// Total length of the match, including prefix and (when present)
    /// suffix. Zero means no match.
    pub length: usize,
    /// Whether the suffix was found before the end of input.
    pub is_terminated: bool,
}

impl EnclosedResult {
    #[inline]
    pub fn matched(&self) -> bool {
        self.length != 0
    }
}

/// Matches a span consisting of `prefix`, arbitrary bytes, and `suffix`.
///
/// Suitable for regular constructs like block comments. If the suffix
/// never appears, the match extends to the end of input with
/// `is_terminated == false`.
pub fn match_enclosed(str: &[u8], prefix: &[u8], suffix: &[u8]) -> EnclosedResult {
    if !str.starts_with(prefix) {
        return EnclosedResult::default();
    }
    match ascii::find_subslice(str, suffix, prefix.len()) {
        Some(i) => EnclosedResult {
            length: i + suffix.len(),
            is_terminated: true,
        },
        None => EnclosedResult {
            length: str.len(),
            is_terminated: false,
        },
    }
}

/// A single line split into content and terminator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LineResult {
    /// Length of the line contents, possibly zero.
    pub content_length: usize,
    /// Length of the terminator: 0 at end of input, 1 for LF or CR,
    /// 2 for CRLF.
    pub terminator_length: usize,
}

/// Matches one line at the start of `str`, terminated by LF, CR, or CRLF.
pub fn match_crlf_line(str: &[u8]) -> LineResult {
    let mut length = 0;
    while length < str.len() {
        match str[length] {
            b'\n' => {
                return LineResult {
                    content_length: length,
                    terminator_length: 1,
                }
            }
            b'\r' => {
                let terminator = if str[length + 1..].starts_with(b"\n") {
                    2
                } else {
                    1
                };
                return LineResult {
                    content_length: length,
                    terminator_length: terminator,
                };
            }
            _ => length += 1,
        }
    }
    LineResult {
        content_length: length,
        terminator_length: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_enclosed_terminated() {
        let r = match_enclosed(b"/* abc */ rest", b"/*", b"*/");
        assert_eq!(r.length, 9);
        assert!(r.is_terminated);
    }

    #[test]
    fn test_match_enclosed_unterminated() {
        let r = match_enclosed(b"/* abc", b"/*", b"*/");
        assert_eq!(r.length, 6);
        assert!(!r.is_terminated);
        assert!(r.matched());
    }

    #[test]
    fn test_match_enclosed_no_match() {
        let r = match_enclosed(b"abc", b"/*", b"*/");
        assert!(!r.matched());
    }

    #[test]
    fn test_match_enclosed_empty_body() {
        let r = match_enclosed(b"/**/", b"/*", b"*/");
        assert_eq!(r.length, 4);
        assert!(r.is_terminated);
    }

    #[test]
    fn test_match_crlf_line() {
        assert_eq!(
            match_crlf_line(b"abc\ndef"),
            LineResult {
                content_length: 3,
                terminator_length: 1
            }
        );
        assert_eq!(
            match_crlf_line(b"abc\r\ndef"),
            LineResult {
                content_length: 3,
                terminator_length: 2
            }
        );
        assert_eq!(
            match_crlf_line(b"abc\rdef"),
            LineResult {
                content_length: 3,
                terminator_length: 1
            }
        );
        assert_eq!(
            match_crlf_line(b"abc"),
            LineResult {
                content_length: 3,
                terminator_length: 0
            }
        );
        assert_eq!(
            match_crlf_line(b"\n"),
            LineResult {
                content_length: 0,
                terminator_length: 1
            }
        );
    }
}
