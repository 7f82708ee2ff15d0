//! Rendering of highlighted source to HTML.
//!
//! The second half of the pipeline: tokens wrap their source spans in
//! `<span>` elements carrying the kind's short id in an attribute, and
//! everything between tokens is copied through verbatim. All source
//! text is entity-escaped.

use crate::{highlight, HighlightError, HighlightOptions, Lang, Token, TokenBuffer};

/// How highlighted spans are written.
#[derive(Clone, Debug)]
pub struct HtmlOptions {
    /// The element name wrapping each token. Default `span`.
    pub tag_name: String,
    /// The attribute carrying the highlight id. Default `data-hl`.
    pub attr_name: String,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            tag_name: "span".to_owned(),
            attr_name: "data-hl".to_owned(),
        }
    }
}

fn escape_into(out: &mut String, bytes: &[u8]) {
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        let replacement = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' => "&quot;",
            _ => continue,
        };
        out.push_str(&String::from_utf8_lossy(&bytes[start..i]));
        out.push_str(replacement);
        start = i + 1;
    }
    out.push_str(&String::from_utf8_lossy(&bytes[start..]));
}

/// Highlights `source` and renders the result as HTML text.
///
/// Gaps between tokens (whitespace, plain text) are escaped and copied
/// without a wrapping element.
///
/// # Example
///
/// ```
/// use glint_syntax::html::{to_html, HtmlOptions};
/// use glint_syntax::{HighlightOptions, Lang};
///
/// let html = to_html(
///     b"int x;",
///     Lang::C,
///     &HighlightOptions::default(),
///     &HtmlOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(
///     html,
///     "<span data-hl=\"kw_type\">int</span> <span data-hl=\"name\">x</span>\
///      <span data-hl=\"sym_punc\">;</span>"
/// );
/// ```
pub fn to_html(
    source: &[u8],
    lang: Lang,
    options: &HighlightOptions,
    html_options: &HtmlOptions,
) -> Result<String, HighlightError> {
    let mut output = String::with_capacity(source.len() * 2);
    let mut cursor = 0usize;

    {
        let mut backing = [Token::default(); 512];
        let mut sink = |tokens: &[Token]| {
            for token in tokens {
                let begin = token.begin as usize;
                let end = token.end() as usize;
                if cursor < begin {
                    escape_into(&mut output, &source[cursor..begin]);
                }
                output.push('<');
                output.push_str(&html_options.tag_name);
                output.push(' ');
                output.push_str(&html_options.attr_name);
                output.push_str("=\"");
                output.push_str(token.kind.id());
                output.push_str("\">");
                escape_into(&mut output, &source[begin..end]);
                output.push_str("</");
                output.push_str(&html_options.tag_name);
                output.push('>');
                cursor = end;
            }
        };
        let mut buffer = TokenBuffer::new(&mut backing, &mut sink);
        highlight(source, lang, &mut buffer, options)?;
        buffer.flush();
    }

    if cursor < source.len() {
        escape_into(&mut output, &source[cursor..]);
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_source_text() {
        let html = to_html(
            b"1<2",
            Lang::Txt,
            &HighlightOptions::default(),
            &HtmlOptions::default(),
        )
        .unwrap();
        assert_eq!(html, "1&lt;2");
    }

    #[test]
    fn test_wraps_tokens() {
        let html = to_html(
            b"// x",
            Lang::C,
            &HighlightOptions::default(),
            &HtmlOptions::default(),
        )
        .unwrap();
        assert_eq!(
            html,
            "<span data-hl=\"cmt_del\">//</span><span data-hl=\"cmt\"> x</span>"
        );
    }

    #[test]
    fn test_custom_tag_and_attr() {
        let html_options = HtmlOptions {
            tag_name: "h-".to_owned(),
            attr_name: "data-h".to_owned(),
        };
        let html = to_html(b"7", Lang::Json, &HighlightOptions::default(), &html_options).unwrap();
        assert_eq!(html, "<h- data-h=\"num\">7</h->");
    }

    #[test]
    fn test_plain_text_has_no_spans() {
        let html = to_html(
            b"nothing here",
            Lang::Txt,
            &HighlightOptions::default(),
            &HtmlOptions::default(),
        )
        .unwrap();
        assert_eq!(html, "nothing here");
    }

    #[test]
    fn test_escaped_quote_in_string_token() {
        let html = to_html(
            br#""a""#,
            Lang::Json,
            &HighlightOptions::default(),
            &HtmlOptions::default(),
        )
        .unwrap();
        assert!(html.contains("&quot;"));
    }
}
