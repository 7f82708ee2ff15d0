//! Output writers for the three CLI formats.

use std::borrow::Cow;
use std::io::Write;

use anyhow::{Context, Result};
use glint_syntax::html::{to_html, HtmlOptions};
use glint_syntax::{highlight, HighlightOptions, Lang, Token, TokenBuffer};
use serde::Serialize;

use crate::ansi;

/// Number of tokens buffered between flushes to the writer.
const BUFFER_LEN: usize = 1024;

/// Writes the source with ANSI colors around highlighted spans.
pub fn write_ansi(
    out: &mut impl Write,
    source: &[u8],
    lang: Lang,
    options: &HighlightOptions,
) -> Result<()> {
    let mut cursor = 0usize;
    let mut io_error = None;

    {
        let mut backing = [Token::default(); BUFFER_LEN];
        let mut sink = |tokens: &[Token]| {
            if io_error.is_some() {
                return;
            }
            for token in tokens {
                let begin = token.begin as usize;
                let end = token.end() as usize;
                let style = ansi::color(token.kind);
                let piece = (|| -> std::io::Result<()> {
                    out.write_all(&source[cursor..begin])?;
                    if style.is_empty() {
                        out.write_all(&source[begin..end])?;
                    } else {
                        out.write_all(style.as_bytes())?;
                        out.write_all(&source[begin..end])?;
                        out.write_all(ansi::RESET.as_bytes())?;
                    }
                    Ok(())
                })();
                if let Err(error) = piece {
                    io_error = Some(error);
                    return;
                }
                cursor = end;
            }
        };
        let mut buffer = TokenBuffer::new(&mut backing, &mut sink);
        highlight(source, lang, &mut buffer, options)?;
        buffer.flush();
    }
    if let Some(error) = io_error {
        return Err(error).context("writing highlighted output");
    }
    out.write_all(&source[cursor..])
        .context("writing highlighted output")?;
    Ok(())
}

/// Writes the source as HTML span markup.
pub fn write_html(
    out: &mut impl Write,
    source: &[u8],
    lang: Lang,
    options: &HighlightOptions,
) -> Result<()> {
    let html = to_html(source, lang, options, &HtmlOptions::default())?;
    out.write_all(html.as_bytes()).context("writing HTML output")?;
    Ok(())
}

/// One line of the token dump: the token itself plus the source text
/// it covers.
#[derive(Serialize)]
struct TokenRecord<'a> {
    #[serde(flatten)]
    token: Token,
    text: Cow<'a, str>,
}

/// Writes one JSON object per token, as JSON Lines.
pub fn write_tokens(
    out: &mut impl Write,
    source: &[u8],
    lang: Lang,
    options: &HighlightOptions,
) -> Result<()> {
    let mut records: Vec<TokenRecord> = Vec::new();
    {
        let mut backing = [Token::default(); BUFFER_LEN];
        let mut sink = |tokens: &[Token]| {
            for &token in tokens {
                let begin = token.begin as usize;
                let end = token.end() as usize;
                records.push(TokenRecord {
                    token,
                    text: String::from_utf8_lossy(&source[begin..end]),
                });
            }
        };
        let mut buffer = TokenBuffer::new(&mut backing, &mut sink);
        highlight(source, lang, &mut buffer, options)?;
        buffer.flush();
    }
    for record in &records {
        let line = serde_json::to_string(record).context("serializing token dump")?;
        writeln!(out, "{line}").context("writing token dump")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ansi_passthrough_without_tokens() {
        let mut out = Vec::new();
        write_ansi(
            &mut out,
            b"plain text",
            Lang::Txt,
            &HighlightOptions::default(),
        )
        .unwrap();
        assert_eq!(out, b"plain text");
    }

    #[test]
    fn test_ansi_styles_keywords() {
        let mut out = Vec::new();
        write_ansi(&mut out, b"int x;", Lang::C, &HighlightOptions::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\x1B["));
        assert!(text.contains("int"));
    }

    #[test]
    fn test_token_dump_shape() {
        let mut out = Vec::new();
        write_tokens(&mut out, b"1", Lang::Json, &HighlightOptions::default()).unwrap();
        let line: serde_json::Value =
            serde_json::from_slice(out.split(|&c| c == b'\n').next().unwrap()).unwrap();
        assert_eq!(line["kind"], "num");
        assert_eq!(line["begin"], 0);
        assert_eq!(line["length"], 1);
        assert_eq!(line["text"], "1");
    }
}
