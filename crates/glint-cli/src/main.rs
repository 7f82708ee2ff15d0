//! glint - highlight source code on the terminal or as HTML.
//!
//! Reads a file (or standard input), picks the language from `--lang`
//! or the file extension, and writes the highlighted result to
//! standard output in one of three formats.

mod ansi;
mod output;

use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use glint_syntax::{HighlightOptions, Lang};
use indexmap::IndexMap;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Highlight source code as ANSI, HTML, or a token dump.
#[derive(Parser, Debug)]
#[command(name = "glint")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Highlight source code as ANSI, HTML, or a token dump", long_about = None)]
struct Cli {
    /// Input file; standard input when omitted
    file: Option<PathBuf>,

    /// Language name or alias; detected from the file extension when
    /// omitted
    #[arg(short, long)]
    lang: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Ansi)]
    format: Format,

    /// Merge adjacent tokens of the same kind
    #[arg(long)]
    coalesce: bool,

    /// Suppress non-standard and cross-language features
    #[arg(long)]
    strict: bool,

    /// List the supported languages and exit
    #[arg(long)]
    list_languages: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    /// ANSI escape sequences for terminals
    Ansi,
    /// HTML span markup
    Html,
    /// One JSON object per token
    Tokens,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_env("GLINT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    if cli.list_languages {
        return list_languages();
    }

    let source = read_source(cli.file.as_deref())?;
    let lang = resolve_lang(&cli)?;
    tracing::debug!(lang = lang.name(), bytes = source.len(), "highlighting");

    let options = HighlightOptions {
        coalescing: cli.coalesce,
        strict: cli.strict,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        Format::Ansi => output::write_ansi(&mut out, &source, lang, &options)?,
        Format::Html => output::write_html(&mut out, &source, lang, &options)?,
        Format::Tokens => output::write_tokens(&mut out, &source, lang, &options)?,
    }
    Ok(())
}

fn read_source(file: Option<&std::path::Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut source = Vec::new();
            std::io::stdin()
                .read_to_end(&mut source)
                .context("failed to read standard input")?;
            Ok(source)
        }
    }
}

fn resolve_lang(cli: &Cli) -> Result<Lang> {
    if let Some(name) = &cli.lang {
        return Lang::from_name(&name.to_ascii_lowercase())
            .with_context(|| format!("unknown language {name:?}; see --list-languages"));
    }
    if let Some(file) = &cli.file {
        if let Some(lang) = Lang::from_path(file) {
            return Ok(lang);
        }
        bail!(
            "cannot detect the language of {}; pass --lang",
            file.display()
        );
    }
    bail!("reading from standard input requires --lang");
}

/// The display registry backing `--list-languages`. An `IndexMap`
/// keeps the listing in registration order, so related languages stay
/// grouped instead of being scattered alphabetically.
fn display_registry() -> IndexMap<Lang, &'static str> {
    const REGISTRATION_ORDER: &[Lang] = &[
        Lang::C,
        Lang::Cpp,
        Lang::JavaScript,
        Lang::TypeScript,
        Lang::Html,
        Lang::Xml,
        Lang::Css,
        Lang::Json,
        Lang::Jsonc,
        Lang::Python,
        Lang::Lua,
        Lang::Bash,
        Lang::Diff,
        Lang::Tex,
        Lang::Latex,
        Lang::Ebnf,
        Lang::Llvm,
        Lang::Nasm,
        Lang::Cowel,
        Lang::Kotlin,
        Lang::Txt,
    ];
    REGISTRATION_ORDER
        .iter()
        .map(|&lang| (lang, lang.display_name()))
        .collect()
}

fn list_languages() -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for (lang, display_name) in display_registry() {
        writeln!(out, "{:<12} {}", lang.name(), display_name)
            .context("writing language list")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_language_once() {
        let registry = display_registry();
        assert_eq!(registry.len(), Lang::all().len());
        for &lang in Lang::all() {
            assert!(registry.contains_key(&lang), "{} missing", lang.name());
        }
    }

    #[test]
    fn test_registry_keeps_registration_order() {
        let registry = display_registry();
        let mut iter = registry.keys();
        assert_eq!(iter.next(), Some(&Lang::C));
        assert_eq!(iter.next(), Some(&Lang::Cpp));
        assert_eq!(registry.keys().last(), Some(&Lang::Txt));
    }
}
