//! Supported languages and name resolution.

use std::path::Path;

/// A supported input language.
///
/// `Latex` is an alias of `Tex` at the highlighting level; it exists as
/// a distinct tag so that callers can round-trip the name they were
/// given. `Txt` is valid and produces no tokens. `Kotlin` is a
/// recognized tag without a scanner in this distribution; dispatching
/// to it reports [`HighlightError::UnsupportedLanguage`].
///
/// [`HighlightError::UnsupportedLanguage`]: crate::HighlightError::UnsupportedLanguage
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lang {
    Bash,
    C,
    Cowel,
    Cpp,
    Css,
    Diff,
    Ebnf,
    Html,
    JavaScript,
    Json,
    Jsonc,
    Kotlin,
    Latex,
    Llvm,
    Lua,
    Nasm,
    Python,
    Tex,
    Txt,
    TypeScript,
    Xml,
}

/// Name table for [`Lang::from_name`]. Sorted by name for binary search.
const LANG_NAMES: &[(&str, Lang)] = &[
    ("asm", Lang::Nasm),
    ("bash", Lang::Bash),
    ("c", Lang::C),
    ("c++", Lang::Cpp),
    ("cc", Lang::Cpp),
    ("cjs", Lang::JavaScript),
    ("cowel", Lang::Cowel),
    ("cplusplus", Lang::Cpp),
    ("cpp", Lang::Cpp),
    ("css", Lang::Css),
    ("cts", Lang::TypeScript),
    ("cxx", Lang::Cpp),
    ("diff", Lang::Diff),
    ("ebnf", Lang::Ebnf),
    ("h", Lang::C),
    ("h++", Lang::Cpp),
    ("hpp", Lang::Cpp),
    ("htm", Lang::Html),
    ("html", Lang::Html),
    ("hxx", Lang::Cpp),
    ("javascript", Lang::JavaScript),
    ("js", Lang::JavaScript),
    ("json", Lang::Json),
    ("jsonc", Lang::Jsonc),
    ("jsx", Lang::JavaScript),
    ("kotlin", Lang::Kotlin),
    ("kt", Lang::Kotlin),
    ("kts", Lang::Kotlin),
    ("latex", Lang::Latex),
    ("ll", Lang::Llvm),
    ("llvm", Lang::Llvm),
    ("lua", Lang::Lua),
    ("mjs", Lang::JavaScript),
    ("mts", Lang::TypeScript),
    ("nasm", Lang::Nasm),
    ("patch", Lang::Diff),
    ("plaintext", Lang::Txt),
    ("py", Lang::Python),
    ("python", Lang::Python),
    ("sh", Lang::Bash),
    ("shell", Lang::Bash),
    ("tex", Lang::Tex),
    ("text", Lang::Txt),
    ("ts", Lang::TypeScript),
    ("tsx", Lang::TypeScript),
    ("txt", Lang::Txt),
    ("typescript", Lang::TypeScript),
    ("xml", Lang::Xml),
    ("zsh", Lang::Bash),
];

impl Lang {
    /// Resolves a language name or common alias.
    ///
    /// Matching is exact and case-sensitive; names are lowercase.
    ///
    /// # Example
    ///
    /// ```
    /// use glint_syntax::Lang;
    ///
    /// assert_eq!(Lang::from_name("c++"), Some(Lang::Cpp));
    /// assert_eq!(Lang::from_name("mjs"), Some(Lang::JavaScript));
    /// assert_eq!(Lang::from_name("cobol"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Lang> {
        LANG_NAMES
            .binary_search_by_key(&name, |&(n, _)| n)
            .ok()
            .map(|i| LANG_NAMES[i].1)
    }

    /// Resolves a language from a file path by its extension.
    ///
    /// # Example
    ///
    /// ```
    /// use glint_syntax::Lang;
    ///
    /// assert_eq!(Lang::from_path("src/scan/mod.hpp"), Some(Lang::Cpp));
    /// assert_eq!(Lang::from_path("Makefile"), None);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Option<Lang> {
        let extension = path.as_ref().extension()?.to_str()?;
        Self::from_name(&extension.to_ascii_lowercase())
    }

    /// Returns the canonical lowercase name of the language.
    pub fn name(self) -> &'static str {
        match self {
            Lang::Bash => "bash",
            Lang::C => "c",
            Lang::Cowel => "cowel",
            Lang::Cpp => "cpp",
            Lang::Css => "css",
            Lang::Diff => "diff",
            Lang::Ebnf => "ebnf",
            Lang::Html => "html",
            Lang::JavaScript => "javascript",
            Lang::Json => "json",
            Lang::Jsonc => "jsonc",
            Lang::Kotlin => "kotlin",
            Lang::Latex => "latex",
            Lang::Llvm => "llvm",
            Lang::Lua => "lua",
            Lang::Nasm => "nasm",
            Lang::Python => "python",
            Lang::Tex => "tex",
            Lang::Txt => "txt",
            Lang::TypeScript => "typescript",
            Lang::Xml => "xml",
        }
    }

    /// Returns a human-readable display name.
    pub fn display_name(self) -> &'static str {
        match self {
            Lang::Bash => "Bash",
            Lang::C => "C",
            Lang::Cowel => "COWEL",
            Lang::Cpp => "C++",
            Lang::Css => "CSS",
            Lang::Diff => "Diff",
            Lang::Ebnf => "EBNF",
            Lang::Html => "HTML",
            Lang::JavaScript => "JavaScript",
            Lang::Json => "JSON",
            Lang::Jsonc => "JSON with Comments",
            Lang::Kotlin => "Kotlin",
            Lang::Latex => "LaTeX",
            Lang::Llvm => "LLVM IR",
            Lang::Lua => "Lua",
            Lang::Nasm => "NASM",
            Lang::Python => "Python",
            Lang::Tex => "TeX",
            Lang::Txt => "Plain Text",
            Lang::TypeScript => "TypeScript",
            Lang::Xml => "XML",
        }
    }

    /// All languages, in canonical-name order.
    pub fn all() -> &'static [Lang] {
        &[
            Lang::Bash,
            Lang::C,
            Lang::Cowel,
            Lang::Cpp,
            Lang::Css,
            Lang::Diff,
            Lang::Ebnf,
            Lang::Html,
            Lang::JavaScript,
            Lang::Json,
            Lang::Jsonc,
            Lang::Kotlin,
            Lang::Latex,
            Lang::Llvm,
            Lang::Lua,
            Lang::Nasm,
            Lang::Python,
            Lang::Tex,
            Lang::Txt,
            Lang::TypeScript,
            Lang::Xml,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_table_is_sorted() {
        for pair in LANG_NAMES.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Lang::from_name("cpp"), Some(Lang::Cpp));
        assert_eq!(Lang::from_name("hxx"), Some(Lang::Cpp));
        assert_eq!(Lang::from_name("js"), Some(Lang::JavaScript));
        assert_eq!(Lang::from_name("jsx"), Some(Lang::JavaScript));
        assert_eq!(Lang::from_name("tsx"), Some(Lang::TypeScript));
        assert_eq!(Lang::from_name("latex"), Some(Lang::Latex));
        assert_eq!(Lang::from_name(""), None);
        assert_eq!(Lang::from_name("CPP"), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Lang::from_path("a/b/c.rs"), None);
        assert_eq!(Lang::from_path("index.html"), Some(Lang::Html));
        assert_eq!(Lang::from_path("MOD.LUA"), Some(Lang::Lua));
        assert_eq!(Lang::from_path("noext"), None);
    }

    #[test]
    fn test_canonical_names_resolve() {
        for &lang in Lang::all() {
            assert_eq!(Lang::from_name(lang.name()), Some(lang), "{}", lang.name());
        }
    }
}
