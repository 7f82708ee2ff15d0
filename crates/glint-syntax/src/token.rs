//! Highlight tokens and the closed set of highlight categories.

/// A single highlight token.
///
/// Tokens reference the original source by byte offset and never
/// overlap. A token is never empty; scanners that have nothing to say
/// about a span simply advance past it without emitting.
///
/// With the `serde` feature, tokens serialize as
/// `{"begin": …, "length": …, "kind": "…"}` with the kind's short id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token {
    /// Byte offset of the first byte of the token within the source.
    pub begin: u32,
    /// Length of the token in bytes. Always nonzero for emitted tokens.
    pub length: u32,
    /// The lexical category of the token.
    pub kind: HighlightKind,
}

impl Token {
    /// Creates a new token.
    #[inline]
    pub fn new(begin: usize, length: usize, kind: HighlightKind) -> Self {
        Self {
            begin: begin as u32,
            length: length as u32,
            kind,
        }
    }

    /// Byte offset one past the end of the token.
    #[inline]
    pub fn end(&self) -> u32 {
        self.begin + self.length
    }
}

/// The lexical category of a highlight token.
///
/// Each kind has a short, stable ASCII identifier obtained from
/// [`HighlightKind::id`], intended for use as an HTML attribute value
/// or CSS class suffix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum HighlightKind {
    /// A byte or construct that could not be classified.
    #[default]
    Error,
    /// Comment content, excluding delimiters.
    Comment,
    /// The delimiters of a comment, like `//` or `*/`.
    CommentDelim,
    /// A generic value, like a CSS hex color in a property value.
    Value,
    /// Digits of a numeric literal.
    Number,
    /// Decoration around a number, like a `0x` prefix or `u8` suffix.
    NumberDecor,
    /// Structural delimiters inside a number, like the radix point.
    NumberDelim,
    /// String literal content.
    String,
    /// The quotes or brackets delimiting a string.
    StringDelim,
    /// An escape sequence within a string.
    StringEscape,
    /// Decoration around a string, like encoding prefixes or regex flags.
    StringDecor,
    /// An interpolated piece of a string, like `$var` in Bash.
    StringInterpolation,
    /// The delimiters of a string interpolation, like `${` and `}`.
    StringInterpolationDelim,
    /// An escape sequence outside of strings, like `&amp;` in HTML text.
    Escape,
    /// A null-like constant, like `null`, `nullptr`, or `nil`.
    Null,
    /// A boolean constant.
    Bool,
    /// A self-reference, like `this` or `self`.
    This,
    /// An identifier with no more specific classification.
    Name,
    /// A variable name, like `%reg` in LLVM.
    NameVar,
    /// The sigil introducing a variable name.
    NameVarDelim,
    /// A function name.
    NameFunction,
    /// The sigil introducing a function name.
    NameFunctionDelim,
    /// An attribute name, like Lua's `const` in `<const>`.
    NameAttr,
    /// The delimiters around an attribute name.
    NameAttrDelim,
    /// A label name.
    NameLabel,
    /// A label declaration, like `loop:` in LLVM or NASM.
    NameLabelDecl,
    /// The punctuation following a label declaration.
    NameLabelDelim,
    /// A macro or preprocessor construct.
    NameMacro,
    /// The punctuation introducing a macro, like `#` or `@`.
    NameMacroDelim,
    /// A nonterminal reference in a grammar.
    NameNonterminal,
    /// A nonterminal declaration in a grammar.
    NameNonterminalDecl,
    /// A word in shell command position.
    NameShellCommand,
    /// A `-option` word in shell argument position.
    NameShellOption,
    /// A keyword with no more specific classification.
    Keyword,
    /// A control-flow keyword.
    KeywordControl,
    /// A type keyword.
    KeywordType,
    /// A markup tag name, or a selector in CSS.
    MarkupTag,
    /// A markup attribute name, or an object key in JSON.
    MarkupAttr,
    /// A symbol with no more specific classification.
    Symbol,
    /// Punctuation, like `,` and `;`.
    SymbolPunc,
    /// Parentheses.
    SymbolParens,
    /// Square brackets.
    SymbolSquare,
    /// Braces.
    SymbolBrace,
    /// An operator.
    SymbolOp,
    /// A diff heading line, like `--- a/file`.
    DiffHeading,
    /// A diff line common to both sides.
    DiffCommon,
    /// A diff hunk header, like `@@ -1 +1 @@`.
    DiffHunk,
    /// A deleted diff line.
    DiffDeletion,
    /// An inserted diff line.
    DiffInsertion,
    /// A modified diff line (context format).
    DiffModification,
}

impl HighlightKind {
    /// Returns the short, stable identifier for the kind.
    ///
    /// # Example
    ///
    /// ```
    /// use glint_syntax::HighlightKind;
    ///
    /// assert_eq!(HighlightKind::Keyword.id(), "kw");
    /// assert_eq!(HighlightKind::StringDelim.id(), "str_del");
    /// ```
    pub fn id(self) -> &'static str {
        use HighlightKind::*;
        match self {
            Error => "err",
            Comment => "cmt",
            CommentDelim => "cmt_del",
            Value => "val",
            Number => "num",
            NumberDecor => "num_dec",
            NumberDelim => "num_del",
            String => "str",
            StringDelim => "str_del",
            StringEscape => "str_esc",
            StringDecor => "str_dec",
            StringInterpolation => "str_intp",
            StringInterpolationDelim => "str_intp_del",
            Escape => "esc",
            Null => "null",
            Bool => "bool",
            This => "this",
            Name => "name",
            NameVar => "name_var",
            NameVarDelim => "name_var_del",
            NameFunction => "name_fn",
            NameFunctionDelim => "name_fn_del",
            NameAttr => "name_attr",
            NameAttrDelim => "name_attr_del",
            NameLabel => "name_label",
            NameLabelDecl => "name_label_dcl",
            NameLabelDelim => "name_label_del",
            NameMacro => "name_macro",
            NameMacroDelim => "name_macro_del",
            NameNonterminal => "name_nt",
            NameNonterminalDecl => "name_nt_dcl",
            NameShellCommand => "name_shell_cmd",
            NameShellOption => "name_shell_opt",
            Keyword => "kw",
            KeywordControl => "kw_ctrl",
            KeywordType => "kw_type",
            MarkupTag => "markup_tag",
            MarkupAttr => "markup_attr",
            Symbol => "sym",
            SymbolPunc => "sym_punc",
            SymbolParens => "sym_parens",
            SymbolSquare => "sym_square",
            SymbolBrace => "sym_brace",
            SymbolOp => "sym_op",
            DiffHeading => "diff_h",
            DiffCommon => "diff_common",
            DiffHunk => "diff_hunk",
            DiffDeletion => "diff_del",
            DiffInsertion => "diff_ins",
            DiffModification => "diff_mod",
        }
    }
}

/// Serializes as the short id, so dumps use the same names as HTML
/// class attributes.
#[cfg(feature = "serde")]
impl serde::Serialize for HighlightKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_end() {
        let t = Token::new(3, 4, HighlightKind::Name);
        assert_eq!(t.begin, 3);
        assert_eq!(t.end(), 7);
    }

    #[test]
    fn test_ids_are_nonempty_and_ascii() {
        // A cheap exhaustiveness check over the discriminant range.
        for raw in 0..=u8::MAX {
            let Some(kind) = kind_from_raw(raw) else {
                continue;
            };
            let id = kind.id();
            assert!(!id.is_empty());
            assert!(id.bytes().all(|c| c.is_ascii_lowercase() || c == b'_'));
        }
    }

    fn kind_from_raw(raw: u8) -> Option<HighlightKind> {
        use HighlightKind::*;
        const ALL: &[HighlightKind] = &[
            Error,
            Comment,
            CommentDelim,
            Value,
            Number,
            NumberDecor,
            NumberDelim,
            String,
            StringDelim,
            StringEscape,
            StringDecor,
            StringInterpolation,
            StringInterpolationDelim,
            Escape,
            Null,
            Bool,
            This,
            Name,
            NameVar,
            NameVarDelim,
            NameFunction,
            NameFunctionDelim,
            NameAttr,
            NameAttrDelim,
            NameLabel,
            NameLabelDecl,
            NameLabelDelim,
            NameMacro,
            NameMacroDelim,
            NameNonterminal,
            NameNonterminalDecl,
            NameShellCommand,
            NameShellOption,
            Keyword,
            KeywordControl,
            KeywordType,
            MarkupTag,
            MarkupAttr,
            Symbol,
            SymbolPunc,
            SymbolParens,
            SymbolSquare,
            SymbolBrace,
            SymbolOp,
            DiffHeading,
            DiffCommon,
            DiffHunk,
            DiffDeletion,
            DiffInsertion,
            DiffModification,
        ];
        ALL.iter().copied().find(|&k| k as u8 == raw)
    }

    #[test]
    fn test_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for raw in 0..=u8::MAX {
            if let Some(kind) = kind_from_raw(raw) {
                assert!(seen.insert(kind.id()), "duplicate id {}", kind.id());
            }
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_token_serializes_with_kind_id() {
        let token = Token::new(2, 3, HighlightKind::KeywordType);
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r#"{"begin":2,"length":3,"kind":"kw_type"}"#);
    }
}
