//! ANSI SGR styling for terminal output.

use glint_syntax::HighlightKind;

pub const RESET: &str = "\x1B[0m";

/// Maps a highlight kind to an SGR escape sequence. Related kinds
/// share a color so terminal output stays calm.
pub fn color(kind: HighlightKind) -> &'static str {
    use HighlightKind::*;

    const RED: &str = "\x1B[31m";
    const GREEN: &str = "\x1B[32m";
    const YELLOW: &str = "\x1B[33m";
    const BLUE: &str = "\x1B[34m";
    const MAGENTA: &str = "\x1B[35m";
    const CYAN: &str = "\x1B[36m";
    const H_BLACK: &str = "\x1B[0;90m";
    const H_RED: &str = "\x1B[0;91m";
    const H_GREEN: &str = "\x1B[0;92m";
    const H_YELLOW: &str = "\x1B[0;93m";
    const H_BLUE: &str = "\x1B[0;94m";
    const H_MAGENTA: &str = "\x1B[0;95m";

    match kind {
        Error => H_RED,
        Comment | CommentDelim => H_BLACK,
        Number | NumberDecor | NumberDelim | Value => H_YELLOW,
        String | StringDelim | StringDecor => GREEN,
        StringEscape | StringInterpolation | StringInterpolationDelim | Escape => H_GREEN,
        Null | Bool | This => YELLOW,
        Name => "",
        NameVar | NameVarDelim | NameShellCommand => CYAN,
        NameFunction | NameFunctionDelim => H_BLUE,
        NameAttr | NameAttrDelim | NameShellOption => H_MAGENTA,
        NameLabel | NameLabelDecl | NameLabelDelim => H_YELLOW,
        NameMacro | NameMacroDelim => RED,
        NameNonterminal | NameNonterminalDecl => CYAN,
        Keyword | KeywordControl => MAGENTA,
        KeywordType => BLUE,
        MarkupTag => BLUE,
        MarkupAttr => CYAN,
        Symbol | SymbolPunc | SymbolParens | SymbolSquare | SymbolBrace | SymbolOp => "",
        DiffHeading | DiffHunk => H_BLUE,
        DiffCommon => "",
        DiffDeletion => RED,
        DiffInsertion => GREEN,
        DiffModification => YELLOW,
    }
}
