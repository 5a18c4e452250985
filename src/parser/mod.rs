pub mod code_parser;
pub mod languages;

use thiserror::Error;
use tree_sitter::Tree;

/// Minimum number of lines a definition must span to become a block
pub const MIN_BLOCK_LINES: usize = 3;

/// Minimum number of lines a file needs before it is taken whole
pub const MIN_FALLBACK_LINES: usize = 10;

/// Code block cut from a source file (one definition, or the whole file)
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub content: String,
    /// 0-based first line
    pub start_line: usize,
    /// 0-based, exclusive
    pub end_line: usize,
    pub symbol_kind: SymbolKind,
}

impl CodeBlock {
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line
    }
}

/// Type of code symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Class,
    Method,
    Interface,
    Struct,
    Impl,
    /// Whole-file fallback
    File,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Interface => "interface",
            SymbolKind::Struct => "struct",
            SymbolKind::Impl => "impl",
            SymbolKind::File => "file",
        }
    }
}

/// Line range of one definition node, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefinitionSpan {
    pub start: usize,
    pub end: usize,
    pub kind: SymbolKind,
}

impl DefinitionSpan {
    pub fn line_count(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

/// Reasons a file could not be turned into a syntax tree
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("grammar for {0} could not be loaded")]
    Grammar(String),
    #[error("parser produced no tree")]
    NoTree,
    #[error("source contains syntax errors")]
    Syntax,
}

/// Per-language parsing capability
pub trait LanguageSupport {
    /// Search key used by the code host (`language:<key>`)
    fn key(&self) -> &str;

    /// File suffixes belonging to this language, dot included
    fn extensions(&self) -> &[&'static str];

    fn parse(&self, source: &str) -> Result<Tree, ParseFailure>;

    /// Every function/class-like node in the tree, nested ones included
    fn definitions(&self, tree: &Tree) -> Vec<DefinitionSpan>;
}
