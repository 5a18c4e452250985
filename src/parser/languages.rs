use super::{DefinitionSpan, LanguageSupport, ParseFailure, SymbolKind};
use tree_sitter::{Language, Node, Parser, Point, Tree, TreeCursor};

/// Tree-sitter backed language: a grammar plus the node kinds that count as definitions
pub struct TreeSitterLanguage {
    key: &'static str,
    extensions: &'static [&'static str],
    grammar: Language,
    definition_kinds: &'static [(&'static str, SymbolKind)],
    skip_async: bool,
    /// Node kinds that never extend a definition's last line
    trailing_trivia: &'static [&'static str],
    /// Node kinds that make a file unparseable even though the tree has no errors
    rejected_kinds: &'static [&'static str],
}

impl TreeSitterLanguage {
    pub fn python() -> Self {
        Self {
            key: "python",
            extensions: &[".py"],
            grammar: tree_sitter_python::language(),
            definition_kinds: &[
                ("function_definition", SymbolKind::Function),
                ("class_definition", SymbolKind::Class),
            ],
            // coroutines are not collected as definitions
            skip_async: true,
            // the block absorbs comments that follow its last statement
            trailing_trivia: &["comment"],
            // Python 2 statements still parse under the Python 3 grammar
            rejected_kinds: &["print_statement", "exec_statement"],
        }
    }

    pub fn javascript() -> Self {
        Self {
            key: "javascript",
            extensions: &[".js", ".mjs", ".cjs"],
            grammar: tree_sitter_javascript::language(),
            definition_kinds: &[
                ("function_declaration", SymbolKind::Function),
                ("generator_function_declaration", SymbolKind::Function),
                ("method_definition", SymbolKind::Method),
                ("class_declaration", SymbolKind::Class),
            ],
            skip_async: false,
            trailing_trivia: &[],
            rejected_kinds: &[],
        }
    }

    pub fn typescript() -> Self {
        Self {
            key: "typescript",
            extensions: &[".ts"],
            grammar: tree_sitter_typescript::language_typescript(),
            definition_kinds: &[
                ("function_declaration", SymbolKind::Function),
                ("method_definition", SymbolKind::Method),
                ("class_declaration", SymbolKind::Class),
                ("abstract_class_declaration", SymbolKind::Class),
                ("interface_declaration", SymbolKind::Interface),
            ],
            skip_async: false,
            trailing_trivia: &[],
            rejected_kinds: &[],
        }
    }

    pub fn rust() -> Self {
        Self {
            key: "rust",
            extensions: &[".rs"],
            grammar: tree_sitter_rust::language(),
            definition_kinds: &[
                ("function_item", SymbolKind::Function),
                ("impl_item", SymbolKind::Impl),
                ("struct_item", SymbolKind::Struct),
                ("enum_item", SymbolKind::Struct),
                ("trait_item", SymbolKind::Interface),
            ],
            skip_async: false,
            trailing_trivia: &[],
            rejected_kinds: &[],
        }
    }

    pub fn go() -> Self {
        Self {
            key: "go",
            extensions: &[".go"],
            grammar: tree_sitter_go::language(),
            definition_kinds: &[
                ("function_declaration", SymbolKind::Function),
                ("method_declaration", SymbolKind::Method),
                ("type_declaration", SymbolKind::Struct),
            ],
            skip_async: false,
            trailing_trivia: &[],
            rejected_kinds: &[],
        }
    }

    pub fn java() -> Self {
        Self {
            key: "java",
            extensions: &[".java"],
            grammar: tree_sitter_java::language(),
            definition_kinds: &[
                ("class_declaration", SymbolKind::Class),
                ("enum_declaration", SymbolKind::Class),
                ("interface_declaration", SymbolKind::Interface),
                ("method_declaration", SymbolKind::Method),
                ("constructor_declaration", SymbolKind::Method),
            ],
            skip_async: false,
            trailing_trivia: &[],
            rejected_kinds: &[],
        }
    }

    pub fn cpp() -> Self {
        Self {
            key: "cpp",
            extensions: &[".cpp", ".cc", ".cxx", ".hpp", ".hh"],
            grammar: tree_sitter_cpp::language(),
            definition_kinds: &[
                ("function_definition", SymbolKind::Function),
                ("class_specifier", SymbolKind::Class),
                ("struct_specifier", SymbolKind::Struct),
            ],
            skip_async: false,
            trailing_trivia: &[],
            rejected_kinds: &[],
        }
    }

    pub fn csharp() -> Self {
        Self {
            key: "csharp",
            extensions: &[".cs"],
            grammar: tree_sitter_c_sharp::language(),
            definition_kinds: &[
                ("class_declaration", SymbolKind::Class),
                ("interface_declaration", SymbolKind::Interface),
                ("struct_declaration", SymbolKind::Struct),
                ("method_declaration", SymbolKind::Method),
                ("constructor_declaration", SymbolKind::Method),
            ],
            skip_async: false,
            trailing_trivia: &[],
            rejected_kinds: &[],
        }
    }

    /// Every grammar this build knows about
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::python(),
            Self::javascript(),
            Self::typescript(),
            Self::rust(),
            Self::go(),
            Self::java(),
            Self::cpp(),
            Self::csharp(),
        ]
    }

    fn classify(&self, node: Node) -> Option<SymbolKind> {
        let kind = node.kind();
        let symbol_kind = self
            .definition_kinds
            .iter()
            .find(|(name, _)| *name == kind)
            .map(|(_, symbol_kind)| *symbol_kind)?;

        if self.skip_async && node.child(0).map_or(false, |c| c.kind() == "async") {
            return None;
        }

        Some(symbol_kind)
    }

    fn collect(&self, cursor: &mut TreeCursor, spans: &mut Vec<DefinitionSpan>) {
        loop {
            let node = cursor.node();

            if let Some(kind) = self.classify(node) {
                let end = content_end(node, self.trailing_trivia).unwrap_or_else(|| node.end_position());
                spans.push(span_of(node.start_position(), end, kind));
            }

            // Keep descending: nested definitions are reported too
            if cursor.goto_first_child() {
                self.collect(cursor, spans);
                cursor.goto_parent();
            }

            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

/// End of the last non-empty token under `node` that is not trivia
fn content_end(node: Node, trivia: &[&str]) -> Option<Point> {
    if trivia.contains(&node.kind()) {
        return None;
    }

    if node.child_count() == 0 {
        return (node.end_byte() > node.start_byte()).then(|| node.end_position());
    }

    (0..node.child_count())
        .rev()
        .find_map(|i| node.child(i).and_then(|child| content_end(child, trivia)))
}

/// First node of one of `kinds` in preorder
fn find_kind<'tree>(cursor: &mut TreeCursor<'tree>, kinds: &[&str]) -> Option<Node<'tree>> {
    loop {
        let node = cursor.node();
        if kinds.contains(&node.kind()) {
            return Some(node);
        }

        if cursor.goto_first_child() {
            let found = find_kind(cursor, kinds);
            cursor.goto_parent();
            if found.is_some() {
                return found;
            }
        }

        if !cursor.goto_next_sibling() {
            return None;
        }
    }
}

/// Convert a node's start and content end into a `[start, end)` line span
fn span_of(start_position: Point, end_position: Point, kind: SymbolKind) -> DefinitionSpan {
    let start = start_position.row;

    // A node ending at column 0 stops at the close of the previous line
    let last_row = if end_position.column == 0 && end_position.row > start {
        end_position.row - 1
    } else {
        end_position.row
    };

    DefinitionSpan {
        start,
        end: last_row + 1,
        kind,
    }
}

impl LanguageSupport for TreeSitterLanguage {
    fn key(&self) -> &str {
        self.key
    }

    fn extensions(&self) -> &[&'static str] {
        self.extensions
    }

    fn parse(&self, source: &str) -> Result<Tree, ParseFailure> {
        let mut parser = Parser::new();
        parser
            .set_language(self.grammar)
            .map_err(|_| ParseFailure::Grammar(self.key.to_string()))?;

        let tree = parser.parse(source, None).ok_or(ParseFailure::NoTree)?;

        if tree.root_node().has_error() {
            return Err(ParseFailure::Syntax);
        }

        if !self.rejected_kinds.is_empty() {
            if let Some(node) = find_kind(&mut tree.root_node().walk(), self.rejected_kinds) {
                tracing::debug!(
                    "{} rejected: {} at line {}",
                    self.key,
                    node.kind(),
                    node.start_position().row + 1
                );
                return Err(ParseFailure::Syntax);
            }
        }

        Ok(tree)
    }

    fn definitions(&self, tree: &Tree) -> Vec<DefinitionSpan> {
        let mut spans = Vec::new();
        self.collect(&mut tree.root_node().walk(), &mut spans);
        spans
    }
}
