use super::languages::TreeSitterLanguage;
use super::{CodeBlock, DefinitionSpan, LanguageSupport, SymbolKind, MIN_BLOCK_LINES, MIN_FALLBACK_LINES};
use std::collections::HashMap;

/// Splits source files into definition-sized blocks using the registered grammars
pub struct CodeParser {
    languages: HashMap<String, Box<dyn LanguageSupport>>,
}

impl CodeParser {
    pub fn new() -> Self {
        let mut parser = Self {
            languages: HashMap::new(),
        };

        for language in TreeSitterLanguage::builtin() {
            parser.register(Box::new(language));
        }

        parser
    }

    /// Add (or replace) the parser for a language key
    pub fn register(&mut self, language: Box<dyn LanguageSupport>) {
        self.languages.insert(language.key().to_lowercase(), language);
    }

    pub fn get(&self, key: &str) -> Option<&dyn LanguageSupport> {
        self.languages.get(&key.to_lowercase()).map(|l| l.as_ref())
    }

    pub fn supported_languages(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.languages.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        keys
    }

    /// Cut `content` into blocks.
    ///
    /// Definitions spanning fewer than [`MIN_BLOCK_LINES`] lines are dropped. When no
    /// definition survives and the file has at least [`MIN_FALLBACK_LINES`] lines, the
    /// whole trimmed file becomes the only block. Source that fails to parse yields
    /// no blocks at all.
    pub fn extract_blocks(&self, content: &str, language: &str) -> Vec<CodeBlock> {
        let spans = match self.get(language) {
            Some(support) => match support.parse(content) {
                Ok(tree) => support.definitions(&tree),
                Err(e) => {
                    tracing::debug!("Skipping unparsable {} source: {}", language, e);
                    return Vec::new();
                }
            },
            None => Vec::new(),
        };

        let lines: Vec<&str> = content.lines().collect();
        let mut blocks: Vec<CodeBlock> = spans
            .into_iter()
            .filter(|span| span.line_count() >= MIN_BLOCK_LINES)
            .map(|span| slice_block(&lines, span))
            .collect();

        if blocks.is_empty() && content.split('\n').count() >= MIN_FALLBACK_LINES {
            blocks.push(CodeBlock {
                content: content.trim().to_string(),
                start_line: 0,
                end_line: lines.len(),
                symbol_kind: SymbolKind::File,
            });
        }

        blocks
    }
}

impl Default for CodeParser {
    fn default() -> Self {
        Self::new()
    }
}

fn slice_block(lines: &[&str], span: DefinitionSpan) -> CodeBlock {
    let end = span.end.min(lines.len());
    let start = span.start.min(end);

    CodeBlock {
        content: lines[start..end].join("\n").trim().to_string(),
        start_line: span.start,
        end_line: span.end,
        symbol_kind: span.kind,
    }
}
