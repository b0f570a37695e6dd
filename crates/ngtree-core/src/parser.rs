//! Tree-Sitter Parser for Component Sources
//!
//! This module wraps tree-sitter's TypeScript grammar and the SCM queries
//! used to locate declaration anchors (decorators, class declarations and
//! route list bindings) inside component and route files.
//!
//! ## Supported Languages
//!
//! - TypeScript (.ts, .mts, .cts)
//! - TSX (.tsx)

use std::path::Path;

use thiserror::Error;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator, Tree};

// ============================================================================
// Supported Languages
// ============================================================================

/// Source languages a component or route file may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedLanguage {
    TypeScript,
    Tsx,
}

impl SupportedLanguage {
    /// Get the language name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedLanguage::TypeScript => "typescript",
            SupportedLanguage::Tsx => "tsx",
        }
    }

    /// Get the tree-sitter Language for this language.
    pub fn tree_sitter_language(&self) -> Language {
        match self {
            SupportedLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SupportedLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    /// Detect language from file extension.
    ///
    /// Returns `None` if the extension is not recognized.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "ts" | "mts" | "cts" => Some(SupportedLanguage::TypeScript),
            "tsx" => Some(SupportedLanguage::Tsx),
            _ => None,
        }
    }

    /// Detect language from file path, defaulting to TypeScript.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
            .unwrap_or(SupportedLanguage::TypeScript)
    }
}

impl std::fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Parser Errors
// ============================================================================

/// Errors that can occur during parsing.
#[derive(Debug, Error)]
pub enum ParserError {
    /// Failed to set language
    #[error("Failed to set language: {0}")]
    LanguageSet(String),

    /// Failed to parse source code
    #[error("Failed to parse source code")]
    ParseFailed,

    /// Failed to compile query
    #[error("Failed to compile query: {0}")]
    QueryCompile(String),
}

// ============================================================================
// Code Parser
// ============================================================================

/// A tree-sitter based parser for TypeScript sources.
pub struct CodeParser {
    parser: Parser,
    language: SupportedLanguage,
}

impl CodeParser {
    /// Create a new parser for the specified language.
    pub fn new(language: SupportedLanguage) -> Result<Self, ParserError> {
        let mut parser = Parser::new();
        parser
            .set_language(&language.tree_sitter_language())
            .map_err(|e| ParserError::LanguageSet(e.to_string()))?;

        Ok(Self { parser, language })
    }

    /// Get the language this parser is configured for.
    pub fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Switch the grammar if `language` differs from the current one.
    pub fn ensure_language(&mut self, language: SupportedLanguage) -> Result<(), ParserError> {
        if self.language != language {
            self.parser
                .set_language(&language.tree_sitter_language())
                .map_err(|e| ParserError::LanguageSet(e.to_string()))?;
            self.language = language;
        }
        Ok(())
    }

    /// Parse source code into a syntax tree.
    pub fn parse(&mut self, source: &str) -> Result<Tree, ParserError> {
        self.parser
            .parse(source, None)
            .ok_or(ParserError::ParseFailed)
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Anchors inside a component source: every decorator and every top-level
/// class declaration, exported or not. Decorators on `export class` hang off
/// the export statement, so they are matched anywhere rather than through
/// the class node.
pub const COMPONENT_QUERY: &str = r#"
(decorator) @decorator

(program
    (class_declaration
        name: (_) @class.name))

(program
    (export_statement
        declaration: (class_declaration
            name: (_) @class.name)))

(program
    (abstract_class_declaration
        name: (_) @class.name))

(program
    (export_statement
        declaration: (abstract_class_declaration
            name: (_) @class.name)))
"#;

/// Anchors inside a route file: variable bindings initialized with an array.
pub const ROUTES_QUERY: &str = r#"
(variable_declarator
    name: (identifier) @binding.name
    value: (array) @binding.value)
"#;

/// A capture produced by running a [`SourceQuery`].
#[derive(Debug, Clone, Copy)]
pub struct QueryHit<'tree> {
    /// Capture name as written in the query (without the `@`)
    pub capture: &'static str,
    /// Captured node
    pub node: Node<'tree>,
}

/// A compiled query over one of the supported grammars.
pub struct SourceQuery {
    query: Query,
    capture_names: Vec<&'static str>,
}

impl SourceQuery {
    /// Compile a query from SCM source.
    ///
    /// Capture names must be one of `known_captures`; they are interned so
    /// hits can be matched against string constants.
    pub fn new(
        language: SupportedLanguage,
        query_source: &str,
        known_captures: &[&'static str],
    ) -> Result<Self, ParserError> {
        let query = Query::new(&language.tree_sitter_language(), query_source)
            .map_err(|e| ParserError::QueryCompile(format!("{:?}", e)))?;

        let capture_names = query
            .capture_names()
            .iter()
            .map(|name| {
                known_captures
                    .iter()
                    .copied()
                    .find(|known| known == name)
                    .ok_or_else(|| ParserError::QueryCompile(format!("unknown capture @{}", name)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            query,
            capture_names,
        })
    }

    /// Run the query and return every capture in document order.
    pub fn captures<'tree>(&self, root: Node<'tree>, source: &[u8]) -> Vec<QueryHit<'tree>> {
        let mut hits = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, root, source);
        while let Some(match_) = matches.next() {
            for capture in match_.captures {
                hits.push(QueryHit {
                    capture: self.capture_names[capture.index as usize],
                    node: capture.node,
                });
            }
        }

        hits.sort_by_key(|hit| hit.node.start_byte());
        hits
    }

    /// Run the query and return the captures of each match together.
    pub fn matches<'tree>(&self, root: Node<'tree>, source: &[u8]) -> Vec<Vec<QueryHit<'tree>>> {
        let mut grouped = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, root, source);
        while let Some(match_) = matches.next() {
            grouped.push(
                match_
                    .captures
                    .iter()
                    .map(|capture| QueryHit {
                        capture: self.capture_names[capture.index as usize],
                        node: capture.node,
                    })
                    .collect(),
            );
        }

        grouped.sort_by_key(|hits: &Vec<QueryHit<'tree>>| {
            hits.first().map(|hit| hit.node.start_byte()).unwrap_or(0)
        });
        grouped
    }
}

/// Get the source text covered by a node.
pub fn node_text<'s>(node: &Node<'_>, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or("")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(
            SupportedLanguage::from_extension("ts"),
            Some(SupportedLanguage::TypeScript)
        );
        assert_eq!(
            SupportedLanguage::from_extension("TSX"),
            Some(SupportedLanguage::Tsx)
        );
        assert_eq!(SupportedLanguage::from_extension("html"), None);
    }

    #[test]
    fn test_language_from_path_defaults_to_typescript() {
        assert_eq!(
            SupportedLanguage::from_path(Path::new("src/app/app.component.ts")),
            SupportedLanguage::TypeScript
        );
        assert_eq!(
            SupportedLanguage::from_path(Path::new("widget.tsx")),
            SupportedLanguage::Tsx
        );
        assert_eq!(
            SupportedLanguage::from_path(Path::new("README")),
            SupportedLanguage::TypeScript
        );
    }

    #[test]
    fn test_parse_typescript() {
        let mut parser = CodeParser::new(SupportedLanguage::TypeScript).unwrap();
        let tree = parser.parse("export class AppComponent {}").unwrap();
        assert_eq!(tree.root_node().kind(), "program");
    }

    #[test]
    fn test_component_query_compiles_and_captures() {
        let query = SourceQuery::new(
            SupportedLanguage::TypeScript,
            COMPONENT_QUERY,
            &["decorator", "class.name"],
        )
        .unwrap();

        let source = "@Component({ selector: 'app-x' })\nexport class XComponent {}";
        let mut parser = CodeParser::new(SupportedLanguage::TypeScript).unwrap();
        let tree = parser.parse(source).unwrap();
        let hits = query.captures(tree.root_node(), source.as_bytes());

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].capture, "decorator");
        assert_eq!(hits[1].capture, "class.name");
        assert_eq!(node_text(&hits[1].node, source.as_bytes()), "XComponent");
    }

    #[test]
    fn test_unknown_capture_rejected() {
        let result = SourceQuery::new(
            SupportedLanguage::TypeScript,
            "(decorator) @deco",
            &["decorator"],
        );
        assert!(matches!(result, Err(ParserError::QueryCompile(_))));
    }

    #[test]
    fn test_routes_query_groups_name_and_value() {
        let query = SourceQuery::new(
            SupportedLanguage::TypeScript,
            ROUTES_QUERY,
            &["binding.name", "binding.value"],
        )
        .unwrap();

        let source = "export const routes: Routes = [{ path: '' }];\nconst other = 1;";
        let mut parser = CodeParser::new(SupportedLanguage::TypeScript).unwrap();
        let tree = parser.parse(source).unwrap();
        let groups = query.matches(tree.root_node(), source.as_bytes());

        assert_eq!(groups.len(), 1);
        let name = groups[0]
            .iter()
            .find(|hit| hit.capture == "binding.name")
            .unwrap();
        assert_eq!(node_text(&name.node, source.as_bytes()), "routes");
    }
}
