//! Component metadata extraction.
//!
//! Reads the class name and the `@Component({...})` configuration of one
//! source file. A file without a selector or without a class declaration is
//! not a component; extraction reports that as `Ok(None)`.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use tracing::trace;

use crate::model::{ComponentId, ComponentMetadata, TemplateSource};
use crate::parser::{
    node_text, CodeParser, ParserError, SourceQuery, SupportedLanguage, COMPONENT_QUERY,
};
use crate::paths::resolve_relative;
use crate::syntax::{array_elements, decorator_config, string_literal, template_literal};

/// Callee name of the component decorator.
pub const COMPONENT_DECORATOR: &str = "Component";

/// Extracts [`ComponentMetadata`] from component sources.
pub struct MetadataExtractor {
    parser: CodeParser,
    query: SourceQuery,
}

impl MetadataExtractor {
    /// Create an extractor with the TypeScript grammar.
    pub fn new() -> Result<Self, ParserError> {
        let language = SupportedLanguage::TypeScript;
        Ok(Self {
            parser: CodeParser::new(language)?,
            query: SourceQuery::new(language, COMPONENT_QUERY, &["decorator", "class.name"])?,
        })
    }

    /// Extract metadata from one file's source text.
    ///
    /// `path` must already be canonical: it becomes the record's
    /// `file_path`, seeds its id and anchors `templateUrl`.
    pub fn extract(
        &mut self,
        path: &Path,
        source: &str,
    ) -> Result<Option<ComponentMetadata>, ParserError> {
        let language = SupportedLanguage::from_path(path);
        if language != self.parser.language() {
            // Query captures are grammar specific; recompile alongside.
            self.parser.ensure_language(language)?;
            self.query = SourceQuery::new(language, COMPONENT_QUERY, &["decorator", "class.name"])?;
        }

        let tree = self.parser.parse(source)?;
        let bytes = source.as_bytes();
        let hits = self.query.captures(tree.root_node(), bytes);

        let class_name = hits
            .iter()
            .find(|hit| hit.capture == "class.name")
            .map(|hit| node_text(&hit.node, bytes).to_string())
            .filter(|name| !name.is_empty());

        let config = hits
            .iter()
            .filter(|hit| hit.capture == "decorator")
            .find_map(|hit| decorator_config(hit.node, bytes, COMPONENT_DECORATOR).ok());

        let Some(config) = config else {
            trace!("No @{} decorator in {:?}", COMPONENT_DECORATOR, path);
            return Ok(None);
        };

        let selector = config
            .get("selector")
            .and_then(|value| string_literal(value, bytes).ok())
            .map(|selector| selector.trim().to_string())
            .filter(|selector| !selector.is_empty());

        let (Some(class_name), Some(selector)) = (class_name, selector) else {
            return Ok(None);
        };

        let inline = config
            .get("template")
            .and_then(|value| template_literal(value, bytes).ok());
        let external = config
            .get("templateUrl")
            .and_then(|value| string_literal(value, bytes).ok())
            .filter(|url| !url.is_empty());

        let template = match (inline, external) {
            (Some(text), _) => Some(TemplateSource::Inline(text)),
            (None, Some(url)) => {
                let base = path.parent().unwrap_or_else(|| Path::new(""));
                Some(TemplateSource::External(resolve_relative(base, &url)))
            }
            (None, None) => None,
        };

        let mut seen = HashSet::new();
        let declared_imports = config
            .get("imports")
            .and_then(|value| array_elements(value).ok())
            .unwrap_or_default()
            .into_iter()
            .map(|element| node_text(&element, bytes).to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect();

        Ok(Some(ComponentMetadata {
            id: ComponentId::from_path(path),
            class_name,
            selector,
            file_path: path.to_path_buf(),
            template,
            declared_imports,
            used_tags: BTreeSet::new(),
        }))
    }
}
