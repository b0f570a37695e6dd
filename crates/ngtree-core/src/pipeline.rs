//! Hierarchy Pipeline
//!
//! Runs the stages in order over one set of component files:
//!
//! 1. metadata extraction and template usage
//! 2. usage, composition and route resolution
//! 3. merge
//! 4. tree construction
//!
//! Per-file problems become events on the caller's sink. Only a missing
//! workspace root or a parser that cannot be set up fails the run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::discovery::{ComponentScanner, DiscoveryError, DEFAULT_COMPONENT_SUFFIX};
use crate::events::{EventSink, PipelineEvent, SkipReason};
use crate::graph::ComponentGraph;
use crate::hierarchy::{
    ChildOrder, HierarchyBuilder, HierarchyNode, HierarchyOptions, DEFAULT_ROOT_SELECTOR,
};
use crate::merge::GraphMerger;
use crate::metadata::MetadataExtractor;
use crate::model::{ComponentId, ComponentMetadata};
use crate::parser::ParserError;
use crate::relations::{RelationMap, RelationSource};
use crate::resolve::{
    CompositionResolver, RouteRelations, RouteResolver, RouteResolverConfig, UsageResolver,
};
use crate::template::TemplateUsageExtractor;

/// Default route-outlet marker tag.
pub const DEFAULT_OUTLET_TAG: &str = "router-outlet";

/// Default directory, relative to the workspace root, searched for routes.
pub const DEFAULT_ROUTE_SEARCH_DIR: &str = "src/app";

/// Default per-file size limit in KB.
pub const DEFAULT_MAX_FILE_SIZE_KB: u64 = 1024;

/// Errors that fail a whole pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Workspace root does not exist or is not a directory
    #[error("Workspace root not found: {0}")]
    RootNotFound(PathBuf),

    /// IO error on a required input
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parser could not be set up
    #[error("Parser error: {0}")]
    Parser(#[from] ParserError),

    /// Component enumeration failed
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// File name suffix of component sources
    pub component_suffix: String,
    /// Globs, relative to the workspace root, of files to skip
    pub exclude_patterns: Vec<String>,
    /// Component sources above this size are skipped
    pub max_file_size_kb: u64,
    pub root_selector: String,
    pub outlet_tag: String,
    /// Resolve route files at all
    pub routes_enabled: bool,
    /// Route search directory relative to the workspace root
    pub route_search_dir: PathBuf,
    pub routes: RouteResolverConfig,
    pub child_order: ChildOrder,
    pub max_depth: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            component_suffix: DEFAULT_COMPONENT_SUFFIX.to_string(),
            exclude_patterns: Vec::new(),
            max_file_size_kb: DEFAULT_MAX_FILE_SIZE_KB,
            root_selector: DEFAULT_ROOT_SELECTOR.to_string(),
            outlet_tag: DEFAULT_OUTLET_TAG.to_string(),
            routes_enabled: true,
            route_search_dir: PathBuf::from(DEFAULT_ROUTE_SEARCH_DIR),
            routes: RouteResolverConfig::default(),
            child_order: ChildOrder::default(),
            max_depth: None,
        }
    }
}

/// Every intermediate result of a run.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Canonical workspace root
    pub workspace_root: PathBuf,
    /// Retained component records, in input order
    pub components: Vec<ComponentMetadata>,
    pub usage: RelationMap,
    pub composition: RelationMap,
    pub routes: RouteRelations,
    pub merged: RelationMap,
    pub entry: Option<ComponentId>,
    pub tree: Option<HierarchyNode>,
}

impl Analysis {
    /// Component record by id.
    pub fn component(&self, id: &ComponentId) -> Option<&ComponentMetadata> {
        self.components.iter().find(|component| &component.id == id)
    }

    /// Relations of one source; `None` selects the merged map.
    pub fn relations(&self, source: Option<RelationSource>) -> &RelationMap {
        match source {
            Some(RelationSource::Usage) => &self.usage,
            Some(RelationSource::Composition) => &self.composition,
            Some(RelationSource::Route) => &self.routes.nested,
            None => &self.merged,
        }
    }

    /// Directed graph of the merged relations.
    pub fn graph(&self) -> ComponentGraph {
        ComponentGraph::new(&self.components, &self.merged)
    }
}

/// The relation-resolution and hierarchy-assembly pipeline.
pub struct HierarchyPipeline<'s> {
    config: PipelineConfig,
    sink: &'s dyn EventSink,
}

impl<'s> HierarchyPipeline<'s> {
    pub fn new(config: PipelineConfig, sink: &'s dyn EventSink) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build the hierarchy of the given component files.
    ///
    /// `None` means no component was found.
    pub fn run(&self, component_paths: &[PathBuf], workspace_root: &Path) -> Result<Option<HierarchyNode>> {
        Ok(self.analyze(component_paths, workspace_root)?.tree)
    }

    /// Enumerate component files under `root` and analyze them.
    pub fn analyze_workspace(&self, root: &Path) -> Result<Analysis> {
        let paths = ComponentScanner::new(self.config.component_suffix.clone())
            .with_exclude_patterns(self.config.exclude_patterns.clone())
            .scan(root)?;
        self.analyze(&paths, root)
    }

    /// Run every stage and keep the intermediate results.
    pub fn analyze(&self, component_paths: &[PathBuf], workspace_root: &Path) -> Result<Analysis> {
        let workspace_root = workspace_root
            .canonicalize()
            .map_err(|_| PipelineError::RootNotFound(workspace_root.to_path_buf()))?;
        if !workspace_root.is_dir() {
            return Err(PipelineError::RootNotFound(workspace_root));
        }

        let components = self.extract_components(component_paths)?;
        info!("Extracted {} component(s)", components.len());

        let usage = UsageResolver::new(self.sink).resolve(&components);
        let composition = CompositionResolver::new(self.sink).resolve(&components);
        let routes = if self.config.routes_enabled {
            let search_root = self.route_search_root(&workspace_root);
            RouteResolver::new(self.config.routes.clone(), self.sink)?.resolve(&components, &search_root)
        } else {
            RouteRelations::default()
        };
        debug!(
            "Resolved {} usage, {} composition, {} nested route edge(s), {} top-level route(s)",
            usage.edge_count(),
            composition.edge_count(),
            routes.nested.edge_count(),
            routes.top_level.len()
        );

        let merged = GraphMerger::new(&self.config.outlet_tag, &self.config.root_selector, self.sink)
            .merge(&components, &usage, &composition, &routes);

        let builder = HierarchyBuilder::new(
            HierarchyOptions {
                root_selector: self.config.root_selector.clone(),
                child_order: self.config.child_order,
                max_depth: self.config.max_depth,
            },
            self.sink,
        );
        let tree = builder.build(&components, &merged);
        let entry = tree.as_ref().map(|node| node.id.clone());
        match &tree {
            Some(node) => info!("Built hierarchy of {} node(s) rooted at {}", node.size(), node.name),
            None => info!("No components found"),
        }

        Ok(Analysis {
            workspace_root,
            components,
            usage,
            composition,
            routes,
            merged,
            entry,
            tree,
        })
    }

    /// Extract metadata and template usage for every file.
    ///
    /// Files that are not components, unreadable, too large, or repeats of
    /// an earlier path are skipped with an event.
    pub fn extract_components(&self, component_paths: &[PathBuf]) -> Result<Vec<ComponentMetadata>> {
        let mut extractor = MetadataExtractor::new()?;
        let templates = TemplateUsageExtractor::new(self.sink);
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut components = Vec::new();

        for path in component_paths {
            let path = match path.canonicalize() {
                Ok(path) => path,
                Err(e) => {
                    self.skip(path, SkipReason::Unreadable(e.to_string()));
                    continue;
                }
            };
            if !seen.insert(path.clone()) {
                self.skip(&path, SkipReason::Duplicate);
                continue;
            }

            let size_kb = std::fs::metadata(&path).map(|m| m.len() / 1024).unwrap_or(0);
            if size_kb > self.config.max_file_size_kb {
                self.skip(
                    &path,
                    SkipReason::TooLarge {
                        size_kb,
                        limit_kb: self.config.max_file_size_kb,
                    },
                );
                continue;
            }

            let source = match std::fs::read_to_string(&path) {
                Ok(source) => source,
                Err(e) => {
                    self.skip(&path, SkipReason::Unreadable(e.to_string()));
                    continue;
                }
            };

            match extractor.extract(&path, &source) {
                Ok(Some(metadata)) => components.push(templates.populate(metadata)),
                Ok(None) => self.skip(&path, SkipReason::NotAComponent),
                Err(ParserError::ParseFailed) => self.skip(&path, SkipReason::Malformed),
                Err(e) => return Err(e.into()),
            }
        }

        Ok(components)
    }

    /// Directory searched for route files.
    ///
    /// The configured search directory when it exists, else the root.
    pub fn route_search_root(&self, workspace_root: &Path) -> PathBuf {
        let candidate = workspace_root.join(&self.config.route_search_dir);
        if candidate.is_dir() {
            candidate
        } else {
            debug!(
                "Route directory {:?} missing, searching {:?}",
                candidate, workspace_root
            );
            workspace_root.to_path_buf()
        }
    }

    fn skip(&self, path: &Path, reason: SkipReason) {
        self.sink.emit(PipelineEvent::FileSkipped {
            path: path.to_path_buf(),
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NullSink, RecordingSink};
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_workspace_root_fails() {
        let pipeline = HierarchyPipeline::new(PipelineConfig::default(), &NullSink);
        let result = pipeline.run(&[], Path::new("/no/such/ngtree/workspace"));
        assert!(matches!(result, Err(PipelineError::RootNotFound(_))));
    }

    #[test]
    fn test_empty_input_is_absent() {
        let temp = TempDir::new().unwrap();
        let pipeline = HierarchyPipeline::new(PipelineConfig::default(), &NullSink);
        assert!(pipeline.run(&[], temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_missing_and_duplicate_files_are_skipped() {
        let temp = TempDir::new().unwrap();
        let app = write(
            temp.path(),
            "app.component.ts",
            "@Component({ selector: 'app-root', template: '' }) export class AppComponent {}",
        );
        let sink = RecordingSink::new();
        let pipeline = HierarchyPipeline::new(PipelineConfig::default(), &sink);

        let paths = vec![app.clone(), app, temp.path().join("gone.component.ts")];
        let analysis = pipeline.analyze(&paths, temp.path()).unwrap();
        assert_eq!(analysis.components.len(), 1);
        assert_eq!(sink.count("file_skipped"), 2);
    }

    #[test]
    fn test_oversized_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let padding = " ".repeat(3 * 1024);
        let big = write(
            temp.path(),
            "big.component.ts",
            &format!("@Component({{ selector: 'app-big' }}) export class Big {{}}{}", padding),
        );
        let config = PipelineConfig {
            max_file_size_kb: 1,
            ..Default::default()
        };
        let sink = RecordingSink::new();
        let analysis = HierarchyPipeline::new(config, &sink)
            .analyze(&[big], temp.path())
            .unwrap();
        assert!(analysis.components.is_empty());
        assert!(matches!(
            sink.events()[0],
            PipelineEvent::FileSkipped {
                reason: SkipReason::TooLarge { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_route_search_root_falls_back() {
        let temp = TempDir::new().unwrap();
        let pipeline = HierarchyPipeline::new(PipelineConfig::default(), &NullSink);
        assert_eq!(pipeline.route_search_root(temp.path()), temp.path());

        fs::create_dir_all(temp.path().join("src/app")).unwrap();
        assert_eq!(
            pipeline.route_search_root(temp.path()),
            temp.path().join("src/app")
        );
    }

    #[test]
    fn test_routes_disabled() {
        let temp = TempDir::new().unwrap();
        let root = write(
            temp.path(),
            "src/app/app.component.ts",
            "@Component({ selector: 'app-root', template: '<router-outlet></router-outlet>' }) export class AppComponent {}",
        );
        let home = write(
            temp.path(),
            "src/app/home.component.ts",
            "@Component({ selector: 'app-home' }) export class HomeComponent {}",
        );
        write(
            temp.path(),
            "src/app/app.routes.ts",
            "export const routes = [{ path: '', loadComponent: () => import('./home.component') }];",
        );

        let config = PipelineConfig {
            routes_enabled: false,
            ..Default::default()
        };
        let analysis = HierarchyPipeline::new(config, &NullSink)
            .analyze(&[root, home], temp.path())
            .unwrap();
        assert!(analysis.routes.is_empty());
        assert!(analysis.tree.unwrap().children.is_empty());
    }
}
