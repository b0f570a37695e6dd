//! Route-declared parent/child relations.
//!
//! Route files are TypeScript modules whose `routes` binding holds an array
//! of route descriptors. A descriptor resolves to a component through its
//! `loadComponent` loader (module path matched against component files) or,
//! when enabled, its static `component` class reference. Nested `children`
//! become edges under the resolved component; top-level descriptors are
//! collected separately for the merger to attach.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tree_sitter::Node;
use walkdir::WalkDir;

use crate::events::{EventSink, PipelineEvent};
use crate::model::{ComponentId, ComponentMetadata};
use crate::parser::{node_text, CodeParser, ParserError, SourceQuery, SupportedLanguage, ROUTES_QUERY};
use crate::paths::{path_key, resolve_relative};
use crate::relations::RelationMap;
use crate::syntax::{array_elements, RouteDescriptor};

/// Directories never searched for route files.
pub const DEFAULT_ROUTE_EXCLUDE_DIRS: &[&str] = &["node_modules", "dist", "build", "coverage"];

/// What happens to the children of a descriptor that resolves to nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanRoutePolicy {
    /// Attach them to the nearest resolved ancestor, or the top level
    #[default]
    Promote,
    /// Leave them unattached; their own nested edges are still recorded
    Drop,
}

/// Route resolution settings.
#[derive(Debug, Clone)]
pub struct RouteResolverConfig {
    /// File name suffix of route files
    pub file_suffix: String,
    /// Name of the variable holding the route array
    pub binding: String,
    pub orphan_children: OrphanRoutePolicy,
    /// Resolve `component: X` by class name when there is no loader
    pub static_components: bool,
    /// Directory names skipped while searching
    pub exclude_dirs: HashSet<String>,
}

impl Default for RouteResolverConfig {
    fn default() -> Self {
        Self {
            file_suffix: ".routes.ts".to_string(),
            binding: "routes".to_string(),
            orphan_children: OrphanRoutePolicy::Promote,
            static_components: true,
            exclude_dirs: DEFAULT_ROUTE_EXCLUDE_DIRS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Output of route resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRelations {
    /// Edges from a route's component to its children's components
    pub nested: RelationMap,
    /// Components of top-level descriptors, awaiting a host
    pub top_level: BTreeSet<ComponentId>,
}

impl RouteRelations {
    pub fn is_empty(&self) -> bool {
        self.nested.is_empty() && self.top_level.is_empty()
    }
}

/// Where a descriptor's resolved component gets attached.
#[derive(Debug, Clone)]
enum Attach {
    TopLevel,
    Under(ComponentId),
    Detached,
}

/// Lookup tables from route references to component ids.
struct TargetIndex<'c> {
    by_path: HashMap<String, &'c ComponentId>,
    by_class: HashMap<&'c str, &'c ComponentId>,
}

impl<'c> TargetIndex<'c> {
    fn new(components: &'c [ComponentMetadata]) -> Self {
        Self {
            by_path: components
                .iter()
                .map(|c| (path_key(&c.file_path), &c.id))
                .collect(),
            by_class: components
                .iter()
                .map(|c| (c.class_name.as_str(), &c.id))
                .collect(),
        }
    }
}

/// Resolves route files into [`RouteRelations`].
pub struct RouteResolver<'s> {
    config: RouteResolverConfig,
    sink: &'s dyn EventSink,
    parser: CodeParser,
    query: SourceQuery,
}

impl<'s> RouteResolver<'s> {
    pub fn new(config: RouteResolverConfig, sink: &'s dyn EventSink) -> Result<Self, ParserError> {
        let language = SupportedLanguage::TypeScript;
        Ok(Self {
            config,
            sink,
            parser: CodeParser::new(language)?,
            query: SourceQuery::new(language, ROUTES_QUERY, &["binding.name", "binding.value"])?,
        })
    }

    /// Resolve every route file under `search_root` against `components`.
    ///
    /// A missing search root yields empty relations.
    pub fn resolve(&mut self, components: &[ComponentMetadata], search_root: &Path) -> RouteRelations {
        let mut relations = RouteRelations::default();
        if !search_root.is_dir() {
            debug!("No route search directory at {:?}", search_root);
            return relations;
        }

        let files = self.find_route_files(search_root);
        info!("Found {} route file(s) under {:?}", files.len(), search_root);

        let index = TargetIndex::new(components);
        for file in files {
            self.resolve_file(&file, &index, &mut relations);
        }
        relations
    }

    /// Route files under `root`, sorted.
    ///
    /// Hidden and excluded directories are not entered.
    pub fn find_route_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                if !e.file_type().is_dir() || e.depth() == 0 {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !name.starts_with('.') && !self.config.exclude_dirs.contains(name.as_ref())
            })
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Error walking directory: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_string_lossy()
                    .ends_with(&self.config.file_suffix)
            {
                files.push(entry.into_path());
            }
        }

        // Sort for deterministic ordering
        files.sort();
        files
    }

    fn resolve_file(&mut self, path: &Path, index: &TargetIndex<'_>, out: &mut RouteRelations) {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                self.skip_file(path, e.to_string());
                return;
            }
        };

        if let Err(e) = self.parser.ensure_language(SupportedLanguage::from_path(path)) {
            self.skip_file(path, e.to_string());
            return;
        }
        let tree = match self.parser.parse(&source) {
            Ok(tree) => tree,
            Err(e) => {
                self.skip_file(path, e.to_string());
                return;
            }
        };

        let bytes = source.as_bytes();
        let binding = self
            .query
            .matches(tree.root_node(), bytes)
            .into_iter()
            .find_map(|hits| {
                let name = hits.iter().find(|hit| hit.capture == "binding.name")?;
                let value = hits.iter().find(|hit| hit.capture == "binding.value")?;
                (node_text(&name.node, bytes) == self.config.binding).then_some(value.node)
            });

        let Some(list) = binding else {
            self.skip_file(path, format!("no `{}` array", self.config.binding));
            return;
        };

        let route_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let context = FileContext {
            path,
            route_dir,
            source: bytes,
            index,
        };
        for element in array_elements(list).unwrap_or_default() {
            self.visit(&context, element, Attach::TopLevel, out);
        }
    }

    fn visit(&self, ctx: &FileContext<'_, '_>, node: Node<'_>, attach: Attach, out: &mut RouteRelations) {
        let descriptor = match RouteDescriptor::parse(node, ctx.source) {
            Ok(descriptor) => descriptor,
            Err(reason) => {
                self.sink.emit(PipelineEvent::route_unresolved(
                    ctx.path,
                    node_text(&node, ctx.source),
                    &reason,
                ));
                return;
            }
        };

        let child_attach = match self.target(ctx, &descriptor) {
            Some(id) => {
                match &attach {
                    Attach::TopLevel => {
                        out.top_level.insert(id.clone());
                    }
                    Attach::Under(parent) => {
                        out.nested.insert(parent.clone(), id.clone());
                    }
                    Attach::Detached => {}
                }
                Attach::Under(id)
            }
            None => match self.config.orphan_children {
                OrphanRoutePolicy::Promote => attach,
                OrphanRoutePolicy::Drop => Attach::Detached,
            },
        };

        for child in descriptor.children {
            self.visit(ctx, child, child_attach.clone(), out);
        }
    }

    /// Component a descriptor points at, if any.
    fn target(&self, ctx: &FileContext<'_, '_>, descriptor: &RouteDescriptor<'_>) -> Option<ComponentId> {
        match &descriptor.loader {
            Some(Ok(module)) => {
                let file = module_file(ctx.route_dir, module);
                match ctx.index.by_path.get(&path_key(&file)) {
                    Some(id) => return Some((*id).clone()),
                    None => self.sink.emit(PipelineEvent::RouteUnresolved {
                        route_file: ctx.path.to_path_buf(),
                        target: module.clone(),
                        reason: format!("no component at {}", file.display()),
                    }),
                }
            }
            Some(Err(reason)) => {
                let target = descriptor.path.clone().unwrap_or_default();
                self.sink
                    .emit(PipelineEvent::route_unresolved(ctx.path, target, reason));
            }
            None => {}
        }

        if !self.config.static_components {
            return None;
        }
        let class = descriptor.component.as_deref()?;
        match ctx.index.by_class.get(class) {
            Some(id) => Some((*id).clone()),
            None => {
                self.sink.emit(PipelineEvent::RouteUnresolved {
                    route_file: ctx.path.to_path_buf(),
                    target: class.to_string(),
                    reason: "no component with this class name".to_string(),
                });
                None
            }
        }
    }

    fn skip_file(&self, path: &Path, reason: String) {
        self.sink.emit(PipelineEvent::RouteFileSkipped {
            path: path.to_path_buf(),
            reason,
        });
    }
}

struct FileContext<'a, 'c> {
    path: &'a Path,
    route_dir: &'a Path,
    source: &'a [u8],
    index: &'a TargetIndex<'c>,
}

/// File a lazy-import module path refers to.
fn module_file(route_dir: &Path, module: &str) -> PathBuf {
    if module.ends_with(".ts") {
        resolve_relative(route_dir, module)
    } else {
        resolve_relative(route_dir, &format!("{}.ts", module))
    }
}
