//! ngtree Core - Static Angular component hierarchy extraction
//!
//! This crate turns a set of component source files into one rooted tree:
//! - Tree-sitter parsing of `@Component` declarations and route files
//! - Template scanning for component-style tags
//! - Usage, composition and route relation resolution
//! - Relation merging with top-level route reattachment
//! - Cycle-safe hierarchy construction and graph diagnostics

pub mod discovery;
pub mod events;
pub mod graph;
pub mod hierarchy;
pub mod merge;
pub mod metadata;
pub mod model;
pub mod parser;
pub mod paths;
pub mod pipeline;
pub mod relations;
pub mod resolve;
pub mod syntax;
pub mod template;

// Model re-exports
pub use model::{ComponentId, ComponentMetadata, TemplateSource};
pub use relations::{RelationMap, RelationSource};

// Stage re-exports
pub use metadata::MetadataExtractor;
pub use template::{scan_tags, TemplateUsageExtractor};
pub use resolve::{
    CompositionResolver, OrphanRoutePolicy, RouteRelations, RouteResolver, RouteResolverConfig,
    UsageResolver,
};
pub use merge::GraphMerger;
pub use hierarchy::{find_entry, ChildOrder, HierarchyBuilder, HierarchyNode, HierarchyOptions};
pub use graph::ComponentGraph;

// Events re-exports
pub use events::{EventSink, NullSink, PipelineEvent, RecordingSink, SkipReason, Tee, TracingSink};

// Parser re-exports
pub use parser::{CodeParser, ParserError, SupportedLanguage};
pub use syntax::Unrecognized;

// Discovery and pipeline re-exports
pub use discovery::{ComponentScanner, DiscoveryError};
pub use pipeline::{Analysis, HierarchyPipeline, PipelineConfig, PipelineError};
