//! CLI command implementations

pub mod components;
pub mod config;
pub mod relations;
pub mod stats;
pub mod tree;

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use ngtree_config::{
    ChildOrderSetting, ConfigLoader, ConfigOverrides, LogFormat, LoggingConfig, NgTreeConfig,
    OrphanChildren,
};
use ngtree_core::{
    Analysis, ChildOrder, ComponentId, EventSink, HierarchyPipeline, OrphanRoutePolicy,
    PipelineConfig, RouteResolverConfig,
};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::progress::{finish_spinner, finish_spinner_warn, spinner};
use crate::GlobalOptions;

/// A resolved workspace with its effective configuration.
pub struct Session {
    pub workspace: PathBuf,
    pub config: NgTreeConfig,
}

/// Resolve the workspace path from an argument or the current directory.
pub fn resolve_workspace(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => path
            .canonicalize()
            .with_context(|| format!("Workspace not found: {}", path.display())),
        None => std::env::current_dir().context("Failed to get current directory"),
    }
}

/// Load configuration with optional config file override.
pub fn load_config(
    global: &GlobalOptions,
    workspace: &Path,
    overrides: &ConfigOverrides,
) -> Result<NgTreeConfig> {
    let mut loader = ConfigLoader::new();

    if let Some(ref config_path) = global.config {
        return loader
            .load_with_file(config_path, Some(overrides))
            .with_context(|| format!("Failed to load config file {}", config_path.display()));
    }

    loader
        .load(workspace, Some(overrides))
        .context("Failed to load configuration")
}

/// Resolve the workspace, load its configuration and set up logging.
///
/// `overrides` carries command-specific flags; the global verbosity flags
/// are layered on top.
pub fn prepare(
    global: &GlobalOptions,
    path: Option<&Path>,
    mut overrides: ConfigOverrides,
) -> Result<Session> {
    let workspace = resolve_workspace(path)?;
    overrides.log_level = global.to_config_overrides().log_level;

    let config = load_config(global, &workspace, &overrides)?;
    init_logging(&config.logging)?;

    Ok(Session { workspace, config })
}

/// Install the global tracing subscriber, writing to stderr.
pub fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let level = Level::from_str(&logging.level).unwrap_or(Level::WARN);

    match logging.format {
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .json()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

/// Map the file-level configuration onto pipeline settings.
pub fn to_pipeline_config(config: &NgTreeConfig) -> PipelineConfig {
    let routes = RouteResolverConfig {
        file_suffix: config.routes.file_suffix.clone(),
        binding: config.routes.binding.clone(),
        orphan_children: match config.routes.orphan_children {
            OrphanChildren::Promote => OrphanRoutePolicy::Promote,
            OrphanChildren::Drop => OrphanRoutePolicy::Drop,
        },
        static_components: config.routes.static_components,
        exclude_dirs: config.routes.exclude_dirs.iter().cloned().collect(),
    };

    PipelineConfig {
        component_suffix: config.analysis.component_suffix.clone(),
        exclude_patterns: config.analysis.exclude_patterns.clone(),
        max_file_size_kb: config.analysis.max_file_size_kb,
        root_selector: config.conventions.root_selector.clone(),
        outlet_tag: config.conventions.outlet_tag.clone(),
        routes_enabled: config.routes.enabled,
        route_search_dir: config.routes.search_dir.clone(),
        routes,
        child_order: match config.output.child_order {
            ChildOrderSetting::Name => ChildOrder::Name,
            ChildOrderSetting::Relation => ChildOrder::Relation,
        },
        max_depth: config.output.max_depth,
    }
}

/// Run the full pipeline over the session's workspace.
pub fn analyze(session: &Session, sink: &dyn EventSink, quiet: bool) -> Result<Analysis> {
    let pb = spinner(
        &format!("Analyzing {}...", session.workspace.display()),
        quiet,
    );

    let pipeline = HierarchyPipeline::new(to_pipeline_config(&session.config), sink);
    let analysis = pipeline
        .analyze_workspace(&session.workspace)
        .with_context(|| format!("Failed to analyze {}", session.workspace.display()))?;

    if analysis.components.is_empty() {
        finish_spinner_warn(pb, "No components found");
    } else {
        finish_spinner(
            pb,
            &format!(
                "Analyzed {} components, {} relations",
                analysis.components.len(),
                analysis.merged.edge_count()
            ),
        );
    }

    Ok(analysis)
}

/// Class name of a component, or its id when it has no record.
pub fn display_name(analysis: &Analysis, id: &ComponentId) -> String {
    analysis
        .component(id)
        .map(|component| component.class_name.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Path relative to the workspace root when possible.
pub fn relative_path(analysis: &Analysis, path: &Path) -> PathBuf {
    path.strip_prefix(&analysis.workspace_root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Print an info message (respects quiet flag).
pub fn print_info(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{}", message);
    }
}
