//! Relations command - Show the edges of one relation source

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use ngtree_config::ConfigOverrides;
use ngtree_core::{Analysis, ComponentId, RelationSource, TracingSink};
use serde::Serialize;

use super::{analyze, display_name, prepare, relative_path};
use crate::GlobalOptions;

#[derive(Args, Debug)]
pub struct RelationsArgs {
    /// Workspace root (defaults to the current directory)
    path: Option<PathBuf>,

    /// Which relations to show
    #[arg(long, short = 's', value_enum, default_value = "merged")]
    source: RelationKind,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RelationKind {
    /// Tags used in templates
    Usage,
    /// Classes listed in decorator imports
    Imports,
    /// Nested route targets and top-level routes
    Routes,
    /// Union of all sources after route reattachment
    Merged,
}

impl RelationKind {
    fn source(self) -> Option<RelationSource> {
        match self {
            RelationKind::Usage => Some(RelationSource::Usage),
            RelationKind::Imports => Some(RelationSource::Composition),
            RelationKind::Routes => Some(RelationSource::Route),
            RelationKind::Merged => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            RelationKind::Usage => "usage",
            RelationKind::Imports => "imports",
            RelationKind::Routes => "routes",
            RelationKind::Merged => "merged",
        }
    }
}

/// One edge, named for display
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeView {
    pub parent: String,
    pub child: String,
    pub parent_path: PathBuf,
    pub child_path: PathBuf,
}

/// Relations of one source
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationsReport {
    pub source: &'static str,
    pub edges: Vec<EdgeView>,
    /// Top-level route targets, before reattachment
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_level: Vec<String>,
}

/// Execute the relations command
pub fn execute(args: RelationsArgs, global: GlobalOptions) -> Result<()> {
    let session = prepare(&global, args.path.as_deref(), ConfigOverrides::default())?;
    let analysis = analyze(&session, &TracingSink, global.quiet)?;
    let report = build_report(&analysis, args.source);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.edges.is_empty() && report.top_level.is_empty() {
        println!("No {} relations found.", report.source);
        return Ok(());
    }

    println!("{} relations ({} edges):\n", report.source, report.edges.len());
    for edge in &report.edges {
        println!("  {} -> {}", edge.parent, edge.child);
    }

    if !report.top_level.is_empty() {
        println!("\nTop-level routes:");
        for name in &report.top_level {
            println!("  {}", name);
        }
    }

    Ok(())
}

fn build_report(analysis: &Analysis, kind: RelationKind) -> RelationsReport {
    let path_of = |id: &ComponentId| {
        analysis
            .component(id)
            .map(|component| relative_path(analysis, &component.file_path))
            .unwrap_or_default()
    };

    let mut edges: Vec<EdgeView> = analysis
        .relations(kind.source())
        .iter()
        .map(|(parent, child)| EdgeView {
            parent: display_name(analysis, parent),
            child: display_name(analysis, child),
            parent_path: path_of(parent),
            child_path: path_of(child),
        })
        .collect();
    // Sort for deterministic ordering
    edges.sort_by(|a, b| {
        (&a.parent, &a.child, &a.parent_path, &a.child_path)
            .cmp(&(&b.parent, &b.child, &b.parent_path, &b.child_path))
    });

    let top_level = if kind == RelationKind::Routes {
        let mut names: Vec<String> = analysis
            .routes
            .top_level
            .iter()
            .map(|id| display_name(analysis, id))
            .collect();
        names.sort();
        names
    } else {
        Vec::new()
    };

    RelationsReport {
        source: kind.label(),
        edges,
        top_level,
    }
}
