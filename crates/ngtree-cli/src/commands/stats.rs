//! Stats command - Summarize the component graph and analysis findings
//!
//! Counts relations per source, reports cycles, roots and components the
//! entry cannot reach, and tallies the events raised during analysis.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use ngtree_config::ConfigOverrides;
use ngtree_core::{Analysis, ComponentId, RecordingSink, Tee, TracingSink};
use serde::Serialize;

use super::{analyze, display_name, prepare};
use crate::GlobalOptions;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Workspace root (defaults to the current directory)
    path: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Relation counts per source
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeCounts {
    pub usage: usize,
    pub imports: usize,
    pub routes: usize,
    pub top_level_routes: usize,
    pub merged: usize,
}

/// Summary of one analysis
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub components: usize,
    pub edges: EdgeCounts,
    pub entry: Option<String>,
    pub tree_size: usize,
    pub tree_depth: usize,
    pub cycles: Vec<Vec<String>>,
    pub roots: Vec<String>,
    pub unreachable: Vec<String>,
    pub events: BTreeMap<&'static str, usize>,
}

/// Execute the stats command
pub fn execute(args: StatsArgs, global: GlobalOptions) -> Result<()> {
    let session = prepare(&global, args.path.as_deref(), ConfigOverrides::default())?;

    let recorder = RecordingSink::new();
    let tracing_sink = TracingSink;
    let sink = Tee::new(&recorder, &tracing_sink);
    let analysis = analyze(&session, &sink, global.quiet)?;

    let report = build_report(&analysis, &recorder);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn build_report(analysis: &Analysis, recorder: &RecordingSink) -> StatsReport {
    let names = |ids: Vec<ComponentId>| -> Vec<String> {
        ids.iter().map(|id| display_name(analysis, id)).collect()
    };

    let graph = analysis.graph();
    let unreachable = match analysis.entry {
        Some(ref entry) => names(graph.unreachable_from(entry)),
        None => Vec::new(),
    };

    let mut events: BTreeMap<&'static str, usize> = BTreeMap::new();
    for event in recorder.events() {
        *events.entry(event.kind()).or_default() += 1;
    }

    StatsReport {
        components: analysis.components.len(),
        edges: EdgeCounts {
            usage: analysis.usage.edge_count(),
            imports: analysis.composition.edge_count(),
            routes: analysis.routes.nested.edge_count(),
            top_level_routes: analysis.routes.top_level.len(),
            merged: analysis.merged.edge_count(),
        },
        entry: analysis
            .entry
            .as_ref()
            .map(|entry| display_name(analysis, entry)),
        tree_size: analysis.tree.as_ref().map_or(0, |tree| tree.size()),
        tree_depth: analysis.tree.as_ref().map_or(0, |tree| tree.depth()),
        cycles: graph.cycles().into_iter().map(&names).collect(),
        roots: names(graph.roots()),
        unreachable,
        events,
    }
}

fn print_report(report: &StatsReport) {
    println!("Component Graph");
    println!("===============\n");

    println!("Components:    {}", report.components);
    println!(
        "Entry:         {}",
        report.entry.as_deref().unwrap_or("(none)")
    );
    println!(
        "Tree:          {} nodes, depth {}",
        report.tree_size, report.tree_depth
    );

    println!("\nRelations:");
    println!("  usage:       {}", report.edges.usage);
    println!("  imports:     {}", report.edges.imports);
    println!("  routes:      {}", report.edges.routes);
    println!("  top-level:   {}", report.edges.top_level_routes);
    println!("  merged:      {}", report.edges.merged);

    print_list("Cycles", &report.cycles.iter().map(|c| c.join(" <-> ")).collect::<Vec<_>>());
    print_list("Roots", &report.roots);
    print_list("Unreachable from entry", &report.unreachable);

    println!("\nFindings:");
    if report.events.is_empty() {
        println!("  (none)");
    }
    for (kind, count) in &report.events {
        println!("  {}: {}", kind, count);
    }
}

fn print_list(title: &str, items: &[String]) {
    println!("\n{} ({}):", title, items.len());
    if items.is_empty() {
        println!("  (none)");
    }
    for item in items {
        println!("  {}", item);
    }
}
