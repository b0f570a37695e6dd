//! Tree command - Print the component hierarchy

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use ngtree_config::{ChildOrderSetting, ConfigOverrides, OutputFormat};
use ngtree_core::{HierarchyNode, TracingSink};

use super::{analyze, prepare, print_info};
use crate::GlobalOptions;

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Workspace root (defaults to the current directory)
    path: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', value_enum)]
    format: Option<TreeFormat>,

    /// Write the tree to a file instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Sibling ordering
    #[arg(long, value_enum)]
    order: Option<SiblingOrder>,

    /// Deepest level to expand (the root is level 0)
    #[arg(long, short = 'd')]
    max_depth: Option<usize>,

    /// Selector of the entry component
    #[arg(long)]
    root_selector: Option<String>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum TreeFormat {
    /// Indented text tree
    Text,
    /// JSON document
    Json,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SiblingOrder {
    /// By class name, then file path
    Name,
    /// As stored in the merged relations
    Relation,
}

impl TreeArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            root_selector: self.root_selector.clone(),
            output_format: self.format.map(|format| match format {
                TreeFormat::Text => OutputFormat::Text,
                TreeFormat::Json => OutputFormat::Json,
            }),
            child_order: self.order.map(|order| match order {
                SiblingOrder::Name => ChildOrderSetting::Name,
                SiblingOrder::Relation => ChildOrderSetting::Relation,
            }),
            max_depth: self.max_depth,
            ..Default::default()
        }
    }
}

/// Execute the tree command
pub fn execute(args: TreeArgs, global: GlobalOptions) -> Result<()> {
    let session = prepare(&global, args.path.as_deref(), args.overrides())?;
    let analysis = analyze(&session, &TracingSink, global.quiet)?;

    let rendered = match session.config.output.format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&analysis.tree)?;
            json.push('\n');
            json
        }
        OutputFormat::Text => match analysis.tree {
            Some(ref tree) => render_text(tree),
            None => {
                print_info("No components found.", global.quiet);
                return Ok(());
            }
        },
    };

    match args.output {
        Some(ref path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_info(&format!("Tree written to {}", path.display()), global.quiet);
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// Render a tree with one node per line.
///
/// Children are indented two spaces per level and marked with `|- `; a
/// node cut by the cycle guard is suffixed with `(circular)`.
pub fn render_text(tree: &HierarchyNode) -> String {
    let mut out = String::new();
    tree.walk(&mut |node, depth| {
        let indent = "  ".repeat(depth.saturating_sub(1));
        let marker = if depth == 0 { "" } else { "|- " };
        let circular = if node.cyclic { " (circular)" } else { "" };
        out.push_str(&format!(
            "{}{}{} <{}>{}\n",
            indent, marker, node.name, node.selector, circular
        ));
    });
    out
}
