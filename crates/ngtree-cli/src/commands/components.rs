//! Components command - List extracted component metadata

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use ngtree_config::ConfigOverrides;
use ngtree_core::{TemplateSource, TracingSink};

use super::{analyze, prepare, relative_path};
use crate::GlobalOptions;

#[derive(Args, Debug)]
pub struct ComponentsArgs {
    /// Workspace root (defaults to the current directory)
    path: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the components command
pub fn execute(args: ComponentsArgs, global: GlobalOptions) -> Result<()> {
    let session = prepare(&global, args.path.as_deref(), ConfigOverrides::default())?;
    let analysis = analyze(&session, &TracingSink, global.quiet)?;

    let mut components: Vec<_> = analysis.components.iter().collect();
    // Sort for deterministic ordering
    components.sort_by(|a, b| {
        a.class_name
            .cmp(&b.class_name)
            .then_with(|| a.file_path.cmp(&b.file_path))
    });

    if args.json {
        println!("{}", serde_json::to_string_pretty(&components)?);
        return Ok(());
    }

    if components.is_empty() {
        println!("No components found.");
        return Ok(());
    }

    println!("Found {} components:\n", components.len());
    for component in components {
        let template = match component.template {
            Some(TemplateSource::Inline(_)) => "inline".to_string(),
            Some(TemplateSource::External(ref path)) => {
                relative_path(&analysis, path).display().to_string()
            }
            None => "none".to_string(),
        };

        println!("  {} <{}>", component.class_name, component.selector);
        println!(
            "    file: {}",
            relative_path(&analysis, &component.file_path).display()
        );
        println!("    template: {}", template);
        if !component.used_tags.is_empty() {
            let tags: Vec<&str> = component.used_tags.iter().map(String::as_str).collect();
            println!("    tags: {}", tags.join(", "));
        }
        if !component.declared_imports.is_empty() {
            println!("    imports: {}", component.declared_imports.join(", "));
        }
    }

    Ok(())
}
