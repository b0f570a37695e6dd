//! ngtree CLI - Angular component hierarchy extraction
//!
//! Reads the component sources of an Angular workspace and prints the
//! component tree rooted at the application's entry component.
//!
//! # Usage
//!
//! ```bash
//! # Print the tree of the current workspace
//! ngtree tree
//!
//! # Write it as JSON
//! ngtree tree ./my-app --format json --output tree.json
//!
//! # Inspect one relation source
//! ngtree relations --source routes
//!
//! # Cycles, roots and unreachable components
//! ngtree stats
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;
mod progress;

/// ngtree - Static component hierarchy of Angular workspaces
#[derive(Parser, Debug)]
#[command(name = "ngtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Args, Debug, Clone)]
struct GlobalOptions {
    /// Path to configuration file (replaces the workspace's .ngtree/config.toml)
    #[arg(long, short = 'c', global = true, env = "NGTREE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

impl GlobalOptions {
    /// Convert global options to config overrides
    pub fn to_config_overrides(&self) -> ngtree_config::ConfigOverrides {
        let log_level = if self.quiet {
            Some("error".to_string())
        } else if self.verbose {
            Some("debug".to_string())
        } else {
            None
        };

        ngtree_config::ConfigOverrides {
            log_level,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the component hierarchy
    Tree(commands::tree::TreeArgs),

    /// List extracted component metadata
    Components(commands::components::ComponentsArgs),

    /// Show parent → child relations of one source
    Relations(commands::relations::RelationsArgs),

    /// Summarize the component graph and analysis findings
    Stats(commands::stats::StatsArgs),

    /// View and manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tree(args) => commands::tree::execute(args, cli.global),
        Commands::Components(args) => commands::components::execute(args, cli.global),
        Commands::Relations(args) => commands::relations::execute(args, cli.global),
        Commands::Stats(args) => commands::stats::execute(args, cli.global),
        Commands::Config(cmd) => commands::config::execute(cmd, cli.global),
    }
}
