//! Config command - View and manage configuration
//!
//! - Show the effective configuration with the source of each value
//! - Get a single value
//! - Create a default config file (local or global)
//! - Show configuration file paths

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use ngtree_config::{ConfigLoader, ConfigOverrides, LoggingConfig, NgTreeConfig};
use serde::Serialize;

use super::{init_logging, prepare, resolve_workspace};
use crate::GlobalOptions;

/// Config management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration with value sources
    Show(ShowArgs),

    /// Get a specific configuration value
    Get(GetArgs),

    /// Create a configuration file with default values
    Init(InitArgs),

    /// Show configuration file paths
    Path(PathArgs),
}

/// Arguments for the show command
#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Workspace root (defaults to the current directory)
    path: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the get command
#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Configuration key (e.g., "routes.binding")
    key: String,

    /// Workspace root (defaults to the current directory)
    path: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Arguments for the init command
#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Workspace root (defaults to the current directory)
    path: Option<PathBuf>,

    /// Create ~/.ngtree/config.toml instead of the workspace file
    #[arg(long)]
    global: bool,
}

/// Arguments for the path command
#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Workspace root (defaults to the current directory)
    path: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Configuration value with source information
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue {
    /// Configuration key
    pub key: String,
    /// Current value
    pub value: serde_json::Value,
    /// Source of this value (default, global, local)
    pub source: String,
}

/// Configuration paths
#[derive(Debug, Clone, Serialize)]
pub struct ConfigPaths {
    /// Global config file path
    pub global: Option<PathBuf>,
    /// Local config file path
    pub local: PathBuf,
    /// Whether global config exists
    pub global_exists: bool,
    /// Whether local config exists
    pub local_exists: bool,
}

/// Execute the config command
pub fn execute(cmd: ConfigCommand, global: GlobalOptions) -> Result<()> {
    match cmd {
        ConfigCommand::Show(args) => execute_show(args, global),
        ConfigCommand::Get(args) => execute_get(args, global),
        ConfigCommand::Init(args) => execute_init(args, global),
        ConfigCommand::Path(args) => execute_path(args, global),
    }
}

fn execute_show(args: ShowArgs, global: GlobalOptions) -> Result<()> {
    let session = prepare(&global, args.path.as_deref(), ConfigOverrides::default())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&session.config)?);
        return Ok(());
    }

    let mut loader = ConfigLoader::new();
    let global_config = loader.load_global()?.unwrap_or_default();
    let local_path = local_path(&global, &loader, &session.workspace);

    // The effective config already carries the local layer; attribute a
    // value to it when it differs from what global alone would give.
    let values = collect_config_values(&NgTreeConfig::default(), &global_config, &session.config)?;

    println!("ngtree Configuration");
    println!("====================\n");
    if let Some(gp) = loader.global_config_path() {
        println!("Global config: {}{}", gp.display(), missing_marker(&gp));
    }
    println!(
        "Local config:  {}{}\n",
        local_path.display(),
        missing_marker(&local_path)
    );

    let mut section = String::new();
    for value in values {
        let (head, field) = value.key.split_once('.').unwrap_or(("", value.key.as_str()));
        if head != section {
            if !section.is_empty() {
                println!();
            }
            println!("[{}]", head);
            section = head.to_string();
        }
        let marker = match value.source.as_str() {
            "default" => String::new(),
            source => format!("  ({})", source),
        };
        println!("{} = {}{}", field, value.value, marker);
    }

    Ok(())
}

fn execute_get(args: GetArgs, global: GlobalOptions) -> Result<()> {
    let session = prepare(&global, args.path.as_deref(), ConfigOverrides::default())?;

    let value = get_config_value(&session.config, &args.key)
        .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", args.key))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        match value {
            serde_json::Value::String(s) => println!("{}", s),
            serde_json::Value::Bool(b) => println!("{}", b),
            serde_json::Value::Number(n) => println!("{}", n),
            serde_json::Value::Null => println!("null"),
            other => println!("{}", serde_json::to_string_pretty(&other)?),
        }
    }

    Ok(())
}

fn execute_init(args: InitArgs, global: GlobalOptions) -> Result<()> {
    init_default_logging(&global)?;
    let loader = ConfigLoader::new();

    let path = if args.global {
        loader
            .init_global()
            .context("Failed to initialize global config")?
    } else {
        let workspace = resolve_workspace(args.path.as_deref())?;
        loader
            .init_local(&workspace)
            .context("Failed to initialize local config")?
    };

    println!("{}", path.display());
    Ok(())
}

fn execute_path(args: PathArgs, global: GlobalOptions) -> Result<()> {
    init_default_logging(&global)?;
    let workspace = resolve_workspace(args.path.as_deref())?;
    let loader = ConfigLoader::new();

    let global_path = loader.global_config_path();
    let local_path = local_path(&global, &loader, &workspace);

    let paths = ConfigPaths {
        global_exists: global_path.as_ref().is_some_and(|p| p.exists()),
        global: global_path,
        local_exists: local_path.exists(),
        local: local_path,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&paths)?);
        return Ok(());
    }

    println!("Configuration Paths");
    println!("===================\n");

    match paths.global {
        Some(ref gp) => println!("Global: {} ({})", gp.display(), status(paths.global_exists)),
        None => println!("Global: not available (no home directory)"),
    }
    println!(
        "Local:  {} ({})",
        paths.local.display(),
        status(paths.local_exists)
    );

    Ok(())
}

/// Logging for commands that do not load the workspace configuration.
fn init_default_logging(global: &GlobalOptions) -> Result<()> {
    let mut logging = LoggingConfig::default();
    if let Some(level) = global.to_config_overrides().log_level {
        logging.level = level;
    }
    init_logging(&logging)
}

/// The file playing the local role: `--config` when given.
fn local_path(global: &GlobalOptions, loader: &ConfigLoader, workspace: &Path) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(|| loader.local_config_path(workspace))
}

fn status(exists: bool) -> &'static str {
    if exists {
        "exists"
    } else {
        "not found"
    }
}

fn missing_marker(path: &Path) -> &'static str {
    if path.exists() {
        ""
    } else {
        " (not found)"
    }
}

/// Get a configuration value by key path
fn get_config_value(config: &NgTreeConfig, key: &str) -> Option<serde_json::Value> {
    let json = serde_json::to_value(config).ok()?;

    let mut current = &json;
    for part in key.split('.') {
        current = current.get(part)?;
    }

    Some(current.clone())
}

/// Collect configuration values with source information
fn collect_config_values(
    default: &NgTreeConfig,
    global: &NgTreeConfig,
    effective: &NgTreeConfig,
) -> Result<Vec<ConfigValue>> {
    let default_json = serde_json::to_value(default)?;
    let global_json = serde_json::to_value(global)?;
    let effective_json = serde_json::to_value(effective)?;

    let mut values = Vec::new();
    flatten_config("", &effective_json, &global_json, &default_json, &mut values);
    Ok(values)
}

/// Recursively flatten config into key-value pairs with sources
fn flatten_config(
    prefix: &str,
    effective: &serde_json::Value,
    global: &serde_json::Value,
    default: &serde_json::Value,
    values: &mut Vec<ConfigValue>,
) {
    match effective {
        serde_json::Value::Object(map) => {
            for (key, value) in map {
                let new_prefix = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };

                let global_val = global.get(key).unwrap_or(&serde_json::Value::Null);
                let default_val = default.get(key).unwrap_or(&serde_json::Value::Null);

                flatten_config(&new_prefix, value, global_val, default_val, values);
            }
        }
        _ => {
            let source = if effective == global && global != default {
                "global"
            } else if effective != default {
                "local"
            } else {
                "default"
            };

            values.push(ConfigValue {
                key: prefix.to_string(),
                value: effective.clone(),
                source: source.to_string(),
            });
        }
    }
}
