//! ngtree configuration management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.ngtree/config.toml`
//! - Local config: `.ngtree/config.toml` (in workspace)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log levels accepted by `logging.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Root configuration for ngtree.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct NgTreeConfig {
    /// Component discovery and extraction
    pub analysis: AnalysisConfig,

    /// Framework naming conventions
    pub conventions: ConventionsConfig,

    /// Route file resolution
    pub routes: RoutesConfig,

    /// Tree output
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// File name suffix identifying component sources
    pub component_suffix: String,

    /// File patterns to exclude (glob patterns, relative to the workspace)
    pub exclude_patterns: Vec<String>,

    /// Maximum file size to analyze (in KB)
    pub max_file_size_kb: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            component_suffix: ".component.ts".to_string(),
            exclude_patterns: vec![
                "**/node_modules/**".to_string(),
                "**/dist/**".to_string(),
                "**/.angular/**".to_string(),
                "**/coverage/**".to_string(),
            ],
            max_file_size_kb: 1024,
        }
    }
}

/// Selector conventions.
///
/// # Example TOML
///
/// ```toml
/// [conventions]
/// root_selector = "app-root"
/// outlet_tag = "router-outlet"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConventionsConfig {
    /// Selector of the application's entry component
    pub root_selector: String,

    /// Tag marking where routed content renders
    pub outlet_tag: String,
}

impl Default for ConventionsConfig {
    fn default() -> Self {
        Self {
            root_selector: "app-root".to_string(),
            outlet_tag: "router-outlet".to_string(),
        }
    }
}

/// Route resolution configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoutesConfig {
    /// Resolve route files at all
    pub enabled: bool,

    /// Directory searched for route files, relative to the workspace
    pub search_dir: PathBuf,

    /// File name suffix identifying route files
    pub file_suffix: String,

    /// Name of the variable holding the route list
    pub binding: String,

    /// What happens to children of a route whose target is unresolved
    pub orphan_children: OrphanChildren,

    /// Resolve `component: SomeComponent` references by class name
    pub static_components: bool,

    /// Directory names skipped while searching for route files
    pub exclude_dirs: Vec<String>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            search_dir: PathBuf::from("src/app"),
            file_suffix: ".routes.ts".to_string(),
            binding: "routes".to_string(),
            orphan_children: OrphanChildren::default(),
            static_components: true,
            exclude_dirs: vec![
                "node_modules".to_string(),
                "dist".to_string(),
                "build".to_string(),
                "coverage".to_string(),
            ],
        }
    }
}

/// Handling of nested routes under an unresolved parent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrphanChildren {
    /// Attach to the nearest resolved ancestor
    #[default]
    Promote,
    /// Leave them without a parent
    Drop,
}

impl std::fmt::Display for OrphanChildren {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrphanChildren::Promote => write!(f, "promote"),
            OrphanChildren::Drop => write!(f, "drop"),
        }
    }
}

impl std::str::FromStr for OrphanChildren {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "promote" => Ok(OrphanChildren::Promote),
            "drop" => Ok(OrphanChildren::Drop),
            _ => Err(ConfigError::invalid_value(
                "routes.orphan_children",
                format!("unknown policy '{}', expected: promote, drop", s),
            )),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Tree output format
    pub format: OutputFormat,

    /// Ordering of siblings in the tree
    pub child_order: ChildOrderSetting,

    /// Deepest level expanded (root is 0); unlimited when absent
    pub max_depth: Option<usize>,
}

/// Tree output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented text tree
    #[default]
    Text,
    /// JSON document
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ConfigError::invalid_value(
                "output.format",
                format!("unknown format '{}', expected: text, json", s),
            )),
        }
    }
}

/// Sibling ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChildOrderSetting {
    /// By class name, then file path
    #[default]
    Name,
    /// As stored in the merged relation map
    Relation,
}

impl std::fmt::Display for ChildOrderSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChildOrderSetting::Name => write!(f, "name"),
            ChildOrderSetting::Relation => write!(f, "relation"),
        }
    }
}

impl std::str::FromStr for ChildOrderSetting {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(ChildOrderSetting::Name),
            "relation" => Ok(ChildOrderSetting::Relation),
            _ => Err(ConfigError::invalid_value(
                "output.child_order",
                format!("unknown order '{}', expected: name, relation", s),
            )),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override entry component selector
    pub root_selector: Option<String>,

    /// Override tree output format
    pub output_format: Option<OutputFormat>,

    /// Override sibling ordering
    pub child_order: Option<ChildOrderSetting>,

    /// Override depth limit
    pub max_depth: Option<usize>,

    /// Override log level
    pub log_level: Option<String>,
}

impl NgTreeConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref selector) = overrides.root_selector {
            self.conventions.root_selector = selector.clone();
        }

        if let Some(format) = overrides.output_format {
            self.output.format = format;
        }

        if let Some(order) = overrides.child_order {
            self.output.child_order = order;
        }

        if let Some(depth) = overrides.max_depth {
            self.output.max_depth = Some(depth);
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("analysis.component_suffix", &self.analysis.component_suffix)?;
        require_non_empty("conventions.root_selector", &self.conventions.root_selector)?;
        require_non_empty("routes.file_suffix", &self.routes.file_suffix)?;
        require_non_empty("routes.binding", &self.routes.binding)?;

        if !self.conventions.outlet_tag.contains('-') {
            return Err(ConfigError::invalid_value(
                "conventions.outlet_tag",
                format!(
                    "'{}' is not a component-style tag (must contain a hyphen)",
                    self.conventions.outlet_tag
                ),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!(
                    "unknown level '{}', expected one of: {}",
                    self.logging.level,
                    LOG_LEVELS.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Get the effective route search directory for a workspace.
    pub fn route_search_dir(&self, workspace_root: &std::path::Path) -> PathBuf {
        if self.routes.search_dir.is_absolute() {
            self.routes.search_dir.clone()
        } else {
            workspace_root.join(&self.routes.search_dir)
        }
    }
}

fn require_non_empty(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid_value(key, "must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[test]
    fn test_default_config() {
        let config = NgTreeConfig::default();
        assert_eq!(config.analysis.component_suffix, ".component.ts");
        assert_eq!(config.conventions.root_selector, "app-root");
        assert_eq!(config.conventions.outlet_tag, "router-outlet");
        assert!(config.routes.enabled);
        assert_eq!(config.routes.binding, "routes");
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.output.max_depth, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = NgTreeConfig::default();
        let overrides = ConfigOverrides {
            root_selector: Some("my-shell".to_string()),
            output_format: Some(OutputFormat::Json),
            child_order: Some(ChildOrderSetting::Relation),
            max_depth: Some(3),
            log_level: Some("debug".to_string()),
        };

        config.apply_overrides(&overrides);

        assert_eq!(config.conventions.root_selector, "my-shell");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.child_order, ChildOrderSetting::Relation);
        assert_eq!(config.output.max_depth, Some(3));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_overrides_change_nothing() {
        let mut config = NgTreeConfig::default();
        config.apply_overrides(&ConfigOverrides::default());
        assert_eq!(config, NgTreeConfig::default());
    }

    #[test]
    fn test_validate_rejects_empty_suffix() {
        let mut config = NgTreeConfig::default();
        config.analysis.component_suffix = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("analysis.component_suffix"));
    }

    #[test]
    fn test_validate_rejects_plain_outlet_tag() {
        let mut config = NgTreeConfig::default();
        config.conventions.outlet_tag = "outlet".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("conventions.outlet_tag"));
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let mut config = NgTreeConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_route_search_dir_resolution() {
        let config = NgTreeConfig::default();
        assert_eq!(
            config.route_search_dir(Path::new("/ws")),
            PathBuf::from("/ws/src/app")
        );

        let mut config = NgTreeConfig::default();
        config.routes.search_dir = PathBuf::from("/elsewhere");
        assert_eq!(
            config.route_search_dir(Path::new("/ws")),
            PathBuf::from("/elsewhere")
        );
    }

    #[test]
    fn test_enum_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "relation".parse::<ChildOrderSetting>().unwrap(),
            ChildOrderSetting::Relation
        );
        assert_eq!("drop".parse::<OrphanChildren>().unwrap(), OrphanChildren::Drop);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_enum_display_roundtrip() {
        for format in [OutputFormat::Text, OutputFormat::Json] {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }
        for order in [ChildOrderSetting::Name, ChildOrderSetting::Relation] {
            assert_eq!(order.to_string().parse::<ChildOrderSetting>().unwrap(), order);
        }
    }

    #[test]
    fn test_partial_toml() {
        let config: NgTreeConfig = toml::from_str(
            r#"
[routes]
binding = "appRoutes"
orphan_children = "drop"

[output]
max_depth = 4
"#,
        )
        .unwrap();

        assert_eq!(config.routes.binding, "appRoutes");
        assert_eq!(config.routes.orphan_children, OrphanChildren::Drop);
        assert_eq!(config.routes.file_suffix, ".routes.ts");
        assert_eq!(config.output.max_depth, Some(4));
        assert_eq!(config.conventions, ConventionsConfig::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = NgTreeConfig::default();
        config.output.max_depth = Some(2);
        config.logging.format = LogFormat::Json;

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: NgTreeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
