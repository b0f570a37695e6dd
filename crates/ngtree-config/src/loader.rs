//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.ngtree/config.toml`
//! 2. Local config: `.ngtree/config.toml` (in workspace)
//! 3. CLI overrides
//!
//! Later sources override earlier ones.

use crate::error::ConfigError;
use crate::{
    AnalysisConfig, ConfigOverrides, ConventionsConfig, LoggingConfig, NgTreeConfig, OutputConfig,
    RoutesConfig,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Global configuration directory name.
const GLOBAL_CONFIG_DIR: &str = ".ngtree";

/// Local configuration directory name.
const LOCAL_CONFIG_DIR: &str = ".ngtree";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.ngtree`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<NgTreeConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.ngtree`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a workspace.
    pub fn local_config_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(LOCAL_CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration for a workspace with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides, then validates
    /// the result.
    pub fn load(
        &mut self,
        workspace_root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<NgTreeConfig, ConfigError> {
        let mut config = NgTreeConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = self.load_local(workspace_root)? {
            config = merge_configs(config, local_config);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with an explicit file in place of the local one.
    ///
    /// Merges config in order: global → `config_file` → overrides.
    pub fn load_with_file(
        &mut self,
        config_file: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<NgTreeConfig, ConfigError> {
        let mut config = NgTreeConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        debug!("Loading config file {:?}", config_file);
        config = merge_configs(config, load_config_file(config_file)?);

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<NgTreeConfig>, ConfigError> {
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = load_config_file(&global_path)?;

        self.global_config = Some(config.clone());

        Ok(Some(config))
    }

    /// Load only the local configuration for a workspace.
    pub fn load_local(&self, workspace_root: &Path) -> Result<Option<NgTreeConfig>, ConfigError> {
        let local_path = self.local_config_path(workspace_root);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Save configuration to the global config file.
    pub fn save_global(&self, config: &NgTreeConfig) -> Result<(), ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };

        save_config_file(&global_dir.join(CONFIG_FILE_NAME), config)
    }

    /// Save configuration to the local config file for a workspace.
    pub fn save_local(
        &self,
        workspace_root: &Path,
        config: &NgTreeConfig,
    ) -> Result<(), ConfigError> {
        save_config_file(&self.local_config_path(workspace_root), config)
    }

    /// Initialize global configuration directory.
    ///
    /// Creates `~/.ngtree/config.toml` with default configuration. An
    /// existing file is left untouched.
    pub fn init_global(&self) -> Result<PathBuf, ConfigError> {
        let Some(ref global_dir) = self.global_config_dir else {
            return Err(ConfigError::NoHomeDir);
        };

        init_config_dir(global_dir)
    }

    /// Initialize local configuration for a workspace.
    ///
    /// Creates `.ngtree/config.toml` with default configuration. An
    /// existing file is left untouched.
    pub fn init_local(&self, workspace_root: &Path) -> Result<PathBuf, ConfigError> {
        init_config_dir(&workspace_root.join(LOCAL_CONFIG_DIR))
    }

    /// Clear cached global configuration.
    ///
    /// Forces reload on next `load_global()` call.
    pub fn clear_cache(&mut self) {
        self.global_config = None;
    }
}

fn init_config_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::create_dir(dir, e))?;
    }

    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        save_config_file(&config_path, &NgTreeConfig::default())?;
    }

    Ok(config_path)
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<NgTreeConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;

    toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &NgTreeConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
}

/// Overlay value if it differs from the default, otherwise the base value.
///
/// A partial file deserializes missing keys to their defaults, so a default
/// in the overlay means "not set here".
fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

/// Overlay entries extend base entries, keeping first occurrences.
fn union(mut base: Vec<String>, overlay: Vec<String>) -> Vec<String> {
    for entry in overlay {
        if !base.contains(&entry) {
            base.push(entry);
        }
    }
    base
}

/// Merge two configurations, with `overlay` taking precedence.
fn merge_configs(base: NgTreeConfig, overlay: NgTreeConfig) -> NgTreeConfig {
    NgTreeConfig {
        analysis: merge_analysis(base.analysis, overlay.analysis),
        conventions: merge_conventions(base.conventions, overlay.conventions),
        routes: merge_routes(base.routes, overlay.routes),
        output: merge_output(base.output, overlay.output),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

/// Merge analysis config.
fn merge_analysis(base: AnalysisConfig, overlay: AnalysisConfig) -> AnalysisConfig {
    let default = AnalysisConfig::default();
    AnalysisConfig {
        component_suffix: pick(
            base.component_suffix,
            overlay.component_suffix,
            default.component_suffix,
        ),
        exclude_patterns: union(base.exclude_patterns, overlay.exclude_patterns),
        max_file_size_kb: pick(
            base.max_file_size_kb,
            overlay.max_file_size_kb,
            default.max_file_size_kb,
        ),
    }
}

/// Merge conventions config.
fn merge_conventions(base: ConventionsConfig, overlay: ConventionsConfig) -> ConventionsConfig {
    let default = ConventionsConfig::default();
    ConventionsConfig {
        root_selector: pick(base.root_selector, overlay.root_selector, default.root_selector),
        outlet_tag: pick(base.outlet_tag, overlay.outlet_tag, default.outlet_tag),
    }
}

/// Merge routes config.
fn merge_routes(base: RoutesConfig, overlay: RoutesConfig) -> RoutesConfig {
    let default = RoutesConfig::default();
    RoutesConfig {
        enabled: pick(base.enabled, overlay.enabled, default.enabled),
        search_dir: pick(base.search_dir, overlay.search_dir, default.search_dir),
        file_suffix: pick(base.file_suffix, overlay.file_suffix, default.file_suffix),
        binding: pick(base.binding, overlay.binding, default.binding),
        orphan_children: pick(
            base.orphan_children,
            overlay.orphan_children,
            default.orphan_children,
        ),
        static_components: pick(
            base.static_components,
            overlay.static_components,
            default.static_components,
        ),
        exclude_dirs: union(base.exclude_dirs, overlay.exclude_dirs),
    }
}

/// Merge output config.
fn merge_output(base: OutputConfig, overlay: OutputConfig) -> OutputConfig {
    let default = OutputConfig::default();
    OutputConfig {
        format: pick(base.format, overlay.format, default.format),
        child_order: pick(base.child_order, overlay.child_order, default.child_order),
        max_depth: overlay.max_depth.or(base.max_depth),
    }
}

/// Merge logging config.
fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    let default = LoggingConfig::default();
    LoggingConfig {
        level: pick(base.level, overlay.level, default.level),
        format: pick(base.format, overlay.format, default.format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChildOrderSetting, OrphanChildren, OutputFormat};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn create_test_config(content: &str, dir: &Path) -> PathBuf {
        let config_dir = dir.join(".ngtree");
        std::fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn write_global(global_dir: &Path, content: &str) {
        std::fs::create_dir_all(global_dir).unwrap();
        std::fs::write(global_dir.join("config.toml"), content).unwrap();
    }

    #[test]
    fn test_load_default_config() {
        let temp = TempDir::new().unwrap();
        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        let config = loader.load(temp.path(), None).unwrap();

        assert_eq!(config, NgTreeConfig::default());
    }

    #[test]
    fn test_load_local_config() {
        let temp = TempDir::new().unwrap();
        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        create_test_config(
            r#"
            [conventions]
            root_selector = "shell-root"

            [routes]
            search_dir = "projects/shop/src/app"
            "#,
            temp.path(),
        );

        let config = loader.load(temp.path(), None).unwrap();

        assert_eq!(config.conventions.root_selector, "shell-root");
        assert_eq!(
            config.routes.search_dir,
            PathBuf::from("projects/shop/src/app")
        );
        assert_eq!(config.conventions.outlet_tag, "router-outlet");
    }

    #[test]
    fn test_global_overrides_default() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");
        write_global(
            &global_dir,
            r#"
            [logging]
            level = "debug"
            "#,
        );

        let mut loader = ConfigLoader::with_global_dir(&global_dir);
        let config = loader.load(temp.path(), None).unwrap();

        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_local_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");
        write_global(
            &global_dir,
            r#"
            [logging]
            level = "debug"

            [output]
            format = "json"
            child_order = "relation"
            "#,
        );

        create_test_config(
            r#"
            [output]
            max_depth = 2
            child_order = "relation"

            [routes]
            enabled = false
            "#,
            temp.path(),
        );

        let mut loader = ConfigLoader::with_global_dir(&global_dir);
        let config = loader.load(temp.path(), None).unwrap();

        assert_eq!(config.output.max_depth, Some(2));
        assert!(!config.routes.enabled);
        // Values the local file does not set survive from global
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.child_order, ChildOrderSetting::Relation);
    }

    #[test]
    fn test_cli_overrides_all() {
        let temp = TempDir::new().unwrap();
        create_test_config(
            r#"
            [conventions]
            root_selector = "local-root"
            "#,
            temp.path(),
        );

        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let overrides = ConfigOverrides {
            root_selector: Some("cli-root".to_string()),
            log_level: Some("trace".to_string()),
            ..Default::default()
        };

        let config = loader.load(temp.path(), Some(&overrides)).unwrap();

        assert_eq!(config.conventions.root_selector, "cli-root");
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_invalid_local_config_is_rejected() {
        let temp = TempDir::new().unwrap();
        create_test_config(
            r#"
            [conventions]
            outlet_tag = "outlet"
            "#,
            temp.path(),
        );

        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let err = loader.load(temp.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_malformed_toml_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = create_test_config("[routes\nbinding = ", temp.path());

        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let err = loader.load(temp.path(), None).unwrap_err();
        match err {
            ConfigError::ParseToml { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_with_file_replaces_local() {
        let temp = TempDir::new().unwrap();
        create_test_config("[conventions]\nroot_selector = \"local-root\"\n", temp.path());
        let explicit = temp.path().join("custom.toml");
        std::fs::write(&explicit, "[routes]\nbinding = \"appRoutes\"\n").unwrap();

        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let config = loader.load_with_file(&explicit, None).unwrap();

        assert_eq!(config.routes.binding, "appRoutes");
        assert_eq!(config.conventions.root_selector, "app-root");
    }

    #[test]
    fn test_load_with_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let err = loader
            .load_with_file(&temp.path().join("absent.toml"), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp = TempDir::new().unwrap();
        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        let mut config = NgTreeConfig::default();
        config.routes.orphan_children = OrphanChildren::Drop;
        config.routes.binding = "appRoutes".to_string();

        loader.save_local(temp.path(), &config).unwrap();

        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));
        let loaded = loader.load(temp.path(), None).unwrap();

        assert_eq!(loaded.routes.orphan_children, OrphanChildren::Drop);
        assert_eq!(loaded.routes.binding, "appRoutes");
    }

    #[test]
    fn test_init_local_creates_config() {
        let temp = TempDir::new().unwrap();
        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        let config_path = loader.init_local(temp.path()).unwrap();

        assert!(config_path.exists());
        assert!(config_path.ends_with(".ngtree/config.toml"));

        let content = std::fs::read_to_string(&config_path).unwrap();
        let parsed: NgTreeConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, NgTreeConfig::default());
    }

    #[test]
    fn test_init_keeps_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = create_test_config("[logging]\nlevel = \"error\"\n", temp.path());
        let loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        assert_eq!(loader.init_local(temp.path()).unwrap(), path);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("error"));
    }

    #[test]
    fn test_init_global_creates_config() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");
        let loader = ConfigLoader::with_global_dir(&global_dir);

        let path = loader.init_global().unwrap();
        assert_eq!(path, global_dir.join("config.toml"));
        assert!(path.exists());
    }

    #[test]
    fn test_exclude_patterns_merge() {
        let base = AnalysisConfig {
            exclude_patterns: vec!["**/node_modules/**".to_string()],
            ..Default::default()
        };
        let overlay = AnalysisConfig {
            exclude_patterns: vec![
                "**/node_modules/**".to_string(),
                "**/legacy/**".to_string(),
            ],
            ..Default::default()
        };

        let merged = merge_analysis(base, overlay);

        assert_eq!(
            merged.exclude_patterns,
            vec!["**/node_modules/**".to_string(), "**/legacy/**".to_string()]
        );
    }

    #[test]
    fn test_route_exclude_dirs_extend_defaults() {
        let temp = TempDir::new().unwrap();
        let mut loader = ConfigLoader::with_global_dir(temp.path().join("global"));

        create_test_config(
            r#"
            [routes]
            exclude_dirs = ["legacy"]
            "#,
            temp.path(),
        );

        let config = loader.load(temp.path(), None).unwrap();

        assert!(config.routes.exclude_dirs.contains(&"legacy".to_string()));
        assert!(config.routes.exclude_dirs.contains(&"node_modules".to_string()));
    }

    #[test]
    fn test_max_depth_merge() {
        let base = OutputConfig {
            max_depth: Some(5),
            ..Default::default()
        };
        let merged = merge_output(base.clone(), OutputConfig::default());
        assert_eq!(merged.max_depth, Some(5));

        let overlay = OutputConfig {
            max_depth: Some(1),
            ..Default::default()
        };
        assert_eq!(merge_output(base, overlay).max_depth, Some(1));
    }

    #[test]
    fn test_cache_clearing() {
        let temp = TempDir::new().unwrap();
        let global_dir = temp.path().join("global");
        write_global(&global_dir, "[logging]\nlevel = \"debug\"\n");

        let mut loader = ConfigLoader::with_global_dir(&global_dir);

        let _ = loader.load_global().unwrap();
        assert!(loader.global_config.is_some());

        loader.clear_cache();
        assert!(loader.global_config.is_none());
    }
}
