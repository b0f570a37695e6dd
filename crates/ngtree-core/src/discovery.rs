//! Component File Discovery
//!
//! Enumerates the component source files under an analysis root. Hidden
//! entries, `.gitignore`d paths, paths listed in `.ngtreeignore` and paths
//! matching the configured exclude globs are left out.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the project-specific ignore file.
pub const IGNORE_FILE_NAME: &str = ".ngtreeignore";

/// Default file name suffix of component sources.
pub const DEFAULT_COMPONENT_SUFFIX: &str = ".component.ts";

/// Errors during component discovery
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Root path does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Finds component source files by name suffix.
#[derive(Debug, Clone)]
pub struct ComponentScanner {
    suffix: String,
    exclude_patterns: Vec<String>,
}

impl Default for ComponentScanner {
    fn default() -> Self {
        Self::new(DEFAULT_COMPONENT_SUFFIX)
    }
}

impl ComponentScanner {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            exclude_patterns: Vec::new(),
        }
    }

    /// Set glob patterns, relative to the root, of files to skip.
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Absolute paths of component files under `root`, sorted.
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root = root
            .canonicalize()
            .map_err(|_| DiscoveryError::RootNotFound(root.to_path_buf()))?;
        if !root.is_dir() {
            return Err(DiscoveryError::RootNotFound(root));
        }

        info!("Scanning for *{} files in {}", self.suffix, root.display());
        let glob_set = self.build_exclude_glob_set();

        let walker = WalkBuilder::new(&root)
            .follow_links(false)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .add_custom_ignore_filename(IGNORE_FILE_NAME)
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Error walking directory: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            if !path.to_string_lossy().ends_with(&self.suffix) {
                continue;
            }

            let rel_path = path.strip_prefix(&root).unwrap_or(path);
            let rel_path_str = rel_path.to_string_lossy().replace('\\', "/");
            if glob_set.is_match(rel_path_str.as_str()) {
                debug!("Skipping excluded file: {}", rel_path_str);
                continue;
            }

            files.push(path.to_path_buf());
        }

        // Sort for deterministic ordering
        files.sort();
        info!("Found {} component file(s)", files.len());
        Ok(files)
    }

    fn build_exclude_glob_set(&self) -> GlobSet {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude_patterns {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => warn!("Ignoring invalid exclude pattern '{}': {}", pattern, e),
            }
        }
        builder.build().unwrap_or_else(|e| {
            warn!("Failed to build exclude patterns: {}", e);
            GlobSet::empty()
        })
    }
}
