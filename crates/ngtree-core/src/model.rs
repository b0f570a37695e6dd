//! Component records shared by every pipeline stage.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable identifier of a component, derived from its canonical path.
///
/// The value is the hex form of a truncated SHA-256 of the path. Nothing
/// outside this type depends on that encoding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Derive the identifier for a canonical file path.
    pub fn from_path(path: &Path) -> Self {
        let digest = Sha256::digest(path.to_string_lossy().as_bytes());
        let hex: String = digest[..16].iter().map(|b| format!("{:02x}", b)).collect();
        Self(hex)
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a component's template comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum TemplateSource {
    /// `template: '...'`, delimiters stripped
    Inline(String),
    /// `templateUrl: '...'`, resolved against the component's directory
    External(PathBuf),
}

/// Metadata extracted from one component source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMetadata {
    pub id: ComponentId,
    /// Declared class name, the key for `imports` matching
    pub class_name: String,
    /// Declared selector, the key for template tag matching
    pub selector: String,
    /// Canonical absolute path of the source file
    pub file_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateSource>,
    /// Entries of the decorator's `imports` array, as written
    pub declared_imports: Vec<String>,
    /// Component-style tags found in the template
    pub used_tags: BTreeSet<String>,
}

impl ComponentMetadata {
    /// Element selectors this component answers to.
    ///
    /// A selector list such as `app-a, app-b` yields both names. Attribute,
    /// class and compound selectors are not element names and are left out.
    pub fn element_selectors(&self) -> impl Iterator<Item = &str> {
        self.selector
            .split(',')
            .map(str::trim)
            .filter(|part| is_element_name(part))
    }

    /// Whether this component answers to the given tag.
    pub fn matches_tag(&self, tag: &str) -> bool {
        self.element_selectors().any(|selector| selector == tag)
    }

    /// Whether the template references the given tag.
    pub fn uses_tag(&self, tag: &str) -> bool {
        self.used_tags.contains(tag)
    }
}

/// A plain element name: alphanumerics and hyphens only.
fn is_element_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}
