//! Lexical path helpers.
//!
//! Template and lazy-route paths are resolved against a file's directory
//! without touching the filesystem, since the target may not exist.

use std::path::{Component, Path, PathBuf};

/// Resolve `relative` against `base_dir` and fold `.` and `..` segments.
///
/// An absolute `relative` replaces the base, mirroring `Path::join`.
pub fn resolve_relative(base_dir: &Path, relative: &str) -> PathBuf {
    normalize(&base_dir.join(relative.replace('\\', "/")))
}

/// Fold `.` and `..` segments of a path lexically.
///
/// `..` never climbs above the root of an absolute path.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    result.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    result.pop();
                } else if !result.has_root() {
                    result.push("..");
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}

/// Comparison key for file paths: forward slashes, lowercase.
///
/// Route targets are matched against component files through this key so
/// separator and case differences between platforms do not matter.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_sibling() {
        let resolved = resolve_relative(Path::new("/ws/src/app/home"), "./home.component.html");
        assert_eq!(resolved, PathBuf::from("/ws/src/app/home/home.component.html"));
    }

    #[test]
    fn test_resolve_relative_parent() {
        let resolved = resolve_relative(Path::new("/ws/src/app/home"), "../shared/card.component");
        assert_eq!(resolved, PathBuf::from("/ws/src/app/shared/card.component"));
    }

    #[test]
    fn test_resolve_relative_windows_separators() {
        let resolved = resolve_relative(Path::new("/ws/src/app"), ".\\pages\\list.component");
        assert_eq!(resolved, PathBuf::from("/ws/src/app/pages/list.component"));
    }

    #[test]
    fn test_normalize_does_not_climb_above_root() {
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
    }

    #[test]
    fn test_normalize_keeps_leading_parent_for_relative() {
        assert_eq!(normalize(Path::new("../x/./y")), PathBuf::from("../x/y"));
    }

    #[test]
    fn test_path_key() {
        assert_eq!(
            path_key(Path::new("/WS/Src/App/Home.Component.ts")),
            "/ws/src/app/home.component.ts"
        );
    }
}
