//! Common test utilities for integration tests.
//!
//! Builds throwaway Angular workspaces on disk and renders hierarchy trees
//! into compact outlines for comparison.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use ngtree_core::HierarchyNode;
use tempfile::TempDir;

/// Path of the checked-in sample application.
pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("sample_app")
}

/// A temporary workspace with an `src/app` directory.
pub struct TestWorkspace {
    dir: TempDir,
    root: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = dir.path().canonicalize().expect("Failed to canonicalize");
        fs::create_dir_all(root.join("src/app")).expect("Failed to create src/app");
        Self { dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a file relative to the workspace root.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    /// Write `src/app/<name>.component.ts` with an inline template.
    pub fn component(&self, name: &str, class: &str, selector: &str, template: &str, imports: &[&str]) -> PathBuf {
        let source = format!(
            "import {{ Component }} from '@angular/core';\n\n@Component({{\n  selector: '{}',\n  standalone: true,\n  imports: [{}],\n  template: `{}`,\n}})\nexport class {} {{}}\n",
            selector,
            imports.join(", "),
            template,
            class
        );
        self.write(&format!("src/app/{}.component.ts", name), &source)
    }

    /// Write `src/app/app.routes.ts`.
    pub fn routes(&self, body: &str) -> PathBuf {
        self.write(
            "src/app/app.routes.ts",
            &format!("import {{ Routes }} from '@angular/router';\n\nexport const routes: Routes = {};\n", body),
        )
    }
}

/// Indented `Name` lines of a tree, cyclic nodes marked with `*`.
pub fn outline(node: &HierarchyNode) -> Vec<String> {
    let mut lines = Vec::new();
    node.walk(&mut |n, depth| {
        let marker = if n.cyclic { "*" } else { "" };
        lines.push(format!("{}{}{}", "  ".repeat(depth), n.name, marker));
    });
    lines
}
