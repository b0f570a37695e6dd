//! End-to-end pipeline behavior on generated workspaces.
//!
//! ```bash
//! cargo test --package ngtree-core --test pipeline
//! ```

mod common;

use common::{outline, TestWorkspace};
use ngtree_core::{
    HierarchyPipeline, NullSink, OrphanRoutePolicy, PipelineConfig, PipelineEvent, RecordingSink,
};
use pretty_assertions::assert_eq;

fn run(ws: &TestWorkspace, config: PipelineConfig) -> Vec<String> {
    let tree = HierarchyPipeline::new(config, &NullSink)
        .analyze_workspace(ws.root())
        .expect("pipeline failed")
        .tree
        .expect("no tree");
    outline(&tree)
}

// ============================================================================
// Matching
// ============================================================================

#[test]
fn test_usage_matching_creates_edge() {
    let ws = TestWorkspace::new();
    ws.component("app", "AppComponent", "app-root", "<a-b></a-b><div></div>", &[]);
    ws.component("ab", "AbComponent", "a-b", "", &[]);

    assert_eq!(run(&ws, PipelineConfig::default()), vec!["AppComponent", "  AbComponent"]);
}

#[test]
fn test_tag_without_hyphen_is_never_a_child() {
    let ws = TestWorkspace::new();
    ws.component("app", "AppComponent", "app-root", "<card></card>", &[]);
    ws.component("card", "CardComponent", "card", "", &[]);

    assert_eq!(run(&ws, PipelineConfig::default()), vec!["AppComponent"]);
}

#[test]
fn test_unknown_import_is_harmless() {
    let ws = TestWorkspace::new();
    ws.component("app", "AppComponent", "app-root", "", &["MissingComponent", "ChildComponent"]);
    ws.component("child", "ChildComponent", "app-child", "", &[]);

    assert_eq!(
        run(&ws, PipelineConfig::default()),
        vec!["AppComponent", "  ChildComponent"]
    );
}

#[test]
fn test_file_without_selector_is_excluded() {
    let ws = TestWorkspace::new();
    ws.component("app", "AppComponent", "app-root", "<app-ghost></app-ghost>", &["GhostComponent"]);
    ws.write(
        "src/app/ghost.component.ts",
        "@Component({ template: '<p>ghost</p>' })\nexport class GhostComponent {}\n",
    );

    let analysis = HierarchyPipeline::new(PipelineConfig::default(), &NullSink)
        .analyze_workspace(ws.root())
        .unwrap();
    assert_eq!(analysis.components.len(), 1);
    assert!(analysis.merged.is_empty());
}

// ============================================================================
// Cycles and entry selection
// ============================================================================

#[test]
fn test_cycle_terminates() {
    let ws = TestWorkspace::new();
    ws.component("a", "AComponent", "app-root", "<app-b></app-b>", &[]);
    ws.component("b", "BComponent", "app-b", "", &["AComponent"]);

    assert_eq!(
        run(&ws, PipelineConfig::default()),
        vec!["AComponent", "  BComponent", "    AComponent*"]
    );
}

#[test]
fn test_entry_fallback_uses_first_file() {
    let ws = TestWorkspace::new();
    ws.component("alpha", "AlphaComponent", "app-alpha", "<app-beta></app-beta>", &[]);
    ws.component("beta", "BetaComponent", "app-beta", "", &[]);

    let sink = RecordingSink::new();
    let tree = HierarchyPipeline::new(PipelineConfig::default(), &sink)
        .analyze_workspace(ws.root())
        .unwrap()
        .tree
        .unwrap();
    assert_eq!(tree.name, "AlphaComponent");
    assert_eq!(sink.count("entry_fallback"), 1);
}

#[test]
fn test_custom_root_selector() {
    let ws = TestWorkspace::new();
    ws.component("a", "AComponent", "app-root", "", &[]);
    ws.component("shell", "ShellComponent", "my-shell", "<app-root></app-root>", &[]);

    let config = PipelineConfig {
        root_selector: "my-shell".to_string(),
        ..Default::default()
    };
    assert_eq!(run(&ws, config), vec!["ShellComponent", "  AComponent"]);
}

#[test]
fn test_empty_workspace_is_absent() {
    let ws = TestWorkspace::new();
    let tree = HierarchyPipeline::new(PipelineConfig::default(), &NullSink)
        .analyze_workspace(ws.root())
        .unwrap()
        .tree;
    assert!(tree.is_none());
}

// ============================================================================
// Routes
// ============================================================================

#[test]
fn test_top_level_routes_attach_to_entry_without_outlet() {
    let ws = TestWorkspace::new();
    ws.component("app", "AppComponent", "app-root", "<main></main>", &[]);
    ws.component("home", "HomeComponent", "app-home", "", &[]);
    ws.component("about", "AboutComponent", "app-about", "", &[]);
    ws.routes(
        "[\n  { path: '', loadComponent: () => import('./home.component') },\n  { path: 'about', loadComponent: () => import('./about.component').then(m => m.AboutComponent) },\n]",
    );

    assert_eq!(
        run(&ws, PipelineConfig::default()),
        vec!["AppComponent", "  AboutComponent", "  HomeComponent"]
    );
}

#[test]
fn test_top_level_routes_attach_to_outlet_host() {
    let ws = TestWorkspace::new();
    ws.component("app", "AppComponent", "app-root", "<app-layout></app-layout>", &[]);
    ws.component("layout", "LayoutComponent", "app-layout", "<router-outlet></router-outlet>", &[]);
    ws.component("home", "HomeComponent", "app-home", "", &[]);
    ws.routes("[{ path: '', loadComponent: () => import('./home.component') }]");

    assert_eq!(
        run(&ws, PipelineConfig::default()),
        vec!["AppComponent", "  LayoutComponent", "    HomeComponent"]
    );
}

#[test]
fn test_orphan_route_children_policy() {
    let ws = TestWorkspace::new();
    ws.component("app", "AppComponent", "app-root", "", &[]);
    ws.component("list", "ListComponent", "app-list", "", &[]);
    ws.routes(
        "[{ path: 'items', children: [{ path: '', loadComponent: () => import('./list.component') }] }]",
    );

    assert_eq!(
        run(&ws, PipelineConfig::default()),
        vec!["AppComponent", "  ListComponent"]
    );

    let mut config = PipelineConfig::default();
    config.routes.orphan_children = OrphanRoutePolicy::Drop;
    assert_eq!(run(&ws, config), vec!["AppComponent"]);
}

#[test]
fn test_routes_outside_src_app_found_by_fallback() {
    let ws = TestWorkspace::new();
    ws.component("app", "AppComponent", "app-root", "", &[]);
    ws.component("home", "HomeComponent", "app-home", "", &[]);
    ws.routes("[{ path: '', loadComponent: () => import('./home.component') }]");

    let config = PipelineConfig {
        route_search_dir: "projects/missing".into(),
        ..Default::default()
    };
    assert_eq!(run(&ws, config), vec!["AppComponent", "  HomeComponent"]);
}

// ============================================================================
// Robustness
// ============================================================================

#[test]
fn test_missing_template_degrades_to_no_children() {
    let ws = TestWorkspace::new();
    ws.write(
        "src/app/app.component.ts",
        "@Component({ selector: 'app-root', templateUrl: './nope.html' })\nexport class AppComponent {}\n",
    );
    let sink = RecordingSink::new();
    let analysis = HierarchyPipeline::new(PipelineConfig::default(), &sink)
        .analyze_workspace(ws.root())
        .unwrap();

    assert_eq!(analysis.tree.unwrap().children.len(), 0);
    assert!(sink
        .events()
        .iter()
        .any(|e| matches!(e, PipelineEvent::TemplateMissing { .. })));
}

#[test]
fn test_garbage_source_does_not_abort_run() {
    let ws = TestWorkspace::new();
    ws.component("app", "AppComponent", "app-root", "<app-ok></app-ok>", &[]);
    ws.component("ok", "OkComponent", "app-ok", "", &[]);
    ws.write("src/app/garbage.component.ts", "@@@ ))) {{{ export class");

    assert_eq!(
        run(&ws, PipelineConfig::default()),
        vec!["AppComponent", "  OkComponent"]
    );
}

#[test]
fn test_idempotent_runs() {
    let ws = TestWorkspace::new();
    ws.component("app", "AppComponent", "app-root", "<app-a></app-a><app-b></app-b>", &["CComponent"]);
    ws.component("a", "AComponent", "app-a", "<app-b></app-b>", &[]);
    ws.component("b", "BComponent", "app-b", "<app-a></app-a>", &[]);
    ws.component("c", "CComponent", "app-c", "", &[]);

    let pipeline = HierarchyPipeline::new(PipelineConfig::default(), &NullSink);
    let first = pipeline.analyze_workspace(ws.root()).unwrap().tree;
    let second = pipeline.analyze_workspace(ws.root()).unwrap().tree;
    assert_eq!(first, second);
}
