//! Hierarchy tree construction.
//!
//! The builder picks an entry component and expands the merged relation
//! map depth-first into [`HierarchyNode`]s. A child already on the current
//! path is emitted as a leaf, so expansion terminates on cyclic input.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::events::{EventSink, PipelineEvent};
use crate::model::{ComponentId, ComponentMetadata};
use crate::relations::RelationMap;

/// Selector of the application's root component.
pub const DEFAULT_ROOT_SELECTOR: &str = "app-root";

/// A node of the component hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    pub id: ComponentId,
    /// Class name of the component
    pub name: String,
    pub selector: String,
    pub file_path: PathBuf,
    pub children: Vec<HierarchyNode>,
    /// Set on a node cut short because it already appears on its path
    #[serde(default, skip_serializing_if = "is_false")]
    pub cyclic: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl HierarchyNode {
    fn leaf(component: &ComponentMetadata) -> Self {
        Self {
            id: component.id.clone(),
            name: component.class_name.clone(),
            selector: component.selector.clone(),
            file_path: component.file_path.clone(),
            children: Vec::new(),
            cyclic: false,
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(HierarchyNode::size).sum::<usize>()
    }

    /// Longest root-to-leaf path, counted in edges.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Visit every node in pre-order together with its depth.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a HierarchyNode, usize)) {
        fn go<'a>(node: &'a HierarchyNode, depth: usize, visit: &mut impl FnMut(&'a HierarchyNode, usize)) {
            visit(node, depth);
            for child in &node.children {
                go(child, depth + 1, visit);
            }
        }
        go(self, 0, visit);
    }
}

/// Order of a node's children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildOrder {
    /// By class name, then file path
    #[default]
    Name,
    /// Relation map order
    Relation,
}

/// Tree construction settings.
#[derive(Debug, Clone)]
pub struct HierarchyOptions {
    pub root_selector: String,
    pub child_order: ChildOrder,
    /// Depth at which expansion stops; the root is depth 0
    pub max_depth: Option<usize>,
}

impl Default for HierarchyOptions {
    fn default() -> Self {
        Self {
            root_selector: DEFAULT_ROOT_SELECTOR.to_string(),
            child_order: ChildOrder::Name,
            max_depth: None,
        }
    }
}

/// Find the entry component.
///
/// Returns the component answering to `root_selector`, or else the first
/// component, with a flag telling whether the fallback was taken.
pub fn find_entry<'c>(
    components: &'c [ComponentMetadata],
    root_selector: &str,
) -> Option<(&'c ComponentMetadata, bool)> {
    components
        .iter()
        .find(|component| component.selector == root_selector || component.matches_tag(root_selector))
        .map(|entry| (entry, false))
        .or_else(|| components.first().map(|first| (first, true)))
}

/// Builds the hierarchy tree from metadata and merged relations.
pub struct HierarchyBuilder<'s> {
    options: HierarchyOptions,
    sink: &'s dyn EventSink,
}

impl<'s> HierarchyBuilder<'s> {
    pub fn new(options: HierarchyOptions, sink: &'s dyn EventSink) -> Self {
        Self { options, sink }
    }

    /// Select the entry component, reporting a fallback.
    pub fn select_entry<'c>(&self, components: &'c [ComponentMetadata]) -> Option<&'c ComponentMetadata> {
        let (entry, fallback) = find_entry(components, &self.options.root_selector)?;
        if fallback {
            self.sink.emit(PipelineEvent::EntryFallback {
                root_selector: self.options.root_selector.clone(),
                chosen: entry.id.clone(),
            });
        }
        Some(entry)
    }

    /// Build the tree. `None` when there are no components.
    pub fn build(&self, components: &[ComponentMetadata], relations: &RelationMap) -> Option<HierarchyNode> {
        let entry = self.select_entry(components)?;
        let by_id: HashMap<&ComponentId, &ComponentMetadata> =
            components.iter().map(|c| (&c.id, c)).collect();

        let mut path = HashSet::new();
        Some(self.expand(entry, 0, &by_id, relations, &mut path))
    }

    fn expand<'c>(
        &self,
        component: &'c ComponentMetadata,
        depth: usize,
        by_id: &HashMap<&ComponentId, &'c ComponentMetadata>,
        relations: &RelationMap,
        path: &mut HashSet<&'c ComponentId>,
    ) -> HierarchyNode {
        let mut node = HierarchyNode::leaf(component);

        let mut children: Vec<&'c ComponentMetadata> = Vec::new();
        for child_id in relations.children(&component.id) {
            match by_id.get(child_id) {
                Some(child) => children.push(*child),
                None => self.sink.emit(PipelineEvent::DanglingChild {
                    parent: component.id.clone(),
                    child: child_id.clone(),
                }),
            }
        }
        if children.is_empty() {
            return node;
        }

        if self.options.max_depth.is_some_and(|limit| depth >= limit) {
            self.sink.emit(PipelineEvent::DepthLimited {
                component: component.id.clone(),
                depth,
            });
            return node;
        }

        if self.options.child_order == ChildOrder::Name {
            children.sort_by(|a, b| {
                a.class_name
                    .cmp(&b.class_name)
                    .then_with(|| a.file_path.cmp(&b.file_path))
            });
        }

        path.insert(&component.id);
        for child in children {
            if path.contains(&child.id) {
                self.sink.emit(PipelineEvent::CycleDetected {
                    parent: component.id.clone(),
                    child: child.id.clone(),
                });
                let mut leaf = HierarchyNode::leaf(child);
                leaf.cyclic = true;
                node.children.push(leaf);
            } else {
                node.children
                    .push(self.expand(child, depth + 1, by_id, relations, path));
            }
        }
        path.remove(&component.id);

        node
    }
}
