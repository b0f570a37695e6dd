//! Parent → children relation maps.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ComponentId;

/// The kind of evidence a relation was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationSource {
    /// Tag used in the parent's template
    Usage,
    /// Class listed in the parent's decorator `imports`
    Composition,
    /// Lazy or static route target
    Route,
}

impl RelationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationSource::Usage => "usage",
            RelationSource::Composition => "composition",
            RelationSource::Route => "route",
        }
    }
}

impl fmt::Display for RelationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicated `parent → {children}` edges.
///
/// Both levels are ordered collections, so iteration order is a function of
/// the ids alone. Self-loops are allowed; the hierarchy builder guards them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationMap {
    edges: BTreeMap<ComponentId, BTreeSet<ComponentId>>,
}

impl RelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge. Returns `false` if it was already present.
    pub fn insert(&mut self, parent: ComponentId, child: ComponentId) -> bool {
        self.edges.entry(parent).or_default().insert(child)
    }

    /// Add every edge of `other`.
    pub fn extend(&mut self, other: &RelationMap) {
        for (parent, child) in other.iter() {
            self.insert(parent.clone(), child.clone());
        }
    }

    /// Children of a parent; empty if it has none.
    pub fn children(&self, parent: &ComponentId) -> impl Iterator<Item = &ComponentId> {
        self.edges.get(parent).into_iter().flatten()
    }

    pub fn contains(&self, parent: &ComponentId, child: &ComponentId) -> bool {
        self.edges
            .get(parent)
            .is_some_and(|children| children.contains(child))
    }

    /// Parents with at least one child.
    pub fn parents(&self) -> impl Iterator<Item = &ComponentId> {
        self.edges
            .iter()
            .filter(|(_, children)| !children.is_empty())
            .map(|(parent, _)| parent)
    }

    /// Every edge as `(parent, child)`.
    pub fn iter(&self) -> impl Iterator<Item = (&ComponentId, &ComponentId)> {
        self.edges
            .iter()
            .flat_map(|(parent, children)| children.iter().map(move |child| (parent, child)))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edge_count() == 0
    }
}

impl FromIterator<(ComponentId, ComponentId)> for RelationMap {
    fn from_iter<T: IntoIterator<Item = (ComponentId, ComponentId)>>(iter: T) -> Self {
        let mut map = RelationMap::new();
        for (parent, child) in iter {
            map.insert(parent, child);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> ComponentId {
        ComponentId::from_path(std::path::Path::new(name))
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut map = RelationMap::new();
        assert!(map.insert(id("a"), id("b")));
        assert!(!map.insert(id("a"), id("b")));
        assert_eq!(map.edge_count(), 1);
    }

    #[test]
    fn test_self_loop_allowed() {
        let mut map = RelationMap::new();
        map.insert(id("a"), id("a"));
        assert!(map.contains(&id("a"), &id("a")));
    }

    #[test]
    fn test_children_of_unknown_parent_is_empty() {
        let map = RelationMap::new();
        assert_eq!(map.children(&id("x")).count(), 0);
        assert!(map.is_empty());
    }

    #[test]
    fn test_extend_unions() {
        let mut left: RelationMap = [(id("a"), id("b"))].into_iter().collect();
        let right: RelationMap = [(id("a"), id("b")), (id("a"), id("c"))].into_iter().collect();
        left.extend(&right);
        assert_eq!(left.edge_count(), 2);
        assert_eq!(left.parents().count(), 1);
    }
}
