//! Graph diagnostics over the merged relations.
//!
//! The hierarchy tree hides structure: shared children appear more than
//! once and cycles are cut. [`ComponentGraph`] keeps the merged relations
//! as a directed graph so cycles, roots and unreachable components can be
//! reported.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;

use crate::model::{ComponentId, ComponentMetadata};
use crate::relations::RelationMap;

/// Directed graph of analyzed components.
///
/// Edges whose endpoints have no metadata are left out.
#[derive(Debug, Clone)]
pub struct ComponentGraph {
    graph: DiGraph<ComponentId, ()>,
    index: HashMap<ComponentId, NodeIndex>,
}

impl ComponentGraph {
    pub fn new(components: &[ComponentMetadata], relations: &RelationMap) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for component in components {
            index
                .entry(component.id.clone())
                .or_insert_with(|| graph.add_node(component.id.clone()));
        }
        for (parent, child) in relations.iter() {
            if let (Some(&from), Some(&to)) = (index.get(parent), index.get(child)) {
                graph.add_edge(from, to, ());
            }
        }
        Self { graph, index }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Groups of components that reach each other, including self-loops.
    ///
    /// Each group is sorted and the groups are sorted by their first id.
    pub fn cycles(&self) -> Vec<Vec<ComponentId>> {
        let mut cycles: Vec<Vec<ComponentId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut ids: Vec<ComponentId> =
                    scc.into_iter().map(|ix| self.graph[ix].clone()).collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Components nothing points at, sorted.
    pub fn roots(&self) -> Vec<ComponentId> {
        let mut roots: Vec<ComponentId> = self
            .graph
            .node_indices()
            .filter(|&ix| {
                self.graph
                    .neighbors_directed(ix, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|ix| self.graph[ix].clone())
            .collect();
        roots.sort();
        roots
    }

    /// Components not reachable from `entry`, sorted.
    ///
    /// Every component is unreachable from an unknown entry.
    pub fn unreachable_from(&self, entry: &ComponentId) -> Vec<ComponentId> {
        let mut reached = vec![false; self.graph.node_count()];
        if let Some(&start) = self.index.get(entry) {
            let mut dfs = Dfs::new(&self.graph, start);
            while let Some(ix) = dfs.next(&self.graph) {
                reached[ix.index()] = true;
            }
        }

        let mut unreachable: Vec<ComponentId> = self
            .graph
            .node_indices()
            .filter(|ix| !reached[ix.index()])
            .map(|ix| self.graph[ix].clone())
            .collect();
        unreachable.sort();
        unreachable
    }

    /// Direct children of a component in the graph.
    pub fn out_degree(&self, id: &ComponentId) -> usize {
        self.index
            .get(id)
            .map(|&ix| self.graph.neighbors_directed(ix, Direction::Outgoing).count())
            .unwrap_or(0)
    }
}
