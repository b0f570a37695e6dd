//! Relation merging.
//!
//! The merger folds the three resolver outputs into one map and gives the
//! top-level route targets a parent. It never mutates its inputs.

use tracing::debug;

use crate::events::{EventSink, PipelineEvent};
use crate::hierarchy::find_entry;
use crate::model::{ComponentId, ComponentMetadata};
use crate::relations::RelationMap;
use crate::resolve::RouteRelations;

/// Unions relation maps and attaches top-level routes.
pub struct GraphMerger<'s> {
    outlet_tag: String,
    root_selector: String,
    sink: &'s dyn EventSink,
}

impl<'s> GraphMerger<'s> {
    pub fn new(
        outlet_tag: impl Into<String>,
        root_selector: impl Into<String>,
        sink: &'s dyn EventSink,
    ) -> Self {
        Self {
            outlet_tag: outlet_tag.into(),
            root_selector: root_selector.into(),
            sink,
        }
    }

    /// Merge usage, composition and route relations.
    ///
    /// Top-level route targets become children of every component whose
    /// template uses the outlet tag. Without such a component they go under
    /// the entry component; with no entry either they are dropped.
    pub fn merge(
        &self,
        components: &[ComponentMetadata],
        usage: &RelationMap,
        composition: &RelationMap,
        routes: &RouteRelations,
    ) -> RelationMap {
        let mut merged = RelationMap::new();
        for source in [usage, composition, &routes.nested] {
            merged.extend(source);
        }
        debug!(
            "Merged {} edge(s) from {} usage, {} composition and {} nested route edge(s)",
            merged.edge_count(),
            usage.edge_count(),
            composition.edge_count(),
            routes.nested.edge_count()
        );

        if routes.top_level.is_empty() {
            return merged;
        }

        let hosts = self.route_hosts(components);
        if hosts.is_empty() {
            self.sink.emit(PipelineEvent::RoutesDropped {
                count: routes.top_level.len(),
            });
            return merged;
        }

        for host in hosts {
            for target in &routes.top_level {
                merged.insert(host.clone(), target.clone());
            }
            self.sink.emit(PipelineEvent::RoutesAttached {
                host: host.clone(),
                count: routes.top_level.len(),
            });
        }
        merged
    }

    fn route_hosts<'c>(&self, components: &'c [ComponentMetadata]) -> Vec<&'c ComponentId> {
        let outlets: Vec<_> = components
            .iter()
            .filter(|component| component.uses_tag(&self.outlet_tag))
            .map(|component| &component.id)
            .collect();
        if !outlets.is_empty() {
            return outlets;
        }
        find_entry(components, &self.root_selector)
            .map(|(entry, _)| vec![&entry.id])
            .unwrap_or_default()
    }
}
