//! Template usage → child edges.

use std::collections::HashMap;

use crate::events::{EventSink, PipelineEvent};
use crate::model::{ComponentId, ComponentMetadata};
use crate::relations::{RelationMap, RelationSource};

/// Matches used template tags against declared selectors.
pub struct UsageResolver<'s> {
    sink: &'s dyn EventSink,
}

impl<'s> UsageResolver<'s> {
    pub fn new(sink: &'s dyn EventSink) -> Self {
        Self { sink }
    }

    /// Build `parent → child` edges from every component's `used_tags`.
    ///
    /// When two components declare the same selector the later one in input
    /// order wins the lookup. Tags naming no analyzed component are native
    /// or third-party elements and are dropped.
    pub fn resolve(&self, components: &[ComponentMetadata]) -> RelationMap {
        let mut by_selector: HashMap<&str, &ComponentId> = HashMap::new();
        for component in components {
            for selector in component.element_selectors() {
                by_selector.insert(selector, &component.id);
            }
        }

        let mut relations = RelationMap::new();
        for parent in components {
            for tag in &parent.used_tags {
                match by_selector.get(tag.as_str()) {
                    Some(child) => {
                        relations.insert(parent.id.clone(), (*child).clone());
                    }
                    None => self.sink.emit(PipelineEvent::EdgeDropped {
                        source: RelationSource::Usage,
                        parent: parent.id.clone(),
                        reference: tag.clone(),
                    }),
                }
            }
        }
        relations
    }
}
