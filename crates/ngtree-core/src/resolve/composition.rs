//! Declared `imports` → child edges.

use std::collections::HashMap;

use crate::events::{EventSink, PipelineEvent};
use crate::model::{ComponentId, ComponentMetadata};
use crate::relations::{RelationMap, RelationSource};

/// Matches decorator `imports` entries against declared class names.
///
/// Matching is by literal text. Aliased (`import { A as B }`) or namespaced
/// (`shared.Card`) references do not resolve.
pub struct CompositionResolver<'s> {
    sink: &'s dyn EventSink,
}

impl<'s> CompositionResolver<'s> {
    pub fn new(sink: &'s dyn EventSink) -> Self {
        Self { sink }
    }

    pub fn resolve(&self, components: &[ComponentMetadata]) -> RelationMap {
        let by_class: HashMap<&str, &ComponentId> = components
            .iter()
            .map(|component| (component.class_name.as_str(), &component.id))
            .collect();

        let mut relations = RelationMap::new();
        for parent in components {
            for imported in &parent.declared_imports {
                match by_class.get(imported.as_str()) {
                    Some(child) => {
                        relations.insert(parent.id.clone(), (*child).clone());
                    }
                    None => self.sink.emit(PipelineEvent::EdgeDropped {
                        source: RelationSource::Composition,
                        parent: parent.id.clone(),
                        reference: imported.clone(),
                    }),
                }
            }
        }
        relations
    }
}
