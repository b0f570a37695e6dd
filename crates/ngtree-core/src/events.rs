//! Structured pipeline events.
//!
//! The pipeline never prints. It reports notable outcomes (skipped files,
//! dropped edges, cycles) to an [`EventSink`] chosen by the caller.

use std::fmt;
use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::model::ComponentId;
use crate::relations::RelationSource;
use crate::syntax::Unrecognized;

/// Why a component source was left out of the metadata list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No `@Component` selector or no class declaration
    NotAComponent,
    /// File could not be read
    Unreadable(String),
    /// File exceeds the configured size limit
    TooLarge { size_kb: u64, limit_kb: u64 },
    /// Parser produced no tree
    Malformed,
    /// Another file already produced this id
    Duplicate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAComponent => write!(f, "not a component"),
            SkipReason::Unreadable(err) => write!(f, "unreadable: {}", err),
            SkipReason::TooLarge { size_kb, limit_kb } => {
                write!(f, "{} KB exceeds limit of {} KB", size_kb, limit_kb)
            }
            SkipReason::Malformed => write!(f, "could not be parsed"),
            SkipReason::Duplicate => write!(f, "duplicate path"),
        }
    }
}

/// Something the pipeline wants its caller to know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// A component source was excluded from analysis
    FileSkipped { path: PathBuf, reason: SkipReason },
    /// `templateUrl` points at a file that does not exist
    TemplateMissing {
        component: ComponentId,
        path: PathBuf,
    },
    /// A tag or import named no analyzed component
    EdgeDropped {
        source: RelationSource,
        parent: ComponentId,
        reference: String,
    },
    /// A route file was not usable
    RouteFileSkipped { path: PathBuf, reason: String },
    /// A route descriptor yielded no component
    RouteUnresolved {
        route_file: PathBuf,
        target: String,
        reason: String,
    },
    /// Top-level routes were attached under a component
    RoutesAttached { host: ComponentId, count: usize },
    /// Top-level routes found no host to attach to
    RoutesDropped { count: usize },
    /// No component has the root selector; another was chosen
    EntryFallback {
        root_selector: String,
        chosen: ComponentId,
    },
    /// A child already on the current path was emitted as a leaf
    CycleDetected {
        parent: ComponentId,
        child: ComponentId,
    },
    /// A relation pointed at an id with no metadata
    DanglingChild {
        parent: ComponentId,
        child: ComponentId,
    },
    /// Expansion stopped at the configured depth
    DepthLimited { component: ComponentId, depth: usize },
}

impl PipelineEvent {
    /// Short machine-friendly name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineEvent::FileSkipped { .. } => "file_skipped",
            PipelineEvent::TemplateMissing { .. } => "template_missing",
            PipelineEvent::EdgeDropped { .. } => "edge_dropped",
            PipelineEvent::RouteFileSkipped { .. } => "route_file_skipped",
            PipelineEvent::RouteUnresolved { .. } => "route_unresolved",
            PipelineEvent::RoutesAttached { .. } => "routes_attached",
            PipelineEvent::RoutesDropped { .. } => "routes_dropped",
            PipelineEvent::EntryFallback { .. } => "entry_fallback",
            PipelineEvent::CycleDetected { .. } => "cycle_detected",
            PipelineEvent::DanglingChild { .. } => "dangling_child",
            PipelineEvent::DepthLimited { .. } => "depth_limited",
        }
    }

    pub(crate) fn route_unresolved(
        route_file: &std::path::Path,
        target: impl Into<String>,
        reason: &Unrecognized,
    ) -> Self {
        PipelineEvent::RouteUnresolved {
            route_file: route_file.to_path_buf(),
            target: target.into(),
            reason: reason.to_string(),
        }
    }
}

/// Receiver of pipeline events.
pub trait EventSink {
    fn emit(&self, event: PipelineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: PipelineEvent) {}
}

/// Forwards events to `tracing`.
///
/// Data-quality findings (missing templates, unresolvable route targets,
/// entry fallback) log at WARN; routine drops log at DEBUG.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PipelineEvent) {
        match event {
            PipelineEvent::FileSkipped { path, reason } => match reason {
                SkipReason::NotAComponent | SkipReason::Duplicate => {
                    debug!("Skipping {:?}: {}", path, reason)
                }
                _ => warn!("Skipping {:?}: {}", path, reason),
            },
            PipelineEvent::TemplateMissing { component, path } => {
                warn!("Template {:?} of component {} not found", path, component)
            }
            PipelineEvent::EdgeDropped {
                source,
                parent,
                reference,
            } => debug!(
                "Dropped {} reference '{}' from {}: no matching component",
                source, reference, parent
            ),
            PipelineEvent::RouteFileSkipped { path, reason } => {
                warn!("Skipping route file {:?}: {}", path, reason)
            }
            PipelineEvent::RouteUnresolved {
                route_file,
                target,
                reason,
            } => warn!(
                "Route target '{}' in {:?} unresolved: {}",
                target, route_file, reason
            ),
            PipelineEvent::RoutesAttached { host, count } => {
                debug!("Attached {} top-level route(s) under {}", count, host)
            }
            PipelineEvent::RoutesDropped { count } => {
                warn!("Dropped {} top-level route(s): no host component", count)
            }
            PipelineEvent::EntryFallback {
                root_selector,
                chosen,
            } => warn!(
                "No component with selector '{}', using {} as root",
                root_selector, chosen
            ),
            PipelineEvent::CycleDetected { parent, child } => {
                debug!("Cycle: {} -> {} already on path", parent, child)
            }
            PipelineEvent::DanglingChild { parent, child } => {
                debug!("Relation {} -> {} has no metadata", parent, child)
            }
            PipelineEvent::DepthLimited { component, depth } => {
                debug!("Depth limit {} reached at {}", depth, component)
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().clone()
    }

    /// Number of recorded events of the given kind.
    pub fn count(&self, kind: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.kind() == kind)
            .count()
    }

    /// Drain recorded events.
    pub fn take(&self) -> Vec<PipelineEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        self.events.lock().push(event);
    }
}

/// Sends each event to two sinks.
pub struct Tee<'a> {
    first: &'a dyn EventSink,
    second: &'a dyn EventSink,
}

impl<'a> Tee<'a> {
    pub fn new(first: &'a dyn EventSink, second: &'a dyn EventSink) -> Self {
        Self { first, second }
    }
}

impl EventSink for Tee<'_> {
    fn emit(&self, event: PipelineEvent) {
        self.first.emit(event.clone());
        self.second.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_counts_by_kind() {
        let sink = RecordingSink::new();
        sink.emit(PipelineEvent::RoutesDropped { count: 2 });
        sink.emit(PipelineEvent::FileSkipped {
            path: PathBuf::from("/ws/a.component.ts"),
            reason: SkipReason::NotAComponent,
        });
        sink.emit(PipelineEvent::RoutesDropped { count: 1 });

        assert_eq!(sink.count("routes_dropped"), 2);
        assert_eq!(sink.count("file_skipped"), 1);
        assert_eq!(sink.events().len(), 3);
    }

    #[test]
    fn test_take_drains() {
        let sink = RecordingSink::new();
        sink.emit(PipelineEvent::RoutesDropped { count: 1 });
        assert_eq!(sink.take().len(), 1);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_tee_forwards_to_both() {
        let a = RecordingSink::new();
        let b = RecordingSink::new();
        Tee::new(&a, &b).emit(PipelineEvent::RoutesDropped { count: 1 });
        assert_eq!(a.events().len(), 1);
        assert_eq!(b.events().len(), 1);
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::TooLarge {
            size_kb: 2048,
            limit_kb: 1024,
        };
        assert_eq!(reason.to_string(), "2048 KB exceeds limit of 1024 KB");
    }
}
