//! Template usage extraction.
//!
//! Loads a component's template (inline text first, then the external file)
//! and collects the component-style tags it opens. A tag is component-style
//! when its name contains a hyphen; native elements never do.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::events::{EventSink, PipelineEvent};
use crate::model::{ComponentMetadata, TemplateSource};

fn opening_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<([a-zA-Z0-9-]+)[\s>/]").expect("opening tag pattern is valid")
    })
}

fn html_comment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"))
}

/// Collect the hyphenated tag names opened in a template.
pub fn scan_tags(template: &str) -> BTreeSet<String> {
    let without_comments = html_comment().replace_all(template, "");
    opening_tag()
        .captures_iter(&without_comments)
        .filter_map(|captures| captures.get(1))
        .map(|tag| tag.as_str())
        .filter(|tag| tag.contains('-'))
        .map(str::to_string)
        .collect()
}

/// Populates `used_tags` on component records.
pub struct TemplateUsageExtractor<'s> {
    sink: &'s dyn EventSink,
}

impl<'s> TemplateUsageExtractor<'s> {
    pub fn new(sink: &'s dyn EventSink) -> Self {
        Self { sink }
    }

    /// Return `metadata` with `used_tags` filled from its template.
    ///
    /// A missing external template yields an empty set and an event.
    pub fn populate(&self, mut metadata: ComponentMetadata) -> ComponentMetadata {
        metadata.used_tags = match self.load(&metadata) {
            Some(text) => scan_tags(&text),
            None => BTreeSet::new(),
        };
        metadata
    }

    fn load(&self, metadata: &ComponentMetadata) -> Option<String> {
        match metadata.template.as_ref()? {
            TemplateSource::Inline(text) => Some(text.clone()),
            TemplateSource::External(path) => match std::fs::read_to_string(path) {
                Ok(text) => Some(text),
                Err(_) => {
                    self.sink.emit(PipelineEvent::TemplateMissing {
                        component: metadata.id.clone(),
                        path: path.clone(),
                    });
                    None
                }
            },
        }
    }
}
