//! Input events produced by the upstream extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::model::date::ResolvedDate;
use crate::model::node::NodeKind;

pub const DEFAULT_CATEGORY: &str = "general";

/// One extracted event. Immutable once handed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub date_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_iso: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default = "default_category", deserialize_with = "lowercase_category")]
    pub category: String,
    #[serde(default = "default_importance")]
    pub importance: f64,
    #[serde(default)]
    pub confidence: f64,
    /// Upstream node-kind hint.
    #[serde(default, rename = "node_type")]
    pub kind: NodeKind,
    /// Topic cluster assigned by upstream clustering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_cluster: Option<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

const fn default_importance() -> f64 {
    0.5
}

fn lowercase_category<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Ok(default_category())
    } else {
        Ok(trimmed.to_lowercase())
    }
}

impl Event {
    /// Build a minimal event; mostly useful in tests and fixtures.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            date_text: String::new(),
            date_iso: None,
            title: title.into(),
            description: String::new(),
            people: Vec::new(),
            locations: Vec::new(),
            category: default_category(),
            importance: default_importance(),
            confidence: 0.0,
            kind: NodeKind::default(),
            semantic_cluster: None,
        }
    }

    #[must_use]
    pub fn with_date(mut self, iso: impl Into<String>) -> Self {
        let iso = iso.into();
        self.date_text.clone_from(&iso);
        self.date_iso = Some(iso);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into().to_lowercase();
        self
    }

    #[must_use]
    pub fn with_people<I, S>(mut self, people: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.people = people.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }

    /// Text scanned for connective markers: title, then description.
    #[must_use]
    pub fn marker_text(&self) -> String {
        format!("{}\n{}", self.title, self.description)
    }

    /// Resolve `date_iso`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDate`] when a date is present but
    /// cannot be parsed.
    pub fn resolved_date(&self) -> EngineResult<Option<ResolvedDate>> {
        match self.date_iso.as_deref() {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => ResolvedDate::parse(raw)
                .map(Some)
                .ok_or_else(|| EngineError::InvalidDate {
                    id: self.id.clone(),
                    value: raw.to_string(),
                }),
        }
    }
}

/// Accepted shapes of an event file: a bare array or an envelope with
/// optional title and source text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EventBatch {
    Bare(Vec<Event>),
    Envelope {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        text: Option<String>,
        #[serde(alias = "events")]
        items: Vec<Event>,
    },
}

impl EventBatch {
    /// Split into `(title, source_text, events)`.
    #[must_use]
    pub fn into_parts(self) -> (Option<String>, Option<String>, Vec<Event>) {
        match self {
            Self::Bare(items) => (None, None, items),
            Self::Envelope { title, text, items } => (title, text, items),
        }
    }
}
