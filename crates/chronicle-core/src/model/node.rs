//! Graph nodes: a one-to-one projection of input events.

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::model::date::{DatePrecision, ResolvedDate};
use crate::model::event::Event;

/// What a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Event,
    Fact,
    Concept,
}

/// A node in the timeline graph.
///
/// Every attribute except `is_parent` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub date_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_iso: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub importance: f64,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub node_type: NodeKind,
    #[serde(default)]
    pub semantic_cluster: Option<String>,
    #[serde(default)]
    pub temporal_precision: DatePrecision,
    #[serde(default)]
    pub is_parent: bool,
}

impl Node {
    /// Project an event into a node.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::EngineError::InvalidDate`] when the event
    /// carries an unparseable date.
    pub fn from_event(event: &Event) -> EngineResult<Self> {
        let precision = event
            .resolved_date()?
            .map_or(DatePrecision::Year, |d| d.precision);

        Ok(Self {
            id: event.id.clone(),
            date_text: event.date_text.clone(),
            date_iso: event.date_iso.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            people: event.people.clone(),
            locations: event.locations.clone(),
            category: event.category.clone(),
            importance: event.importance,
            confidence: event.confidence,
            node_type: event.kind,
            semantic_cluster: event.semantic_cluster.clone(),
            temporal_precision: precision,
            is_parent: false,
        })
    }

    /// The node's date, if it carries a parseable one.
    #[must_use]
    pub fn resolved_date(&self) -> Option<ResolvedDate> {
        self.date_iso.as_deref().and_then(ResolvedDate::parse)
    }
}
