//! Directed relations between two nodes.

use serde::{Deserialize, Serialize};

use crate::model::relation::RelationType;

/// A directed, typed relation `source_id -> target_id`.
///
/// `relation_strength` is the score that admitted the edge; it is never
/// rewritten after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    pub relation_type: RelationType,
    pub relation_strength: f64,
    /// Target date minus source date, in days, when both are known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_gap_days: Option<i64>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub evidence_sentences: Vec<String>,
}

impl Edge {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relation_type: RelationType,
        relation_strength: f64,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation_type,
            relation_strength,
            time_gap_days: None,
            reasoning: String::new(),
            evidence_sentences: Vec::new(),
        }
    }

    /// `(source, target)` identity of the edge.
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.source_id, &self.target_id)
    }
}
