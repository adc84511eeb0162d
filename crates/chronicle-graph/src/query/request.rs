//! Query request and response wire types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use chronicle_core::error::EngineError;
use chronicle_core::model::RelationType;

/// The six supported structural queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Path,
    CausalChain,
    Influence,
    Prerequisite,
    Parallel,
    Impact,
}

impl QueryType {
    pub const ALL: [Self; 6] = [
        Self::Path,
        Self::CausalChain,
        Self::Influence,
        Self::Prerequisite,
        Self::Parallel,
        Self::Impact,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::CausalChain => "causal_chain",
            Self::Influence => "influence",
            Self::Prerequisite => "prerequisite",
            Self::Parallel => "parallel",
            Self::Impact => "impact",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| EngineError::InvalidQuery {
                query_type: s.to_string(),
                reason: "unknown query type; expected one of path, causal_chain, \
                         influence, prerequisite, parallel, impact"
                    .to_string(),
            })
    }
}

/// A query plus its parameter bag. Which parameters are required depends
/// on `query_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query_type: QueryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relation_types: Vec<RelationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    /// Edge bound for path queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
}

impl QueryRequest {
    #[must_use]
    pub const fn new(query_type: QueryType) -> Self {
        Self {
            query_type,
            start_node_id: None,
            end_node_id: None,
            node_id: None,
            relation_types: Vec::new(),
            max_results: None,
            max_depth: None,
        }
    }

    #[must_use]
    pub fn path(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start_node_id: Some(start.into()),
            end_node_id: Some(end.into()),
            ..Self::new(QueryType::Path)
        }
    }

    #[must_use]
    pub fn causal_chain(start: impl Into<String>) -> Self {
        Self {
            start_node_id: Some(start.into()),
            ..Self::new(QueryType::CausalChain)
        }
    }

    #[must_use]
    pub fn influence(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start_node_id: Some(start.into()),
            end_node_id: Some(end.into()),
            ..Self::new(QueryType::Influence)
        }
    }

    #[must_use]
    pub fn prerequisite(node: impl Into<String>) -> Self {
        Self {
            node_id: Some(node.into()),
            ..Self::new(QueryType::Prerequisite)
        }
    }

    #[must_use]
    pub fn parallel(node: impl Into<String>) -> Self {
        Self {
            node_id: Some(node.into()),
            ..Self::new(QueryType::Parallel)
        }
    }

    #[must_use]
    pub fn impact(node: impl Into<String>) -> Self {
        Self {
            node_id: Some(node.into()),
            ..Self::new(QueryType::Impact)
        }
    }

    #[must_use]
    pub fn with_relation_types(mut self, types: impl IntoIterator<Item = RelationType>) -> Self {
        self.relation_types = types.into_iter().collect();
        self
    }

    #[must_use]
    pub const fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}

/// Type-specific query payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResult {
    Paths { paths: Vec<Vec<String>> },
    NodeIds { node_ids: Vec<String> },
    Influence { influenced: bool, confidence: f64 },
}

impl QueryResult {
    /// Number of paths or node ids; 1 or 0 for an influence answer.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Paths { paths } => paths.len(),
            Self::NodeIds { node_ids } => node_ids.len(),
            Self::Influence { influenced, .. } => usize::from(*influenced),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query_type: QueryType,
    pub result: QueryResult,
}
