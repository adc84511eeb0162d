//! Error taxonomy for graph construction and querying.
//!
//! Construction-time failures abort the whole pipeline: no partially reduced
//! graph is ever returned. Query-time "node not found" conditions are not
//! errors at all; the query engine answers them with empty or negative
//! results.

use std::fmt;

/// Pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validation,
    Scoring,
    CycleResolution,
    Reduction,
    Topology,
    Query,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Scoring => "scoring",
            Self::CycleResolution => "cycle-resolution",
            Self::Reduction => "reduction",
            Self::Topology => "topology",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable error codes for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    EmptyEvents,
    DuplicateEventId,
    InvalidDate,
    ThresholdOutOfRange,
    MaxEventsOutOfRange,
    WindowOutOfRange,
    WorkersOutOfRange,
    UnknownRelationType,
    InvalidQuery,
    InvalidCandidate,
    WorkerPool,
    InternalInvariant,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EmptyEvents => "E1001",
            Self::DuplicateEventId => "E1002",
            Self::InvalidDate => "E1003",
            Self::ThresholdOutOfRange => "E1101",
            Self::MaxEventsOutOfRange => "E1102",
            Self::WindowOutOfRange => "E1103",
            Self::WorkersOutOfRange => "E1104",
            Self::UnknownRelationType => "E1201",
            Self::InvalidQuery => "E1202",
            Self::InvalidCandidate => "E1203",
            Self::WorkerPool => "E5001",
            Self::InternalInvariant => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::EmptyEvents => "Event list is empty",
            Self::DuplicateEventId => "Duplicate event identifier",
            Self::InvalidDate => "Event date is not a valid ISO date",
            Self::ThresholdOutOfRange => "Relation threshold out of range",
            Self::MaxEventsOutOfRange => "max_events out of range",
            Self::WindowOutOfRange => "Look-ahead window out of range",
            Self::WorkersOutOfRange => "Worker count out of range",
            Self::UnknownRelationType => "Unknown relation type",
            Self::InvalidQuery => "Malformed query request",
            Self::InvalidCandidate => "Malformed candidate edge",
            Self::WorkerPool => "Scoring worker pool unavailable",
            Self::InternalInvariant => "Internal invariant violated",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::EmptyEvents => Some("Provide at least one event."),
            Self::DuplicateEventId => Some("Deduplicate events upstream; ids must be unique."),
            Self::InvalidDate => Some("Use YYYY, YYYY-MM, YYYY-MM-DD or an RFC 3339 timestamp."),
            Self::ThresholdOutOfRange => Some("Use a relation threshold between 0.0 and 1.0."),
            Self::MaxEventsOutOfRange => Some("Use max_events between 1 and 5000."),
            Self::WindowOutOfRange => Some("Use a look-ahead window of at least 1."),
            Self::WorkersOutOfRange => Some("Use between 1 and 64 scoring workers."),
            Self::UnknownRelationType => Some(
                "Use one of causal, temporal, prerequisite, parallel, derived, dependency, correlated.",
            ),
            Self::InvalidQuery => Some("Supply the parameters required by the query type."),
            Self::InvalidCandidate => {
                Some(
                    "Candidate edges must join two distinct, existing nodes exactly once, \
                     meet the threshold and never point back in time.",
                )
            }
            Self::WorkerPool => Some("Retry with --workers 1 to score sequentially."),
            Self::InternalInvariant => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised while validating input, building a graph, or parsing a query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("event list is empty")]
    EmptyEvents,

    #[error("duplicate event id '{id}'")]
    DuplicateEventId { id: String },

    #[error("event '{id}' has an invalid date_iso '{value}'")]
    InvalidDate { id: String, value: String },

    #[error("relation threshold {value} is outside [0.0, 1.0]")]
    ThresholdOutOfRange { value: f64 },

    #[error("max_events {value} is outside [1, {max}]", max = crate::config::MAX_EVENTS_LIMIT)]
    MaxEventsOutOfRange { value: usize },

    #[error("look-ahead window {value} must be at least 1")]
    WindowOutOfRange { value: usize },

    #[error("worker count {value} is outside [1, {max}]", max = crate::config::MAX_WORKERS)]
    WorkersOutOfRange { value: usize },

    #[error(transparent)]
    UnknownRelationType(#[from] crate::model::relation::UnknownRelationType),

    #[error("invalid {query_type} query: {reason}")]
    InvalidQuery { query_type: String, reason: String },

    #[error("invalid candidate edge {source_id} -> {target_id}: {reason}")]
    InvalidCandidate {
        source_id: String,
        target_id: String,
        reason: String,
    },

    #[error("scoring worker pool could not be created: {reason}")]
    WorkerPool { reason: String },

    #[error("internal invariant violated during {stage}: {detail}")]
    InternalInvariant { stage: Stage, detail: String },
}

impl EngineError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyEvents => ErrorCode::EmptyEvents,
            Self::DuplicateEventId { .. } => ErrorCode::DuplicateEventId,
            Self::InvalidDate { .. } => ErrorCode::InvalidDate,
            Self::ThresholdOutOfRange { .. } => ErrorCode::ThresholdOutOfRange,
            Self::MaxEventsOutOfRange { .. } => ErrorCode::MaxEventsOutOfRange,
            Self::WindowOutOfRange { .. } => ErrorCode::WindowOutOfRange,
            Self::WorkersOutOfRange { .. } => ErrorCode::WorkersOutOfRange,
            Self::UnknownRelationType(_) => ErrorCode::UnknownRelationType,
            Self::InvalidQuery { .. } => ErrorCode::InvalidQuery,
            Self::InvalidCandidate { .. } => ErrorCode::InvalidCandidate,
            Self::WorkerPool { .. } => ErrorCode::WorkerPool,
            Self::InternalInvariant { .. } => ErrorCode::InternalInvariant,
        }
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::EmptyEvents
            | Self::DuplicateEventId { .. }
            | Self::InvalidDate { .. }
            | Self::ThresholdOutOfRange { .. }
            | Self::MaxEventsOutOfRange { .. }
            | Self::WindowOutOfRange { .. }
            | Self::WorkersOutOfRange { .. }
            | Self::UnknownRelationType(_)
            | Self::InvalidCandidate { .. } => Stage::Validation,
            Self::InvalidQuery { .. } => Stage::Query,
            Self::WorkerPool { .. } => Stage::Scoring,
            Self::InternalInvariant { stage, .. } => *stage,
        }
    }

    /// `true` for the input-error family: rejected before construction starts.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        !matches!(
            self,
            Self::InternalInvariant { .. } | Self::WorkerPool { .. }
        )
    }

    /// Remediation text, falling back to the code's summary.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.error_code();
        code.hint().unwrap_or_else(|| code.message()).to_string()
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
