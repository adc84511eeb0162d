//! End-to-end graph construction.
//!
//! [`GraphBuilder::build`] validates input, generates windowed candidates,
//! then runs cycle resolution, transitive reduction and topological
//! analysis in that order. Any stage failure aborts the whole construction;
//! no partially reduced graph is returned.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use chronicle_core::candidates::CandidateGenerator;
use chronicle_core::config::EngineConfig;
use chronicle_core::error::{EngineError, EngineResult};
use chronicle_core::heuristics::Heuristics;
use chronicle_core::model::{Edge, Event, GRAPH_VERSION, Node, TimelineGraph};
use chronicle_core::score::SourceContext;

use crate::graph::build::RelationGraph;
use crate::graph::cycles::{BrokenCycle, resolve_cycles};
use crate::graph::reduce::transitive_reduction;
use crate::graph::stats::graph_stats;
use crate::graph::topology::{Topology, analyze};

const ID_PREFIX: &str = "dag-";
const ID_HEX_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Diagnostics collected while building one graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConstructionReport {
    /// Events supplied by the caller, before truncation.
    pub input_events: usize,
    /// Events dropped by the `max_events` limit.
    pub truncated_events: usize,
    pub candidate_count: usize,
    pub cycles_broken: Vec<BrokenCycle>,
    pub transitive_removed: Vec<Edge>,
}

/// A finished graph plus the analysis computed on the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Construction {
    pub graph: TimelineGraph,
    pub topology: Topology,
    pub report: ConstructionReport,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configured entry point for graph construction.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    config: EngineConfig,
    heuristics: Heuristics,
    title: String,
    text: String,
    generated_at: Option<DateTime<Utc>>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_heuristics(mut self, heuristics: Heuristics) -> Self {
        self.heuristics = heuristics;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Source document the events were extracted from.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Pin the generation timestamp; defaults to the time of the build.
    #[must_use]
    pub const fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a graph from chronologically ordered events.
    ///
    /// # Errors
    ///
    /// Returns an input error for an invalid configuration, an empty or
    /// malformed event list, and [`EngineError::InternalInvariant`] if a
    /// stage breaks its guarantee.
    #[instrument(skip_all, fields(events = events.len()))]
    pub fn build(&self, events: &[Event]) -> EngineResult<Construction> {
        let (kept, truncated) = self.admit(events)?;
        let context = SourceContext::new(&self.text);
        let candidates =
            CandidateGenerator::new(&self.heuristics, &context, &self.config).generate(kept)?;
        self.assemble(kept, candidates, events.len(), truncated)
    }

    /// Run the graph stages on externally supplied candidate edges.
    ///
    /// Candidates must satisfy the same rules the scorer enforces: strength
    /// in `[0, 1]` and at least the configured threshold, and a source dated
    /// no later than its target. Self-loops, unknown endpoints and repeated
    /// pairs are rejected as well.
    ///
    /// # Errors
    ///
    /// Same as [`Self::build`], plus [`EngineError::InvalidCandidate`] for a
    /// malformed candidate.
    #[instrument(skip_all, fields(events = events.len(), candidates = candidates.len()))]
    pub fn finish_from_candidates(
        &self,
        events: &[Event],
        candidates: Vec<Edge>,
    ) -> EngineResult<Construction> {
        let (kept, truncated) = self.admit(events)?;
        self.check_candidates(kept, &candidates)?;
        self.assemble(kept, candidates, events.len(), truncated)
    }

    fn admit<'e>(&self, events: &'e [Event]) -> EngineResult<(&'e [Event], usize)> {
        self.config.validate()?;
        if events.is_empty() {
            return Err(EngineError::EmptyEvents);
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(events.len());
        for event in events {
            if !seen.insert(event.id.as_str()) {
                return Err(EngineError::DuplicateEventId {
                    id: event.id.clone(),
                });
            }
        }

        let limit = self.config.max_events;
        if events.len() > limit {
            warn!(
                input = events.len(),
                max_events = limit,
                "event list truncated to max_events"
            );
            return Ok((&events[..limit], events.len() - limit));
        }
        Ok((events, 0))
    }

    /// Threshold, range and date order of external candidates. Structural
    /// problems (loops, unknown endpoints, repeats) are left to
    /// [`RelationGraph::from_parts`].
    fn check_candidates(&self, events: &[Event], candidates: &[Edge]) -> EngineResult<()> {
        let mut dates: HashMap<&str, Option<NaiveDate>> = HashMap::with_capacity(events.len());
        for event in events {
            dates.insert(&event.id, event.resolved_date()?.map(|d| d.date));
        }

        let threshold = self.config.relation_threshold;
        for edge in candidates {
            let invalid = |reason: String| EngineError::InvalidCandidate {
                source_id: edge.source_id.clone(),
                target_id: edge.target_id.clone(),
                reason,
            };
            let strength = edge.relation_strength;
            if !(0.0..=1.0).contains(&strength) {
                return Err(invalid(format!("strength {strength} is outside [0, 1]")));
            }
            if strength < threshold {
                return Err(invalid(format!(
                    "strength {strength} is below threshold {threshold}"
                )));
            }
            let source = dates.get(edge.source_id.as_str()).copied().flatten();
            let target = dates.get(edge.target_id.as_str()).copied().flatten();
            if let (Some(s), Some(t)) = (source, target) {
                if s > t {
                    return Err(invalid(format!("source date {s} is after target date {t}")));
                }
            }
        }
        Ok(())
    }

    fn assemble(
        &self,
        events: &[Event],
        candidates: Vec<Edge>,
        input_events: usize,
        truncated_events: usize,
    ) -> EngineResult<Construction> {
        let mut nodes = events
            .iter()
            .map(Node::from_event)
            .collect::<EngineResult<Vec<_>>>()?;
        let candidate_count = candidates.len();

        let mut rg = RelationGraph::from_parts(&nodes, candidates)?;
        let resolution = resolve_cycles(&mut rg);
        let transitive_removed = transitive_reduction(&mut rg)?;
        let topology = analyze(&rg)?;
        let edges = rg.into_edges();

        let parents: HashSet<&str> = edges
            .iter()
            .filter(|e| e.relation_type.is_lineage())
            .map(|e| e.source_id.as_str())
            .collect();
        for node in &mut nodes {
            node.is_parent = parents.contains(node.id.as_str());
        }

        let stats = graph_stats(
            nodes.len(),
            edges.len(),
            topology.max_path_length,
            resolution.cycles_broken(),
        );
        let generated_at = self.generated_at.unwrap_or_else(Utc::now);
        let id = graph_id(&nodes, &self.text, generated_at);

        info!(
            %id,
            nodes = stats.node_count,
            edges = stats.edge_count,
            cycles_broken = stats.cyclic_count,
            transitive_removed = transitive_removed.len(),
            max_path_length = stats.max_path_length,
            "graph constructed"
        );

        let graph = TimelineGraph {
            id,
            title: self.title.clone(),
            text: truncate_chars(&self.text, self.config.max_text_chars),
            total_events: nodes.len(),
            nodes,
            edges,
            generated_at,
            version: GRAPH_VERSION.to_string(),
            stats,
        };
        let report = ConstructionReport {
            input_events,
            truncated_events,
            candidate_count,
            cycles_broken: resolution.broken,
            transitive_removed,
        };
        Ok(Construction {
            graph,
            topology,
            report,
        })
    }
}

/// `dag-` plus the first 16 hex chars of a BLAKE3 digest over node ids,
/// source text and timestamp.
fn graph_id(nodes: &[Node], text: &str, generated_at: DateTime<Utc>) -> String {
    let mut hasher = blake3::Hasher::new();
    for node in nodes {
        hasher.update(node.id.as_bytes());
        hasher.update(b"\x00");
    }
    hasher.update(text.as_bytes());
    hasher.update(b"\x00");
    hasher.update(
        generated_at
            .to_rfc3339_opts(SecondsFormat::Micros, true)
            .as_bytes(),
    );
    let hex = hasher.finalize().to_hex();
    format!("{ID_PREFIX}{}", &hex.as_str()[..ID_HEX_LEN])
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
