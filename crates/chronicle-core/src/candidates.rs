//! Windowed candidate-edge generation.
//!
//! Each event is scored against the next `window` events only. Scoring is
//! pure, so pairs may be spread over a bounded worker pool; results are
//! always returned in `(i, j)` order.

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::heuristics::Heuristics;
use crate::model::edge::Edge;
use crate::model::event::Event;
use crate::score::{PreparedEvent, RelationScorer, SourceContext};

/// `(i, j)` index pairs with `i < j <= i + window`, in row-major order.
#[must_use]
pub fn window_pairs(len: usize, window: usize) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(len.saturating_mul(window));
    for i in 0..len {
        let end = len.min(i.saturating_add(window).saturating_add(1));
        for j in (i + 1)..end {
            pairs.push((i, j));
        }
    }
    pairs
}

/// Drives the relation scorer over look-ahead pairs.
#[derive(Debug, Clone, Copy)]
pub struct CandidateGenerator<'a> {
    scorer: RelationScorer<'a>,
    context: &'a SourceContext,
    window: usize,
    workers: usize,
}

impl<'a> CandidateGenerator<'a> {
    #[must_use]
    pub const fn new(heuristics: &'a Heuristics, context: &'a SourceContext, config: &EngineConfig) -> Self {
        Self {
            scorer: RelationScorer::new(heuristics, config.relation_threshold),
            context,
            window: config.window,
            workers: config.workers,
        }
    }

    /// Score every windowed pair and collect the admitted edges.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDate`] for an unparseable event date and
    /// [`EngineError::WorkerPool`] when the scoring pool cannot be built.
    #[instrument(skip_all, fields(events = events.len(), window = self.window, workers = self.workers))]
    pub fn generate(&self, events: &[Event]) -> EngineResult<Vec<Edge>> {
        let prepared = events
            .iter()
            .map(PreparedEvent::new)
            .collect::<EngineResult<Vec<_>>>()?;
        warn_on_regressions(&prepared);

        let pairs = window_pairs(prepared.len(), self.window);
        let score = |&(i, j): &(usize, usize)| self.edge_for(&prepared[i], &prepared[j]);

        let edges: Vec<Edge> = if self.workers <= 1 {
            pairs.iter().filter_map(score).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .thread_name(|i| format!("chronicle-score-{i}"))
                .build()
                .map_err(|e| EngineError::WorkerPool {
                    reason: e.to_string(),
                })?;
            pool.install(|| pairs.par_iter().filter_map(score).collect())
        };

        info!(
            pairs = pairs.len(),
            candidates = edges.len(),
            "candidate generation complete"
        );
        Ok(edges)
    }

    fn edge_for(&self, earlier: &PreparedEvent<'_>, later: &PreparedEvent<'_>) -> Option<Edge> {
        let scored = self.scorer.score(earlier, later)?;
        debug!(
            source = %earlier.event.id,
            target = %later.event.id,
            relation = %scored.relation_type,
            strength = scored.strength,
            "candidate"
        );

        let mut edge = Edge::new(
            earlier.event.id.clone(),
            later.event.id.clone(),
            scored.relation_type,
            scored.strength,
        );
        edge.time_gap_days = scored.time_gap_days;
        edge.reasoning = scored.rationale;
        edge.evidence_sentences = self.context.evidence_for(later.event);
        Some(edge)
    }
}

fn warn_on_regressions(prepared: &[PreparedEvent<'_>]) {
    let mut last: Option<(&str, chrono::NaiveDate)> = None;
    for current in prepared {
        let Some(date) = current.date.map(|d| d.date) else {
            continue;
        };
        if let Some((earlier, prev)) = last {
            if prev > date {
                warn!(earlier, later = %current.event.id, "input is not chronologically ordered");
            }
        }
        last = Some((current.event.id.as_str(), date));
    }
}
