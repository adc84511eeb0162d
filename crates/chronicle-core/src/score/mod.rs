//! Heuristic relation scoring between an ordered pair of events.
//!
//! `strength = 0.45*marker + 0.25*affinity + 0.20*decay + 0.10*overlap`
//!
//! - `marker`: best connective phrase in the later event's text, then the
//!   earlier one's (later wins ties).
//! - `affinity`: category affinity plus a capped entity-overlap bonus.
//! - `decay`: `exp(-|gap_days| / 365)`, or 0.8 when either date is missing.
//! - `overlap`: shared people and locations.

pub mod context;

pub use context::SourceContext;

use crate::error::EngineResult;
use crate::heuristics::{EntitySet, Heuristics, Marker, entity_overlap, entity_set};
use crate::model::date::ResolvedDate;
use crate::model::event::Event;
use crate::model::relation::RelationType;

pub const MARKER_WEIGHT: f64 = 0.45;
pub const AFFINITY_WEIGHT: f64 = 0.25;
pub const DECAY_WEIGHT: f64 = 0.20;
pub const OVERLAP_WEIGHT: f64 = 0.10;

const DECAY_HORIZON_DAYS: f64 = 365.0;
const UNDATED_DECAY: f64 = 0.8;
const ENTITY_BONUS_CAP: f64 = 0.15;
/// Overlap at or above this counts as "shared entities".
pub const SHARED_ENTITY_OVERLAP: f64 = 0.25;

/// An event with its date and matching keys resolved once up front.
#[derive(Debug, Clone)]
pub struct PreparedEvent<'a> {
    pub event: &'a Event,
    pub date: Option<ResolvedDate>,
    entities: EntitySet,
    haystack: String,
}

impl<'a> PreparedEvent<'a> {
    /// # Errors
    ///
    /// Returns [`crate::error::EngineError::InvalidDate`] for an unparseable
    /// `date_iso`.
    pub fn new(event: &'a Event) -> EngineResult<Self> {
        Ok(Self {
            event,
            date: event.resolved_date()?,
            entities: entity_set(&event.people, &event.locations),
            haystack: event.marker_text().to_ascii_lowercase(),
        })
    }
}

/// The four weighted components of a strength value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub marker: f64,
    pub affinity: f64,
    pub decay: f64,
    pub overlap: f64,
}

impl ScoreBreakdown {
    /// Weighted sum, clamped to `[0, 1]` and rounded to 3 decimals.
    #[must_use]
    pub fn strength(&self) -> f64 {
        let raw = MARKER_WEIGHT * self.marker
            + AFFINITY_WEIGHT * self.affinity
            + DECAY_WEIGHT * self.decay
            + OVERLAP_WEIGHT * self.overlap;
        round3(raw.clamp(0.0, 1.0))
    }
}

#[must_use]
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// A relation the scorer would emit, before threshold filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRelation {
    pub relation_type: RelationType,
    pub strength: f64,
    pub rationale: String,
    pub marker: Option<String>,
    pub time_gap_days: Option<i64>,
    pub breakdown: ScoreBreakdown,
}

/// Pure scorer over injected heuristic tables.
#[derive(Debug, Clone, Copy)]
pub struct RelationScorer<'h> {
    heuristics: &'h Heuristics,
    threshold: f64,
}

impl<'h> RelationScorer<'h> {
    #[must_use]
    pub const fn new(heuristics: &'h Heuristics, threshold: f64) -> Self {
        Self {
            heuristics,
            threshold,
        }
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score `earlier -> later`, or `None` when the pair is rejected.
    ///
    /// A pair is rejected when its strength is below the threshold or when
    /// both dates resolve and `earlier` is strictly later than `later`.
    #[must_use]
    pub fn score(&self, earlier: &PreparedEvent<'_>, later: &PreparedEvent<'_>) -> Option<ScoredRelation> {
        if let (Some(a), Some(b)) = (earlier.date, later.date) {
            if a.date > b.date {
                return None;
            }
        }

        let scored = self.assess(earlier, later);
        (scored.strength >= self.threshold).then_some(scored)
    }

    /// Score without the threshold or temporal checks.
    #[must_use]
    pub fn assess(&self, earlier: &PreparedEvent<'_>, later: &PreparedEvent<'_>) -> ScoredRelation {
        let marker = self.best_marker(earlier, later);

        let overlap = entity_overlap(&earlier.entities, &later.entities);
        let same_category = earlier.event.category == later.event.category;
        let affinity = (self
            .heuristics
            .affinity
            .lookup(&earlier.event.category, &later.event.category)
            + (ENTITY_BONUS_CAP * overlap).min(ENTITY_BONUS_CAP))
        .min(1.0);

        let time_gap_days = match (earlier.date, later.date) {
            (Some(a), Some(b)) => Some(a.days_until(&b)),
            _ => None,
        };
        #[allow(clippy::cast_precision_loss)]
        let decay = time_gap_days.map_or(UNDATED_DECAY, |gap| {
            (-(gap.unsigned_abs() as f64) / DECAY_HORIZON_DAYS).exp()
        });

        let breakdown = ScoreBreakdown {
            marker: marker.map_or(0.0, |m| m.score),
            affinity,
            decay,
            overlap,
        };

        let (relation_type, rationale) = match marker {
            Some(m) => (m.relation, format!("{} marker \"{}\"", m.relation, m.phrase)),
            None if same_category && overlap >= SHARED_ENTITY_OVERLAP => (
                RelationType::Correlated,
                "same category with shared entities".to_string(),
            ),
            None if same_category => (
                RelationType::Temporal,
                format!("chronological succession within {}", earlier.event.category),
            ),
            None => (
                RelationType::Temporal,
                "chronological succession".to_string(),
            ),
        };

        ScoredRelation {
            relation_type,
            strength: breakdown.strength(),
            rationale,
            marker: marker.map(|m| m.phrase.clone()),
            time_gap_days,
            breakdown,
        }
    }

    fn best_marker(&self, earlier: &PreparedEvent<'_>, later: &PreparedEvent<'_>) -> Option<&'h Marker> {
        let lexicon = &self.heuristics.lexicon;
        let from_later = lexicon.best_match_normalized(&later.haystack);
        let from_earlier = lexicon.best_match_normalized(&earlier.haystack);
        match (from_later, from_earlier) {
            (Some(l), Some(e)) if e.score > l.score => Some(e),
            (Some(l), _) => Some(l),
            (None, e) => e,
        }
    }
}
