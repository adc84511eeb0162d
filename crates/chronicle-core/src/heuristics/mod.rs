//! Read-only heuristic tables injected into the relation scorer.

pub mod affinity;
pub mod lexicon;

use std::str::FromStr;

pub use affinity::{CategoryAffinity, EntitySet, entity_overlap, entity_set};
pub use lexicon::{Marker, MarkerLexicon};

use crate::config::HeuristicsConfig;
use crate::error::EngineResult;
use crate::model::relation::RelationType;

/// Marker lexicon plus category-affinity matrix.
///
/// Built once per construction and shared by reference with every scoring
/// worker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Heuristics {
    pub lexicon: MarkerLexicon,
    pub affinity: CategoryAffinity,
}

impl Heuristics {
    #[must_use]
    pub const fn new(lexicon: MarkerLexicon, affinity: CategoryAffinity) -> Self {
        Self { lexicon, affinity }
    }

    /// Apply a `[heuristics]` table on top of the built-in tables.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::EngineError::UnknownRelationType`] when a
    /// marker names a relation type outside the closed set.
    pub fn from_config(config: &HeuristicsConfig) -> EngineResult<Self> {
        let extra = config
            .markers
            .iter()
            .map(|m| -> EngineResult<Marker> {
                let relation = RelationType::from_str(&m.relation)?;
                Ok(Marker::new(m.phrase.trim(), relation, m.score))
            })
            .collect::<EngineResult<Vec<_>>>()?;

        let lexicon = if config.replace_default_markers {
            MarkerLexicon::new(extra)
        } else {
            let mut lexicon = MarkerLexicon::builtin();
            lexicon.extend(extra);
            lexicon
        };

        let mut affinity = CategoryAffinity::builtin();
        if let Some(score) = config.same_category_affinity {
            affinity.set_same_category(score);
        }
        if let Some(score) = config.default_affinity {
            affinity.set_default(score);
        }
        for pair in &config.affinity {
            affinity.set(&pair.a, &pair.b, pair.score);
        }

        Ok(Self { lexicon, affinity })
    }
}
