//! Category affinity matrix and named-entity overlap.

use std::collections::{BTreeSet, HashMap};

use crate::model::event::DEFAULT_CATEGORY;

const SAME_CATEGORY: f64 = 0.9;
const GENERAL_PAIR: f64 = 0.5;
const UNKNOWN_PAIR: f64 = 0.15;

/// Off-diagonal entries. Lookups are symmetric.
const BUILTIN_PAIRS: &[(&str, &str, f64)] = &[
    ("politics", "economy", 0.7),
    ("politics", "military", 0.7),
    ("politics", "society", 0.6),
    ("politics", "business", 0.4),
    ("politics", "health", 0.4),
    ("politics", "disaster", 0.4),
    ("economy", "business", 0.8),
    ("economy", "technology", 0.5),
    ("economy", "society", 0.5),
    ("economy", "disaster", 0.5),
    ("economy", "health", 0.3),
    ("business", "technology", 0.7),
    ("business", "science", 0.4),
    ("business", "sports", 0.3),
    ("technology", "science", 0.8),
    ("technology", "military", 0.4),
    ("technology", "health", 0.4),
    ("science", "health", 0.7),
    ("science", "disaster", 0.3),
    ("military", "disaster", 0.4),
    ("military", "society", 0.4),
    ("disaster", "society", 0.6),
    ("disaster", "health", 0.5),
    ("society", "health", 0.6),
    ("society", "culture", 0.6),
    ("culture", "sports", 0.6),
    ("general", "politics", 0.3),
    ("general", "economy", 0.3),
    ("general", "business", 0.3),
    ("general", "technology", 0.3),
    ("general", "science", 0.3),
    ("general", "military", 0.3),
    ("general", "disaster", 0.3),
    ("general", "society", 0.3),
    ("general", "health", 0.3),
    ("general", "culture", 0.3),
    ("general", "sports", 0.3),
];

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Symmetric category-affinity lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAffinity {
    same_category: f64,
    general_pair: f64,
    default: f64,
    pairs: HashMap<(String, String), f64>,
}

impl Default for CategoryAffinity {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CategoryAffinity {
    #[must_use]
    pub fn builtin() -> Self {
        let mut affinity = Self::empty(SAME_CATEGORY, UNKNOWN_PAIR);
        for &(a, b, score) in BUILTIN_PAIRS {
            affinity.set(a, b, score);
        }
        affinity
    }

    /// A matrix with no off-diagonal entries.
    #[must_use]
    pub fn empty(same_category: f64, default: f64) -> Self {
        Self {
            same_category: same_category.clamp(0.0, 1.0),
            general_pair: GENERAL_PAIR,
            default: default.clamp(0.0, 1.0),
            pairs: HashMap::new(),
        }
    }

    pub fn set(&mut self, a: &str, b: &str, score: f64) {
        let a = a.trim().to_lowercase();
        let b = b.trim().to_lowercase();
        self.pairs.insert(pair_key(&a, &b), score.clamp(0.0, 1.0));
    }

    pub fn set_same_category(&mut self, score: f64) {
        self.same_category = score.clamp(0.0, 1.0);
    }

    pub fn set_default(&mut self, score: f64) {
        self.default = score.clamp(0.0, 1.0);
    }

    /// Affinity between two (lowercase) category labels.
    #[must_use]
    pub fn lookup(&self, a: &str, b: &str) -> f64 {
        if let Some(&score) = self.pairs.get(&pair_key(a, b)) {
            return score;
        }
        if a != b {
            return self.default;
        }
        if a == DEFAULT_CATEGORY {
            self.general_pair
        } else {
            self.same_category
        }
    }
}

/// Normalised people and locations of one event.
pub type EntitySet = BTreeSet<String>;

#[must_use]
pub fn entity_set(people: &[String], locations: &[String]) -> EntitySet {
    people
        .iter()
        .chain(locations)
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Jaccard overlap plus 0.1 per shared entity beyond the first, capped at 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn entity_overlap(a: &EntitySet, b: &EntitySet) -> f64 {
    let shared = a.intersection(b).count();
    if shared == 0 {
        return 0.0;
    }
    let union = a.union(b).count();
    let jaccard = shared as f64 / union as f64;
    (jaccard + 0.1 * (shared - 1) as f64).min(1.0)
}
