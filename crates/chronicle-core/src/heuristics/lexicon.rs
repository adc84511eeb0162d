//! Ranked lexicon of connective phrases.
//!
//! Phrases are matched against an event's `title + "\n" + description`.
//! ASCII phrases are matched case-insensitively and only on word
//! boundaries; phrases in other scripts match as plain substrings.

use crate::model::relation::RelationType;

/// One connective phrase and the evidence it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub phrase: String,
    pub relation: RelationType,
    pub score: f64,
    needle: String,
    /// ASCII phrases must not touch an ASCII letter or digit on either side.
    word_bounded: bool,
}

impl Marker {
    pub fn new(phrase: impl Into<String>, relation: RelationType, score: f64) -> Self {
        let phrase = phrase.into();
        let needle = phrase.to_ascii_lowercase();
        let word_bounded = needle.is_ascii();
        Self {
            phrase,
            relation,
            score: score.clamp(0.0, 1.0),
            needle,
            word_bounded,
        }
    }

    /// Whether the phrase occurs in `haystack`, which must already be
    /// ASCII-lowercased.
    #[must_use]
    pub fn occurs_in(&self, haystack: &str) -> bool {
        if !self.word_bounded {
            return haystack.contains(self.needle.as_str());
        }
        haystack.match_indices(self.needle.as_str()).any(|(start, hit)| {
            let before = haystack[..start].chars().next_back();
            let after = haystack[start + hit.len()..].chars().next();
            !before.is_some_and(|c| c.is_ascii_alphanumeric())
                && !after.is_some_and(|c| c.is_ascii_alphanumeric())
        })
    }
}

/// Default entries, grouped by relation type.
const BUILTIN: &[(&str, RelationType, f64)] = &[
    // causal
    ("その結果", RelationType::Causal, 0.95),
    ("as a result", RelationType::Causal, 0.95),
    ("結果として", RelationType::Causal, 0.93),
    ("consequently", RelationType::Causal, 0.93),
    ("そのため", RelationType::Causal, 0.92),
    ("これにより", RelationType::Causal, 0.92),
    ("これによって", RelationType::Causal, 0.92),
    ("therefore", RelationType::Causal, 0.92),
    ("because of", RelationType::Causal, 0.90),
    ("led to", RelationType::Causal, 0.90),
    ("resulted in", RelationType::Causal, 0.90),
    ("caused by", RelationType::Causal, 0.90),
    // prerequisite
    ("前提として", RelationType::Prerequisite, 0.95),
    ("prerequisite", RelationType::Prerequisite, 0.95),
    ("に先立ち", RelationType::Prerequisite, 0.92),
    ("in preparation for", RelationType::Prerequisite, 0.92),
    ("を経て", RelationType::Prerequisite, 0.90),
    ("paved the way", RelationType::Prerequisite, 0.90),
    // dependency
    ("に依存", RelationType::Dependency, 0.90),
    ("depends on", RelationType::Dependency, 0.90),
    ("contingent on", RelationType::Dependency, 0.90),
    ("relied on", RelationType::Dependency, 0.88),
    // derived
    ("に基づき", RelationType::Derived, 0.88),
    ("derived from", RelationType::Derived, 0.88),
    ("based on", RelationType::Derived, 0.85),
    ("building on", RelationType::Derived, 0.85),
    // parallel
    ("同時に", RelationType::Parallel, 0.90),
    ("並行して", RelationType::Parallel, 0.90),
    ("at the same time", RelationType::Parallel, 0.90),
    ("simultaneously", RelationType::Parallel, 0.90),
    ("meanwhile", RelationType::Parallel, 0.88),
    ("一方", RelationType::Parallel, 0.85),
    // temporal
    ("the next day", RelationType::Temporal, 0.85),
    ("翌日", RelationType::Temporal, 0.82),
    ("subsequently", RelationType::Temporal, 0.82),
    ("その後", RelationType::Temporal, 0.80),
    ("翌月", RelationType::Temporal, 0.80),
    ("afterwards", RelationType::Temporal, 0.80),
    ("翌年", RelationType::Temporal, 0.78),
    ("later", RelationType::Temporal, 0.75),
    // correlated
    ("同様に", RelationType::Correlated, 0.75),
    ("similarly", RelationType::Correlated, 0.75),
    ("likewise", RelationType::Correlated, 0.75),
];

/// Ordered marker table. Order breaks score ties.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLexicon {
    markers: Vec<Marker>,
}

impl Default for MarkerLexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

impl MarkerLexicon {
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .map(|&(phrase, relation, score)| Marker::new(phrase, relation, score))
                .collect(),
        )
    }

    /// Build from an explicit list. Empty phrases are dropped.
    #[must_use]
    pub fn new(markers: Vec<Marker>) -> Self {
        Self {
            markers: markers
                .into_iter()
                .filter(|m| !m.needle.trim().is_empty())
                .collect(),
        }
    }

    /// Append entries after the existing ones.
    pub fn extend(&mut self, markers: impl IntoIterator<Item = Marker>) {
        self.markers
            .extend(markers.into_iter().filter(|m| !m.needle.trim().is_empty()));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    /// Highest-scoring marker found in `text`; the earliest entry wins ties.
    #[must_use]
    pub fn best_match(&self, text: &str) -> Option<&Marker> {
        let haystack = text.to_ascii_lowercase();
        self.best_match_normalized(&haystack)
    }

    /// Like [`Self::best_match`] for text already passed through
    /// `to_ascii_lowercase`.
    #[must_use]
    pub fn best_match_normalized(&self, haystack: &str) -> Option<&Marker> {
        let mut best: Option<&Marker> = None;
        for marker in &self.markers {
            if !marker.occurs_in(haystack) {
                continue;
            }
            if best.is_none_or(|b| marker.score > b.score) {
                best = Some(marker);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_relation_type() {
        let lexicon = MarkerLexicon::builtin();
        for relation in RelationType::ALL {
            assert!(
                lexicon.iter().any(|m| m.relation == relation),
                "no marker for {relation}"
            );
        }
    }

    #[test]
    fn match_is_ascii_case_insensitive() {
        let lexicon = MarkerLexicon::builtin();
        let hit = lexicon.best_match("As A Result, prices rose").unwrap();
        assert_eq!(hit.phrase, "as a result");
        assert_eq!(hit.relation, RelationType::Causal);
    }

    #[test]
    fn japanese_markers_match() {
        let lexicon = MarkerLexicon::builtin();
        let hit = lexicon.best_match("その結果、株価が下落した").unwrap();
        assert_eq!(hit.relation, RelationType::Causal);
        assert!((hit.score - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn highest_score_wins() {
        let lexicon = MarkerLexicon::builtin();
        let hit = lexicon
            .best_match("Later, consequently, the plan failed")
            .unwrap();
        assert_eq!(hit.phrase, "consequently");
    }

    #[test]
    fn earlier_entry_wins_score_tie() {
        let lexicon = MarkerLexicon::new(vec![
            Marker::new("alpha", RelationType::Derived, 0.8),
            Marker::new("beta", RelationType::Parallel, 0.8),
        ]);
        let hit = lexicon.best_match("beta then alpha").unwrap();
        assert_eq!(hit.phrase, "alpha");
    }

    #[test]
    fn ascii_markers_need_word_boundaries() {
        let lexicon = MarkerLexicon::builtin();
        assert!(lexicon.best_match("Talks scheduled to open").is_none());
        assert!(lexicon.best_match("Flights cancelled today").is_none());
        assert!(lexicon.best_match("A collateral agreement was signed").is_none());

        let hit = lexicon.best_match("The strike led to delays.").unwrap();
        assert_eq!(hit.phrase, "led to");
        let hit = lexicon.best_match("(later) the talks resumed").unwrap();
        assert_eq!(hit.phrase, "later");
    }

    #[test]
    fn ascii_marker_matches_next_to_japanese_text() {
        let lexicon = MarkerLexicon::builtin();
        let hit = lexicon.best_match("会議はlaterに延期").unwrap();
        assert_eq!(hit.phrase, "later");
    }

    #[test]
    fn japanese_markers_match_inside_words() {
        let lexicon = MarkerLexicon::builtin();
        let hit = lexicon.best_match("協議の翌日に発表").unwrap();
        assert_eq!(hit.phrase, "翌日");
    }

    #[test]
    fn no_marker_returns_none() {
        let lexicon = MarkerLexicon::builtin();
        assert!(lexicon.best_match("Parliament opens its session").is_none());
    }

    #[test]
    fn empty_phrases_are_dropped_and_scores_clamped() {
        let lexicon = MarkerLexicon::new(vec![
            Marker::new("  ", RelationType::Causal, 0.9),
            Marker::new("boom", RelationType::Causal, 3.0),
        ]);
        assert_eq!(lexicon.len(), 1);
        assert!((lexicon.best_match("boom").unwrap().score - 1.0).abs() < f64::EPSILON);
    }
}
