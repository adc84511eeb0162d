//! Source text split into sentences for evidence lookup.

use crate::model::event::Event;

const SENTENCE_TERMINATORS: &[char] = &['。', '！', '？', '.', '!', '?', '\n'];
const MAX_EVIDENCE: usize = 2;

/// Sentences of the document the events were extracted from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceContext {
    sentences: Vec<String>,
}

impl SourceContext {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let sentences = text
            .split(SENTENCE_TERMINATORS)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect();
        Self { sentences }
    }

    #[must_use]
    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Up to two distinct sentences mentioning `event`.
    ///
    /// Matches on the title first, then the description; with no match the
    /// title itself is the evidence.
    #[must_use]
    pub fn evidence_for(&self, event: &Event) -> Vec<String> {
        for needle in [event.title.trim(), event.description.trim()] {
            if needle.is_empty() {
                continue;
            }
            let found = self.sentences_containing(needle);
            if !found.is_empty() {
                return found;
            }
        }

        let title = event.title.trim();
        if title.is_empty() {
            Vec::new()
        } else {
            vec![title.to_string()]
        }
    }

    fn sentences_containing(&self, needle: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for sentence in &self.sentences {
            if found.len() == MAX_EVIDENCE {
                break;
            }
            if sentence.contains(needle) && !found.contains(sentence) {
                found.push(sentence.clone());
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_japanese_and_latin_terminators() {
        let ctx = SourceContext::new("内閣が発足。予算が成立！ Prices rose. Why?\nDone");
        assert_eq!(
            ctx.sentences(),
            ["内閣が発足", "予算が成立", "Prices rose", "Why", "Done"]
        );
    }

    #[test]
    fn evidence_prefers_title_matches_and_caps_at_two() {
        let ctx = SourceContext::new("Budget passed. The Budget vote was close. Budget riots. Other.");
        let evidence = ctx.evidence_for(&Event::new("e", "Budget"));
        assert_eq!(evidence, ["Budget passed", "The Budget vote was close"]);
    }

    #[test]
    fn evidence_is_deduplicated() {
        let ctx = SourceContext::new("Budget passed. Budget passed. Budget riots.");
        let evidence = ctx.evidence_for(&Event::new("e", "Budget"));
        assert_eq!(evidence, ["Budget passed", "Budget riots"]);
    }

    #[test]
    fn evidence_falls_back_to_description_then_title() {
        let ctx = SourceContext::new("The central bank raised rates.");
        let by_description =
            ctx.evidence_for(&Event::new("e", "Rate hike").with_description("raised rates"));
        assert_eq!(by_description, ["The central bank raised rates"]);

        let by_title = ctx.evidence_for(&Event::new("e", "Election"));
        assert_eq!(by_title, ["Election"]);

        let empty = SourceContext::new("");
        assert!(empty.is_empty());
        assert_eq!(empty.evidence_for(&Event::new("e", "Election")), ["Election"]);
    }
}
