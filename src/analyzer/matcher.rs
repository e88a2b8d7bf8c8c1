use crate::analyzer::taxonomy::{Taxonomy, TaxonomyEntry};
use crate::model::{Category, MatchResult, MatchSource, NormalizedLot};

/// A category hit inside a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetMatch {
    pub category: Category,
    pub base_score: f64,
    pub matched_text: String,
}

/// Classifies normalized lots against a target taxonomy.
pub struct KeywordMatcher {
    taxonomy: Taxonomy,
}

impl KeywordMatcher {
    pub fn new(taxonomy: Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Highest-valued category present in `text`.
    pub fn best_match(&self, text: &str) -> Option<TargetMatch> {
        // Entries are sorted by base score, so the first hit is the best.
        self.taxonomy
            .entries()
            .iter()
            .find_map(|entry| Self::hit(entry, text))
    }

    /// Scraper-supplied make/model/trim fields are consulted first; the raw
    /// text (plus condition notes) decides when they say nothing. A model that
    /// was itself pulled out of the raw text carries no extra weight.
    pub fn classify(&self, lot: NormalizedLot) -> MatchResult {
        let model = lot.model.as_deref().filter(|_| lot.model_declared);
        let vehicle = [lot.make.as_deref(), model, lot.trim.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");

        let found = self
            .best_match(&vehicle)
            .map(|m| (m, MatchSource::MakeModel))
            .or_else(|| {
                let text = match lot.condition_notes.as_deref() {
                    Some(notes) => format!("{} {}", lot.raw_text, notes),
                    None => lot.raw_text.clone(),
                };
                self.best_match(&text).map(|m| (m, MatchSource::RawText))
            });

        match found {
            Some((hit, matched_on)) => MatchResult {
                lot,
                category: hit.category,
                base_score: hit.base_score,
                matched_on,
                matched_text: Some(hit.matched_text),
            },
            None => MatchResult {
                lot,
                category: Category::NoMatch,
                base_score: 0.0,
                matched_on: MatchSource::Unmatched,
                matched_text: None,
            },
        }
    }

    fn hit(entry: &TaxonomyEntry, text: &str) -> Option<TargetMatch> {
        entry.patterns.iter().find_map(|p| p.find(text)).map(|m| TargetMatch {
            category: entry.category,
            base_score: entry.base_score,
            matched_text: m.as_str().to_string(),
        })
    }
}
