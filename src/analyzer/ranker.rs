use crate::analyzer::dedup::{dedupe, duplicate_count, rank_order};
use crate::analyzer::matcher::KeywordMatcher;
use crate::analyzer::scoring::{Scorer, ScoringPolicy};
use crate::analyzer::taxonomy::Taxonomy;
use crate::config::{AppConfig, ConfigError};
use crate::model::{Category, RankedSet, RawLot};
use crate::normalizer::Normalizer;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Counters describing one ranking run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankSummary {
    pub total: usize,
    pub matched: usize,
    pub duplicates_removed: usize,
    pub ranked: usize,
    pub by_category: BTreeMap<&'static str, usize>,
    pub by_state: BTreeMap<String, usize>,
}

/// normalize -> classify -> drop non-targets -> score -> dedupe -> sort.
pub struct Ranker {
    normalizer: Normalizer,
    matcher: KeywordMatcher,
    scorer: Scorer,
}

impl Ranker {
    pub fn new(normalizer: Normalizer, matcher: KeywordMatcher, scorer: Scorer) -> Self {
        Self {
            normalizer,
            matcher,
            scorer,
        }
    }

    /// Builds the pipeline from configuration. `reference_year` is passed in
    /// rather than read from the clock so a run is reproducible.
    pub fn from_config(cfg: &AppConfig, reference_year: i32) -> Result<Self, ConfigError> {
        cfg.scoring.validate()?;
        let taxonomy = match &cfg.taxonomy {
            Some(entries) => Taxonomy::from_config(entries)?,
            None => Taxonomy::default(),
        };
        Ok(Self::new(
            Normalizer::new(reference_year, &cfg.normalizer),
            KeywordMatcher::new(taxonomy),
            Scorer::new(ScoringPolicy::new(reference_year, cfg.scoring.clone())),
        ))
    }

    #[cfg(test)]
    pub fn rank(&self, lots: &[RawLot]) -> RankedSet {
        self.rank_with_summary(lots).0
    }

    pub fn rank_with_summary(&self, lots: &[RawLot]) -> (RankedSet, RankSummary) {
        let scored: Vec<_> = lots
            .par_iter()
            .filter_map(|raw| {
                let matched = self.matcher.classify(self.normalizer.normalize(raw));
                (matched.category != Category::NoMatch).then(|| self.scorer.score(matched))
            })
            .collect();

        let matched = scored.len();
        let duplicates_removed = duplicate_count(&scored);
        let mut ranked = dedupe(scored);
        ranked.sort_by(rank_order);

        let mut summary = RankSummary {
            total: lots.len(),
            matched,
            duplicates_removed,
            ranked: ranked.len(),
            ..RankSummary::default()
        };
        for lot in &ranked {
            *summary.by_category.entry(lot.category().as_str()).or_default() += 1;
            *summary
                .by_state
                .entry(lot.lot().location_state.clone())
                .or_default() += 1;
        }

        debug!(
            "Ranked {} of {} lots ({} matched, {} duplicates collapsed)",
            summary.ranked, summary.total, summary.matched, summary.duplicates_removed
        );

        (ranked, summary)
    }
}
