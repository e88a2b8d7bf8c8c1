use crate::config::ScoringConfig;
use crate::model::{Category, MatchResult, ScoreBreakdown, ScoredLot};

/// Everything the scorer needs, fixed for a whole run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    pub reference_year: i32,
    pub config: ScoringConfig,
}

impl ScoringPolicy {
    pub fn new(reference_year: i32, config: ScoringConfig) -> Self {
        Self {
            reference_year,
            config,
        }
    }
}

/// final = base * (1 - title penalty) * (1 - age penalty), clamped to [0, 1].
pub struct Scorer {
    policy: ScoringPolicy,
}

impl Scorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn score(&self, matched: MatchResult) -> ScoredLot {
        if matched.category == Category::NoMatch {
            return ScoredLot {
                matched,
                final_score: 0.0,
                breakdown: ScoreBreakdown {
                    base: 0.0,
                    title_penalty: 0.0,
                    age_penalty: 0.0,
                },
            };
        }

        let base = matched.base_score;
        let title_penalty = self
            .policy
            .config
            .title_penalties
            .for_status(matched.lot.title_status);
        let age_penalty = self.age_penalty(matched.lot.year);
        let final_score = (base * (1.0 - title_penalty) * (1.0 - age_penalty)).clamp(0.0, 1.0);

        ScoredLot {
            matched,
            final_score,
            breakdown: ScoreBreakdown {
                base,
                title_penalty,
                age_penalty,
            },
        }
    }

    /// Unknown years and future model years carry no age penalty.
    pub fn age_penalty(&self, year: Option<i32>) -> f64 {
        let Some(year) = year else {
            return 0.0;
        };
        let age = (self.policy.reference_year - year).max(0);
        (self.policy.config.age_penalty_per_year * f64::from(age)).min(self.policy.config.max_age_penalty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchSource, NormalizedLot, TitleStatus};
    use chrono::{TimeZone, Utc};

    fn scorer() -> Scorer {
        Scorer::new(ScoringPolicy::new(2025, ScoringConfig::default()))
    }

    fn matched(category: Category, base: f64, year: Option<i32>, title: TitleStatus) -> MatchResult {
        MatchResult {
            lot: NormalizedLot {
                source: "gsa".into(),
                source_lot_id: "A-1".into(),
                lot_url: None,
                sale_date_utc: Utc.with_ymd_and_hms(2025, 7, 1, 16, 0, 0).unwrap(),
                sale_local_time: None,
                tz_name: None,
                location_name: None,
                location_city: "Boston".into(),
                location_state: "MA".into(),
                raw_text: String::new(),
                condition_notes: None,
                vin: None,
                year,
                make: None,
                model: None,
                model_declared: false,
                trim: None,
                title_status: title,
                drivetrain: None,
                odometer: None,
            },
            category,
            base_score: base,
            matched_on: MatchSource::RawText,
            matched_text: None,
        }
    }

    #[test]
    fn land_cruiser_2015_clean() {
        let scored = scorer().score(matched(Category::LandCruiser, 1.0, Some(2015), TitleStatus::Clean));
        assert_eq!(scored.breakdown.base, 1.0);
        assert_eq!(scored.breakdown.title_penalty, 0.0);
        assert!((scored.breakdown.age_penalty - 0.10).abs() < 1e-9);
        assert!((scored.final_score - 0.90).abs() < 1e-9);
    }

    #[test]
    fn age_penalty_is_capped_and_never_negative() {
        let s = scorer();
        assert_eq!(s.age_penalty(None), 0.0);
        assert_eq!(s.age_penalty(Some(2026)), 0.0);
        assert_eq!(s.age_penalty(Some(1980)), 0.30);
        assert!((s.age_penalty(Some(2005)) - 0.20).abs() < 1e-9);
    }

    #[test]
    fn title_penalty_is_monotonic() {
        let s = scorer();
        let score = |t| s.score(matched(Category::Tacoma, 0.9, Some(2018), t)).final_score;
        let clean = score(TitleStatus::Clean);
        let rebuilt = score(TitleStatus::Rebuilt);
        let salvage = score(TitleStatus::Salvage);
        let parts = score(TitleStatus::PartsOnly);
        assert!(clean >= rebuilt && rebuilt >= salvage && salvage >= parts);
        assert!(parts > 0.0);
        assert_eq!(score(TitleStatus::Unknown), clean);
    }

    #[test]
    fn flood_penalty_is_configurable() {
        let mut config = ScoringConfig::default();
        config.title_penalties.flood = 0.5;
        let s = Scorer::new(ScoringPolicy::new(2025, config));
        let flood = s.score(matched(Category::FourRunner, 0.95, None, TitleStatus::Flood));
        assert!((flood.final_score - 0.475).abs() < 1e-9);
    }

    #[test]
    fn no_match_scores_zero() {
        let scored = scorer().score(matched(Category::NoMatch, 0.0, Some(2020), TitleStatus::Clean));
        assert_eq!(scored.final_score, 0.0);
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let s = scorer();
        for title in [
            TitleStatus::Unknown,
            TitleStatus::Clean,
            TitleStatus::Rebuilt,
            TitleStatus::Salvage,
            TitleStatus::Flood,
            TitleStatus::Totaled,
            TitleStatus::PartsOnly,
        ] {
            for year in [None, Some(1980), Some(2010), Some(2026)] {
                let f = s.score(matched(Category::LandCruiser, 1.0, year, title)).final_score;
                assert!((0.0..=1.0).contains(&f));
            }
        }
    }
}
