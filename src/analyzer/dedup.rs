use crate::model::ScoredLot;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Total preference order: higher score, then sooner sale, then source and
/// source lot id. `Less` means `a` is preferred.
pub fn rank_order(a: &ScoredLot, b: &ScoredLot) -> Ordering {
    b.final_score
        .total_cmp(&a.final_score)
        .then_with(|| a.lot().sale_date_utc.cmp(&b.lot().sale_date_utc))
        .then_with(|| a.lot().source.cmp(&b.lot().source))
        .then_with(|| a.lot().source_lot_id.cmp(&b.lot().source_lot_id))
}

/// Keeps the preferred lot per VIN. Lots without a VIN are never merged.
/// Survivors stay at the position of the first lot seen for their VIN.
pub fn dedupe(lots: Vec<ScoredLot>) -> Vec<ScoredLot> {
    let mut kept: Vec<ScoredLot> = Vec::with_capacity(lots.len());
    let mut by_vin: HashMap<String, usize> = HashMap::new();

    for lot in lots {
        let Some(vin) = lot.vin().map(str::to_string) else {
            kept.push(lot);
            continue;
        };

        match by_vin.get(&vin) {
            Some(&idx) => {
                if rank_order(&lot, &kept[idx]) == Ordering::Less {
                    kept[idx] = lot;
                }
            }
            None => {
                by_vin.insert(vin, kept.len());
                kept.push(lot);
            }
        }
    }

    kept
}

/// Number of lots a `dedupe` pass would drop.
pub fn duplicate_count(lots: &[ScoredLot]) -> usize {
    let mut vins: Vec<&str> = lots.iter().filter_map(ScoredLot::vin).collect();
    let total = vins.len();
    vins.sort_unstable();
    vins.dedup();
    total - vins.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, MatchResult, MatchSource, NormalizedLot, ScoreBreakdown, TitleStatus};
    use chrono::{DateTime, TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, d, 13, 0, 0).unwrap()
    }

    fn scored(id: &str, vin: Option<&str>, score: f64, sale: DateTime<Utc>) -> ScoredLot {
        ScoredLot {
            matched: MatchResult {
                lot: NormalizedLot {
                    source: "public_surplus".into(),
                    source_lot_id: id.into(),
                    lot_url: None,
                    sale_date_utc: sale,
                    sale_local_time: None,
                    tz_name: None,
                    location_name: None,
                    location_city: "Trenton".into(),
                    location_state: "NJ".into(),
                    raw_text: "Sprinter camper conversion".into(),
                    condition_notes: None,
                    vin: vin.map(Into::into),
                    year: None,
                    make: None,
                    model: None,
                    model_declared: false,
                    trim: None,
                    title_status: TitleStatus::Unknown,
                    drivetrain: None,
                    odometer: None,
                },
                category: Category::RvCamper,
                base_score: 0.6,
                matched_on: MatchSource::RawText,
                matched_text: Some("camper".into()),
            },
            final_score: score,
            breakdown: ScoreBreakdown {
                base: 0.6,
                title_penalty: 0.0,
                age_penalty: 0.0,
            },
        }
    }

    const VIN: &str = "1ABCD23EFGH456789";

    #[test]
    fn keeps_highest_score_per_vin() {
        let out = dedupe(vec![
            scored("a", Some(VIN), 0.55, day(1)),
            scored("b", Some(VIN), 0.72, day(2)),
        ]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].final_score, 0.72);
        assert_eq!(out[0].lot().source_lot_id, "b");
    }

    #[test]
    fn ties_prefer_sooner_sale_then_lot_id() {
        let out = dedupe(vec![
            scored("z", Some(VIN), 0.6, day(9)),
            scored("y", Some(VIN), 0.6, day(3)),
        ]);
        assert_eq!(out[0].lot().source_lot_id, "y");

        let out = dedupe(vec![
            scored("z", Some(VIN), 0.6, day(3)),
            scored("y", Some(VIN), 0.6, day(3)),
        ]);
        assert_eq!(out[0].lot().source_lot_id, "y");
    }

    #[test]
    fn lots_without_vin_are_never_merged() {
        let out = dedupe(vec![
            scored("a", None, 0.6, day(1)),
            scored("a", None, 0.6, day(1)),
            scored("c", Some(VIN), 0.6, day(1)),
        ]);
        assert_eq!(out.len(), 3);
        assert_eq!(duplicate_count(&out), 0);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let input = vec![
            scored("a", Some(VIN), 0.5, day(1)),
            scored("b", None, 0.9, day(2)),
            scored("c", Some("2T3ZF4DV0BW012345"), 0.4, day(3)),
            scored("d", Some(VIN), 0.8, day(4)),
            scored("e", Some("2T3ZF4DV0BW012345"), 0.4, day(2)),
        ];
        assert_eq!(duplicate_count(&input), 2);
        let once = dedupe(input);
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
        assert_eq!(duplicate_count(&once), 0);
    }

    #[test]
    fn empty_input() {
        assert!(dedupe(Vec::new()).is_empty());
    }
}
