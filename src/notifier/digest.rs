// Plain-text digest of a ranked set, ready to hand to any sender.
use crate::model::{Category, ScoredLot};
use chrono::{DateTime, Duration, Utc};

const WATCHED: [Category; 7] = [
    Category::LandCruiser,
    Category::FourRunner,
    Category::Tacoma,
    Category::Tundra,
    Category::Frontier,
    Category::Titan,
    Category::RvCamper,
];

/// Formats the best `top_n` lots selling within `days_ahead` of `now`.
/// `lots` is expected in rank order.
pub fn format_digest(lots: &[ScoredLot], top_n: usize, days_ahead: i64, now: DateTime<Utc>) -> String {
    let horizon = now + Duration::days(days_ahead);
    let upcoming: Vec<&ScoredLot> = lots
        .iter()
        .filter(|l| l.lot().sale_date_utc >= now && l.lot().sale_date_utc <= horizon)
        .collect();

    if upcoming.is_empty() {
        let watched: Vec<String> = WATCHED.iter().map(|c| format!("• {}", c.label())).collect();
        return format!(
            "🔎 Auction Radar: no target vehicles in the next {days_ahead} days.\n\nWatching for:\n{}",
            watched.join("\n")
        );
    }

    let plural = if upcoming.len() == 1 { "" } else { "s" };
    let mut out = format!(
        "🎯 Auction Radar: {} target vehicle{plural} in the next {days_ahead} days\n",
        upcoming.len()
    );

    for (i, scored) in upcoming.iter().take(top_n).enumerate() {
        out.push('\n');
        out.push_str(&format_entry(i + 1, scored));
    }

    if upcoming.len() > top_n {
        out.push_str(&format!("\n…and {} more", upcoming.len() - top_n));
    }

    out
}

fn format_entry(position: usize, scored: &ScoredLot) -> String {
    let lot = scored.lot();
    let year = lot
        .year
        .map_or_else(|| "Unknown year".to_string(), |y| y.to_string());
    let vehicle = [lot.make.as_deref(), lot.model.as_deref(), lot.trim.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    let mut entry = format!(
        "{position}. {year} {vehicle} ({})\n   Score: {:.2} | Title: {}\n   Sale: {} | {}, {}\n",
        scored.category().label(),
        scored.final_score,
        lot.title_status,
        lot.sale_date_utc.format("%Y-%m-%d %H:%M UTC"),
        lot.location_city,
        lot.location_state,
    );
    if let Some(vin) = &lot.vin {
        entry.push_str(&format!("   VIN: {vin}\n"));
    }
    if let Some(url) = &lot.lot_url {
        entry.push_str(&format!("   🔗 {url}\n"));
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchResult, MatchSource, NormalizedLot, ScoreBreakdown, TitleStatus};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn scored(id: &str, year: Option<i32>, score: f64, days_out: i64) -> ScoredLot {
        ScoredLot {
            matched: MatchResult {
                lot: NormalizedLot {
                    source: "vt_state_surplus".into(),
                    source_lot_id: id.into(),
                    lot_url: Some(format!("https://surplus.example/lot/{id}")),
                    sale_date_utc: now() + Duration::days(days_out),
                    sale_local_time: None,
                    tz_name: None,
                    location_name: None,
                    location_city: "Montpelier".into(),
                    location_state: "VT".into(),
                    raw_text: String::new(),
                    condition_notes: None,
                    vin: Some("JTEBU5JR0F5234567".into()),
                    year,
                    make: Some("Toyota".into()),
                    model: Some("Tundra".into()),
                    model_declared: true,
                    trim: None,
                    title_status: TitleStatus::Salvage,
                    drivetrain: None,
                    odometer: None,
                },
                category: Category::Tundra,
                base_score: 0.9,
                matched_on: MatchSource::MakeModel,
                matched_text: Some("Tundra".into()),
            },
            final_score: score,
            breakdown: ScoreBreakdown {
                base: 0.9,
                title_penalty: 0.2,
                age_penalty: 0.0,
            },
        }
    }

    #[test]
    fn empty_digest_lists_watched_categories() {
        let text = format_digest(&[], 10, 14, now());
        assert!(text.contains("no target vehicles in the next 14 days"));
        assert!(text.contains("• Land Cruiser / LX"));
        assert!(text.contains("• RV / Camper"));
    }

    #[test]
    fn digest_lists_top_lots_in_order() {
        let lots = vec![
            scored("1", Some(2012), 0.72, 2),
            scored("2", None, 0.55, 5),
            scored("3", Some(2010), 0.50, 6),
        ];
        let text = format_digest(&lots, 2, 14, now());

        assert!(text.starts_with("🎯 Auction Radar: 3 target vehicles in the next 14 days"));
        assert!(text.contains("1. 2012 Toyota Tundra (Tundra)"));
        assert!(text.contains("Score: 0.72 | Title: salvage"));
        assert!(text.contains("2. Unknown year Toyota Tundra"));
        assert!(text.contains("Montpelier, VT"));
        assert!(text.contains("🔗 https://surplus.example/lot/1"));
        assert!(!text.contains("3. 2010"));
        assert!(text.ends_with("…and 1 more"));
    }

    #[test]
    fn digest_skips_lots_outside_window() {
        let lots = vec![scored("late", Some(2015), 0.8, 30), scored("past", Some(2015), 0.8, -1)];
        let text = format_digest(&lots, 10, 14, now());
        assert!(text.contains("no target vehicles"));

        let single = format_digest(&[scored("1", Some(2015), 0.8, 1)], 10, 14, now());
        assert!(single.contains("1 target vehicle in"));
    }
}
