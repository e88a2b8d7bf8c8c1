use crate::model::{ExportError, ScoredLot};
use chrono::SecondsFormat;
use serde::Serialize;
use std::fs::File;
use std::io::Write;

/// One CSV line per ranked lot, flattened for spreadsheets.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    source: &'a str,
    source_lot_id: &'a str,
    lot_url: Option<&'a str>,
    sale_date_utc: String,
    sale_local_time: Option<&'a str>,
    location_city: &'a str,
    location_state: &'a str,
    vin: Option<&'a str>,
    year: Option<i32>,
    make: Option<&'a str>,
    model: Option<&'a str>,
    category: &'static str,
    title_status: &'static str,
    condition_notes: Option<&'a str>,
    score: String,
}

impl<'a> From<&'a ScoredLot> for ExportRow<'a> {
    fn from(scored: &'a ScoredLot) -> Self {
        let lot = scored.lot();
        Self {
            source: &lot.source,
            source_lot_id: &lot.source_lot_id,
            lot_url: lot.lot_url.as_deref(),
            sale_date_utc: lot.sale_date_utc.to_rfc3339_opts(SecondsFormat::Secs, true),
            sale_local_time: lot.sale_local_time.as_deref(),
            location_city: &lot.location_city,
            location_state: &lot.location_state,
            vin: lot.vin.as_deref(),
            year: lot.year,
            make: lot.make.as_deref(),
            model: lot.model.as_deref(),
            category: scored.category().as_str(),
            title_status: lot.title_status.as_str(),
            condition_notes: lot.condition_notes.as_deref(),
            score: format!("{:.3}", scored.final_score),
        }
    }
}

/// Writes `lots` in ranked order and returns the number of rows written.
pub fn write_csv<W: Write>(writer: W, lots: &[ScoredLot]) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for lot in lots {
        csv_writer.serialize(ExportRow::from(lot))?;
    }
    csv_writer.flush()?;
    Ok(lots.len())
}

pub fn export_csv(path: &str, lots: &[ScoredLot]) -> Result<usize, ExportError> {
    write_csv(File::create(path)?, lots)
}
