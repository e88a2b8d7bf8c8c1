use crate::model::{Category, ScoredLot, StorageError, TitleStatus};
use crate::utils::parse_datetime;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use std::collections::BTreeMap;

/// A ranked lot as read back from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLot {
    pub source: String,
    pub source_lot_id: String,
    pub lot_url: Option<String>,
    pub sale_date_utc: DateTime<Utc>,
    pub location_city: String,
    pub location_state: String,
    pub vin: Option<String>,
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub title_status: TitleStatus,
    pub category: Category,
    pub final_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageStats {
    pub total_lots: usize,
    pub by_source: BTreeMap<String, usize>,
}

pub struct SqliteStorage {
    conn: Connection,
}

const LOT_COLUMNS: &str = "source, source_lot_id, lot_url, sale_date_utc, location_city, location_state,
     vin, year, make, model, title_status, category, final_score";

fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl SqliteStorage {
    /// Opens the database file and creates the schema if needed.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open(db_path)?)
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS lots (
                source TEXT NOT NULL,
                source_lot_id TEXT NOT NULL,
                lot_url TEXT,
                sale_date_utc TEXT NOT NULL,
                location_city TEXT NOT NULL,
                location_state TEXT NOT NULL,
                vin TEXT,
                year INTEGER,
                make TEXT,
                model TEXT,
                title_status TEXT NOT NULL DEFAULT 'unknown',
                category TEXT NOT NULL,
                base_score REAL NOT NULL,
                title_penalty REAL NOT NULL,
                age_penalty REAL NOT NULL,
                final_score REAL NOT NULL,
                ranked_at TEXT NOT NULL,
                PRIMARY KEY (source, source_lot_id)
            );

            CREATE INDEX IF NOT EXISTS idx_lots_vin ON lots(vin);
            CREATE INDEX IF NOT EXISTS idx_lots_sale_date ON lots(sale_date_utc);
            ",
        )?;
        Ok(Self { conn })
    }

    /// Upserts a ranked set in one transaction, keyed by (source, source_lot_id).
    pub fn save_ranked(&self, lots: &[ScoredLot], ranked_at: DateTime<Utc>) -> Result<usize, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO lots (
                    source, source_lot_id, lot_url, sale_date_utc, location_city, location_state,
                    vin, year, make, model, title_status, category,
                    base_score, title_penalty, age_penalty, final_score, ranked_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            )?;
            for scored in lots {
                let lot = scored.lot();
                stmt.execute(params![
                    &lot.source,
                    &lot.source_lot_id,
                    &lot.lot_url,
                    timestamp(&lot.sale_date_utc),
                    &lot.location_city,
                    &lot.location_state,
                    &lot.vin,
                    &lot.year,
                    &lot.make,
                    &lot.model,
                    lot.title_status.as_str(),
                    scored.category().as_str(),
                    scored.breakdown.base,
                    scored.breakdown.title_penalty,
                    scored.breakdown.age_penalty,
                    scored.final_score,
                    timestamp(&ranked_at),
                ])?;
            }
        }
        tx.commit()?;
        Ok(lots.len())
    }

    /// Best-scoring stored lots, ties broken by sooner sale.
    pub fn top_lots(&self, limit: usize) -> Result<Vec<StoredLot>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOT_COLUMNS} FROM lots
             ORDER BY final_score DESC, sale_date_utc ASC, source ASC, source_lot_id ASC
             LIMIT ?1"
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], Self::map_lot)?;
        let mut lots = Vec::new();
        for lot in rows {
            lots.push(lot?);
        }
        Ok(lots)
    }

    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT source, COUNT(*) FROM lots GROUP BY source ORDER BY source")?;
        let rows = stmt.query_map([], |row| {
            let source: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            let count = usize::try_from(count)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Integer, Box::new(e)))?;
            Ok((source, count))
        })?;

        let mut stats = StorageStats::default();
        for row in rows {
            let (source, count) = row?;
            stats.total_lots += count;
            stats.by_source.insert(source, count);
        }
        Ok(stats)
    }

    /// Removes lots whose sale already happened before `cutoff`.
    pub fn delete_sold_before(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError> {
        let deleted = self.conn.execute(
            "DELETE FROM lots WHERE sale_date_utc < ?1",
            params![timestamp(&cutoff)],
        )?;
        Ok(deleted)
    }

    fn map_lot(row: &Row) -> Result<StoredLot, rusqlite::Error> {
        let invalid = |idx: usize, what: &str| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, format!("invalid {what}").into())
        };

        let sale_date: String = row.get(3)?;
        let title: String = row.get(10)?;
        let category: String = row.get(11)?;

        Ok(StoredLot {
            source: row.get(0)?,
            source_lot_id: row.get(1)?,
            lot_url: row.get(2)?,
            sale_date_utc: parse_datetime(&sale_date).ok_or_else(|| invalid(3, "timestamp"))?,
            location_city: row.get(4)?,
            location_state: row.get(5)?,
            vin: row.get(6)?,
            year: row.get(7)?,
            make: row.get(8)?,
            model: row.get(9)?,
            title_status: TitleStatus::from_str_opt(&title).ok_or_else(|| invalid(10, "title status"))?,
            category: Category::from_str_opt(&category).ok_or_else(|| invalid(11, "category"))?,
            final_score: row.get(12)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchResult, MatchSource, NormalizedLot, ScoreBreakdown};
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, day, 15, 0, 0).unwrap()
    }

    fn scored(source: &str, id: &str, score: f64, sale: DateTime<Utc>) -> ScoredLot {
        ScoredLot {
            matched: MatchResult {
                lot: NormalizedLot {
                    source: source.into(),
                    source_lot_id: id.into(),
                    lot_url: Some(format!("https://example.org/lots/{id}")),
                    sale_date_utc: sale,
                    sale_local_time: None,
                    tz_name: Some("America/New_York".into()),
                    location_name: None,
                    location_city: "Albany".into(),
                    location_state: "NY".into(),
                    raw_text: "2016 Toyota 4Runner".into(),
                    condition_notes: None,
                    vin: Some("JTEBU5JR0F5234567".into()),
                    year: Some(2016),
                    make: Some("Toyota".into()),
                    model: Some("4Runner".into()),
                    model_declared: true,
                    trim: None,
                    title_status: TitleStatus::Rebuilt,
                    drivetrain: None,
                    odometer: None,
                },
                category: Category::FourRunner,
                base_score: 0.95,
                matched_on: MatchSource::MakeModel,
                matched_text: Some("4Runner".into()),
            },
            final_score: score,
            breakdown: ScoreBreakdown {
                base: 0.95,
                title_penalty: 0.05,
                age_penalty: 0.09,
            },
        }
    }

    #[test]
    fn saves_and_reads_back_in_rank_order() {
        let storage = SqliteStorage::in_memory().unwrap();
        let saved = storage
            .save_ranked(
                &[
                    scored("ny_state_surplus", "1", 0.5, at(4)),
                    scored("ny_abetter_bid", "2", 0.8, at(6)),
                    scored("ny_state_surplus", "3", 0.8, at(2)),
                ],
                at(1),
            )
            .unwrap();
        assert_eq!(saved, 3);

        assert_eq!(storage.top_lots(usize::MAX).unwrap().len(), 3);
        let top = storage.top_lots(2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].source_lot_id, "3");
        assert_eq!(top[1].source_lot_id, "2");
        assert_eq!(top[0].category, Category::FourRunner);
        assert_eq!(top[0].title_status, TitleStatus::Rebuilt);
        assert_eq!(top[0].sale_date_utc, at(2));
        assert_eq!(top[0].year, Some(2016));
    }

    #[test]
    fn upsert_replaces_existing_lot() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage.save_ranked(&[scored("gsa", "7", 0.4, at(3))], at(1)).unwrap();
        storage.save_ranked(&[scored("gsa", "7", 0.7, at(3))], at(2)).unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_lots, 1);
        assert_eq!(storage.top_lots(10).unwrap()[0].final_score, 0.7);
    }

    #[test]
    fn stats_and_cleanup() {
        let storage = SqliteStorage::in_memory().unwrap();
        storage
            .save_ranked(
                &[
                    scored("gsa", "1", 0.4, at(3)),
                    scored("gsa", "2", 0.4, at(9)),
                    scored("govdeals", "3", 0.4, at(12)),
                ],
                at(1),
            )
            .unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_lots, 3);
        assert_eq!(stats.by_source.get("gsa"), Some(&2));

        assert_eq!(storage.delete_sold_before(at(10)).unwrap(), 2);
        assert_eq!(storage.stats().unwrap().total_lots, 1);
    }
}
