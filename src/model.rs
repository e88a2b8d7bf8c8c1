// Core structs: RawLot, NormalizedLot, MatchResult, ScoredLot
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Scrapers hand over years and odometers either as numbers or as loose text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(i64),
    Text(String),
}

/// A single auction listing exactly as a source scraper produced it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawLot {
    pub source: String,
    pub source_lot_id: String,
    pub sale_date_utc: DateTime<Utc>,
    pub location_city: String,
    pub location_state: String,
    pub raw_text: String,
    #[serde(default)]
    pub lot_url: Option<String>,
    #[serde(default)]
    pub sale_local_time: Option<String>,
    #[serde(default)]
    pub tz_name: Option<String>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub year: Option<NumberOrText>,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub trim: Option<String>,
    #[serde(default)]
    pub title_status: Option<String>,
    #[serde(default)]
    pub drivetrain: Option<String>,
    #[serde(default)]
    pub odometer: Option<NumberOrText>,
    #[serde(default)]
    pub condition_notes: Option<String>,
}

/// Legal title classification, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleStatus {
    Unknown,
    Clean,
    Rebuilt,
    Salvage,
    Flood,
    Totaled,
    PartsOnly,
}

impl TitleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleStatus::Unknown => "unknown",
            TitleStatus::Clean => "clean",
            TitleStatus::Rebuilt => "rebuilt",
            TitleStatus::Salvage => "salvage",
            TitleStatus::Flood => "flood",
            TitleStatus::Totaled => "totaled",
            TitleStatus::PartsOnly => "parts_only",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "unknown" => Some(TitleStatus::Unknown),
            "clean" => Some(TitleStatus::Clean),
            "rebuilt" => Some(TitleStatus::Rebuilt),
            "salvage" => Some(TitleStatus::Salvage),
            "flood" => Some(TitleStatus::Flood),
            "totaled" => Some(TitleStatus::Totaled),
            "parts_only" => Some(TitleStatus::PartsOnly),
            _ => None,
        }
    }
}

impl fmt::Display for TitleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target-vehicle categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    LandCruiser,
    FourRunner,
    Tacoma,
    Tundra,
    Frontier,
    Titan,
    RvCamper,
    NoMatch,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::LandCruiser => "land_cruiser",
            Category::FourRunner => "four_runner",
            Category::Tacoma => "tacoma",
            Category::Tundra => "tundra",
            Category::Frontier => "frontier",
            Category::Titan => "titan",
            Category::RvCamper => "rv_camper",
            Category::NoMatch => "no_match",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "land_cruiser" => Some(Category::LandCruiser),
            "four_runner" => Some(Category::FourRunner),
            "tacoma" => Some(Category::Tacoma),
            "tundra" => Some(Category::Tundra),
            "frontier" => Some(Category::Frontier),
            "titan" => Some(Category::Titan),
            "rv_camper" => Some(Category::RvCamper),
            "no_match" => Some(Category::NoMatch),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::LandCruiser => "Land Cruiser / LX",
            Category::FourRunner => "4Runner",
            Category::Tacoma => "Tacoma",
            Category::Tundra => "Tundra",
            Category::Frontier => "Frontier",
            Category::Titan => "Titan",
            Category::RvCamper => "RV / Camper",
            Category::NoMatch => "No match",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lot after field extraction. Unresolved fields stay `None` / `Unknown`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLot {
    pub source: String,
    pub source_lot_id: String,
    pub lot_url: Option<String>,
    pub sale_date_utc: DateTime<Utc>,
    pub sale_local_time: Option<String>,
    pub tz_name: Option<String>,
    pub location_name: Option<String>,
    pub location_city: String,
    pub location_state: String,
    pub raw_text: String,
    pub condition_notes: Option<String>,
    pub vin: Option<String>,
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
    /// The model came from the scraper's own field rather than raw text.
    pub model_declared: bool,
    pub trim: Option<String>,
    pub title_status: TitleStatus,
    pub drivetrain: Option<String>,
    pub odometer: Option<u32>,
}

/// Where the winning taxonomy pattern was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    MakeModel,
    RawText,
    Unmatched,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub lot: NormalizedLot,
    pub category: Category,
    pub base_score: f64,
    pub matched_on: MatchSource,
    pub matched_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub title_penalty: f64,
    pub age_penalty: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredLot {
    pub matched: MatchResult,
    pub final_score: f64,
    pub breakdown: ScoreBreakdown,
}

impl ScoredLot {
    pub fn lot(&self) -> &NormalizedLot {
        &self.matched.lot
    }

    pub fn category(&self) -> Category {
        self.matched.category
    }

    pub fn vin(&self) -> Option<&str> {
        self.matched.lot.vin.as_deref()
    }
}

/// Ordered, VIN-unique output of a ranking run.
pub type RankedSet = Vec<ScoredLot>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read source {source_name}: {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },
    #[error("malformed lots in source {source_name}: {error}")]
    Malformed {
        source_name: String,
        #[source]
        error: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("api error: {0}")]
    ApiError(String),
    #[error("notification endpoint unreachable")]
    Unreachable,
}
