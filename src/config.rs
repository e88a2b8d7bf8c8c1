use crate::model::{Category, TitleStatus};
use serde::Deserialize;
use std::fs;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid pattern for {category}: {error}")]
    InvalidPattern {
        category: Category,
        #[source]
        error: regex::Error,
    },
    #[error("base score for {0} must lie in [0, 1]")]
    InvalidBaseScore(Category),
    #[error("scoring.{name} must lie in [0, 1], got {value}")]
    InvalidPenalty { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub min_year: i32,
    pub validate_vin_check_digit: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_year: 1980,
            validate_vin_check_digit: false,
        }
    }
}

/// Penalty fractions applied per title status.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TitlePenalties {
    pub clean: f64,
    pub rebuilt: f64,
    pub salvage: f64,
    pub flood: f64,
    pub totaled: f64,
    pub parts_only: f64,
    pub unknown: f64,
}

impl Default for TitlePenalties {
    fn default() -> Self {
        Self {
            clean: 0.0,
            rebuilt: 0.05,
            salvage: 0.20,
            flood: 0.20,
            totaled: 0.20,
            parts_only: 0.60,
            // No evidence, no penalty.
            unknown: 0.0,
        }
    }
}

impl TitlePenalties {
    pub fn for_status(&self, status: TitleStatus) -> f64 {
        match status {
            TitleStatus::Clean => self.clean,
            TitleStatus::Rebuilt => self.rebuilt,
            TitleStatus::Salvage => self.salvage,
            TitleStatus::Flood => self.flood,
            TitleStatus::Totaled => self.totaled,
            TitleStatus::PartsOnly => self.parts_only,
            TitleStatus::Unknown => self.unknown,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    pub title_penalties: TitlePenalties,
    pub age_penalty_per_year: f64,
    pub max_age_penalty: f64,
}

impl ScoringConfig {
    /// Every penalty is a fraction; anything outside [0, 1] (or NaN) is rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.title_penalties;
        let values = [
            ("title_penalties.clean", p.clean),
            ("title_penalties.rebuilt", p.rebuilt),
            ("title_penalties.salvage", p.salvage),
            ("title_penalties.flood", p.flood),
            ("title_penalties.totaled", p.totaled),
            ("title_penalties.parts_only", p.parts_only),
            ("title_penalties.unknown", p.unknown),
            ("age_penalty_per_year", self.age_penalty_per_year),
            ("max_age_penalty", self.max_age_penalty),
        ];
        match values.into_iter().find(|(_, v)| !(0.0..=1.0).contains(v)) {
            Some((name, value)) => Err(ConfigError::InvalidPenalty { name, value }),
            None => Ok(()),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            title_penalties: TitlePenalties::default(),
            age_penalty_per_year: 0.01,
            max_age_penalty: 0.30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyEntryConfig {
    pub category: Category,
    pub base_score: f64,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_days_ahead")]
    pub days_ahead: i64,
}

fn default_top_n() -> usize {
    10
}

fn default_days_ahead() -> i64 {
    14
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: String,
    pub sources: Vec<SourceConfig>,
    pub since_days: i64,
    pub target_states: Vec<String>,
    pub reference_year: Option<i32>,
    pub normalizer: NormalizerConfig,
    pub scoring: ScoringConfig,
    pub taxonomy: Option<Vec<TaxonomyEntryConfig>>,
    pub telegram: Option<TelegramConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "auction_radar.sqlite".to_string(),
            sources: Vec::new(),
            since_days: 30,
            target_states: Vec::new(),
            reference_year: None,
            normalizer: NormalizerConfig::default(),
            scoring: ScoringConfig::default(),
            taxonomy: None,
            telegram: None,
        }
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let cfg: AppConfig = serde_json::from_str(content)?;
    cfg.scoring.validate()?;
    Ok(cfg)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
