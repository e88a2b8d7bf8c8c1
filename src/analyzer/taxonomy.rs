use crate::config::{ConfigError, TaxonomyEntryConfig};
use crate::model::Category;
use regex::Regex;

/// One target category and the patterns that identify it.
#[derive(Debug, Clone)]
pub struct TaxonomyEntry {
    pub category: Category,
    pub base_score: f64,
    pub patterns: Vec<Regex>,
}

/// Immutable target table, kept in descending base-score order so the first
/// matching entry is always the most valuable one. Equal scores keep their
/// declaration order.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    entries: Vec<TaxonomyEntry>,
}

const BUILT_IN: &[(Category, f64, &[&str])] = &[
    (
        Category::LandCruiser,
        1.0,
        &[
            r"\bland[\s\-]*cruiser\b",
            r"\blx\s*-?\d{3}\b",
            r"\blc\s*-?\d{2,3}\b",
            r"\blexus\s+lx\b",
        ],
    ),
    (Category::FourRunner, 0.95, &[r"\b(?:4|four)[\s\-]*runner\b"]),
    (Category::Tacoma, 0.9, &[r"\btacoma\b", r"\btoyota\s+pickup\b"]),
    (Category::Tundra, 0.9, &[r"\btundra\b", r"\bt[\s\-]?100\b"]),
    (
        Category::Frontier,
        0.85,
        &[r"\bfrontier\b", r"\bhardbody\b", r"\bnavara\b", r"\bnissan\s+pickup\b"],
    ),
    (Category::Titan, 0.85, &[r"\btitan\b"]),
    (
        Category::RvCamper,
        0.6,
        &[
            r"\brv\b",
            r"\bcamper\b",
            r"\bmotor[\s\-]*home\b",
            r"\bclass\s*[abc]\b",
            r"\btravel\s*trailer\b",
            r"\bteardrop\b",
            r"\bfifth[\s\-]*wheel\b",
            r"\btoy\s*hauler\b",
            r"\bpop[\s\-]*up\b",
            r"\bconversion\s*van\b",
            r"\broadtrek\b",
            r"\btravato\b",
            r"\bcasita\b",
            r"\br[\s\-]?pod\b",
        ],
    ),
];

fn compile(category: Category, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(&format!("(?i){pattern}"))
        .map_err(|error| ConfigError::InvalidPattern { category, error })
}

impl Taxonomy {
    pub fn from_entries(mut entries: Vec<TaxonomyEntry>) -> Self {
        entries.retain(|e| e.category != Category::NoMatch);
        entries.sort_by(|a, b| b.base_score.total_cmp(&a.base_score));
        Self { entries }
    }

    pub fn from_config(configs: &[TaxonomyEntryConfig]) -> Result<Self, ConfigError> {
        let entries = configs
            .iter()
            .map(|cfg| {
                if !(0.0..=1.0).contains(&cfg.base_score) {
                    return Err(ConfigError::InvalidBaseScore(cfg.category));
                }
                let patterns = cfg
                    .patterns
                    .iter()
                    .map(|p| compile(cfg.category, p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TaxonomyEntry {
                    category: cfg.category,
                    base_score: cfg.base_score,
                    patterns,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self::from_entries(entries))
    }

    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }
}

impl Default for Taxonomy {
    fn default() -> Self {
        let entries = BUILT_IN
            .iter()
            .map(|(category, base_score, patterns)| TaxonomyEntry {
                category: *category,
                base_score: *base_score,
                patterns: patterns
                    .iter()
                    .map(|p| compile(*category, p).unwrap())
                    .collect(),
            })
            .collect();
        Self::from_entries(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_table_is_sorted_by_base_score() {
        let taxonomy = Taxonomy::default();
        let scores: Vec<f64> = taxonomy.entries().iter().map(|e| e.base_score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(taxonomy.entries()[0].category, Category::LandCruiser);
        assert!(taxonomy.entries().iter().all(|e| e.category != Category::NoMatch));
    }

    #[test]
    fn equal_scores_keep_declaration_order() {
        let taxonomy = Taxonomy::default();
        let order: Vec<Category> = taxonomy.entries().iter().map(|e| e.category).collect();
        let tacoma = order.iter().position(|c| *c == Category::Tacoma).unwrap();
        let tundra = order.iter().position(|c| *c == Category::Tundra).unwrap();
        assert!(tacoma < tundra);
    }

    #[test]
    fn config_entries_are_reordered_and_validated() {
        let configs = vec![
            TaxonomyEntryConfig {
                category: Category::RvCamper,
                base_score: 0.4,
                patterns: vec![r"\bcamper\b".into()],
            },
            TaxonomyEntryConfig {
                category: Category::Titan,
                base_score: 0.7,
                patterns: vec![r"\btitan\b".into()],
            },
        ];
        let taxonomy = Taxonomy::from_config(&configs).unwrap();
        assert_eq!(taxonomy.entries()[0].category, Category::Titan);

        let bad = vec![TaxonomyEntryConfig {
            category: Category::Tacoma,
            base_score: 0.9,
            patterns: vec!["(unclosed".into()],
        }];
        assert!(matches!(
            Taxonomy::from_config(&bad),
            Err(ConfigError::InvalidPattern { category: Category::Tacoma, .. })
        ));

        let out_of_range = vec![TaxonomyEntryConfig {
            category: Category::Tacoma,
            base_score: 1.5,
            patterns: vec![],
        }];
        assert!(matches!(
            Taxonomy::from_config(&out_of_range),
            Err(ConfigError::InvalidBaseScore(Category::Tacoma))
        ));
    }
}
