// Reads lots that a site scraper has already dumped to disk as a JSON array.
use crate::model::{RawLot, SourceError};
use crate::scraper::traits::SourceFetcher;
use std::path::PathBuf;
use tracing::info;

pub struct JsonFileSource {
    name: String,
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Parses a JSON array of lots. Lots missing a `source` are attributed to
    /// this source.
    pub fn parse(&self, content: &str) -> Result<Vec<RawLot>, SourceError> {
        let mut lots: Vec<RawLot> =
            serde_json::from_str(content).map_err(|error| SourceError::Malformed {
                source_name: self.name.clone(),
                error,
            })?;
        for lot in lots.iter_mut().filter(|l| l.source.trim().is_empty()) {
            lot.source = self.name.clone();
        }
        Ok(lots)
    }
}

#[async_trait::async_trait]
impl SourceFetcher for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<RawLot>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|error| SourceError::Io {
                source_name: self.name.clone(),
                error,
            })?;
        let lots = self.parse(&content)?;
        info!("Loaded {} lots from {}", lots.len(), self.path.display());
        Ok(lots)
    }
}
