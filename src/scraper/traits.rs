use crate::model::{RawLot, SourceError};

/// Anything that can hand over a batch of raw lots. The ranking pipeline never
/// looks at which implementation produced them.
#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Vec<RawLot>, SourceError>;
}
