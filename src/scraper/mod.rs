pub mod json_source;
pub mod traits;

pub use json_source::JsonFileSource;
pub use traits::SourceFetcher;
