// Analyzer module: the matching, scoring and ranking stages of the pipeline.

pub mod dedup;
pub mod matcher;
pub mod ranker;
pub mod scoring;
pub mod taxonomy;

// Re-export the pipeline entry point for ease of use.
pub use ranker::Ranker;
