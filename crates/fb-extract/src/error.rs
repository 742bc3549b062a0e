/// Extractor errors. In production mode the indexer absorbs these per
/// file (the file then yields zero entities); developer mode re-raises.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("extraction failed for {path}: {reason}")]
    Failed { path: String, reason: String },
}

impl ExtractError {
    pub fn is_retryable(&self) -> bool {
        false
    }
}
