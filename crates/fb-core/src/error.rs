/// Errors from fb-core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("unknown entity kind tag: {tag}")]
    InvalidKindTag { tag: String },

    #[error("type conversion failed: {reason}")]
    ConversionFailed { reason: String },
}

impl CoreError {
    pub fn is_retryable(&self) -> bool {
        false
    }
}
