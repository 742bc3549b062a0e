/// Indexing errors.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("storage error: {0}")]
    Store(#[from] fb_store::StoreError),

    #[error("extraction error: {0}")]
    Extract(#[from] fb_extract::ExtractError),

    #[error("tokenization error: {0}")]
    Tokenize(#[from] fb_tokenize::TokenizeError),

    #[error("configuration error: {reason}")]
    Config { reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}
