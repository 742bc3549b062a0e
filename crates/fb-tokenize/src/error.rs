/// Tokenization errors.
///
/// Outside developer mode the tokenizer never fails: undecodable bytes are
/// transcoded or stripped and processing continues.
#[derive(Debug, thiserror::Error)]
pub enum TokenizeError {
    #[error("input is not valid UTF-8 (first bad byte at offset {offset})")]
    InvalidEncoding { offset: usize },
}

impl TokenizeError {
    pub fn is_retryable(&self) -> bool {
        false
    }
}
