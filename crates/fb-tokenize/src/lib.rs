mod detokenize;
mod encoding;
mod error;
mod tokenizer;

pub use detokenize::{detokenize, detokenize_marked};
pub use encoding::decode_text;
pub use error::TokenizeError;
pub use tokenizer::tokenize;
