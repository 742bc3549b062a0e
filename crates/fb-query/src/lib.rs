mod ast;
mod error;
mod parser;
mod rewrite;

pub use ast::{Column, Leaf, QueryNode};
pub use error::QueryParseError;
pub use parser::parse;
pub use rewrite::rewrite;

/// Parse a user query and rewrite it into an FTS MATCH expression in one
/// step. This is the path every search command takes.
pub fn rewrite_query(input: &str) -> Result<String, QueryParseError> {
    let node = parse(input)?;
    rewrite(&node)
}
