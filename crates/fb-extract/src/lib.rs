mod common;
mod css;
mod error;
mod javascript;
mod markdown;
mod php;
mod python;
mod registry;
mod script;

pub use common::is_binary;
pub use css::CssExtractor;
pub use error::ExtractError;
pub use javascript::JsExtractor;
pub use markdown::MarkdownExtractor;
pub use php::PhpExtractor;
pub use python::PythonExtractor;
pub use registry::{Extractor, ExtractorRegistry};
pub use script::ScriptExtractor;
