//! Extractor contract and extension-based routing.

use fb_core::EntityRecord;

use crate::css::CssExtractor;
use crate::error::ExtractError;
use crate::javascript::JsExtractor;
use crate::markdown::MarkdownExtractor;
use crate::php::PhpExtractor;
use crate::python::PythonExtractor;
use crate::script::ScriptExtractor;

/// The contract every extractor satisfies: given a filename and its
/// content, return an ordered list of entity records. A readable file
/// always yields at least its file-level record.
pub trait Extractor {
    /// Extensions this extractor claims (lowercase, no dot).
    fn extensions(&self) -> &'static [&'static str];

    /// Tie-break when several extractors claim an extension; higher wins.
    fn priority(&self) -> u8 {
        0
    }

    fn extract(&self, filename: &str, content: &str) -> Result<Vec<EntityRecord>, ExtractError>;
}

/// Routes files to extractors by extension.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn Extractor>>,
    script: ScriptExtractor,
}

impl ExtractorRegistry {
    /// Registry with the built-in extractor set.
    pub fn with_defaults() -> Self {
        Self {
            extractors: vec![
                Box::new(PhpExtractor),
                Box::new(PythonExtractor),
                Box::new(JsExtractor),
                Box::new(CssExtractor),
                Box::new(MarkdownExtractor),
            ],
            script: ScriptExtractor,
        }
    }

    /// The extractor claiming `ext` with the highest priority, if any.
    pub fn for_extension(&self, ext: &str) -> Option<&dyn Extractor> {
        self.extractors
            .iter()
            .filter(|e| e.extensions().contains(&ext))
            .max_by_key(|e| e.priority())
            .map(|e| e.as_ref())
    }

    /// Whether any extractor claims `ext`.
    pub fn supports(&self, ext: &str) -> bool {
        self.for_extension(ext).is_some()
    }

    /// The shebang-script extractor, used for extension-less executables.
    pub fn script(&self) -> &ScriptExtractor {
        &self.script
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_by_extension() {
        let registry = ExtractorRegistry::with_defaults();
        for ext in ["php", "phtml", "py", "js", "jsx", "ts", "tsx", "mjs", "cjs", "css", "scss", "sass", "less", "md", "markdown"] {
            assert!(registry.supports(ext), "missing extractor for .{ext}");
        }
        assert!(!registry.supports("txt"));
        assert!(!registry.supports("html"));
    }

    #[test]
    fn higher_priority_wins_on_tie() {
        struct Low;
        impl Extractor for Low {
            fn extensions(&self) -> &'static [&'static str] {
                &["zz"]
            }
            fn extract(
                &self,
                _filename: &str,
                _content: &str,
            ) -> Result<Vec<EntityRecord>, ExtractError> {
                Ok(Vec::new())
            }
        }
        struct High;
        impl Extractor for High {
            fn extensions(&self) -> &'static [&'static str] {
                &["zz"]
            }
            fn priority(&self) -> u8 {
                9
            }
            fn extract(
                &self,
                _filename: &str,
                _content: &str,
            ) -> Result<Vec<EntityRecord>, ExtractError> {
                Ok(Vec::new())
            }
        }

        let mut registry = ExtractorRegistry::with_defaults();
        registry.extractors.push(Box::new(Low));
        registry.extractors.push(Box::new(High));
        let chosen = registry.for_extension("zz").unwrap();
        assert_eq!(chosen.priority(), 9);
    }
}
