use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Kinds of entities an extractor may emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    File,
    Namespace,
    Class,
    Interface,
    Trait,
    Enum,
    Function,
    Method,
    ArrowFunction,
    Script,
    CssRule,
    CssMediaQuery,
    CssKeyframes,
    CssAtRule,
    MdHeading1,
    Module,
}

impl EntityKind {
    /// Stable textual tag, used as the `type` column in the store.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Namespace => "namespace",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Trait => "trait",
            Self::Enum => "enum",
            Self::Function => "function",
            Self::Method => "method",
            Self::ArrowFunction => "arrow-function",
            Self::Script => "script",
            Self::CssRule => "css-rule",
            Self::CssMediaQuery => "css-media-query",
            Self::CssKeyframes => "css-keyframes",
            Self::CssAtRule => "css-at-rule",
            Self::MdHeading1 => "md-heading-1",
            Self::Module => "module",
        }
    }

    /// Parse the textual tag back into a kind.
    pub fn from_str_tag(tag: &str) -> Result<Self, CoreError> {
        match tag {
            "file" => Ok(Self::File),
            "namespace" => Ok(Self::Namespace),
            "class" => Ok(Self::Class),
            "interface" => Ok(Self::Interface),
            "trait" => Ok(Self::Trait),
            "enum" => Ok(Self::Enum),
            "function" => Ok(Self::Function),
            "method" => Ok(Self::Method),
            "arrow-function" => Ok(Self::ArrowFunction),
            "script" => Ok(Self::Script),
            "css-rule" => Ok(Self::CssRule),
            "css-media-query" => Ok(Self::CssMediaQuery),
            "css-keyframes" => Ok(Self::CssKeyframes),
            "css-at-rule" => Ok(Self::CssAtRule),
            "md-heading-1" => Ok(Self::MdHeading1),
            "module" => Ok(Self::Module),
            _ => Err(CoreError::InvalidKindTag {
                tag: tag.to_string(),
            }),
        }
    }

    /// All kinds, in declaration order.
    pub const ALL: [EntityKind; 16] = [
        Self::File,
        Self::Namespace,
        Self::Class,
        Self::Interface,
        Self::Trait,
        Self::Enum,
        Self::Function,
        Self::Method,
        Self::ArrowFunction,
        Self::Script,
        Self::CssRule,
        Self::CssMediaQuery,
        Self::CssKeyframes,
        Self::CssAtRule,
        Self::MdHeading1,
        Self::Module,
    ];
}

/// One extracted entity, the contract every extractor must satisfy.
///
/// Invariants: `line_start <= line_end` (1-indexed, inclusive); a readable
/// file always yields at least the file-level record; child records nest
/// inside their parent's line range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub kind: EntityKind,
    /// Identifier as written in source ("" for the file record).
    pub name: String,
    /// Dotted or slashed enclosing path, possibly empty.
    pub namespace: String,
    /// Enclosing type name; set only for methods.
    pub enclosing: String,
    /// Declaration text, whitespace-collapsed.
    pub signature_raw: String,
    /// Leading comments, docstrings, decorators, attributes.
    pub preamble_raw: String,
    /// Implementation text. May be truncated for storage; truncation never
    /// changes `line_end`.
    pub body_raw: String,
    pub line_start: u32,
    pub line_end: u32,
    /// Free-form language tag ("php", "python", "bash", ...).
    pub language: String,
    /// Free-form visibility tag, when the language expresses one.
    pub visibility: Option<String>,
}

impl EntityRecord {
    /// The file-level record every extractor emits first.
    pub fn file(name: &str, body: &str, line_count: u32, language: &str) -> Self {
        Self {
            kind: EntityKind::File,
            name: name.to_string(),
            namespace: String::new(),
            enclosing: String::new(),
            signature_raw: name.to_string(),
            preamble_raw: String::new(),
            body_raw: body.to_string(),
            line_start: 1,
            line_end: line_count.max(1),
            language: language.to_string(),
            visibility: None,
        }
    }
}
