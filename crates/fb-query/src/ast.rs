/// Indexed columns a query may filter on. Identifiers outside this set in
/// front of a `:` are ordinary terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Preamble,
    Signature,
    Body,
    Namespace,
    Ext,
    Path,
}

impl Column {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "preamble" => Some(Self::Preamble),
            "signature" => Some(Self::Signature),
            "body" => Some(Self::Body),
            "namespace" => Some(Self::Namespace),
            "ext" => Some(Self::Ext),
            "path" => Some(Self::Path),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Preamble => "preamble",
            Self::Signature => "signature",
            Self::Body => "body",
            Self::Namespace => "namespace",
            Self::Ext => "ext",
            Self::Path => "path",
        }
    }
}

/// A leaf atom: one term or phrase, with its modifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// Column restriction, if a valid column name preceded `:`.
    pub column: Option<Column>,
    /// `^` anchor to the start of the column.
    pub anchored: bool,
    /// Trailing `*` prefix match.
    pub prefix: bool,
    /// Leading `+` phrase-proximity unary.
    pub proximity: bool,
    /// Quoted phrase (interior tokenized as one unit, re-wrapped).
    pub phrase: bool,
    /// The raw leaf text, before tokenization.
    pub text: String,
    /// Byte offset of the leaf in the original query (for error reports).
    pub offset: usize,
}

impl Leaf {
    pub fn term(text: &str, offset: usize) -> Self {
        Self {
            column: None,
            anchored: false,
            prefix: false,
            proximity: false,
            phrase: false,
            text: text.to_string(),
            offset,
        }
    }
}

/// Parsed query tree. Operator shape survives rewriting unchanged; only
/// leaf contents are tokenized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryNode {
    /// `a OR b`
    Or(Box<QueryNode>, Box<QueryNode>),
    /// `a AND b` or adjacency; `explicit` records which spelling was used.
    And {
        left: Box<QueryNode>,
        right: Box<QueryNode>,
        explicit: bool,
    },
    /// `a NOT b`
    Not(Box<QueryNode>, Box<QueryNode>),
    /// `( ... )`
    Group(Box<QueryNode>),
    /// `NEAR(a b ..., k)`; `distance` is `None` when `, k` was omitted.
    Near {
        atoms: Vec<Leaf>,
        distance: Option<u32>,
    },
    Leaf(Leaf),
}

impl QueryNode {
    /// The operator tree with leaf contents erased, for shape comparisons.
    pub fn shape(&self) -> String {
        match self {
            Self::Or(a, b) => format!("or({},{})", a.shape(), b.shape()),
            Self::And { left, right, .. } => format!("and({},{})", left.shape(), right.shape()),
            Self::Not(a, b) => format!("not({},{})", a.shape(), b.shape()),
            Self::Group(inner) => format!("group({})", inner.shape()),
            Self::Near { atoms, .. } => format!("near[{}]", atoms.len()),
            Self::Leaf(_) => "leaf".to_string(),
        }
    }
}
