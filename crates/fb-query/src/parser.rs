//! Recursive-descent parser for the user query language.
//!
//! Precedence, tightest first: NOT, AND (explicit or adjacency), OR —
//! matching the FTS engine the output is fed to. Keywords are recognized
//! only in uppercase; anything else is a term.

use crate::ast::{Column, Leaf, QueryNode};
use crate::error::QueryParseError;

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    LParen(usize),
    RParen(usize),
    Comma(usize),
    Word { text: String, offset: usize },
    Phrase { text: String, offset: usize },
}

impl Tok {
    fn offset(&self) -> usize {
        match self {
            Tok::LParen(o) | Tok::RParen(o) | Tok::Comma(o) => *o,
            Tok::Word { offset, .. } | Tok::Phrase { offset, .. } => *offset,
        }
    }
}

fn lex(input: &str) -> Result<Vec<Tok>, QueryParseError> {
    let mut toks = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let ch = input[i..].chars().next().unwrap_or(' ');
        if ch.is_whitespace() {
            i += ch.len_utf8();
        } else if ch == '(' {
            toks.push(Tok::LParen(i));
            i += 1;
        } else if ch == ')' {
            toks.push(Tok::RParen(i));
            i += 1;
        } else if ch == ',' {
            toks.push(Tok::Comma(i));
            i += 1;
        } else if ch == '"' {
            let start = i;
            let rest = &input[i + 1..];
            match rest.find('"') {
                Some(end) => {
                    toks.push(Tok::Phrase {
                        text: rest[..end].to_string(),
                        offset: start,
                    });
                    i += end + 2;
                }
                None => {
                    return Err(QueryParseError {
                        offset: start,
                        expected: "closing '\"'",
                    })
                }
            }
        } else {
            let start = i;
            while i < bytes.len() {
                let ch = input[i..].chars().next().unwrap_or(' ');
                if ch.is_whitespace() || matches!(ch, '(' | ')' | ',' | '"') {
                    break;
                }
                i += ch.len_utf8();
            }
            toks.push(Tok::Word {
                text: input[start..i].to_string(),
                offset: start,
            });
        }
    }
    Ok(toks)
}

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
    eof: usize,
}

/// Parse a user query string into its operator tree.
pub fn parse(input: &str) -> Result<QueryNode, QueryParseError> {
    let toks = lex(input)?;
    let mut parser = Parser {
        toks,
        pos: 0,
        eof: input.len(),
    };
    if parser.peek().is_none() {
        return Err(QueryParseError {
            offset: 0,
            expected: "term",
        });
    }
    let node = parser.parse_or()?;
    if let Some(tok) = parser.peek() {
        return Err(QueryParseError {
            offset: tok.offset(),
            expected: "end of query",
        });
    }
    Ok(node)
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn peek_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Some(Tok::Word { text, .. }) if text == kw)
    }

    fn parse_or(&mut self) -> Result<QueryNode, QueryParseError> {
        let mut left = self.parse_and()?;
        while self.peek_keyword("OR") {
            self.bump();
            let right = self.parse_and()?;
            left = QueryNode::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<QueryNode, QueryParseError> {
        let mut left = self.parse_not()?;
        loop {
            if self.peek_keyword("AND") {
                self.bump();
                let right = self.parse_not()?;
                left = QueryNode::And {
                    left: Box::new(left),
                    right: Box::new(right),
                    explicit: true,
                };
            } else if self.starts_primary() {
                let right = self.parse_not()?;
                left = QueryNode::And {
                    left: Box::new(left),
                    right: Box::new(right),
                    explicit: false,
                };
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<QueryNode, QueryParseError> {
        let mut left = self.parse_primary()?;
        while self.peek_keyword("NOT") {
            self.bump();
            let right = self.parse_primary()?;
            left = QueryNode::Not(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// True when the next token can begin a primary (used for implicit AND).
    fn starts_primary(&self) -> bool {
        match self.peek() {
            Some(Tok::LParen(_)) | Some(Tok::Phrase { .. }) => true,
            Some(Tok::Word { text, .. }) => !matches!(text.as_str(), "AND" | "OR" | "NOT"),
            _ => false,
        }
    }

    fn parse_primary(&mut self) -> Result<QueryNode, QueryParseError> {
        match self.peek().cloned() {
            Some(Tok::LParen(_)) => {
                self.bump();
                let inner = self.parse_or()?;
                match self.bump() {
                    Some(Tok::RParen(_)) => Ok(QueryNode::Group(Box::new(inner))),
                    other => Err(QueryParseError {
                        offset: other.map(|t| t.offset()).unwrap_or(self.eof),
                        expected: "')'",
                    }),
                }
            }
            Some(Tok::Phrase { text, offset }) => {
                self.bump();
                let mut leaf = Leaf::term(&text, offset);
                leaf.phrase = true;
                Ok(QueryNode::Leaf(leaf))
            }
            Some(Tok::Word { text, offset }) => {
                if matches!(text.as_str(), "AND" | "OR" | "NOT") {
                    return Err(QueryParseError {
                        offset,
                        expected: "term",
                    });
                }
                if text == "NEAR" && matches!(self.toks.get(self.pos + 1), Some(Tok::LParen(_))) {
                    return self.parse_near();
                }
                self.bump();
                // col:"phrase" lexes as a word ending in ':' followed by a
                // phrase with no whitespace between.
                if let Some(col_name) = text.strip_suffix(':') {
                    if let Some(column) = Column::from_name(col_name) {
                        if let Some(Tok::Phrase {
                            text: ptext,
                            offset: poffset,
                        }) = self.peek().cloned()
                        {
                            if poffset == offset + text.len() {
                                self.bump();
                                let mut leaf = Leaf::term(&ptext, poffset);
                                leaf.phrase = true;
                                leaf.column = Some(column);
                                return Ok(QueryNode::Leaf(leaf));
                            }
                        }
                    }
                }
                Ok(QueryNode::Leaf(parse_term(&text, offset)?))
            }
            Some(tok) => Err(QueryParseError {
                offset: tok.offset(),
                expected: "term",
            }),
            None => Err(QueryParseError {
                offset: self.eof,
                expected: "term",
            }),
        }
    }

    fn parse_near(&mut self) -> Result<QueryNode, QueryParseError> {
        self.bump(); // NEAR
        self.bump(); // (
        let mut atoms = Vec::new();
        let mut distance = None;
        loop {
            match self.peek().cloned() {
                Some(Tok::Word { text, offset }) => {
                    self.bump();
                    atoms.push(parse_term(&text, offset)?);
                }
                Some(Tok::Phrase { text, offset }) => {
                    self.bump();
                    let mut leaf = Leaf::term(&text, offset);
                    leaf.phrase = true;
                    atoms.push(leaf);
                }
                Some(Tok::Comma(_)) => {
                    self.bump();
                    match self.bump() {
                        Some(Tok::Word { text, offset }) => match text.parse::<u32>() {
                            Ok(k) => distance = Some(k),
                            Err(_) => {
                                return Err(QueryParseError {
                                    offset,
                                    expected: "distance",
                                })
                            }
                        },
                        other => {
                            return Err(QueryParseError {
                                offset: other.map(|t| t.offset()).unwrap_or(self.eof),
                                expected: "distance",
                            })
                        }
                    }
                    break;
                }
                Some(Tok::RParen(_)) => break,
                other => {
                    return Err(QueryParseError {
                        offset: other.map(|t| t.offset()).unwrap_or(self.eof),
                        expected: "term",
                    })
                }
            }
        }
        match self.bump() {
            Some(Tok::RParen(_)) => {}
            other => {
                return Err(QueryParseError {
                    offset: other.map(|t| t.offset()).unwrap_or(self.eof),
                    expected: "')'",
                })
            }
        }
        if atoms.is_empty() {
            return Err(QueryParseError {
                offset: self.eof,
                expected: "term",
            });
        }
        Ok(QueryNode::Near { atoms, distance })
    }
}

/// Split a bare word into its leaf modifiers: `+` proximity prefix, a
/// column filter when a valid column name precedes `:`, `^` anchoring and
/// a trailing `*`. Unknown `col:` prefixes stay part of the term text.
fn parse_term(word: &str, offset: usize) -> Result<Leaf, QueryParseError> {
    let mut leaf = Leaf::term(word, offset);
    let mut rest = word;

    if let Some(stripped) = rest.strip_prefix('+') {
        leaf.proximity = true;
        rest = stripped;
    }
    if let Some(idx) = rest.find(':') {
        if let Some(column) = Column::from_name(&rest[..idx]) {
            leaf.column = Some(column);
            rest = &rest[idx + 1..];
        }
    }
    if let Some(stripped) = rest.strip_prefix('^') {
        leaf.anchored = true;
        rest = stripped;
    }
    if let Some(stripped) = rest.strip_suffix('*') {
        leaf.prefix = true;
        rest = stripped;
    }
    if rest.is_empty() {
        return Err(QueryParseError {
            offset,
            expected: "term",
        });
    }
    leaf.text = rest.to_string();
    Ok(leaf)
}
