//! Renders a parsed query back into an FTS MATCH expression.
//!
//! Operators, grouping and column filters pass through unchanged; every
//! leaf is run through the same tokenizer the indexer used, with `+`
//! adjacency joining multi-token leaves into a single phrase.

use fb_tokenize::tokenize;

use crate::ast::{Leaf, QueryNode};
use crate::error::QueryParseError;

/// Rewrite an operator tree into the backend MATCH string.
pub fn rewrite(node: &QueryNode) -> Result<String, QueryParseError> {
    match node {
        QueryNode::Or(a, b) => Ok(format!("{} OR {}", rewrite(a)?, rewrite(b)?)),
        QueryNode::And {
            left,
            right,
            explicit,
        } => {
            let joiner = if *explicit { " AND " } else { " " };
            Ok(format!("{}{}{}", rewrite(left)?, joiner, rewrite(right)?))
        }
        QueryNode::Not(a, b) => Ok(format!("{} NOT {}", rewrite(a)?, rewrite(b)?)),
        QueryNode::Group(inner) => Ok(format!("({})", rewrite(inner)?)),
        QueryNode::Near { atoms, distance } => {
            let mut rendered = Vec::with_capacity(atoms.len());
            for atom in atoms {
                rendered.push(render_near_atom(atom)?);
            }
            match distance {
                Some(k) => Ok(format!("NEAR({}, {k})", rendered.join(" "))),
                None => Ok(format!("NEAR({})", rendered.join(" "))),
            }
        }
        QueryNode::Leaf(leaf) => render_leaf(leaf),
    }
}

fn leaf_tokens(leaf: &Leaf) -> Result<Vec<String>, QueryParseError> {
    let toks = tokenize(&leaf.text);
    if toks.is_empty() {
        return Err(QueryParseError {
            offset: leaf.offset,
            expected: "term",
        });
    }
    Ok(toks.split(' ').map(str::to_string).collect())
}

fn render_leaf(leaf: &Leaf) -> Result<String, QueryParseError> {
    let tokens = leaf_tokens(leaf)?;
    let mut out = tokens.join(" + ");
    if leaf.prefix {
        out.push('*');
    }
    if leaf.anchored {
        out = format!("^{out}");
    }
    if leaf.phrase {
        out = format!("\"{out}\"");
    }
    if let Some(column) = leaf.column {
        out = format!("{}:{out}", column.name());
    }
    if leaf.proximity {
        out = format!("+ {out}");
    }
    Ok(out)
}

/// A NEAR atom must read as a single unit, so multi-token leaves and
/// phrases are quoted. Distances are never tokenized.
fn render_near_atom(leaf: &Leaf) -> Result<String, QueryParseError> {
    let tokens = leaf_tokens(leaf)?;
    if tokens.len() == 1 && !leaf.phrase {
        Ok(tokens.into_iter().next().unwrap_or_default())
    } else {
        Ok(format!("\"{}\"", tokens.join(" + ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn rw(input: &str) -> String {
        rewrite(&parse(input).unwrap()).unwrap()
    }

    #[test]
    fn column_leaf_tokenized() {
        assert_eq!(rw("signature:getUserById"), "signature:get + User + By + Id");
    }

    #[test]
    fn phrase_interior_joined() {
        assert_eq!(rw("\"class User\""), "\"class + User\"");
    }

    #[test]
    fn prefix_star_lands_on_last_token() {
        assert_eq!(rw("getUser*"), "get + User*");
        assert_eq!(rw("user*"), "user*");
    }

    #[test]
    fn anchor_lands_on_first_token() {
        assert_eq!(rw("^getUser"), "^get + User");
        assert_eq!(rw("namespace:^App"), "namespace:^App");
    }

    #[test]
    fn proximity_unary_rendered() {
        assert_eq!(rw("head +tail"), "head + tail");
    }

    #[test]
    fn operator_shape_preserved() {
        assert_eq!(
            rw("alpha AND (beta OR gamma) NOT delta"),
            "alpha AND (beta OR gamma) NOT delta"
        );
        assert_eq!(rw("alpha beta"), "alpha beta");
    }

    #[test]
    fn near_atoms_tokenized_but_distance_is_not() {
        assert_eq!(rw("NEAR(getUser save, 10)"), "NEAR(\"get + User\" save, 10)");
        assert_eq!(rw("NEAR(alpha beta)"), "NEAR(alpha beta)");
    }

    #[test]
    fn unknown_column_hex_escapes_the_colon() {
        // ':' = 0x3a
        assert_eq!(rw("foo:bar"), "foo + T3aK + bar");
    }

    #[test]
    fn punctuation_term_matches_indexed_form() {
        assert_eq!(rw("$userId"), "T24K + user + Id");
    }

    #[test]
    fn column_phrase_combined() {
        assert_eq!(rw("body:\"return null\""), "body:\"return + null\"");
    }

    #[test]
    fn shape_comparison_ignores_leaf_contents() {
        let a = parse("one AND two").unwrap();
        let b = parse("three AND four*").unwrap();
        assert_eq!(a.shape(), b.shape());
    }
}
