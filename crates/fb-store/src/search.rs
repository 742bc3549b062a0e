//! MATCH execution and result-row shaping.

use rusqlite::params;
use serde::Serialize;

use fb_tokenize::{detokenize, detokenize_marked};

use crate::entities::prefix_of;
use crate::error::StoreError;
use crate::store::Store;

/// Markers the snippet function wraps around matched tokens; the
/// detokenizer keeps them around the decoded text.
pub const MARK_START: &str = "«";
pub const MARK_END: &str = "»";

/// Number of tokens the snippet window spans.
const SNIPPET_TOKENS: u32 = 16;

/// One search hit, ready for display or JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// Path relative to the project root.
    pub path: String,
    pub line_start: u32,
    pub line_end: u32,
    /// Entity type tag ("function", "class", "md-heading-1", ...).
    pub kind: String,
    pub namespace: String,
    pub enclosing: String,
    pub name: String,
    /// Detokenized snippet with highlight markers.
    pub snippet: String,
}

impl Store {
    /// Run a rewritten MATCH expression scoped to one project. Results
    /// come back in the backend's relevance order.
    pub fn search(
        &self,
        project_root: &str,
        match_expr: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let prefix = prefix_of(project_root);
        let mut stmt = self.conn().prepare_cached(
            "SELECT e.filename, e.line_start, e.line_end, e.type, e.namespace, \
                    e.enclosing, e.name, \
                    snippet(code_index, -1, ?3, ?4, ' … ', ?5) \
             FROM code_index \
             JOIN code_entities e ON e.id = code_index.rowid \
             WHERE code_index MATCH ?1 \
               AND substr(e.filename, 1, length(?2)) = ?2 \
             ORDER BY rank \
             LIMIT ?6",
        )?;
        let rows = stmt.query_map(
            params![
                match_expr,
                prefix,
                MARK_START,
                MARK_END,
                SNIPPET_TOKENS,
                limit as i64
            ],
            |row| {
                let filename: String = row.get(0)?;
                let namespace: String = row.get(4)?;
                let snippet_raw: String = row.get(7)?;
                Ok(SearchHit {
                    path: filename
                        .strip_prefix(&prefix)
                        .unwrap_or(filename.as_str())
                        .to_string(),
                    line_start: row.get(1)?,
                    line_end: row.get(2)?,
                    kind: row.get(3)?,
                    namespace: detokenize(&namespace),
                    enclosing: row.get(5)?,
                    name: row.get(6)?,
                    snippet: detokenize_marked(&snippet_raw, MARK_START, MARK_END),
                })
            },
        )?;
        let hits = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        tracing::debug!(query = match_expr, hits = hits.len(), "search executed");
        Ok(hits)
    }
}
