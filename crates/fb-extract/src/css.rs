//! CSS extractor: one record per selector-block pair.
//!
//! `@media` blocks are entered so the rules inside them are records of
//! their own; other at-rules are kept as single blocks.

use fb_core::{collapse_ws, EntityKind, EntityRecord};

use crate::common::{count_lines, line_of, line_starts, match_brace, BraceSyntax};
use crate::error::ExtractError;
use crate::registry::Extractor;

pub struct CssExtractor;

impl Extractor for CssExtractor {
    fn extensions(&self) -> &'static [&'static str] {
        &["css", "scss", "sass", "less"]
    }

    fn extract(&self, filename: &str, content: &str) -> Result<Vec<EntityRecord>, ExtractError> {
        let starts = line_starts(content);
        let total = count_lines(content).max(1);
        let basename = filename.rsplit('/').next().unwrap_or(filename);
        let ext = filename.rsplit('.').next().unwrap_or("css");

        let mut records = vec![EntityRecord::file(basename, content, total, ext)];
        scan_rules(content, 0, content.len(), &starts, ext, &mut records);
        Ok(records)
    }
}

/// Scan `content[from..to]` for selector-block pairs, appending a record
/// per pair. Recurses into `@media` interiors.
fn scan_rules(
    content: &str,
    from: usize,
    to: usize,
    starts: &[usize],
    ext: &str,
    records: &mut Vec<EntityRecord>,
) {
    let bytes = content.as_bytes();
    let mut sel_start = from;
    let mut i = from;

    while i < to {
        // Skip comments; a comment before the selector moves the record
        // start past it, a comment inside the selector is stripped later.
        if content[i..].starts_with("/*") {
            let after = match content[i..].find("*/") {
                Some(pos) => i + pos + 2,
                None => break,
            };
            if content[sel_start..i].trim().is_empty() {
                sel_start = after;
            }
            i = after;
            continue;
        }
        match bytes[i] {
            b';' => {
                // Statement at-rule (@import, @charset, ...) or stray ';'.
                let sel = collapse_ws(strip_comments(&content[sel_start..i]).trim());
                if sel.starts_with('@') {
                    records.push(rule_record(&sel, content, starts, sel_offset(content, sel_start), i, ext));
                }
                sel_start = i + 1;
                i += 1;
            }
            b'{' => {
                let Some(close) = match_brace(content, i, BraceSyntax::CSS) else {
                    return;
                };
                let sel = collapse_ws(strip_comments(&content[sel_start..i]).trim());
                if !sel.is_empty() {
                    let record_start = sel_offset(content, sel_start);
                    records.push(rule_record(&sel, content, starts, record_start, close, ext));
                    if sel.starts_with("@media") {
                        scan_rules(content, i + 1, close, starts, ext, records);
                    }
                }
                sel_start = close + 1;
                i = close + 1;
            }
            _ => i += 1,
        }
    }
}

/// Remove `/* ... */` spans embedded in selector text.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start..].find("*/") {
            Some(end) => rest = &rest[start + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Skip leading whitespace so the record starts on the selector's line.
fn sel_offset(content: &str, mut start: usize) -> usize {
    let bytes = content.as_bytes();
    while start < bytes.len() && (bytes[start] as char).is_whitespace() {
        start += 1;
    }
    start
}

fn rule_record(
    selector: &str,
    content: &str,
    starts: &[usize],
    start: usize,
    end: usize,
    ext: &str,
) -> EntityRecord {
    let kind = if selector.starts_with("@media") {
        EntityKind::CssMediaQuery
    } else if selector.starts_with("@keyframes") {
        EntityKind::CssKeyframes
    } else if selector.starts_with('@') {
        EntityKind::CssAtRule
    } else {
        EntityKind::CssRule
    };
    EntityRecord {
        kind,
        name: selector.to_string(),
        namespace: String::new(),
        enclosing: String::new(),
        signature_raw: selector.to_string(),
        preamble_raw: String::new(),
        body_raw: content[start..=end.min(content.len().saturating_sub(1))].to_string(),
        line_start: line_of(starts, start),
        line_end: line_of(starts, end.min(content.len().saturating_sub(1))),
        language: ext.to_string(),
        visibility: None,
    }
}
