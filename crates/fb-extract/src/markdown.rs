//! Markdown extractor: the file plus one record per top-level heading,
//! each body spanning until the next `# `.

use fb_core::{EntityKind, EntityRecord};

use crate::common::count_lines;
use crate::error::ExtractError;
use crate::registry::Extractor;

pub struct MarkdownExtractor;

impl Extractor for MarkdownExtractor {
    fn extensions(&self) -> &'static [&'static str] {
        &["md", "markdown"]
    }

    fn extract(&self, filename: &str, content: &str) -> Result<Vec<EntityRecord>, ExtractError> {
        let lines: Vec<&str> = content.lines().collect();
        let total = count_lines(content).max(1);
        let basename = filename.rsplit('/').next().unwrap_or(filename);

        let mut records = vec![EntityRecord::file(basename, content, total, "markdown")];

        let heading_lines: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.starts_with("# "))
            .map(|(idx, _)| idx)
            .collect();

        for (pos, &idx) in heading_lines.iter().enumerate() {
            let title = lines[idx][2..].trim().to_string();
            let end_idx = heading_lines
                .get(pos + 1)
                .map(|next| next - 1)
                .unwrap_or(lines.len().saturating_sub(1));
            records.push(EntityRecord {
                kind: EntityKind::MdHeading1,
                name: title.clone(),
                namespace: String::new(),
                enclosing: String::new(),
                signature_raw: lines[idx].to_string(),
                preamble_raw: String::new(),
                body_raw: lines[idx..=end_idx].join("\n"),
                line_start: idx as u32 + 1,
                line_end: end_idx as u32 + 1,
                language: "markdown".to_string(),
                visibility: None,
            });
        }

        Ok(records)
    }
}
