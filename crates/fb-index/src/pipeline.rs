//! Full indexing pipeline: discovery → extraction → tokenization →
//! insertion, inside a single transaction.

use std::path::Path;
use std::time::Instant;

use fb_core::{truncate_chars, Config, Language, Progress};
use fb_extract::ExtractorRegistry;
use fb_store::{FileMeta, NewEntity, Store, StoreTx};
use fb_tokenize::{decode_text, tokenize};

use crate::discover::discover;
use crate::error::IndexError;
use crate::ignore::IgnoreMatcher;
use crate::report::IndexReport;

/// Progress advances are amortized to every N files; the final advance
/// always lands on the exact total.
pub(crate) const PROGRESS_STEP: usize = 7;

/// Bodies above this many characters are cut before tokenization. Storage
/// only; recorded line ranges are unaffected.
const BODY_MAX_CHARS: usize = 100_000;

/// Re-index a project from scratch: purge its rows, walk the tree, and
/// write every discovered file's entities in one transaction.
#[tracing::instrument(skip(store, config, registry, progress))]
pub fn full_index(
    store: &mut Store,
    project_root: &str,
    config: &Config,
    registry: &ExtractorRegistry,
    progress: &mut dyn Progress,
) -> Result<IndexReport, IndexError> {
    let start = Instant::now();
    let root = Path::new(project_root);
    let mut matcher = IgnoreMatcher::new(root);
    let found = discover(root, &mut matcher);
    let total = found.len();
    tracing::info!(files = total, "full index started");

    progress.begin(total);
    let mut report = IndexReport {
        files_discovered: total,
        ..IndexReport::default()
    };
    let now = fb_core::now_epoch();

    store.tx(|tx| {
        tx.purge_project(project_root)?;
        for (idx, item) in found.iter().enumerate() {
            match index_file(
                tx,
                project_root,
                &item.path,
                item.language,
                registry,
                config,
                now,
            ) {
                Ok(written) => {
                    report.files_indexed += 1;
                    report.entities_written += written;
                }
                // Store failures abort the command; per-file problems are
                // absorbed.
                Err(IndexError::Store(inner)) => return Err(inner),
                Err(e) => {
                    report.files_failed += 1;
                    tracing::warn!(path = %item.path.display(), error = %e, "file skipped");
                }
            }
            if (idx + 1) % PROGRESS_STEP == 0 {
                progress.advance(idx + 1);
            }
        }
        tx.set_last_indexed(project_root, now)?;
        Ok(())
    })?;

    progress.advance(total);
    progress.finish();

    report.duration = start.elapsed();
    tracing::info!(
        files = report.files_indexed,
        entities = report.entities_written,
        "full index completed"
    );
    Ok(report)
}

/// Extract one file and write its entity rows and metadata. Returns the
/// number of entity rows written. I/O and extraction problems are absorbed
/// (zero entities, a warning); in developer mode they surface as errors.
pub(crate) fn index_file(
    tx: &StoreTx<'_>,
    project_root: &str,
    path: &Path,
    language: Language,
    registry: &ExtractorRegistry,
    config: &Config,
    now: i64,
) -> Result<usize, IndexError> {
    let filename = path.to_string_lossy().replace('\\', "/");
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            if config.dev_mode {
                return Err(IndexError::Io(e));
            }
            tracing::warn!(path = %filename, error = %e, "unreadable file skipped");
            return Ok(0);
        }
    };
    let content = decode_text(&bytes, config.dev_mode)?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let extracted = if language == Language::Script {
        registry.script().extract(&filename, &content)
    } else {
        match registry.for_extension(&ext) {
            Some(extractor) => extractor.extract(&filename, &content),
            None => {
                tracing::debug!(path = %filename, "no extractor registered");
                return Ok(0);
            }
        }
    };
    let records = match extracted {
        Ok(records) => records,
        Err(e) => {
            if config.dev_mode {
                return Err(e.into());
            }
            tracing::warn!(path = %filename, error = %e, "extraction failed");
            Vec::new()
        }
    };
    if records.is_empty() {
        tracing::warn!(path = %filename, "extractor produced no entities");
    }

    let rel_path = path
        .strip_prefix(project_root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/");
    let ext_tokens = tokenize(&ext);
    let path_tokens = tokenize(&rel_path);
    let record_language = records
        .first()
        .map(|r| r.language.clone())
        .unwrap_or_else(|| language.name().to_string());

    let rows: Vec<NewEntity> = records
        .iter()
        .map(|record| NewEntity {
            preamble: tokenize(&record.preamble_raw),
            signature: tokenize(&record.signature_raw),
            body: tokenize(truncate_chars(&record.body_raw, BODY_MAX_CHARS)),
            namespace: tokenize(&record.namespace),
            ext: ext_tokens.clone(),
            path: path_tokens.clone(),
            preamble_raw: record.preamble_raw.clone(),
            signature_raw: record.signature_raw.clone(),
            kind: record.kind.as_str().to_string(),
            name: record.name.clone(),
            enclosing: record.enclosing.clone(),
            filename: filename.clone(),
            line_start: record.line_start,
            line_end: record.line_end,
        })
        .collect();
    tx.insert_entities(&rows)?;

    tx.upsert_file(&FileMeta {
        filename,
        project_root: project_root.to_string(),
        filetime: mtime_epoch(path),
        verified_time: now,
        file_hash: xxhash_rust::xxh3::xxh3_64(&bytes) as i64,
        entry_count: rows.len() as u32,
        language: record_language,
    })?;

    Ok(rows.len())
}

/// File mtime as Unix seconds; 0 when unavailable.
pub(crate) fn mtime_epoch(path: &Path) -> i64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
