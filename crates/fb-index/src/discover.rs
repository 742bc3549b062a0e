//! Walks a project root emitting (absolute path, language) pairs.
//!
//! The walk is an explicit stack (no recursion), applies the inheritable
//! ignore rules at every level, and silently skips directories that fail
//! to open. Symlinks are not followed.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use fb_core::Language;

use crate::ignore::IgnoreMatcher;

/// One discovered candidate file.
#[derive(Debug, Clone)]
pub struct Discovered {
    pub path: PathBuf,
    pub language: Language,
}

/// Walk `root`, returning candidates in deterministic (sorted) order.
pub fn discover(root: &Path, matcher: &mut IgnoreMatcher) -> Vec<Discovered> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            // Permission errors and races: skip the directory silently.
            Err(_) => continue,
        };

        let mut paths: Vec<(PathBuf, bool)> = Vec::new();
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_symlink() {
                continue;
            }
            paths.push((entry.path(), file_type.is_dir()));
        }
        paths.sort_by(|a, b| a.0.cmp(&b.0));

        for (path, is_dir) in paths {
            if matcher.is_ignored(&dir, &path, is_dir) {
                continue;
            }
            if is_dir {
                stack.push(path);
            } else if let Some(language) = classify(&path) {
                found.push(Discovered { path, language });
            }
        }
    }

    found.sort_by(|a, b| a.path.cmp(&b.path));
    found
}

/// Classify a file by extension, or as a script when it is extension-less,
/// executable, and starts with `#!`.
pub fn classify(path: &Path) -> Option<Language> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => Language::from_extension(&ext.to_ascii_lowercase()),
        None => {
            if is_executable(path) && has_shebang(path) {
                Some(Language::Script)
            } else {
                None
            }
        }
    }
}

fn has_shebang(path: &Path) -> bool {
    let Ok(mut file) = fs::File::open(path) else {
        return false;
    };
    let mut head = [0u8; 2];
    matches!(file.read(&mut head), Ok(2)) && &head == b"#!"
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    false
}
