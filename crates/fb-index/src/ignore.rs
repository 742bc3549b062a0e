//! Inheritable ignore rules, one compiled set per directory.
//!
//! The project root starts with a single global pattern (dot-directories
//! and common vendor/build segments). Every descendant directory inherits
//! its parent's compiled set and, when a `.gitignore` is present, appends
//! one regex per non-comment line, anchored to that directory. Patterns
//! prefixed with `!` become re-include guards wrapping the exclude set.
//!
//! Rule sets are built iteratively down from the root (no recursion) and
//! memoized per directory path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;

/// Path segments excluded everywhere, in addition to dot-directories.
const GLOBAL_SEGMENTS: &[&str] = &[
    "node_modules",
    "vendor",
    "__pycache__",
    "dist",
    "build",
    "coverage",
];

/// Compiled rules in force for one directory.
#[derive(Debug, Default, Clone)]
pub struct DirRules {
    excludes: Vec<Regex>,
    negates: Vec<Regex>,
}

impl DirRules {
    /// A path is ignored when any exclude matches and no negate re-includes
    /// it. Directory paths must carry a trailing `/` before testing.
    fn matches(&self, path: &str) -> bool {
        self.excludes.iter().any(|re| re.is_match(path))
            && !self.negates.iter().any(|re| re.is_match(path))
    }
}

/// Per-directory ignore matcher for one project root, memoizing compiled
/// rule sets. Rebuilt at the start of each discovery or update pass.
pub struct IgnoreMatcher {
    root: PathBuf,
    rules: HashMap<PathBuf, Arc<DirRules>>,
}

impl IgnoreMatcher {
    pub fn new(root: &Path) -> Self {
        let mut global = DirRules::default();
        let segments = GLOBAL_SEGMENTS.join("|");
        // Anchored below the root so a project that itself lives under a
        // dot-directory is not wholesale excluded.
        let root_str = root.to_string_lossy().replace('\\', "/");
        let root_esc = regex::escape(root_str.trim_end_matches('/'));
        if let Ok(re) = Regex::new(&format!(r"^{root_esc}/(?:.*/)?(\.[^/]+|{segments})/")) {
            global.excludes.push(re);
        }
        let mut rules = HashMap::new();
        rules.insert(root.to_path_buf(), Arc::new(global));
        Self {
            root: root.to_path_buf(),
            rules,
        }
    }

    /// Should `path` (a child of `parent`) be skipped? `is_dir` appends the
    /// trailing slash directory patterns need.
    pub fn is_ignored(&mut self, parent: &Path, path: &Path, is_dir: bool) -> bool {
        let rules = self.rules_for(parent);
        let mut subject = path.to_string_lossy().replace('\\', "/");
        if is_dir && !subject.ends_with('/') {
            subject.push('/');
        }
        rules.matches(&subject)
    }

    /// The compiled rule set for a directory, building (and memoizing)
    /// every level between the root and it with an explicit walk.
    pub fn rules_for(&mut self, dir: &Path) -> Arc<DirRules> {
        if let Some(rules) = self.rules.get(dir) {
            return Arc::clone(rules);
        }

        // Collect the uncached ancestry, nearest-to-root last.
        let mut pending: Vec<PathBuf> = Vec::new();
        let mut cursor = dir.to_path_buf();
        while !self.rules.contains_key(&cursor) {
            pending.push(cursor.clone());
            match cursor.parent() {
                Some(parent) if cursor != self.root => cursor = parent.to_path_buf(),
                _ => break,
            }
        }

        // Build top-down so each level inherits its parent's set.
        for level in pending.into_iter().rev() {
            let parent_rules = level
                .parent()
                .and_then(|p| self.rules.get(p))
                .or_else(|| self.rules.get(&self.root))
                .cloned()
                .unwrap_or_default();
            let mut combined = (*parent_rules).clone();
            append_gitignore(&mut combined, &level);
            self.rules.insert(level, Arc::new(combined));
        }

        self.rules
            .get(dir)
            .or_else(|| self.rules.get(&self.root))
            .cloned()
            .unwrap_or_default()
    }
}

/// Compile the `.gitignore` in `dir` (if any) onto `rules`.
fn append_gitignore(rules: &mut DirRules, dir: &Path) {
    let Ok(text) = std::fs::read_to_string(dir.join(".gitignore")) else {
        return;
    };
    let dir_str = dir.to_string_lossy().replace('\\', "/");
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (negate, pattern) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        if let Some(re) = gitignore_to_regex(&dir_str, pattern) {
            if negate {
                rules.negates.push(re);
            } else {
                rules.excludes.push(re);
            }
        }
    }
}

/// Convert one gitignore pattern into a regex anchored to `dir`.
///
/// `*` → `[^/]*`, `**` → `.*` (consuming an optional trailing `/`),
/// `?` → `[^/]`, `[...]` passes through as a class with `!`/`^` negation.
/// A leading `/` anchors to the directory; without one the pattern matches
/// in any subdirectory. A trailing `/` restricts the match to directories
/// (directory paths get a `/` appended before testing).
pub fn gitignore_to_regex(dir: &str, pattern: &str) -> Option<Regex> {
    let dir_only = pattern.ends_with('/');
    let pattern = pattern.trim_end_matches('/');
    let (anchored, pattern) = match pattern.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };
    if pattern.is_empty() {
        return None;
    }

    let mut body = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                body.push_str(".*");
                i += 2;
                if chars.get(i) == Some(&'/') {
                    i += 1;
                }
            }
            '*' => {
                body.push_str("[^/]*");
                i += 1;
            }
            '?' => {
                body.push_str("[^/]");
                i += 1;
            }
            '[' => {
                body.push('[');
                i += 1;
                if matches!(chars.get(i), Some('!') | Some('^')) {
                    body.push('^');
                    i += 1;
                }
                while i < chars.len() && chars[i] != ']' {
                    if chars[i] == '\\' {
                        body.push('\\');
                    } else {
                        body.push_str(&regex::escape(&chars[i].to_string()));
                    }
                    i += 1;
                }
                body.push(']');
                i += 1;
            }
            ch => {
                body.push_str(&regex::escape(&ch.to_string()));
                i += 1;
            }
        }
    }

    let prefix = if anchored {
        format!("^{}/", regex::escape(dir))
    } else {
        format!("^{}/(?:.*/)?", regex::escape(dir))
    };
    let suffix = if dir_only { "/" } else { "(?:/|$)" };
    Regex::new(&format!("{prefix}{body}{suffix}")).ok()
}
