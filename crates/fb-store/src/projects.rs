//! Registered project roots and path-to-project resolution.

use std::path::{Path, PathBuf};

use rusqlite::{params, Row};
use serde::Serialize;

use crate::error::StoreError;
use crate::store::{Store, StoreTx};

/// Files whose presence marks a plausible project root.
const ROOT_MARKERS: &[&str] = &[
    ".git",
    "composer.json",
    "package.json",
    "Cargo.toml",
    "go.mod",
    "pyproject.toml",
    "Gemfile",
    "Makefile",
];

/// One registered project root.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectRoot {
    pub project_root: String,
    pub project_name: String,
    pub registered_at: i64,
    pub last_indexed: Option<i64>,
    pub last_accessed: Option<i64>,
    pub last_update_check: Option<i64>,
}

/// Outcome of resolving a working directory to a project.
#[derive(Debug)]
pub enum Resolution {
    /// The longest registered root containing the path.
    Found(ProjectRoot),
    /// Nothing registered contains the path; `candidates` are plausible
    /// roots found by scanning upward for known markers.
    NotFound { candidates: Vec<PathBuf> },
}

fn row_to_project(row: &Row<'_>) -> rusqlite::Result<ProjectRoot> {
    Ok(ProjectRoot {
        project_root: row.get(0)?,
        project_name: row.get(1)?,
        registered_at: row.get(2)?,
        last_indexed: row.get(3)?,
        last_accessed: row.get(4)?,
        last_update_check: row.get(5)?,
    })
}

const PROJECT_COLUMNS: &str =
    "project_root, project_name, registered_at, last_indexed, last_accessed, last_update_check";

impl StoreTx<'_> {
    /// Register a project root, or refresh its display name if it is
    /// already registered.
    pub fn register_project(&self, root: &str, name: &str, now: i64) -> Result<(), StoreError> {
        self.conn
            .prepare_cached(
                "INSERT INTO project_roots (project_root, project_name, registered_at) \
                 VALUES (?1, ?2, ?3) \
                 ON CONFLICT(project_root) DO UPDATE SET project_name = ?2",
            )?
            .execute(params![root, name, now])?;
        Ok(())
    }

    pub fn set_last_indexed(&self, root: &str, now: i64) -> Result<(), StoreError> {
        self.conn
            .prepare_cached("UPDATE project_roots SET last_indexed = ?2 WHERE project_root = ?1")?
            .execute(params![root, now])?;
        Ok(())
    }

    pub fn set_last_update_check(&self, root: &str, now: i64) -> Result<(), StoreError> {
        self.conn
            .prepare_cached(
                "UPDATE project_roots SET last_update_check = ?2 WHERE project_root = ?1",
            )?
            .execute(params![root, now])?;
        Ok(())
    }
}

impl Store {
    /// All registered projects, oldest registration first.
    pub fn projects(&self) -> Result<Vec<ProjectRoot>, StoreError> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project_roots ORDER BY registered_at ASC"
        ))?;
        let rows = stmt.query_map([], row_to_project)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// One project by exact root path.
    pub fn project(&self, root: &str) -> Result<Option<ProjectRoot>, StoreError> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project_roots WHERE project_root = ?1"
        ))?;
        let mut rows = stmt.query(params![root])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_project(row)?)),
            None => Ok(None),
        }
    }

    /// Resolve a starting path to the longest registered root that equals
    /// or prefixes it. A match stamps `last_accessed`; a miss returns
    /// candidate roots found by the upward marker scan.
    pub fn resolve_project(&self, start: &Path, now: i64) -> Result<Resolution, StoreError> {
        let start_str = start.to_string_lossy();
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {PROJECT_COLUMNS} FROM project_roots ORDER BY LENGTH(project_root) DESC"
        ))?;
        let rows = stmt.query_map([], row_to_project)?;
        for project in rows {
            let project = project?;
            if path_contains(&project.project_root, &start_str) {
                self.conn()
                    .prepare_cached(
                        "UPDATE project_roots SET last_accessed = ?2 WHERE project_root = ?1",
                    )?
                    .execute(params![project.project_root, now])?;
                return Ok(Resolution::Found(project));
            }
        }
        Ok(Resolution::NotFound {
            candidates: candidate_roots(start, home_dir().as_deref()),
        })
    }
}

/// True when `root` equals `path` or is an ancestor directory of it.
fn path_contains(root: &str, path: &str) -> bool {
    if root == path {
        return true;
    }
    let root = root.trim_end_matches('/');
    path.strip_prefix(root)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Scan upward from `start` collecting directories that carry a known
/// project marker. Stops at the home directory when `start` lies inside
/// it, otherwise at the filesystem root.
pub fn candidate_roots(start: &Path, home: Option<&Path>) -> Vec<PathBuf> {
    let stop_at = home.filter(|h| start.starts_with(h));
    let mut candidates = Vec::new();
    let mut current = Some(start);
    while let Some(dir) = current {
        if ROOT_MARKERS.iter().any(|m| dir.join(m).exists()) {
            candidates.push(dir.to_path_buf());
        }
        if let Some(stop) = stop_at {
            if dir == stop {
                break;
            }
        }
        current = dir.parent();
    }
    candidates
}
