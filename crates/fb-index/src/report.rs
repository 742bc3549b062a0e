use std::time::Duration;

/// Statistics from a full indexing run.
#[derive(Debug, Default)]
pub struct IndexReport {
    pub files_discovered: usize,
    pub files_indexed: usize,
    pub files_failed: usize,
    pub entities_written: usize,
    pub duration: Duration,
}

/// Statistics from one updater invocation.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// The throttle suppressed this run entirely.
    pub throttled: bool,
    /// Metadata rows compared against disk during detection.
    pub files_checked: usize,
    /// Files whose mtime advanced past the recorded one.
    pub files_changed: usize,
    /// Files now missing or newly excluded by ignore rules.
    pub files_deleted: usize,
    /// Unknown files picked up by the directory rescan.
    pub files_added: usize,
    pub entities_written: usize,
    /// Detection stopped early on its wall-clock budget.
    pub detection_truncated: bool,
    pub duration: Duration,
}

impl UpdateReport {
    /// Total files queued for re-indexing.
    pub fn queued(&self) -> usize {
        self.files_changed + self.files_deleted + self.files_added
    }
}
