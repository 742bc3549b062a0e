/// Storage errors. Fatal for the command that triggered them; the
/// enclosing transaction rolls back.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    #[error("migration from version {from} failed: {reason}")]
    MigrationFailed { from: u32, reason: String },

    #[error("HOME is not set; cannot locate the index database")]
    MissingHome,
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Sqlite(e) if is_sqlite_busy(e))
    }
}

fn is_sqlite_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ErrorCode::DatabaseBusy,
                ..
            },
            _
        )
    )
}
