mod config;
mod entity;
mod error;
mod language;
mod progress;
mod text;

pub use config::Config;
pub use entity::{EntityKind, EntityRecord};
pub use error::CoreError;
pub use language::{script_tag, Language};
pub use progress::{NoProgress, Progress};
pub use text::{collapse_ws, truncate_chars};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as whole Unix seconds.
///
/// All persisted timestamps (registration, verification, throttle checks)
/// use this representation so window arithmetic stays integer-only.
pub fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_epoch_is_positive() {
        assert!(now_epoch() > 1_500_000_000);
    }
}
