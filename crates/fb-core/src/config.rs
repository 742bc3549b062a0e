use std::time::Duration;

/// Runtime configuration, resolved from `FUBBER_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Run the updater automatically on command execution.
    pub auto_update: bool,
    /// Minimum interval between automatic update checks.
    pub update_throttle: Duration,
    /// Soft wall-clock budget for the change-detection phase.
    pub detect_timeout: Duration,
    /// Files verified within this window are swept preferentially.
    pub recent_threshold: Duration,
    /// Strict mode: tokenizer/extractor failures surface instead of degrading.
    pub dev_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_update: true,
            update_throttle: Duration::from_secs(60),
            detect_timeout: Duration::from_millis(250),
            recent_threshold: Duration::from_secs(86_400),
            dev_mode: false,
        }
    }
}

impl Config {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            auto_update: lookup("FUBBER_AUTO_UPDATE")
                .map(|v| !matches!(v.trim(), "false" | "0"))
                .unwrap_or(defaults.auto_update),
            update_throttle: lookup("FUBBER_UPDATE_THROTTLE")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.update_throttle),
            detect_timeout: lookup("FUBBER_DETECT_TIMEOUT")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.detect_timeout),
            recent_threshold: lookup("FUBBER_RECENT_THRESHOLD")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.recent_threshold),
            dev_mode: lookup("FUBBER_DEV")
                .map(|v| !matches!(v.trim(), "" | "false" | "0"))
                .unwrap_or(defaults.dev_mode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config_with(&[]);
        assert!(cfg.auto_update);
        assert_eq!(cfg.update_throttle, Duration::from_secs(60));
        assert_eq!(cfg.detect_timeout, Duration::from_millis(250));
        assert_eq!(cfg.recent_threshold, Duration::from_secs(86_400));
        assert!(!cfg.dev_mode);
    }

    #[test]
    fn auto_update_disabled_by_false_or_zero() {
        assert!(!config_with(&[("FUBBER_AUTO_UPDATE", "false")]).auto_update);
        assert!(!config_with(&[("FUBBER_AUTO_UPDATE", "0")]).auto_update);
        assert!(config_with(&[("FUBBER_AUTO_UPDATE", "yes")]).auto_update);
    }

    #[test]
    fn numeric_overrides() {
        let cfg = config_with(&[
            ("FUBBER_UPDATE_THROTTLE", "5"),
            ("FUBBER_DETECT_TIMEOUT", "900"),
            ("FUBBER_RECENT_THRESHOLD", "3600"),
        ]);
        assert_eq!(cfg.update_throttle, Duration::from_secs(5));
        assert_eq!(cfg.detect_timeout, Duration::from_millis(900));
        assert_eq!(cfg.recent_threshold, Duration::from_secs(3600));
    }

    #[test]
    fn garbage_numbers_fall_back() {
        let cfg = config_with(&[("FUBBER_UPDATE_THROTTLE", "soon")]);
        assert_eq!(cfg.update_throttle, Duration::from_secs(60));
    }

    #[test]
    fn dev_mode_truthy() {
        assert!(config_with(&[("FUBBER_DEV", "1")]).dev_mode);
        assert!(!config_with(&[("FUBBER_DEV", "0")]).dev_mode);
        assert!(!config_with(&[]).dev_mode);
    }
}
