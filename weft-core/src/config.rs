//! Runtime configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReactiveError, Result};

/// Default garbage-collection cadence.
pub const DEFAULT_GC_INTERVAL_MS: u64 = 1000;

/// Default bound on cascading derivation rounds per flush.
pub const DEFAULT_MAX_SETTLE_ROUNDS: usize = 100;

/// Default number of undrained diagnostics kept by a runtime.
pub const DEFAULT_MAX_DIAGNOSTICS: usize = 256;

/// Tunables for a [`Runtime`](crate::Runtime).
///
/// Missing fields fall back to their defaults when deserializing:
///
/// ```rust
/// use weft_core::Config;
///
/// let config = Config::from_json(r#"{ "gc_interval_ms": 250 }"#).unwrap();
/// assert_eq!(config.gc_interval_ms, 250);
/// assert_eq!(config.max_settle_rounds, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Delay between the first edge registration and the GC sweep.
    pub gc_interval_ms: u64,

    /// Maximum number of derivation rounds a flush runs before giving up
    /// on settling and committing anyway.
    pub max_settle_rounds: usize,

    /// Extra delay the async driver waits before flushing. Zero flushes at
    /// the next yield point.
    pub flush_delay_ms: u64,

    /// Diagnostics kept until `take_diagnostics` drains them. Once full, the
    /// oldest entry is dropped. Zero keeps none.
    pub max_diagnostics: usize,
}

impl Config {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_settle_rounds == 0 {
            return Err(ReactiveError::InvalidConfig(
                "max_settle_rounds must be at least 1".into(),
            ));
        }
        if self.gc_interval_ms == 0 {
            return Err(ReactiveError::InvalidConfig(
                "gc_interval_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn gc_interval(&self) -> Duration {
        Duration::from_millis(self.gc_interval_ms)
    }

    pub fn flush_delay(&self) -> Duration {
        Duration::from_millis(self.flush_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gc_interval_ms: DEFAULT_GC_INTERVAL_MS,
            max_settle_rounds: DEFAULT_MAX_SETTLE_ROUNDS,
            flush_delay_ms: 0,
            max_diagnostics: DEFAULT_MAX_DIAGNOSTICS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.gc_interval(), Duration::from_secs(1));
        assert_eq!(config.max_settle_rounds, 100);
        assert_eq!(config.flush_delay(), Duration::ZERO);
        assert_eq!(config.max_diagnostics, 256);
    }

    #[test]
    fn empty_json_yields_defaults() {
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn rejects_zero_rounds() {
        let err = Config::from_json(r#"{ "max_settle_rounds": 0 }"#).unwrap_err();
        assert!(matches!(err, ReactiveError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Config::from_json("{ gc_interval_ms: }").unwrap_err();
        assert!(matches!(err, ReactiveError::ConfigParse(_)));
    }

    #[test]
    fn round_trips_through_json() {
        let config = Config {
            gc_interval_ms: 50,
            max_settle_rounds: 8,
            flush_delay_ms: 2,
            max_diagnostics: 16,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }
}
