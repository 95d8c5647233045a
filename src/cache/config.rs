//! Document cache configuration.

use time::Duration;

const DEFAULT_TTL_MINUTES: i64 = 60;

/// Runtime view of `[cache]` settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a cached document stays valid after it was built.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(DEFAULT_TTL_MINUTES),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            ttl: Duration::minutes(i64::from(settings.ttl_minutes.get())),
        }
    }
}
