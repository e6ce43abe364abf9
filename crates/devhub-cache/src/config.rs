//! Cache configuration.
//!
//! Connection settings and cache policy are read from environment variables.

use std::env;
use std::time::Duration;

/// Default time-to-live for list and detail payloads (one hour).
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// Default bound on a single store round trip.
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Cache configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
/// - `CACHE_TTL_SECONDS`: Default TTL for cached payloads in seconds (default: `3600`)
/// - `CACHE_PREFIX`: Namespace prepended to every key (default: none)
/// - `CACHE_TIMEOUT_MS`: Per-operation store timeout in milliseconds (default: `500`)
/// - `CACHE_ENABLED`: Set to `false` or `0` to turn caching off (default: `true`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Redis connection URL.
    pub redis_url: String,

    /// Default time-to-live for cached payloads in seconds.
    pub default_ttl_seconds: u64,

    /// Optional namespace so several deployments can share one Redis.
    pub key_prefix: Option<String>,

    /// Upper bound on a single store round trip in milliseconds.
    pub timeout_ms: u64,

    /// When `false` every read misses and every write is dropped.
    pub enabled: bool,
}

impl CacheConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable numbers fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            default_ttl_seconds: lookup("CACHE_TTL_SECONDS")
                .and_then(|v| v.parse().ok())
                .filter(|ttl| *ttl > 0)
                .unwrap_or(defaults.default_ttl_seconds),
            key_prefix: lookup("CACHE_PREFIX")
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty()),
            timeout_ms: lookup("CACHE_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.timeout_ms),
            enabled: lookup("CACHE_ENABLED")
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off"))
                .unwrap_or(defaults.enabled),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.into(),
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
            key_prefix: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> CacheConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CacheConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]);
        assert_eq!(config, CacheConfig::default());
        assert_eq!(config.default_ttl(), Duration::from_secs(3600));
        assert_eq!(config.timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_values_are_read() {
        let config = config_from(&[
            ("REDIS_URL", "redis://cache:6380/2"),
            ("CACHE_TTL_SECONDS", "120"),
            ("CACHE_PREFIX", "devhub"),
            ("CACHE_TIMEOUT_MS", "50"),
            ("CACHE_ENABLED", "false"),
        ]);

        assert_eq!(config.redis_url, "redis://cache:6380/2");
        assert_eq!(config.default_ttl_seconds, 120);
        assert_eq!(config.key_prefix.as_deref(), Some("devhub"));
        assert_eq!(config.timeout_ms, 50);
        assert!(!config.enabled);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("CACHE_TTL_SECONDS", "soon"),
            ("CACHE_TIMEOUT_MS", "0"),
            ("CACHE_PREFIX", "   "),
            ("CACHE_ENABLED", "yes"),
        ]);

        assert_eq!(config.default_ttl_seconds, DEFAULT_TTL_SECONDS);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.key_prefix, None);
        assert!(config.enabled);
    }
}
