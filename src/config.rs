//! Cache configuration.
//!
//! Settings may be passed directly at construction or loaded from environment
//! variables as a convenience.

use std::env;
use std::time::Duration;

/// Configuration for a [`crate::Client`].
///
/// # Environment Variables
///
/// - `REDIS_URL`: Redis connection URL (default: `redis://127.0.0.1:6379`)
/// - `CACHE_PREFIX`: prefix prepended to every key (default: none)
/// - `CACHE_TIMEOUT_MS`: per-operation deadline in milliseconds (default: none)
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Redis connection URL.
    pub url: String,

    /// Optional prefix for all keys to avoid collisions with other store users.
    pub key_prefix: Option<String>,

    /// Optional deadline applied to every store operation.
    pub op_timeout: Option<Duration>,
}

impl CacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
            key_prefix: env::var("CACHE_PREFIX").ok().filter(|p| !p.is_empty()),
            op_timeout: env::var("CACHE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis),
        }
    }

    /// Configuration for an explicit endpoint with no prefix and no deadline.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Build the full store key for a logical key.
    ///
    /// # Example
    ///
    /// ```
    /// use lazykv::CacheConfig;
    ///
    /// let mut config = CacheConfig::default();
    /// config.key_prefix = Some("app".into());
    /// assert_eq!(config.prefixed_key("user:1"), "app:user:1");
    /// ```
    pub fn prefixed_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{prefix}:{key}"),
            None => key.to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".into(),
            key_prefix: None,
            op_timeout: None,
        }
    }
}
