//! Error types for store and cache operations.

use std::time::Duration;

/// Error type for store and cache operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The transport could not be established, was refused, or was lost
    /// mid-operation.
    #[error("redis connection error: {0}")]
    Connection(#[source] redis::RedisError),

    /// The store rejected a command at the protocol level.
    #[error("redis command error: {0}")]
    Store(#[source] redis::RedisError),

    /// The value could not be serialized for storage.
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),

    /// A stored payload could not be parsed back into the expected shape.
    #[error("failed to decode stored payload for key `{key}`: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The fallback producer failed on the cache-miss path.
    #[error("producer failed: {0}")]
    Producer(#[source] anyhow::Error),

    /// The operation exceeded the configured deadline.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
}

impl StoreError {
    /// Splits a redis error into the connection-level or command-level variant.
    pub(crate) fn from_redis(err: redis::RedisError) -> Self {
        if err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_io_error()
            || err.is_timeout()
        {
            StoreError::Connection(err)
        } else {
            StoreError::Store(err)
        }
    }

    /// True for failures that indicate the transport itself is unhealthy.
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_) | StoreError::Timeout(_))
    }
}
