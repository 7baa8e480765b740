//! Store abstraction underneath the typed client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Connection status reported by [`crate::Client::status`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Whether the transport is currently believed healthy.
    pub connected: bool,
    /// The endpoint the client was constructed against.
    pub endpoint: String,
}

/// Raw key-value transport underneath [`crate::Client`].
///
/// Implementations move opaque text payloads; JSON encoding and key handling
/// happen a layer above. All operations are async and surface faults through
/// their result, never by panicking.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Fetches the raw payload stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `payload` under `key`, overwriting any previous entry.
    async fn set(&self, key: &str, payload: String) -> Result<(), StoreError>;

    /// Removes `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Lists all keys matching a glob `pattern`.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Transport health from in-memory state; never blocks.
    fn connected(&self) -> bool;
}
