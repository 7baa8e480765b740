//! Typed store client.
//!
//! Wraps a [`StoreBackend`] with JSON encoding, key prefixing, and the
//! operation deadline from [`CacheConfig`].

use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::CacheConfig;
use crate::error::StoreError;
use crate::redis::RedisStore;
use crate::store::{Status, StoreBackend};

/// Result of a single-key lookup.
///
/// `found == false` means the key was absent; `data` is then the type's
/// default value, never a null-like placeholder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stored<T> {
    pub found: bool,
    pub data: T,
}

/// Result of a prefix listing. `found == false` iff no key matched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredKeys {
    pub found: bool,
    pub keys: Vec<String>,
}

/// Client for a key-value store holding JSON values.
///
/// Cheap to clone; clones share the same backend connection.
#[derive(Clone)]
pub struct Client {
    store: Arc<dyn StoreBackend>,
    config: CacheConfig,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.config.url)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Connects to Redis at `url` with default configuration.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the URL is invalid or the
    /// connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        Self::with_config(CacheConfig::for_url(url)).await
    }

    /// Connects to Redis using the endpoint and settings in `config`.
    pub async fn with_config(config: CacheConfig) -> Result<Self, StoreError> {
        let store = RedisStore::connect(&config.url).await?;

        Ok(Self {
            store: Arc::new(store),
            config,
        })
    }

    /// Builds a client over an injected backend.
    ///
    /// This is how tests run against [`crate::MemoryStore`] instead of a live
    /// Redis.
    pub fn with_store(store: impl StoreBackend + 'static, config: CacheConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    /// Current connection status, from in-memory state.
    pub fn status(&self) -> Status {
        Status {
            connected: self.store.connected(),
            endpoint: self.config.url.clone(),
        }
    }

    /// Stores `value` as JSON under `key`, overwriting any previous entry.
    ///
    /// If `value` serializes to a JSON object, a `"key"` field holding `key`
    /// is added to the stored form so entries are self-describing. The
    /// caller's value is never modified; the injection happens on the
    /// serialized copy. Arrays and scalars are stored verbatim.
    #[instrument(skip(self, value), fields(cache.operation = "SET"))]
    pub async fn set_key<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let payload = encode_entry(key, value)?;
        let full_key = self.config.prefixed_key(key);

        self.deadline(self.store.set(&full_key, payload)).await?;

        debug!(cache.key = %key, "cache set");

        Ok(())
    }

    /// Fetches and decodes the entry under `key`.
    ///
    /// An absent key yields `found == false` with `T::default()` as data. A
    /// present but unparsable payload is `StoreError::Decode`, not a miss.
    #[instrument(skip(self), fields(cache.operation = "GET"))]
    pub async fn get_by_key<T>(&self, key: &str) -> Result<Stored<T>, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        let full_key = self.config.prefixed_key(key);
        let reply = self.deadline(self.store.get(&full_key)).await?;

        match reply {
            Some(raw) => {
                let data = serde_json::from_str(&raw).map_err(|source| StoreError::Decode {
                    key: key.to_string(),
                    source,
                })?;
                debug!(cache.key = %key, "cache hit");
                Ok(Stored { found: true, data })
            }
            None => {
                debug!(cache.key = %key, "cache miss");
                Ok(Stored {
                    found: false,
                    data: T::default(),
                })
            }
        }
    }

    /// Fetches several keys concurrently, preserving input order.
    ///
    /// Misses appear as `found == false` elements so callers can filter. Zero
    /// keys resolves to an empty vec without touching the store. The whole
    /// call fails on the first per-key error.
    #[instrument(skip(self), fields(cache.operation = "MGET", cache.keys = keys.len()))]
    pub async fn get_by_keys<T>(&self, keys: &[&str]) -> Result<Vec<Stored<T>>, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        try_join_all(keys.iter().map(|key| self.get_by_key::<T>(key))).await
    }

    /// Lists all stored keys starting with `prefix`.
    ///
    /// An empty prefix lists every key. A prefix not already ending in a glob
    /// metacharacter gets `*` appended, so plain strings behave as prefixes.
    #[instrument(skip(self), fields(cache.operation = "KEYS"))]
    pub async fn get_keys(&self, prefix: &str) -> Result<StoredKeys, StoreError> {
        let pattern = match prefix {
            "" => "*".to_string(),
            p if p.ends_with('*') || p.ends_with('?') => p.to_string(),
            p => format!("{p}*"),
        };
        let full_pattern = self.config.prefixed_key(&pattern);

        let mut keys = self.deadline(self.store.keys(&full_pattern)).await?;

        // report logical keys, without the configured prefix
        if let Some(prefix) = &self.config.key_prefix {
            let stored_prefix = format!("{prefix}:");
            keys = keys
                .into_iter()
                .map(|k| {
                    k.strip_prefix(&stored_prefix)
                        .map(str::to_string)
                        .unwrap_or(k)
                })
                .collect();
        }

        debug!(cache.prefix = %prefix, cache.matches = keys.len(), "keys listed");

        Ok(StoredKeys {
            found: !keys.is_empty(),
            keys,
        })
    }

    /// Removes the entry under `key`. Deleting an absent key is not an error.
    #[instrument(skip(self), fields(cache.operation = "DEL"))]
    pub async fn delete_key(&self, key: &str) -> Result<(), StoreError> {
        let full_key = self.config.prefixed_key(key);

        self.deadline(self.store.delete(&full_key)).await?;

        debug!(cache.key = %key, "cache entry deleted");

        Ok(())
    }

    /// Applies the configured operation deadline, if any.
    pub(crate) async fn deadline<T>(
        &self,
        op: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        match self.config.op_timeout {
            Some(limit) => tokio::time::timeout(limit, op)
                .await
                .map_err(|_| StoreError::Timeout(limit))?,
            None => op.await,
        }
    }
}

/// Serializes `value`, injecting `key` into object-shaped entries.
///
/// Pure transform: works on the serialized form, never on the caller's value.
fn encode_entry<T: Serialize>(key: &str, value: &T) -> Result<String, StoreError> {
    let mut json = serde_json::to_value(value).map_err(StoreError::Encode)?;

    if let serde_json::Value::Object(fields) = &mut json {
        fields.insert(
            "key".to_string(),
            serde_json::Value::String(key.to_string()),
        );
    }

    serde_json::to_string(&json).map_err(StoreError::Encode)
}
