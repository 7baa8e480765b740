//! Lazy read-through caching.
//!
//! The protocol: serve whatever the store already holds and refresh it behind
//! the caller's back; only a miss makes the caller wait for fresh data.

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::client::Client;
use crate::error::StoreError;

impl Client {
    /// Returns the value cached under `key`, falling back to `producer`.
    ///
    /// On a **hit** the cached (possibly stale) value is returned
    /// immediately; the producer then runs on a spawned task and overwrites
    /// the entry with the fresh value. That refresh is not awaited and is
    /// unordered relative to the caller observing its value. Producer or
    /// write failures on this path are logged at `warn` and never reach the
    /// caller.
    ///
    /// On a **miss** the producer is awaited, its result is written to the
    /// store, and the fresh value is returned. Producer failure surfaces as
    /// `StoreError::Producer`; a failed write surfaces as its own error.
    ///
    /// Concurrent calls on the same key are not coordinated: two overlapping
    /// misses each run their producer and race to write, last writer wins.
    pub async fn lazy_cache<T, F, Fut>(&self, key: &str, producer: F) -> Result<T, StoreError>
    where
        T: Serialize + DeserializeOwned + Default + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let cached = self.get_by_key::<T>(key).await?;

        if cached.found {
            debug!(cache.key = %key, "lazy cache hit, refreshing in background");

            let client = self.clone();
            let key = key.to_string();
            let refresh = producer();
            tokio::spawn(async move {
                match refresh.await {
                    Ok(fresh) => {
                        if let Err(error) = client.set_key(&key, &fresh).await {
                            warn!(cache.key = %key, %error, "background refresh write failed");
                        }
                    }
                    Err(error) => {
                        warn!(cache.key = %key, %error, "background refresh producer failed");
                    }
                }
            });

            return Ok(cached.data);
        }

        debug!(cache.key = %key, "lazy cache miss, producing");

        let fresh = producer().await.map_err(StoreError::Producer)?;
        self.set_key(key, &fresh).await?;

        Ok(fresh)
    }
}
