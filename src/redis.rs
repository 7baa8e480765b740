//! Redis-backed store over a managed async connection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::store::StoreBackend;

/// Redis implementation of [`StoreBackend`].
///
/// Holds a [`ConnectionManager`], which multiplexes and reconnects under the
/// hood; each operation clones it, so `RedisStore` itself is cheap to clone
/// and share.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    connected: Arc<AtomicBool>,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connects to Redis at `url` (e.g. `redis://127.0.0.1:6379`).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the URL is invalid or the initial
    /// connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(StoreError::Connection)?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(StoreError::Connection)?;

        Ok(Self {
            conn,
            connected: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Folds an operation result into the live connection flag.
    ///
    /// Connection-class failures flip the flag to false; any success flips it
    /// back to true, so status tracks the transport rather than latching.
    fn observe<T>(&self, result: Result<T, redis::RedisError>) -> Result<T, StoreError> {
        match result {
            Ok(value) => {
                self.connected.store(true, Ordering::Relaxed);
                Ok(value)
            }
            Err(e) => {
                let err = StoreError::from_redis(e);
                if err.is_connection() {
                    self.connected.store(false, Ordering::Relaxed);
                }
                Err(err)
            }
        }
    }
}

#[async_trait]
impl StoreBackend for RedisStore {
    #[instrument(skip(self), fields(store.operation = "GET"))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let reply = self.observe(conn.get::<_, Option<String>>(key).await)?;

        debug!(store.key = %key, store.found = reply.is_some(), "GET");

        Ok(reply)
    }

    #[instrument(skip(self, payload), fields(store.operation = "SET"))]
    async fn set(&self, key: &str, payload: String) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.observe(conn.set::<_, _, ()>(key, payload).await)?;

        debug!(store.key = %key, "SET");

        Ok(())
    }

    #[instrument(skip(self), fields(store.operation = "DEL"))]
    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.observe(conn.del::<_, ()>(key).await)?;

        debug!(store.key = %key, "DEL");

        Ok(())
    }

    /// Lists keys with a SCAN loop rather than the blocking KEYS command.
    #[instrument(skip(self), fields(store.operation = "SCAN"))]
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut found = Vec::new();

        loop {
            let reply: Result<(u64, Vec<String>), _> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await;
            let (next_cursor, mut keys) = self.observe(reply)?;

            found.append(&mut keys);
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(store.pattern = %pattern, store.matches = found.len(), "SCAN complete");

        Ok(found)
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}
