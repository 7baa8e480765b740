//! # lazykv
//!
//! Lazy read-through caching over Redis with JSON values.
//!
//! This crate provides:
//! - A typed async client over a key-value store (get, set, delete, list by prefix)
//! - The lazy-cache protocol: serve cached data immediately, refresh it in the
//!   background, and only block the caller on a genuine miss
//! - A pluggable [`StoreBackend`] seam with Redis and in-memory implementations
//! - Configuration from explicit values or environment variables
//!
//! # Example
//!
//! ```ignore
//! use lazykv::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lazykv::StoreError> {
//!     let client = Client::connect("redis://127.0.0.1:6379").await?;
//!
//!     // Serve from cache, falling back to the producer on a miss.
//!     let report: Report = client
//!         .lazy_cache("report:today", || async { build_report().await })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Entries never expire on their own; deletion is explicit. The cache is
//! best-effort and eventually refreshed, not strongly consistent.

mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod redis;
pub mod store;

// Re-export commonly used types at crate root
pub use client::{Client, Stored, StoredKeys};
pub use config::CacheConfig;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use redis::RedisStore;
pub use store::{Status, StoreBackend};
