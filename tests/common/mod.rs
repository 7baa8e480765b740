use lazykv::{CacheConfig, Client, MemoryStore};
use serde::{Deserialize, Serialize};

/// Record shape used across the store tests.
///
/// The `key` field is filled in by the client on write, so a round trip
/// through the store makes entries self-describing.
#[allow(dead_code)]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    #[serde(default)]
    pub key: String,
    pub name: String,
    pub count: i32,
}

#[allow(dead_code)]
pub fn record(name: &str, count: i32) -> TestRecord {
    TestRecord {
        key: String::new(),
        name: name.to_string(),
        count,
    }
}

/// Client over an in-memory backend, plus a second handle onto the same
/// backend for direct inspection.
#[allow(dead_code)]
pub fn memory_client() -> (Client, MemoryStore) {
    let store = MemoryStore::new();
    let client = Client::with_store(store.clone(), CacheConfig::for_url("memory://test"));
    (client, store)
}
