//! In-process store backend.
//!
//! A hash-map stand-in for Redis, mainly useful for tests and embedding
//! without a live store. Implements the same glob subset the client relies on
//! (`*` and `?`).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::store::StoreBackend;

/// In-memory implementation of [`StoreBackend`].
///
/// Clones share the same underlying map, so a test can hold one handle while
/// the client under test holds another.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    ops: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of backend operations issued so far.
    ///
    /// Lets tests assert that an operation short-circuited without touching
    /// the store at all.
    pub fn op_count(&self) -> usize {
        self.ops.load(Ordering::Relaxed)
    }

    fn record_op(&self) {
        self.ops.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.record_op();
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, payload: String) -> Result<(), StoreError> {
        self.record_op();
        self.entries.lock().await.insert(key.to_string(), payload);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.record_op();
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        self.record_op();
        let entries = self.entries.lock().await;
        let mut matches: Vec<String> = entries
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();
        matches.sort();
        Ok(matches)
    }

    fn connected(&self) -> bool {
        true
    }
}

/// Matches `text` against a glob `pattern` supporting `*` and `?`.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < txt.len() {
        if p < pat.len() && (pat[p] == '?' || pat[p] == txt[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            // backtrack: let the last * swallow one more character
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_literal_and_star() {
        assert!(glob_match("user:*", "user:42"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("user:42", "user:42"));
        assert!(!glob_match("user:*", "session:42"));
    }

    #[test]
    fn test_glob_question_mark() {
        assert!(glob_match("k?y", "key"));
        assert!(!glob_match("k?y", "keey"));
    }

    #[test]
    fn test_glob_star_backtracking() {
        assert!(glob_match("a*b*c", "aXbYbZc"));
        assert!(!glob_match("a*b*c", "aXbYb"));
    }

    #[tokio::test]
    async fn test_shared_handles_see_same_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("k", "\"v\"".to_string()).await.unwrap();
        assert_eq!(other.get("k").await.unwrap(), Some("\"v\"".to_string()));
    }
}
