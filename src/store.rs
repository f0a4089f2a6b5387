//! In-memory versioned key-value store with last-writer-wins resolution.
//!
//! Entries are held in a `tokio::sync::RwLock<HashMap<...>>` map scoped to
//! one node process.  Every write carries a logical timestamp; a write only
//! lands if its timestamp is strictly newer than what the store already
//! holds for that key, so out-of-order replication deliveries converge to
//! the same final state on every node.
//!
//! There is no persistence: the store lives and dies with the process.

use std::collections::HashMap;

use tokio::sync::RwLock;

/// A stored value plus the logical timestamp of the write that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Opaque value bytes (UTF-8 string on the wire).
    pub value: String,
    /// Wall-clock timestamp assigned by the leader, fractional seconds.
    pub timestamp: f64,
}

/// Versioned in-memory key-value store.
///
/// Both the leader and follower roles own exactly one instance.  The
/// conflict rule is last-writer-wins by timestamp, with ties resolved in
/// favor of the existing entry so retransmitted writes are idempotent.
#[derive(Debug, Default)]
pub struct VersionedStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl VersionedStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the current value for `key`, if any.
    pub async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).map(|e| e.value.clone())
    }

    /// Return the full entry (value + timestamp) for `key`, if any.
    pub async fn get_entry(&self, key: &str) -> Option<Entry> {
        self.entries.read().await.get(key).cloned()
    }

    /// Apply a write if it is newer than the stored entry.
    ///
    /// The write lands only when no entry exists for `key` or `timestamp`
    /// is strictly greater than the stored timestamp.  An equal timestamp
    /// is a no-op, which makes redelivery of the same replication request
    /// idempotent.  Returns whether the write was applied.
    ///
    /// The read-compare-write runs under a single write lock, so two
    /// concurrent `set` calls can never apply out of timestamp order and a
    /// concurrent [`snapshot`](Self::snapshot) can never observe a value
    /// without its paired timestamp.
    pub async fn set(&self, key: &str, value: &str, timestamp: f64) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(existing) if existing.timestamp >= timestamp => false,
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: value.to_string(),
                        timestamp,
                    },
                );
                true
            }
        }
    }

    /// Check whether `key` currently has an entry.
    pub async fn exists(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Point-in-time copy of all keys and their current values.
    ///
    /// The copy is taken under the read lock and is not kept consistent
    /// with later mutations.
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect()
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = VersionedStore::new();
        assert_eq!(store.get("missing").await, None);
        assert!(!store.exists("missing").await);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = VersionedStore::new();
        assert!(store.set("k", "v", 1.0).await);
        assert_eq!(store.get("k").await, Some("v".to_string()));
        assert!(store.exists("k").await);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_newer_write_wins() {
        let store = VersionedStore::new();
        assert!(store.set("k", "old", 1.0).await);
        assert!(store.set("k", "new", 2.0).await);
        assert_eq!(store.get("k").await, Some("new".to_string()));
    }

    #[tokio::test]
    async fn test_stale_write_discarded() {
        let store = VersionedStore::new();
        assert!(store.set("k", "current", 5.0).await);
        assert!(!store.set("k", "stale", 3.0).await);
        assert_eq!(store.get("k").await, Some("current".to_string()));
        let entry = store.get_entry("k").await.unwrap();
        assert_eq!(entry.timestamp, 5.0);
    }

    #[tokio::test]
    async fn test_equal_timestamp_is_noop() {
        let store = VersionedStore::new();
        assert!(store.set("k", "first", 1.5).await);
        assert!(!store.set("k", "retransmit", 1.5).await);
        assert_eq!(store.get("k").await, Some("first".to_string()));
    }

    #[tokio::test]
    async fn test_idempotent_redelivery() {
        let store = VersionedStore::new();
        store.set("k", "v", 2.0).await;
        let before = store.get_entry("k").await;
        // Delivering the exact same tuple again must not change anything.
        assert!(!store.set("k", "v", 2.0).await);
        assert_eq!(store.get_entry("k").await, before);
    }

    #[tokio::test]
    async fn test_snapshot_is_point_in_time() {
        let store = VersionedStore::new();
        store.set("a", "1", 1.0).await;
        store.set("b", "2", 1.0).await;

        let snap = store.snapshot().await;
        store.set("c", "3", 1.0).await;

        assert_eq!(snap.len(), 2);
        assert_eq!(snap.get("a"), Some(&"1".to_string()));
        assert!(!snap.contains_key("c"));
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_concurrent_sets_converge() {
        let store = Arc::new(VersionedStore::new());

        let mut handles = Vec::new();
        for t in 1..=50u32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set("k", &format!("v{t}"), f64::from(t)).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        // Regardless of interleaving, the highest timestamp must win.
        let entry = store.get_entry("k").await.unwrap();
        assert_eq!(entry.timestamp, 50.0);
        assert_eq!(entry.value, "v50");
    }

    #[tokio::test]
    async fn test_snapshot_during_concurrent_writes() {
        let store = Arc::new(VersionedStore::new());

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for t in 1..=100u32 {
                    store.set("k", &format!("v{t}"), f64::from(t)).await;
                }
            })
        };

        for _ in 0..20 {
            let snap = store.snapshot().await;
            // A snapshot either has no entry yet or a complete one whose
            // value matches a timestamp the writer actually produced.
            if let Some(v) = snap.get("k") {
                assert!(v.starts_with('v'));
                let entry = store.get_entry("k").await.unwrap();
                assert!(entry.timestamp >= 1.0);
            }
            tokio::task::yield_now().await;
        }

        writer.await.unwrap();
        assert_eq!(store.get("k").await, Some("v100".to_string()));
    }
}
