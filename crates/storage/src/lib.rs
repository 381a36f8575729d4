//! A read-oriented cache of items the host has already seen, keyed by
//! unsigned ID. `find_process` (`spec.md` §4.7) is the core's only reader;
//! the rest of the host is responsible for populating it as messages arrive.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::RwLock;
use poda_bundle::Item;
use tracing::debug;

const DEFAULT_CACHE_SIZE: usize = 1024;

/// In-memory LRU cache standing in for the `ao_cache` collaborator
/// (`spec.md` §6, `read_message`). A real host backs this with persistent
/// storage; the device only ever needs read-through lookups by ID. The lock
/// guards a synchronous, in-memory map only — no I/O happens inside the
/// critical section, so `parking_lot::RwLock` rather than `tokio::sync`.
#[derive(Debug)]
pub struct ProcessCache {
    messages: RwLock<LruCache<[u8; 32], Item>>,
}

impl ProcessCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            messages: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Mirrors the collaborator contract `read_message(store, id) -> Item |
    /// not_found`: a miss is not an error, just `None`.
    pub async fn read_message(&self, id: &[u8; 32]) -> Option<Item> {
        let mut messages = self.messages.write();
        let hit = messages.get(id).cloned();
        debug!(id = %hex_prefix(id), hit = hit.is_some(), "cache lookup");
        hit
    }

    pub async fn insert(&self, id: [u8; 32], item: Item) {
        let mut messages = self.messages.write();
        debug!(id = %hex_prefix(&id), "cache insert");
        messages.put(id, item);
    }
}

fn hex_prefix(id: &[u8; 32]) -> String {
    id[..4].iter().map(|byte| format!("{byte:02x}")).collect()
}

impl Default for ProcessCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use poda_bundle::ItemData;

    use super::*;

    #[tokio::test]
    async fn miss_returns_none() {
        let cache = ProcessCache::new();
        assert!(cache.read_message(&[0u8; 32]).await.is_none());
    }

    #[tokio::test]
    async fn insert_then_read_hits() {
        let cache = ProcessCache::new();
        let item = Item::new(ItemData::Bytes(b"definition".to_vec()));
        let id = item.unsigned_id();
        cache.insert(id, item.clone()).await;

        assert_eq!(cache.read_message(&id).await, Some(item));
    }

    #[tokio::test]
    async fn eviction_drops_oldest_entry() {
        let cache = ProcessCache::with_capacity(1);
        let first = Item::new(ItemData::Bytes(b"first".to_vec()));
        let second = Item::new(ItemData::Bytes(b"second".to_vec()));
        let first_id = first.unsigned_id();
        let second_id = second.unsigned_id();

        cache.insert(first_id, first).await;
        cache.insert(second_id, second).await;

        assert!(cache.read_message(&first_id).await.is_none());
        assert!(cache.read_message(&second_id).await.is_some());
    }
}
