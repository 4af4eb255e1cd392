// Shared async LRU used by the store for hot user/post rows. Values are
// cloned out so the lock is never held across an await point.

use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

pub struct Cache<K, V> {
    inner: Mutex<LruCache<K, V>>,
}

impl<K: std::hash::Hash + Eq, V: Clone> Cache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Cache {
            inner: Mutex::new(LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap())),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().await.get(key).cloned()
    }

    pub async fn insert(&self, key: K, value: V) {
        self.inner.lock().await.put(key, value);
    }

    pub async fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().await.pop(key)
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }
}
