//! In-memory session maps with an idle timeout and a size cap.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

struct Slot<V> {
    value: V,
    last_seen: Instant,
}

/// Sessions keyed by `K`. Entries idle longer than `ttl` are dropped on
/// access or on `sweep`; once `capacity` is reached the least recently
/// used entry makes room for a new one.
pub struct SessionMap<K, V> {
    entries: RwLock<HashMap<K, Slot<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<K, V> SessionMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub async fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now()).await
    }

    /// Live entry for `key`; marks it as used
    pub async fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now()).await
    }

    /// Apply `f` to a live entry. Returns false when there is none.
    pub async fn update(&self, key: &K, f: impl FnOnce(&mut V)) -> bool {
        let now = Instant::now();
        if self.get_at(key, now).await.is_none() {
            return false;
        }
        match self.entries.write().await.get_mut(key) {
            Some(slot) => {
                f(&mut slot.value);
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, key: &K) -> Option<V> {
        self.entries.write().await.remove(key).map(|slot| slot.value)
    }

    /// Entries currently held, expired ones included until the next sweep
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Drop idle entries. Returns how many went.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Instant::now()).await
    }

    fn expired(&self, slot: &Slot<V>, now: Instant) -> bool {
        now.saturating_duration_since(slot.last_seen) > self.ttl
    }

    async fn insert_at(&self, key: K, value: V, now: Instant) {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            entries.retain(|_, slot| !self.expired(slot, now));
            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, slot)| slot.last_seen)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                    tracing::debug!(capacity = self.capacity, "session map full, dropped oldest entry");
                }
            }
        }
        entries.insert(
            key,
            Slot {
                value,
                last_seen: now,
            },
        );
    }

    async fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut entries = self.entries.write().await;
        let expired = self.expired(entries.get(key)?, now);
        if expired {
            entries.remove(key);
            return None;
        }
        let slot = entries.get_mut(key)?;
        slot.last_seen = now;
        Some(slot.value.clone())
    }

    async fn sweep_at(&self, now: Instant) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, slot| !self.expired(slot, now));
        before - entries.len()
    }
}
