use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

struct Slot<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Slot<V> {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// A concurrent map whose entries expire after a time-to-live.
///
/// Expired entries are never handed out: they are dropped when touched and reclaimed by
/// [`ExpiringStore::spawn_sweeper`]. Clones share the same map.
pub struct ExpiringStore<K, V> {
    entries: Arc<Mutex<HashMap<K, Slot<V>>>>,
    default_ttl: Duration,
}

impl<K, V> Clone for ExpiringStore<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            default_ttl: self.default_ttl,
        }
    }
}

impl<K, V> ExpiringStore<K, V>
where
    K: Eq + Hash + Send + 'static,
    V: Clone + Send + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(slot) if slot.is_live(now) => Some(slot.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.entries.lock().insert(key, Slot { value, expires_at });
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        self.entries
            .lock()
            .remove(key)
            .filter(|slot| slot.is_live(now))
            .map(|slot| slot.value)
    }

    /// Atomically reads the live value for `key` and optionally replaces it.
    ///
    /// `f` receives the live value (or `None`) and returns its result together with the
    /// replacement to store and that replacement's time-to-live. Returning `None` as the
    /// replacement leaves the stored entry untouched. No other caller can observe or
    /// modify the key while `f` runs, so `f` must not block.
    pub fn update<R, F>(&self, key: K, f: F) -> R
    where
        F: FnOnce(Option<V>) -> (R, Option<(V, Duration)>),
    {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let current = entries
            .get(&key)
            .filter(|slot| slot.is_live(now))
            .map(|slot| slot.value.clone());

        let (result, replacement) = f(current);
        if let Some((value, ttl)) = replacement {
            entries.insert(
                key,
                Slot {
                    value,
                    expires_at: now + ttl,
                },
            );
        }
        result
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, slot| slot.is_live(now));
        before - entries.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|slot| slot.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starts a background task purging expired entries every `every`.
    ///
    /// The task holds only a weak reference and ends once all handles to the store are gone.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let entries: Weak<Mutex<HashMap<K, Slot<V>>>> = Arc::downgrade(&self.entries);
        let default_ttl = self.default_ttl;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(entries) = entries.upgrade() else {
                    break;
                };
                let store = ExpiringStore {
                    entries,
                    default_ttl,
                };
                let purged = store.purge_expired();
                if purged > 0 {
                    let remaining = store.len();
                    tracing::debug!(purged, remaining, "expired cache entries swept");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_get_respects_ttl() {
        let store: ExpiringStore<&'static str, u32> = ExpiringStore::new(Duration::from_secs(5));
        store.set("a", 1);
        assert_eq!(store.get(&"a"), Some(1));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.get(&"a"), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_ttl_overrides_default() {
        let store: ExpiringStore<String, u32> = ExpiringStore::new(Duration::from_secs(60));
        store.set_with_ttl("short".to_string(), 1, Duration::from_secs(1));
        store.set("long".to_string(), 2);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get(&"short".to_string()), None);
        assert_eq!(store.get(&"long".to_string()), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_without_replacement_keeps_entry() {
        let store: ExpiringStore<u8, u32> = ExpiringStore::new(Duration::from_secs(10));
        store.set(1, 7);

        let seen = store.update(1, |current| (current, None));
        assert_eq!(seen, Some(7));
        assert_eq!(store.get(&1), Some(7));

        let seen = store.update(1, |current| {
            let next = current.unwrap_or(0) + 1;
            (next, Some((next, Duration::from_secs(10))))
        });
        assert_eq!(seen, 8);
        assert_eq!(store.get(&1), Some(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_hides_expired_value() {
        let store: ExpiringStore<u8, u32> = ExpiringStore::new(Duration::from_secs(1));
        store.set(1, 7);
        tokio::time::advance(Duration::from_secs(2)).await;

        let seen = store.update(1, |current| (current, None));
        assert_eq!(seen, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store: ExpiringStore<u8, u8> = ExpiringStore::new(Duration::from_secs(1));
        store.set(1, 1);
        store.set(2, 2);
        store.set_with_ttl(3, 3, Duration::from_secs(30));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.purge_expired(), 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.remove(&3), Some(3));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_reclaims_and_stops_with_store() {
        let store: ExpiringStore<u8, u8> = ExpiringStore::new(Duration::from_secs(1));
        let sweeper = store.spawn_sweeper(Duration::from_secs(5));
        store.set(1, 1);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(store.entries.lock().len(), 0);

        drop(store);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(sweeper.is_finished());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_are_not_lost() {
        let store: ExpiringStore<&'static str, u64> = ExpiringStore::new(Duration::from_secs(60));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..500 {
                    store.update("hits", |current| {
                        let next = current.unwrap_or(0) + 1;
                        ((), Some((next, Duration::from_secs(60))))
                    });
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.get(&"hits"), Some(4000));
    }
}
