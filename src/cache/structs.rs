use anyhow::Result;
use log::debug;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::clock::{Clock, SystemClock};

struct Entry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

/// In-memory cache where every entry expires after its own time-to-live
pub struct TtlCache<K, V> {
    entries: HashMap<K, Entry<V>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// Create a cache backed by the system clock
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
            clock,
        }
    }

    /// Fresh value for `key`; expired entries are evicted on access
    pub fn get(&mut self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let fresh = self.entries.get(key).map(|entry| entry.is_fresh(now))?;

        if fresh {
            self.entries.get(key).map(|entry| entry.value.clone())
        } else {
            debug!("Cache entry expired");
            self.entries.remove(key);
            None
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        let ttl = self.default_ttl;
        self.insert_with_ttl(key, value, ttl);
    }

    pub fn insert_with_ttl(&mut self, key: K, value: V, ttl: Duration) {
        let entry = Entry {
            value,
            stored_at: self.clock.now(),
            ttl,
        };
        self.entries.insert(key, entry);
    }

    /// Return the cached value or compute, store and return a new one.
    /// A failing loader leaves the cache untouched.
    pub fn get_or_try_insert_with<F>(&mut self, key: K, load: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = load()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&mut self, key: &K) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn cache_with_clock(ttl_secs: u64) -> (TtlCache<&'static str, u32>, ManualClock) {
        let clock = ManualClock::new();
        let cache = TtlCache::with_clock(Duration::from_secs(ttl_secs), Arc::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn test_value_is_served_until_ttl_elapses() {
        let (mut cache, clock) = cache_with_clock(300);
        cache.insert("venues", 7);

        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get(&"venues"), Some(7));

        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(&"venues"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_drops_entry() {
        let (mut cache, _clock) = cache_with_clock(300);
        cache.insert("venues", 7);
        cache.invalidate(&"venues");
        assert_eq!(cache.get(&"venues"), None);
    }

    #[test]
    fn test_loader_runs_once_while_fresh() {
        let (mut cache, clock) = cache_with_clock(300);
        let mut calls = 0;

        for _ in 0..3 {
            let value = cache
                .get_or_try_insert_with("venues", || {
                    calls += 1;
                    Ok(42)
                })
                .unwrap();
            assert_eq!(value, 42);
        }
        assert_eq!(calls, 1);

        clock.advance(Duration::from_secs(301));
        cache
            .get_or_try_insert_with("venues", || {
                calls += 1;
                Ok(43)
            })
            .unwrap();
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let (mut cache, _clock) = cache_with_clock(300);
        let result = cache.get_or_try_insert_with("venues", || anyhow::bail!("unreadable"));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_per_entry_ttl() {
        let (mut cache, clock) = cache_with_clock(300);
        cache.insert_with_ttl("short", 1, Duration::from_secs(10));
        cache.insert("long", 2);

        clock.advance(Duration::from_secs(11));
        assert_eq!(cache.get(&"short"), None);
        assert_eq!(cache.get(&"long"), Some(2));
    }
}
