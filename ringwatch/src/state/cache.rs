// ringwatch/src/state/cache.rs
//
// Owned TTL cache with a capacity bound.
//
// DashMap holds the entries; a parking_lot Mutex guards the insertion-order
// queue used for FIFO eviction once `capacity` is reached. Expired entries
// are dropped lazily on read and on `purge_expired`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::config::CacheConfig;

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct TtlCache<V: Clone> {
    entries: DashMap<String, CacheEntry<V>>,
    order: Mutex<VecDeque<String>>,
    capacity: usize,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.capacity, Duration::from_secs(config.ttl_secs))
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let hit = self.entries.get(key).map(|e| (e.expires_at > now, e.value.clone()));
        match hit {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                self.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let entry = CacheEntry { value, expires_at: Instant::now() + self.ttl };

        let mut order = self.order.lock();
        if self.entries.insert(key.clone(), entry).is_some() {
            order.retain(|k| k != &key);
        }
        order.push_back(key);

        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.order.lock().retain(|k| k != key);
        self.entries.remove(key).map(|(_, e)| e.value)
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.expires_at <= now)
            .map(|e| e.key().clone())
            .collect();
        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
