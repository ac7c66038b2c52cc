//! In-memory response cache with time-to-live on read.
//!
//! Entries are few and short-lived, so the map is unbounded and only expired
//! entries are evicted, lazily, when they are looked up.

use crate::types::ApiPayload;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: ApiPayload,
    pub stored_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    /// Live payload for `key`; an expired entry is evicted and reported as a miss.
    pub fn get(&self, key: &str) -> Option<ApiPayload> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(self.ttl) => Some(entry.payload.clone()),
            Some(_) => {
                tracing::debug!("Cache expired for {}", key);
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Last write wins.
    pub fn put(&self, key: impl Into<String>, payload: ApiPayload) {
        let entry = CacheEntry { payload, stored_at: Instant::now() };
        self.lock().insert(key.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
