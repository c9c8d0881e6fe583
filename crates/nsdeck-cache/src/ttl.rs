use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::CacheResult;
use crate::traits::NsdeckStore;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
struct CacheEntry {
    value: Vec<u8>,
    written_at: Instant,
}

/// An in-process store whose entries expire a fixed time after they were
/// written.
///
/// Expired entries are dropped when read or by [`TtlCache::purge`];
/// there is no size bound. Concurrent writers to one key race and the last
/// write wins.
#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned map is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.duration_since(entry.written_at) < self.ttl
    }

    pub fn insert(&self, key: impl Into<String>, value: Vec<u8>) {
        let entry = CacheEntry {
            value,
            written_at: Instant::now(),
        };
        self.lock().insert(key.into(), entry);
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let mut entries = self.lock();

        match entries.get(key) {
            Some(entry) if self.is_fresh(entry, now) => Some(entry.value.clone()),
            Some(_) => {
                tracing::debug!("Cache entry '{}' expired.", key);
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn invalidate(&self, key: &str) {
        self.lock().remove(key);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| self.is_fresh(entry, now));
        before - entries.len()
    }

    /// Number of entries held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl NsdeckStore for TtlCache {
    async fn set_bytes(&self, key: String, value: Vec<u8>) -> CacheResult<()> {
        self.insert(key, value);
        Ok(())
    }

    async fn get_bytes(&self, key: String) -> CacheResult<Option<Vec<u8>>> {
        Ok(self.get(&key))
    }

    async fn remove(&self, key: String) -> CacheResult<()> {
        self.invalidate(&key);
        Ok(())
    }

    async fn clear_all(&self) -> CacheResult<()> {
        self.clear();
        Ok(())
    }

    async fn purge_expired(&self) -> CacheResult<usize> {
        Ok(self.purge())
    }
}
