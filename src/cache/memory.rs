//! Bounded in-process tier of the ownership cache.
//!
//! Purely a performance layer in front of the durable table: entries
//! expire on a short TTL and the oldest insertion is evicted once the
//! count bound is hit. Correctness never depends on a hit here.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::models::OwnershipRecord;

/// Default bound on cached executions.
pub const DEFAULT_CAPACITY: usize = 200;

/// Default lifetime of a fast-tier entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct CacheEntry {
    record: OwnershipRecord,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(record: OwnershipRecord, ttl: Duration) -> Self {
        Self {
            record,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn get(&self) -> Option<OwnershipRecord> {
        if self.is_expired() {
            None
        } else {
            Some(self.record.clone())
        }
    }
}

struct Inner {
    entries: HashMap<String, CacheEntry>,
    /// Insertion order of keys, oldest first. Superseding an existing key
    /// keeps its original position.
    order: VecDeque<String>,
}

/// In-memory ownership tier with count and TTL bounds.
pub struct MemoryTier {
    inner: RwLock<Inner>,
    capacity: usize,
    ttl: Duration,
}

impl MemoryTier {
    /// Create a tier with default bounds.
    pub fn new() -> Self {
        Self::with_bounds(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// Create a tier with custom bounds.
    pub fn with_bounds(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
            ttl,
        }
    }

    /// Get a cached record, or None if expired/missing.
    pub fn get(&self, execution_id: &str) -> Option<OwnershipRecord> {
        self.inner
            .read()
            .ok()
            .and_then(|guard| guard.entries.get(execution_id).and_then(|e| e.get()))
    }

    /// Insert a record, evicting the oldest insertions past the count
    /// bound.
    pub fn insert(&self, record: OwnershipRecord) {
        if let Ok(mut guard) = self.inner.write() {
            let key = record.execution_id.clone();
            if !guard.entries.contains_key(&key) {
                guard.order.push_back(key.clone());
            }
            guard.entries.insert(key, CacheEntry::new(record, self.ttl));
            while guard.entries.len() > self.capacity {
                match guard.order.pop_front() {
                    Some(oldest) => {
                        guard.entries.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.read().map(|guard| guard.entries.len()).unwrap_or(0)
    }
}

impl Default for MemoryTier {
    fn default() -> Self {
        Self::new()
    }
}
