//! Warning cache - bounded TTL memo for conflict-detection results.
//!
//! List queries recompute all-pairs conflicts on every read, so results are
//! memoized per query shape. Entries expire after a fixed TTL and are evicted
//! lazily on lookup. Callers must `invalidate()` after any write that could
//! change a conflict outcome.
//!
//! Values are copied on the way in and on the way out; the cache never shares
//! storage with its callers.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};

use crate::config::CacheConfig;
use crate::conflict::Conflict;
use crate::window::{PeriodKind, TimeInterval};

/// Source of "now" for expiry decisions.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// The full shape of a warnings query, as seen by orchestration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningQuery {
    pub principal_id: String,
    pub is_admin: bool,
    pub participant_filter: Vec<String>,
    pub period: PeriodKind,
    pub reference: DateTime<FixedOffset>,
    pub window: TimeInterval,
}

/// Normalized cache key: participant filter sorted and deduplicated, instants in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    principal_id: String,
    is_admin: bool,
    participants: Vec<String>,
    period: PeriodKind,
    reference: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
}

impl CacheKey {
    pub fn new(query: &WarningQuery) -> Self {
        let mut participants = query.participant_filter.clone();
        participants.sort();
        participants.dedup();

        Self {
            principal_id: query.principal_id.clone(),
            is_admin: query.is_admin,
            participants,
            period: query.period,
            reference: query.reference.with_timezone(&Utc),
            window_start: query.window.start.with_timezone(&Utc),
            window_end: query.window.end.with_timezone(&Utc),
        }
    }
}

impl From<&WarningQuery> for CacheKey {
    fn from(query: &WarningQuery) -> Self {
        CacheKey::new(query)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:[{}]:{}@{}:{}..{}",
            self.principal_id,
            if self.is_admin { "admin" } else { "user" },
            self.participants.join(","),
            self.period,
            self.reference.timestamp(),
            self.window_start.timestamp(),
            self.window_end.timestamp()
        )
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    warnings: Vec<Conflict>,
    expires_at: DateTime<Utc>,
}

/// Thread-safe, bounded, TTL-expiring store of conflict warnings.
///
/// Reads share a lock; store, eviction and invalidation take it exclusively.
/// Concurrent stores to the same key are last-write-wins.
pub struct WarningCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: TimeDelta,
    capacity: usize,
    clock: Clock,
}

impl WarningCache {
    /// A cache driven by the system clock.
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self::with_clock(ttl, capacity, Utc::now)
    }

    /// A cache driven by an injected clock.
    pub fn with_clock<F>(ttl: Duration, capacity: usize, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            capacity,
            clock: Arc::new(clock),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.ttl(), config.capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fetch a copy of the warnings stored under `key`.
    ///
    /// An expired entry is a miss and is removed.
    pub fn get(&self, key: &CacheKey) -> Option<Vec<Conflict>> {
        let now = (self.clock)();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                None => {
                    tracing::trace!(%key, "warning cache miss");
                    return None;
                }
                Some(entry) if now < entry.expires_at => {
                    tracing::trace!(%key, "warning cache hit");
                    return Some(entry.warnings.clone());
                }
                Some(_) => {}
            }
        }

        // Re-check under the write lock; a concurrent store may have refreshed it.
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.get(key).is_some_and(|entry| now >= entry.expires_at) {
            entries.remove(key);
            tracing::trace!(%key, "evicted expired warning entry");
        }
        None
    }

    /// Store a copy of `warnings` under `key`, expiring one TTL from now.
    ///
    /// When the cache is full and `key` is new, expired entries are dropped
    /// first; if none were expired, one arbitrary entry is evicted.
    pub fn store(&self, key: CacheKey, warnings: &[Conflict]) {
        if self.capacity == 0 {
            return;
        }

        let now = (self.clock)();
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            entries.retain(|_, entry| now < entry.expires_at);
            if entries.len() >= self.capacity {
                if let Some(victim) = entries.keys().next().cloned() {
                    entries.remove(&victim);
                    tracing::trace!(key = %victim, "evicted warning entry at capacity");
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                warnings: warnings.to_vec(),
                expires_at,
            },
        );
    }

    /// Return the cached warnings for `key`, computing and storing them on a miss.
    pub fn get_or_compute<F>(&self, key: &CacheKey, compute: F) -> Vec<Conflict>
    where
        F: FnOnce() -> Vec<Conflict>,
    {
        if let Some(hit) = self.get(key) {
            return hit;
        }
        let warnings = compute();
        self.store(key.clone(), &warnings);
        warnings
    }

    /// Drop every entry.
    pub fn invalidate(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = entries.len();
        entries.clear();
        tracing::debug!(dropped, "warning cache invalidated");
    }

    /// Remove all expired entries; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = (self.clock)();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for WarningCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarningCache")
            .field("len", &self.len())
            .field("ttl", &self.ttl)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
