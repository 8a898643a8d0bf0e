use crate::carbon_dating::domain::TargetType;
use crate::shared::Clock;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// Capacity and expiry settings of the result cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub max_entries: usize,
    pub website_ttl: Duration,
    pub repository_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            website_ttl: Duration::from_secs(60 * 60),
            repository_ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(15 * 60),
        }
    }
}

impl CacheSettings {
    pub fn ttl_for(&self, target_type: TargetType) -> Duration {
        match target_type {
            TargetType::Website => self.website_ttl,
            TargetType::Repository => self.repository_ttl,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub size: usize,
    pub max_entries: usize,
    /// Percentage of lookups served from cache
    pub hit_rate: f64,
    /// Percentage of capacity in use
    pub utilization: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheEntryInfo {
    pub inserted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub access_count: u64,
    pub expires_in_secs: i64,
}

struct CacheEntry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    last_accessed: DateTime<Utc>,
    access_count: u64,
    /// Monotonic recency stamp; the smallest one is evicted first
    recency: u64,
}

/// Entries plus two ordered indices: recency stamp to key, and
/// (expiry, key). Both indices hold exactly one item per entry.
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    by_recency: BTreeMap<u64, String>,
    by_expiry: BTreeSet<(DateTime<Utc>, String)>,
    tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl<V> CacheState<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            by_recency: BTreeMap::new(),
            by_expiry: BTreeSet::new(),
            tick: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn insert_entry(&mut self, key: &str, entry: CacheEntry<V>) {
        self.remove_entry(key);
        self.by_recency.insert(entry.recency, key.to_string());
        self.by_expiry.insert((entry.expires_at, key.to_string()));
        self.entries.insert(key.to_string(), entry);
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.by_recency.remove(&entry.recency);
        self.by_expiry.remove(&(entry.expires_at, key.to_string()));
        Some(entry)
    }

    fn touch(&mut self, key: &str, now: DateTime<Utc>, tick: u64) -> Option<V>
    where
        V: Clone,
    {
        let entry = self.entries.get_mut(key)?;
        let previous = std::mem::replace(&mut entry.recency, tick);
        entry.last_accessed = now;
        entry.access_count += 1;
        let value = entry.value.clone();
        self.by_recency.remove(&previous);
        self.by_recency.insert(tick, key.to_string());
        Some(value)
    }

    /// Removes every entry with `expires_at <= now`, earliest first.
    fn drop_expired(&mut self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        while let Some((expires_at, key)) = self.by_expiry.first().cloned() {
            if expires_at > now {
                break;
            }
            self.remove_entry(&key);
            removed += 1;
        }
        self.expirations += removed as u64;
        removed
    }

    fn evict_least_recent(&mut self) {
        let victim = self.by_recency.first_key_value().map(|(_, key)| key.clone());

        if let Some(key) = victim {
            self.remove_entry(&key);
            self.evictions += 1;
            tracing::debug!(key = %key, "evicted least recently used cache entry");
        }
    }

    fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.by_recency.clear();
        self.by_expiry.clear();
        removed
    }
}

/// Bounded LRU map with a per-entry TTL.
///
/// Expired entries read as absent immediately; a periodic sweep removes
/// them. When the map is full, expired entries are reclaimed before any
/// live entry is evicted. A `put` only replaces an entry inserted at an
/// earlier instant, so concurrent writers settle on the latest insertion
/// time.
pub struct ResultCache<V> {
    inner: Mutex<CacheState<V>>,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(CacheState::new()),
            max_entries: max_entries.max(1),
            clock,
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut state = self.inner.lock();
        let tick = state.next_tick();

        let expired = match state.entries.get(key) {
            None => {
                state.misses += 1;
                return None;
            }
            Some(entry) => entry.expires_at <= now,
        };

        if expired {
            state.remove_entry(key);
            state.expirations += 1;
            state.misses += 1;
            return None;
        }

        let value = state.touch(key, now, tick);
        state.hits += 1;
        value
    }

    /// Stores `value` under `key` for `ttl`.
    ///
    /// The insertion instant is taken before the lock is acquired. An entry
    /// already stored with a later insertion instant wins.
    pub fn put(&self, key: &str, value: V, ttl: Duration) {
        self.insert_at(key, value, ttl, self.clock.now());
    }

    fn insert_at(&self, key: &str, value: V, ttl: Duration, inserted_at: DateTime<Utc>) {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| inserted_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut state = self.inner.lock();

        if let Some(existing) = state.entries.get(key) {
            if existing.inserted_at > inserted_at {
                tracing::debug!(key, "dropping cache write older than the stored entry");
                return;
            }
        } else if state.entries.len() >= self.max_entries {
            let reclaimed = state.drop_expired(inserted_at);
            if reclaimed > 0 {
                tracing::debug!(reclaimed, "reclaimed expired cache entries on a full cache");
            }
            if state.entries.len() >= self.max_entries {
                state.evict_least_recent();
            }
        }

        let recency = state.next_tick();
        state.insert_entry(
            key,
            CacheEntry {
                value,
                inserted_at,
                expires_at,
                last_accessed: inserted_at,
                access_count: 0,
                recency,
            },
        );
    }

    pub fn remove(&self, key: &str) -> bool {
        self.inner.lock().remove_entry(key).is_some()
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&self) -> usize {
        self.inner.lock().clear()
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        self.inner.lock().drop_expired(now)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.inner.lock();
        let lookups = state.hits + state.misses;
        let size = state.entries.len();

        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            expirations: state.expirations,
            size,
            max_entries: self.max_entries,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                state.hits as f64 / lookups as f64 * 100.0
            },
            utilization: size as f64 / self.max_entries as f64 * 100.0,
        }
    }

    /// Metadata of a live entry; `None` when absent or expired. Does not
    /// count as an access.
    pub fn entry_info(&self, key: &str) -> Option<CacheEntryInfo> {
        let now = self.clock.now();
        let state = self.inner.lock();
        let entry = state.entries.get(key).filter(|e| e.expires_at > now)?;

        Some(CacheEntryInfo {
            inserted_at: entry.inserted_at,
            expires_at: entry.expires_at,
            last_accessed: entry.last_accessed,
            access_count: entry.access_count,
            expires_in_secs: (entry.expires_at - now).num_seconds(),
        })
    }
}
