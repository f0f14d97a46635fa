//! Time-to-live cache for weather snapshots.
//!
//! Entries are keyed by a string derived from a rounded coordinate (see
//! [`Coordinate::cache_key`](crate::model::Coordinate::cache_key)). There is no
//! size bound: a session only ever touches a handful of sites.

use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};
use tracing::trace;

use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub value: T,
    pub captured_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Age relative to `now`. A capture stamped in the future counts as age zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.captured_at).to_std().unwrap_or_default()
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) > ttl
    }
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Fresh(CacheEntry<T>),
    /// The entry was past its TTL and has been removed from the cache.
    Expired(CacheEntry<T>),
    Miss,
}

impl<T> Lookup<T> {
    pub fn fresh(self) -> Option<CacheEntry<T>> {
        match self {
            Lookup::Fresh(entry) => Some(entry),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct WeatherCache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> WeatherCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { entries: RwLock::new(HashMap::new()), ttl, clock }
    }

    /// Fresh value for `key`, evicting it if it is past its TTL.
    pub fn get(&self, key: &str) -> Option<T> {
        self.lookup(key).fresh().map(|entry| entry.value)
    }

    pub fn lookup(&self, key: &str) -> Lookup<T> {
        let now = self.clock.now();
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            match entries.get(key) {
                None => return Lookup::Miss,
                Some(entry) if !entry.is_expired(now, self.ttl) => {
                    return Lookup::Fresh(entry.clone());
                }
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Another writer may have refreshed the entry between the two locks.
        match entries.get(key) {
            None => Lookup::Miss,
            Some(entry) if !entry.is_expired(now, self.ttl) => Lookup::Fresh(entry.clone()),
            Some(_) => {
                trace!(key, "evicting expired cache entry");
                entries.remove(key).map_or(Lookup::Miss, Lookup::Expired)
            }
        }
    }

    /// Store `value` stamped with the clock's current time, replacing any entry.
    pub fn put(&self, key: impl Into<String>, value: T) -> CacheEntry<T> {
        let entry = CacheEntry { value, captured_at: self.clock.now() };
        self.insert_entry(key, entry.clone());
        entry
    }

    /// Store a pre-stamped entry, replacing any existing one.
    pub fn insert_entry(&self, key: impl Into<String>, entry: CacheEntry<T>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.into(), entry);
    }

    pub fn invalidate(&self, key: &str) -> Option<CacheEntry<T>> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
