//! Expiring snapshot cache over a key/value store.
//!
//! A snapshot is the WeChat article collection and the paper collection, stored
//! together with one timestamp under three keys. Snapshots expire a fixed time after
//! they were written; an expired snapshot is removed from storage as soon as it is
//! noticed.
//!
//! Storage failures never reach callers: reads degrade to a miss and writes to a
//! no-op, with a warning logged.
//!
//! # Example
//!
//! ```
//! use digestboard::cache::{CacheStore, ManualClock, MemoryStorage};
//! use digestboard::WechatArticle;
//! use chrono::{Duration, Utc};
//!
//! let mut cache = CacheStore::with_clock(MemoryStorage::new(), ManualClock::new(Utc::now()));
//! cache.put(Some(&[WechatArticle::default()]), None);
//!
//! cache.clock().advance(Duration::minutes(29));
//! assert!(cache.get().is_some());
//!
//! cache.clock().advance(Duration::minutes(2));
//! assert!(cache.get().is_none());
//! ```

use crate::model::{Paper, WechatArticle};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// How long a snapshot stays fresh
pub const CACHE_EXPIRATION_MINUTES: i64 = 30;

/// Storage keys of a snapshot
pub mod keys {
    pub const WECHAT_ARTICLES: &str = "wechatArticles";
    pub const PAPERS: &str = "papers";
    pub const LAST_UPDATED: &str = "lastUpdated";

    pub const ALL: [&str; 3] = [WECHAT_ARTICLES, PAPERS, LAST_UPDATED];
}

/// Errors raised by a [`Storage`] backend.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A string key/value store.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory [`Storage`] with an optional byte quota over all keys and values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the total size of stored keys and values
    #[must_use]
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn used_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let needed = self.used_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        self.items.insert(key.to_string(), value);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }
}

/// [`Storage`] keeping one file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Uses `dir` for storage, creating it if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Both collections as cached together, with the time they were written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub wechat_articles: Option<Vec<WechatArticle>>,
    pub papers: Option<Vec<Paper>>,
    pub timestamp: DateTime<Utc>,
}

/// Expiring snapshot cache.
#[derive(Debug)]
pub struct CacheStore<S, C = SystemClock> {
    storage: S,
    clock: C,
    ttl: Duration,
}

impl<S: Storage> CacheStore<S> {
    /// Creates a cache on `storage` using the system clock
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, SystemClock)
    }
}

impl<S: Storage, C: Clock> CacheStore<S, C> {
    pub fn with_clock(storage: S, clock: C) -> Self {
        Self {
            storage,
            clock,
            ttl: Duration::minutes(CACHE_EXPIRATION_MINUTES),
        }
    }

    /// Sets how long a snapshot stays fresh
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the stored snapshot if it is still fresh.
    ///
    /// An expired snapshot is removed from storage before returning `None`.
    pub fn get(&mut self) -> Option<CacheSnapshot> {
        let timestamp = match self.fresh_timestamp() {
            Ok(Some(timestamp)) => timestamp,
            Ok(None) => {
                self.purge();
                return None;
            }
            Err(e) => {
                warn!("failed to read cache timestamp: {e}");
                return None;
            }
        };

        match self.read_snapshot(timestamp) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("failed to read cached snapshot: {e}");
                None
            }
        }
    }

    /// Stores both collections with the current time, replacing any previous snapshot.
    pub fn put(&mut self, wechat_articles: Option<&[WechatArticle]>, papers: Option<&[Paper]>) {
        let timestamp = self.clock.now();
        if let Err(e) = self.write_snapshot(wechat_articles, papers, timestamp) {
            warn!("failed to update cache: {e}");
            self.purge();
        }
    }

    /// Removes the stored snapshot if it is missing its timestamp or has expired.
    pub fn clear_if_expired(&mut self) {
        match self.fresh_timestamp() {
            Ok(Some(_)) => {}
            Ok(None) => self.purge(),
            Err(e) => warn!("failed to clear expired cache: {e}"),
        }
    }

    fn is_expired(&self, timestamp: DateTime<Utc>) -> bool {
        self.clock.now().signed_duration_since(timestamp) > self.ttl
    }

    /// The stored timestamp, or `None` when absent, unreadable, or expired.
    fn fresh_timestamp(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let Some(raw) = self.storage.get_item(keys::LAST_UPDATED)? else {
            return Ok(None);
        };
        let timestamp = raw
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis);

        match timestamp {
            Some(t) if !self.is_expired(t) => Ok(Some(t)),
            Some(t) => {
                debug!(stored_at = %t, "cache snapshot expired");
                Ok(None)
            }
            None => {
                warn!("ignoring unreadable cache timestamp {raw:?}");
                Ok(None)
            }
        }
    }

    fn read_snapshot(&self, timestamp: DateTime<Utc>) -> Result<CacheSnapshot, StorageError> {
        Ok(CacheSnapshot {
            wechat_articles: self.read_json(keys::WECHAT_ARTICLES)?,
            papers: self.read_json(keys::PAPERS)?,
            timestamp,
        })
    }

    fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        match self.storage.get_item(key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(None),
        }
    }

    fn write_snapshot(
        &mut self,
        wechat_articles: Option<&[WechatArticle]>,
        papers: Option<&[Paper]>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let wechat_json = serde_json::to_string(&wechat_articles)?;
        let papers_json = serde_json::to_string(&papers)?;

        self.storage.set_item(keys::WECHAT_ARTICLES, wechat_json)?;
        self.storage.set_item(keys::PAPERS, papers_json)?;
        self.storage
            .set_item(keys::LAST_UPDATED, timestamp.timestamp_millis().to_string())?;
        Ok(())
    }

    fn purge(&mut self) {
        for key in keys::ALL {
            if let Err(e) = self.storage.remove_item(key) {
                warn!("failed to remove cache key {key}: {e}");
            }
        }
    }
}
