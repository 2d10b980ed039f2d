//! Caching layer: the stored entry shape and the pluggable store seam.
//!
//! The gateway never asks the store whether an entry is usable. Entries keep
//! their creation time and the gateway classifies them at request time, so a
//! store only has to answer `lookup` and `store`. [`MemoryStore`] is the
//! in-process implementation; anything network-backed (Redis, a sidecar)
//! slots in behind the same [`CacheStore`] trait.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::RwLock;

/// How long a store holds an entry before discarding it outright.
///
/// This is an infrastructure bound, not a freshness decision: the gateway's
/// own policy stops serving an entry long before this expires. It only has to
/// be long enough that a stale entry is still around to serve while a refresh
/// runs, and short enough that an abandoned key eventually frees its memory.
pub const STORE_TTL: Duration = Duration::from_secs(86_400);

/// A cached upstream payload plus the metadata needed to serve and age it.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Verbatim upstream body.
    pub body: Bytes,
    /// `Content-Type` to serve the body with.
    pub content_type: String,
    /// `Cache-Control` to serve the body with.
    pub cache_control: String,
    /// When the payload was fetched from upstream.
    pub created_at: SystemTime,
}

impl CacheEntry {
    /// Wraps a freshly fetched payload, stamping it with the current time.
    pub fn new(body: Bytes) -> Self {
        Self {
            body,
            content_type: "application/json".to_owned(),
            cache_control: format!("public, s-maxage={}", STORE_TTL.as_secs()),
            created_at: SystemTime::now(),
        }
    }

    /// Returns the entry's age relative to the current time.
    pub fn age(&self) -> Duration {
        self.age_at(SystemTime::now())
    }

    /// Returns the entry's age relative to `now`.
    ///
    /// A clock that moved backwards yields an age of zero rather than an
    /// error; treating such entries as brand new is the safe direction.
    pub fn age_at(&self, now: SystemTime) -> Duration {
        now.duration_since(self.created_at).unwrap_or_default()
    }
}

/// Errors surfaced by a cache store.
///
/// [`MemoryStore`] never fails, but the trait leaves room for backends that
/// can. The gateway treats a failed lookup as a miss and a failed write as a
/// lost optimization, never as a request failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store unavailable: {message}")]
    Unavailable { message: String },
}

/// Where cached menu payloads live.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the entry stored under `key`, if one exists.
    async fn lookup(&self, key: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Stores `entry` under `key`, replacing any previous entry.
    async fn store(&self, key: &str, entry: CacheEntry) -> Result<(), StoreError>;
}

/// In-process cache store backed by a `HashMap`.
///
/// Entries older than the store TTL are evicted lazily on lookup; with two
/// well-known keys there is nothing to gain from a sweeper task.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl MemoryStore {
    /// Creates a store with the default [`STORE_TTL`].
    pub fn new() -> Self {
        Self::with_ttl(STORE_TTL)
    }

    /// Creates a store that discards entries older than `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn lookup(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        // Write lock up front: an expired hit mutates the map.
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.age() >= self.ttl => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.clone())),
            None => Ok(None),
        }
    }

    async fn store(&self, key: &str, entry: CacheEntry) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_owned(), entry);
        Ok(())
    }
}
