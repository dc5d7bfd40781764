//! Expiring key-value cache ("transients").
//!
//! A transient is a string value with an optional time-to-live. Expired
//! entries read as absent; there is no explicit eviction API.

use crate::error::HostResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Transient cache provided by the host.
#[async_trait]
pub trait TransientCache: Send + Sync {
    /// Read a transient. Missing and expired entries both return `None`.
    async fn get(&self, key: &str) -> HostResult<Option<String>>;

    /// Store a transient. A `ttl` of `None` never expires, and neither does
    /// one too large to represent.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> HostResult<()>;
}

struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }
}

/// In-memory transient cache scoped to the host process.
#[derive(Default)]
pub struct MemoryTransientCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryTransientCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransientCache for MemoryTransientCache {
    async fn get(&self, key: &str) -> HostResult<Option<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired(Instant::now()) => Ok(Some(entry.value.clone())),
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> HostResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        // Expired entries are dropped lazily on write.
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: ttl.and_then(|ttl| now.checked_add(ttl)),
            },
        );
        Ok(())
    }
}
