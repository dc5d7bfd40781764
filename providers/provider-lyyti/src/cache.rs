//! Participant count cache on top of the host transient cache.

use lyyti_host::TransientCache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cache key for a `(event id, status filter)` pair.
pub fn cache_key(eid: &str, status: &str) -> String {
    format!("lyyti_participant_count_{eid}_{status}")
}

/// Caches participant counts per event and status filter.
#[derive(Clone)]
pub struct CountCache {
    transients: Arc<dyn TransientCache>,
}

impl CountCache {
    pub fn new(transients: Arc<dyn TransientCache>) -> Self {
        Self { transients }
    }

    /// Look up a cached count. Read failures and unparsable entries are misses.
    pub async fn get(&self, eid: &str, status: &str) -> Option<u64> {
        let key = cache_key(eid, status);
        let raw = match self.transients.get(&key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed");
                return None;
            }
        };

        match raw.parse::<u64>() {
            Ok(count) => Some(count),
            Err(_) => {
                warn!(key = %key, value = %raw, "Ignoring malformed cache entry");
                None
            }
        }
    }

    /// Store a count. Write failures are logged and otherwise ignored.
    pub async fn set(&self, eid: &str, status: &str, count: u64, ttl: Option<Duration>) {
        let key = cache_key(eid, status);
        if let Err(e) = self.transients.set(&key, &count.to_string(), ttl).await {
            warn!(key = %key, error = %e, "Cache write failed");
            return;
        }
        debug!(key = %key, count, ttl_secs = ?ttl.map(|ttl| ttl.as_secs()), "Cached participant count");
    }
}
