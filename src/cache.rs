use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// In-memory cache of upstream API responses, expired after a fixed TTL
pub struct ResponseCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Deterministic key for a call: parameter order does not matter.
    pub fn key(api: &str, params: &[(&str, &str)]) -> String {
        let sorted: BTreeMap<&str, &str> = params.iter().copied().collect();
        let params_json = serde_json::to_string(&sorted).unwrap_or_default();
        let digest = Sha256::digest(format!("{api}:{params_json}").as_bytes());
        hex::encode(digest)
    }

    /// Returns the cached value if it is still fresh, evicting it otherwise.
    pub async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        let fresh = match entries.get(key) {
            Some((_, stored_at)) => stored_at.elapsed() < self.ttl,
            None => return None,
        };

        if fresh {
            debug!("Cache hit for key {}...", &key[..key.len().min(8)]);
            entries.get(key).map(|(value, _)| value.clone())
        } else {
            entries.remove(key);
            None
        }
    }

    /// Stores `value`, sweeping expired entries first so the map stays bounded.
    pub async fn set(&self, key: String, value: String) {
        debug!("Caching response under key {}...", &key[..key.len().min(8)]);
        let mut entries = self.entries.lock().await;
        self.evict_expired(&mut entries);
        entries.insert(key, (value, Instant::now()));
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn clear_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        self.evict_expired(&mut entries)
    }

    fn evict_expired(&self, entries: &mut HashMap<String, (String, Instant)>) -> usize {
        let before = entries.len();
        entries.retain(|_, (_, stored_at)| stored_at.elapsed() < self.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            info!("Removed {} expired cache entries", removed);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
