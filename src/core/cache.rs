use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Key-value store for decoded lookup results, with per-entry expiry.
#[async_trait]
pub trait MetadataCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value, ttl: Duration);
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        *elapsed += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let elapsed = self.elapsed.lock().unwrap_or_else(|e| e.into_inner());
        self.start + *elapsed
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// Process-local cache backend. Expired entries are dropped lazily on read.
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataCache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if now < entry.expires_at => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        debug!("Cache entry expired: {}", key);
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| now >= entry.expires_at) {
            entries.remove(key);
        }
        None
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), CacheEntry { value, expires_at });
    }
}
