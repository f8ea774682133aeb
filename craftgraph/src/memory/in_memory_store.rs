use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::memory::store::{Store, StoreError};

/// In-memory key-value store with lazy expiry.
///
/// **Interaction**: Used as `Arc<dyn Store>` in tests, the CLI's `--in-memory`
/// mode and any single-process deployment. Expired entries are removed when read.
/// Uses tokio's clock so tests can pause and advance time.
#[derive(Default)]
pub struct InMemoryStore {
    data: DashMap<String, Entry>,
}

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now >= at).unwrap_or(false)
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.data.iter().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys starting with `prefix` (live entries only), sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .data
            .iter()
            .filter(|e| e.key().starts_with(prefix) && !e.is_expired(now))
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let entry = match self.data.get(key) {
            Some(e) => e.clone(),
            None => return Ok(None),
        };
        if entry.is_expired(now) {
            // A concurrent `set` may have replaced the entry since it was read.
            self.data.remove_if(key, |_, e| e.is_expired(now));
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError> {
        let expires_at = ttl.map(|d| Instant::now() + d);
        self.data.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.data.remove(key);
        Ok(())
    }
}
