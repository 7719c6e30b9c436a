//! In-memory TTL cache of generated persona replies.
//!
//! Entries are keyed by persona and normalized message text (trimmed,
//! lowercased), so the same phrasing in any conversation shares a reply.
//! The cache is a best-effort optimization: it never fails a caller, and
//! concurrent writers follow last-writer-wins.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parley_types::config::CacheConfig;
use parley_types::persona::Persona;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::clock::{Clock, SystemClock};

/// A cached reply and the instant it was stored.
#[derive(Debug, Clone)]
struct CacheEntry {
    reply: String,
    stored_at: Instant,
}

/// Snapshot of cache occupancy and settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub ttl_minutes: u64,
    pub enabled: bool,
}

/// Process-wide reply cache with TTL expiry and oldest-first capacity eviction.
///
/// Constructed once at startup and shared via `Arc`. Call
/// [`ResponseCache::spawn_sweeper`] to start periodic expiry and
/// [`ResponseCache::shutdown`] to stop it.
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
    enabled: bool,
    clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
}

impl ResponseCache {
    /// Create a cache using the system clock.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache reading time from `clock`.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl: config.ttl(),
            max_entries: config.max_entries,
            enabled: config.enabled,
            clock,
            shutdown: CancellationToken::new(),
        }
    }

    /// Build the lookup key: `"<persona>:<trimmed, lowercased text>"`.
    pub fn cache_key(text: &str, persona: &Persona) -> String {
        format!("{}:{}", persona, text.trim().to_lowercase())
    }

    /// Look up a still-valid reply.
    pub fn get(&self, text: &str, persona: &Persona) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let key = Self::cache_key(text, persona);
        let entry = self.entries.get(&key)?;
        if self.clock.now().saturating_duration_since(entry.stored_at) < self.ttl {
            debug!(key = %truncate_key(&key), "response cache hit");
            Some(entry.reply.clone())
        } else {
            None
        }
    }

    /// Store (or refresh) a reply, then enforce the capacity limit.
    pub fn put(&self, text: &str, persona: &Persona, reply: &str) {
        if !self.enabled {
            return;
        }
        let key = Self::cache_key(text, persona);
        self.entries.insert(
            key,
            CacheEntry {
                reply: reply.to_string(),
                stored_at: self.clock.now(),
            },
        );
        self.enforce_capacity();
    }

    /// Evict oldest-stored entries until the cache is back within capacity.
    fn enforce_capacity(&self) {
        let len = self.entries.len();
        if len <= self.max_entries {
            return;
        }

        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().stored_at))
            .collect();
        by_age.sort_by_key(|(_, stored_at)| *stored_at);

        let excess = by_age.len().saturating_sub(self.max_entries);
        for (key, _) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        debug!(removed = excess, "response cache trimmed to capacity");
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) < self.ttl);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            info!(removed, "swept expired response cache entries");
        }
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
        info!("response cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            max_size: self.max_entries,
            ttl_minutes: self.ttl.as_secs() / 60,
            enabled: self.enabled,
        }
    }

    /// Start the background pass that sweeps expired entries every `interval`.
    ///
    /// The task runs until [`ResponseCache::shutdown`] is called.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let token = self.shutdown.clone();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        cache.sweep_expired();
                    }
                }
            }
            debug!("response cache sweeper stopped");
        })
    }

    /// Stop the sweeper and drop all entries.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.clear();
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("size", &self.entries.len())
            .field("max_entries", &self.max_entries)
            .field("ttl", &self.ttl)
            .field("enabled", &self.enabled)
            .finish()
    }
}

fn truncate_key(key: &str) -> &str {
    match key.char_indices().nth(50) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}
