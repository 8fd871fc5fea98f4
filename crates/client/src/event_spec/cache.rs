//! In-memory cache of fetched event specs.
//!
//! Responsibilities:
//! - Store parsed specs keyed by api key, stream id and event name.
//! - Expire entries lazily on access by age (TTL) or by per-entry hit count.
//! - Rotate out the globally oldest entry every `MAX_EVENT_COUNT` hits.
//!
//! Does NOT handle:
//! - Fetching specs (see [`super::fetcher`]).
//! - Persistence across processes.
//!
//! Invariants:
//! - Every returned entry is younger than the TTL and has fewer than
//!   `MAX_EVENT_COUNT` hits, counting the current one.
//! - The global hit counter is reset exactly once per rotation.
//! - The map and the global counter are guarded by one lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use inspector_config::constants::{EVENT_SPEC_CACHE_TTL_SECS, EVENT_SPEC_MAX_EVENT_COUNT};
use tokio::time::Instant;
use tracing::debug;

use super::models::EventSpecResponse;
use crate::metrics::{EvictionReason, MetricsCollector};

#[derive(Debug, Clone)]
struct CacheEntry {
    spec: EventSpecResponse,
    timestamp: Instant,
    event_count: u32,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    global_event_count: u32,
}

/// Per-entry diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryStats {
    pub key: String,
    pub age: Duration,
    pub event_count: u32,
}

/// Cache diagnostics snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub global_event_count: u32,
    pub entries: Vec<CacheEntryStats>,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Spec cache: {} entries, {} hits since last rotation",
            self.size, self.global_event_count
        )
    }
}

/// Event spec cache with TTL and hit-count expiry.
#[derive(Debug)]
pub struct EventSpecCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    max_event_count: u32,
    log_enabled: bool,
    metrics: MetricsCollector,
}

impl Default for EventSpecCache {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSpecCache {
    /// Create a cache with the default TTL (5 minutes) and hit limit (50).
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            ttl: Duration::from_secs(EVENT_SPEC_CACHE_TTL_SECS),
            max_event_count: EVENT_SPEC_MAX_EVENT_COUNT,
            log_enabled: false,
            metrics: MetricsCollector::disabled(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_event_count(mut self, max: u32) -> Self {
        self.max_event_count = max.max(1);
        self
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.log_enabled = enabled;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    /// Cache key. Branch is not part of the key.
    fn key(api_key: &str, stream_id: &str, event_name: &str) -> String {
        format!("{}{}{}", api_key, stream_id, event_name)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a spec, counting the access as a hit.
    pub fn get(&self, api_key: &str, stream_id: &str, event_name: &str) -> Option<EventSpecResponse> {
        self.get_at(api_key, stream_id, event_name, Instant::now())
    }

    /// Look up a spec as of `now`.
    pub fn get_at(
        &self,
        api_key: &str,
        stream_id: &str,
        event_name: &str,
        now: Instant,
    ) -> Option<EventSpecResponse> {
        let key = Self::key(api_key, stream_id, event_name);
        let mut state = self.lock();

        let Some(entry) = state.entries.get_mut(&key) else {
            if self.log_enabled {
                debug!(event_name, "Event spec cache miss");
            }
            self.metrics.record_spec_cache_miss();
            return None;
        };

        entry.event_count += 1;
        let timestamp = entry.timestamp;
        let event_count = entry.event_count;
        let spec = entry.spec.clone();
        state.global_event_count += 1;

        if state.global_event_count >= self.max_event_count {
            Self::evict_oldest(&mut state);
            state.global_event_count = 0;
            self.metrics
                .record_spec_cache_eviction(EvictionReason::Rotation);
            if self.log_enabled {
                debug!("Event spec cache rotated out its oldest entry");
            }
        }

        let reason = if now.saturating_duration_since(timestamp) >= self.ttl {
            Some(EvictionReason::Expired)
        } else if event_count >= self.max_event_count {
            Some(EvictionReason::HitLimit)
        } else {
            None
        };

        if let Some(reason) = reason {
            state.entries.remove(&key);
            self.metrics.record_spec_cache_eviction(reason);
            self.metrics.record_spec_cache_miss();
            if self.log_enabled {
                debug!(event_name, reason = reason.as_str(), "Event spec cache entry expired");
            }
            return None;
        }

        self.metrics.record_spec_cache_hit();
        if self.log_enabled {
            debug!(event_name, event_count, "Event spec cache hit");
        }
        Some(spec)
    }

    fn evict_oldest(state: &mut CacheState) {
        let oldest = state
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.timestamp)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            state.entries.remove(&key);
        }
    }

    /// Store a spec, replacing any existing entry and resetting its counters.
    pub fn set(&self, api_key: &str, stream_id: &str, event_name: &str, spec: EventSpecResponse) {
        self.set_at(api_key, stream_id, event_name, spec, Instant::now());
    }

    /// Store a spec with an explicit creation instant.
    pub fn set_at(
        &self,
        api_key: &str,
        stream_id: &str,
        event_name: &str,
        spec: EventSpecResponse,
        now: Instant,
    ) {
        let key = Self::key(api_key, stream_id, event_name);
        self.lock().entries.insert(
            key,
            CacheEntry {
                spec,
                timestamp: now,
                event_count: 0,
            },
        );
        if self.log_enabled {
            debug!(event_name, "Event spec cached");
        }
    }

    /// Drop every entry and reset the global hit counter.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.global_event_count = 0;
    }

    /// Number of cached entries.
    pub fn size(&self) -> usize {
        self.lock().entries.len()
    }

    /// Diagnostics snapshot, entries ordered oldest first.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let state = self.lock();
        let mut entries: Vec<_> = state
            .entries
            .iter()
            .map(|(key, entry)| CacheEntryStats {
                key: key.clone(),
                age: now.saturating_duration_since(entry.timestamp),
                event_count: entry.event_count,
            })
            .collect();
        entries.sort_by(|a, b| b.age.cmp(&a.age).then_with(|| a.key.cmp(&b.key)));

        CacheStats {
            size: state.entries.len(),
            global_event_count: state.global_event_count,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_spec::models::EventSpecMetadata;

    fn spec(schema_id: &str) -> EventSpecResponse {
        EventSpecResponse {
            events: Vec::new(),
            metadata: EventSpecMetadata {
                schema_id: schema_id.to_string(),
                branch_id: "main".to_string(),
                latest_action_id: "a1".to_string(),
                source_id: None,
            },
        }
    }

    #[test]
    fn test_hit_increments_counters() {
        let cache = EventSpecCache::new();
        cache.set("k", "s", "e", spec("a"));
        assert!(cache.get("k", "s", "e").is_some());
        assert!(cache.get("k", "s", "e").is_some());

        let stats = cache.stats();
        assert_eq!(stats.global_event_count, 2);
        assert_eq!(stats.entries[0].event_count, 2);
    }

    #[test]
    fn test_miss_does_not_count() {
        let cache = EventSpecCache::new();
        assert!(cache.get("k", "s", "e").is_none());
        assert_eq!(cache.stats().global_event_count, 0);
    }

    #[test]
    fn test_set_resets_entry() {
        let cache = EventSpecCache::new();
        cache.set("k", "s", "e", spec("a"));
        cache.get("k", "s", "e");
        cache.set("k", "s", "e", spec("b"));

        assert_eq!(cache.stats().entries[0].event_count, 0);
        assert_eq!(cache.get("k", "s", "e").unwrap().metadata.schema_id, "b");
    }

    #[test]
    fn test_entry_expires_at_hit_limit() {
        let cache = EventSpecCache::new().with_max_event_count(3);
        let base = Instant::now();
        cache.set_at("k", "s", "e", spec("a"), base);
        cache.set_at("k", "s", "other", spec("b"), base + Duration::from_secs(1));
        let now = base + Duration::from_secs(2);

        assert!(cache.get_at("k", "s", "e", now).is_some());
        assert!(cache.get_at("k", "s", "e", now).is_some());
        // Third hit reaches the limit on both counters: "e" is the oldest
        // entry and is also past its own hit limit.
        assert!(cache.get_at("k", "s", "e", now).is_none());
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.stats().entries[0].key, "ksother");
    }

    #[test]
    fn test_clear_resets_everything() {
        let cache = EventSpecCache::new();
        cache.set("k", "s", "e", spec("a"));
        cache.get("k", "s", "e");
        cache.clear();

        assert_eq!(cache.size(), 0);
        assert_eq!(cache.stats().global_event_count, 0);
    }

    #[test]
    fn test_stats_display() {
        let cache = EventSpecCache::new();
        cache.set("k", "s", "e", spec("a"));
        assert_eq!(
            cache.stats().to_string(),
            "Spec cache: 1 entries, 0 hits since last rotation"
        );
    }
}
