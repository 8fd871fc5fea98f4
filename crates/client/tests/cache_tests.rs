//! Event spec cache expiry and rotation tests.
//!
//! # Invariants
//! - Entries older than the TTL are never returned
//! - Every 50th cumulative hit rotates out the oldest entry
//! - An entry hit 50 times is dropped on that access

mod common;

use std::time::Duration;

use common::*;
use inspector_client::EventSpecCache;
use tokio::time::Instant;

const TTL: Duration = Duration::from_secs(5 * 60);

#[test]
fn test_get_after_set_returns_spec_for_that_event_only() {
    let cache = EventSpecCache::new();
    let spec = spec_fixture("event_spec/checkout.json");

    cache.set("k1", "s1", "e1", spec.clone());

    assert_eq!(cache.get("k1", "s1", "e1"), Some(spec));
    assert_eq!(cache.get("k1", "s1", "e2"), None);
}

#[test]
fn test_entry_expires_one_millisecond_after_ttl() {
    let cache = EventSpecCache::new();
    let base = Instant::now();
    cache.set_at("k", "s", "e", spec_fixture("event_spec/checkout.json"), base);

    assert!(
        cache
            .get_at("k", "s", "e", base + TTL - Duration::from_millis(1))
            .is_some()
    );
    assert!(
        cache
            .get_at("k", "s", "e", base + TTL + Duration::from_millis(1))
            .is_none()
    );
    assert_eq!(cache.size(), 0);
}

#[test]
fn test_fifty_hits_rotate_out_oldest_entry() {
    let cache = EventSpecCache::new();
    let spec = spec_fixture("event_spec/checkout.json");
    let base = Instant::now();
    cache.set_at("k", "s", "oldest", spec.clone(), base);
    cache.set_at("k", "s", "b", spec.clone(), base + Duration::from_millis(1));
    cache.set_at("k", "s", "c", spec, base + Duration::from_millis(2));

    let now = base + Duration::from_millis(10);
    for i in 0..50 {
        let event = if i % 2 == 0 { "b" } else { "c" };
        assert!(cache.get_at("k", "s", event, now).is_some(), "hit {i}");
        if i < 49 {
            assert_eq!(cache.size(), 3);
        }
    }

    let stats = cache.stats();
    assert_eq!(stats.size, 2);
    assert_eq!(stats.global_event_count, 0);
    assert!(stats.entries.iter().all(|e| e.key != "ksoldest"));
}

#[test]
fn test_entry_reaching_hit_limit_is_dropped() {
    let cache = EventSpecCache::new().with_max_event_count(5);
    let base = Instant::now();
    cache.set_at("k", "s", "e", spec_fixture("event_spec/checkout.json"), base);

    for _ in 0..4 {
        assert!(cache.get_at("k", "s", "e", base).is_some());
    }
    // The fifth hit both rotates and trips the per-entry limit.
    assert!(cache.get_at("k", "s", "e", base).is_none());
    assert_eq!(cache.size(), 0);
}

#[test]
fn test_set_resets_counters() {
    let cache = EventSpecCache::new().with_max_event_count(3);
    let spec = spec_fixture("event_spec/checkout.json");
    let base = Instant::now();

    cache.set_at("k", "s", "e", spec.clone(), base);
    assert!(cache.get_at("k", "s", "e", base).is_some());
    cache.set_at("k", "s", "e", spec, base);

    let stats = cache.stats();
    assert_eq!(stats.entries[0].event_count, 0);
}

#[test]
fn test_clear_empties_cache() {
    let cache = EventSpecCache::new();
    cache.set("k", "s", "e", spec_fixture("event_spec/checkout.json"));
    cache.clear();

    assert_eq!(cache.size(), 0);
    assert_eq!(cache.stats().global_event_count, 0);
    assert!(cache.get("k", "s", "e").is_none());
}

#[test]
fn test_stats_display_summarizes() {
    let cache = EventSpecCache::new();
    cache.set("k", "s", "e", spec_fixture("event_spec/checkout.json"));
    cache.get("k", "s", "e");

    assert_eq!(
        cache.stats().to_string(),
        "Spec cache: 1 entries, 1 hits since last rotation"
    );
}

/// Known gap: the cache key has no branch component, so a spec fetched for
/// another branch replaces the cached one.
#[test]
fn test_known_gap_branch_not_part_of_key() {
    let cache = EventSpecCache::new();
    let main = spec_fixture("event_spec/checkout.json");
    let mut feature = main.clone();
    feature.metadata.branch_id = "feature".to_string();

    cache.set("k", "s", "e", main);
    cache.set("k", "s", "e", feature);

    assert_eq!(cache.size(), 1);
    let cached = cache.get("k", "s", "e").unwrap();
    assert_eq!(cached.metadata.branch_id, "feature");
}

/// Known gap: key parts are concatenated without a separator.
#[test]
fn test_known_gap_key_parts_can_collide() {
    let cache = EventSpecCache::new();
    cache.set("ab", "c", "e", spec_fixture("event_spec/checkout.json"));

    assert!(cache.get("a", "bc", "e").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_entry_expires_on_the_runtime_clock() {
    let cache = EventSpecCache::new();
    cache.set("k", "s", "e", spec_fixture("event_spec/checkout.json"));

    tokio::time::advance(TTL - Duration::from_secs(1)).await;
    assert!(cache.get("k", "s", "e").is_some());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(cache.get("k", "s", "e").is_none());
    assert_eq!(cache.size(), 0);
}
