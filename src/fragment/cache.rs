//! Time-based plus partial-LRU eviction for the fragment reassembly table.

use std::time::Instant;

use crate::config::EngineConfig;
use crate::logging;
use crate::FxHashMap;

use super::entry::FragmentEntry;
use super::key::FragmentKey;

/// Runs the eviction sweep if `frag_clear_interval` has elapsed since the
/// last sweep; otherwise a no-op. Pass 1 drops anything idle past
/// `frag_timeout`. Pass 2, if the table is still oversized, removes the
/// oldest `overflow` entries by `last_access_time` using a partial sort
/// (`select_nth_unstable_by_key` then a small `sort_by_key` over just the
/// overflow), rather than a full `O(n log n)` sort.
pub fn maybe_evict(
    entries: &mut FxHashMap<FragmentKey, FragmentEntry>,
    last_cleanup: &mut Option<Instant>,
    now: Instant,
    config: &EngineConfig,
) {
    if let Some(last) = *last_cleanup {
        if now.saturating_duration_since(last) < config.frag_clear_interval() {
            return;
        }
    }
    *last_cleanup = Some(now);

    let timeout = config.frag_timeout();
    let before = entries.len();
    entries.retain(|_, entry| now.saturating_duration_since(entry.last_access_time) <= timeout);
    let timed_out = before - entries.len();
    if timed_out > 0 {
        tracing::debug!(target: logging::CACHE_EVICT, count = timed_out, "evicted timed-out fragment groups");
    }

    let max_count = config.max_cache_count() as usize;
    if entries.len() <= max_count {
        return;
    }
    let overflow = entries.len() - max_count;

    let mut ages: Vec<(FragmentKey, Instant)> = entries.iter().map(|(k, v)| (*k, v.last_access_time)).collect();
    let k = overflow.min(ages.len());
    if k > 0 {
        ages.select_nth_unstable_by_key(k - 1, |(_, t)| *t);
        ages.truncate(k);
        for (key, _) in ages {
            entries.remove(&key);
        }
        tracing::debug!(target: logging::CACHE_EVICT, count = k, "evicted oldest fragment groups over capacity");
    }
}
