//! Tracing targets used across the engine.
//!
//! The engine never owns a subscriber (it's a library embedded in a host
//! application); it only emits [`tracing`] events under these targets so a
//! host can wire up its own sink. Events are grouped by target rather than
//! by module path so a host can filter "just the attack-drop edges" without
//! needing to know this crate's internal layout.

/// A fragment group was dropped: overlap, a bound exceeded, or a timeout.
pub(crate) const FRAGMENT_DROP: &str = "dissector::fragment::drop";
/// A decode failure at any layer.
pub(crate) const DECODE_FAIL: &str = "dissector::decode::fail";
/// The recursion-depth bound was hit while re-dissecting a reassembled
/// datagram.
pub(crate) const RECURSION_LIMIT: &str = "dissector::dispatch::recursion_limit";
/// The fragment cache evicted entries (timeout sweep or LRU overflow).
pub(crate) const CACHE_EVICT: &str = "dissector::fragment::evict";
