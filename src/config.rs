//! Tunable bounds for the dissection engine.
//!
//! Every field is clamped to a valid range on construction, following the
//! same "build from defaults, override with setters" idiom the teacher uses
//! for its own test header builders: a [`EngineConfig`] always holds values a
//! caller can safely hand to the rest of the engine without further
//! validation.

/// Tunable bounds for fragment reassembly, caching, and recursion.
///
/// All fields are clamped to their documented ranges by [`EngineConfig::new`]
/// and every setter; there is no way to construct an out-of-range
/// `EngineConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    frag_timeout_ms: u32,
    frag_clear_interval_ms: u32,
    max_reassemble_size: u32,
    max_fragment_count: u32,
    max_frag_size: u32,
    max_cache_count: u32,
    max_recursion_depth: u8,
}

const FRAG_TIMEOUT_RANGE: (u32, u32) = (1_000, 300_000);
const FRAG_CLEAR_INTERVAL_RANGE: (u32, u32) = (100, 60_000);
const MAX_REASSEMBLE_SIZE_RANGE: (u32, u32) = (1_280, 16_777_216);
const MAX_FRAGMENT_COUNT_RANGE: (u32, u32) = (1, 256);
const MAX_FRAG_SIZE_RANGE: (u32, u32) = (8, 16_384);
const MAX_CACHE_COUNT_RANGE: (u32, u32) = (1, 5_000);
const MAX_RECURSION_DEPTH_RANGE: (u8, u8) = (1, 5);

fn clamp_u32(value: u32, (lo, hi): (u32, u32)) -> u32 {
    value.clamp(lo, hi)
}

impl EngineConfig {
    /// Creates a configuration with every field at its default, per the
    /// specification's clamp table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `frag_timeout`, the milliseconds an incomplete fragment group
    /// may live, clamped to `[1000, 300000]`.
    pub fn with_frag_timeout_ms(mut self, ms: u32) -> Self {
        self.frag_timeout_ms = clamp_u32(ms, FRAG_TIMEOUT_RANGE);
        if self.frag_clear_interval_ms > self.frag_timeout_ms {
            self.frag_clear_interval_ms = self.frag_timeout_ms;
        }
        self
    }

    /// Sets `frag_clear_interval`, the milliseconds between eviction
    /// sweeps, clamped to `[100, 60000]` and to be no greater than the
    /// fragment timeout.
    pub fn with_frag_clear_interval_ms(mut self, ms: u32) -> Self {
        let clamped = clamp_u32(ms, FRAG_CLEAR_INTERVAL_RANGE);
        self.frag_clear_interval_ms = clamped.min(self.frag_timeout_ms);
        self
    }

    /// Sets `max_reassemble_size`, clamped to `[1280, 16777216]` bytes.
    pub fn with_max_reassemble_size(mut self, bytes: u32) -> Self {
        self.max_reassemble_size = clamp_u32(bytes, MAX_REASSEMBLE_SIZE_RANGE);
        self
    }

    /// Sets `max_fragment_count`, clamped to `(0, 256]`.
    pub fn with_max_fragment_count(mut self, count: u32) -> Self {
        self.max_fragment_count = clamp_u32(count, MAX_FRAGMENT_COUNT_RANGE);
        self
    }

    /// Sets `max_frag_size`, clamped to `[8, 16384]` bytes.
    pub fn with_max_frag_size(mut self, bytes: u32) -> Self {
        self.max_frag_size = clamp_u32(bytes, MAX_FRAG_SIZE_RANGE);
        self
    }

    /// Sets `max_cache_count`, clamped to `(0, 5000]`.
    pub fn with_max_cache_count(mut self, count: u32) -> Self {
        self.max_cache_count = clamp_u32(count, MAX_CACHE_COUNT_RANGE);
        self
    }

    /// Sets `max_recursion_depth`, clamped to `(0, 5]`.
    pub fn with_max_recursion_depth(mut self, depth: u8) -> Self {
        self.max_recursion_depth = depth.clamp(MAX_RECURSION_DEPTH_RANGE.0, MAX_RECURSION_DEPTH_RANGE.1);
        self
    }

    pub fn frag_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.frag_timeout_ms as u64)
    }

    pub fn frag_clear_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.frag_clear_interval_ms as u64)
    }

    pub fn max_reassemble_size(&self) -> u32 {
        self.max_reassemble_size
    }

    pub fn max_fragment_count(&self) -> u32 {
        self.max_fragment_count
    }

    pub fn max_frag_size(&self) -> u32 {
        self.max_frag_size
    }

    pub fn max_cache_count(&self) -> u32 {
        self.max_cache_count
    }

    pub fn max_recursion_depth(&self) -> u8 {
        self.max_recursion_depth
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let timeout = 1_000;
        Self {
            frag_timeout_ms: timeout,
            frag_clear_interval_ms: timeout / 5,
            max_reassemble_size: 65_535,
            max_fragment_count: 32,
            max_frag_size: 8_192,
            max_cache_count: 1_000,
            max_recursion_depth: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_specification() {
        let config = EngineConfig::new();
        assert_eq!(config.frag_timeout(), std::time::Duration::from_millis(1_000));
        assert_eq!(config.frag_clear_interval(), std::time::Duration::from_millis(200));
        assert_eq!(config.max_reassemble_size(), 65_535);
        assert_eq!(config.max_fragment_count(), 32);
        assert_eq!(config.max_frag_size(), 8_192);
        assert_eq!(config.max_cache_count(), 1_000);
        assert_eq!(config.max_recursion_depth(), 3);
    }

    #[test]
    fn clamps_out_of_range_values() {
        let config = EngineConfig::new()
            .with_frag_timeout_ms(10)
            .with_max_reassemble_size(1)
            .with_max_fragment_count(0)
            .with_max_frag_size(1)
            .with_max_cache_count(0)
            .with_max_recursion_depth(0);
        assert_eq!(config.frag_timeout(), std::time::Duration::from_millis(1_000));
        assert_eq!(config.max_reassemble_size(), 1_280);
        assert_eq!(config.max_fragment_count(), 1);
        assert_eq!(config.max_frag_size(), 8);
        assert_eq!(config.max_cache_count(), 1);
        assert_eq!(config.max_recursion_depth(), 1);
    }

    #[test]
    fn clear_interval_never_exceeds_timeout() {
        let config = EngineConfig::new()
            .with_frag_timeout_ms(1_000)
            .with_frag_clear_interval_ms(60_000);
        assert_eq!(config.frag_clear_interval(), std::time::Duration::from_millis(1_000));
    }

    #[test]
    fn clamps_overly_large_values() {
        let config = EngineConfig::new()
            .with_frag_timeout_ms(u32::MAX)
            .with_max_reassemble_size(u32::MAX)
            .with_max_fragment_count(u32::MAX)
            .with_max_frag_size(u32::MAX)
            .with_max_cache_count(u32::MAX)
            .with_max_recursion_depth(u8::MAX);
        assert_eq!(config.frag_timeout(), std::time::Duration::from_millis(300_000));
        assert_eq!(config.max_reassemble_size(), 16_777_216);
        assert_eq!(config.max_fragment_count(), 256);
        assert_eq!(config.max_frag_size(), 16_384);
        assert_eq!(config.max_cache_count(), 5_000);
        assert_eq!(config.max_recursion_depth(), 5);
    }
}
