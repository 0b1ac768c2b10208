//! IPv4/IPv6 fragment reassembly: a single lock-guarded table keyed by
//! [`key::FragmentKey`], holding one [`entry::FragmentEntry`] per in-flight
//! group.
//!
//! The entry is owned exclusively by the table (see the design note on
//! [`entry::FragmentEntry`]) — there is no reference-counted sharing to
//! reason about, so "drop this entry" is just a `HashMap::remove`.

mod cache;
mod entry;
mod key;
mod reassembler;

pub use key::FragmentKey;
pub use reassembler::FragmentDescriptor;

use std::sync::Mutex;
use std::time::Instant;

use crate::config::EngineConfig;
use crate::header::{Header, Ipv4Header};
use crate::logging;
use crate::FxHashMap;

use entry::{FragmentEntry, InsertOutcome};

/// The result of [`FragmentTable::check_and_handle_fragment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// The packet is not a fragment at all; dispatch should continue
    /// decoding it as-is.
    NotFragment,
    /// The packet is a fragment. `reassembled` holds the rebuilt datagram
    /// if this fragment completed its group; buffering failures, overlap,
    /// and cache-saturation drops are all represented the same way as
    /// `reassembled: None` since none of them are surfaced as distinct
    /// errors (they are silently-absorbed hostile-traffic outcomes).
    Fragment { reassembled: Option<Vec<u8>> },
}

struct TableState {
    entries: FxHashMap<FragmentKey, FragmentEntry>,
    last_cleanup: Option<Instant>,
}

/// The fragment reassembly table: one lock, one owned map, guarded for the
/// shortest possible critical section per packet.
pub struct FragmentTable {
    state: Mutex<TableState>,
    config: EngineConfig,
}

impl FragmentTable {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: Mutex::new(TableState {
                entries: FxHashMap::default(),
                last_cleanup: None,
            }),
            config,
        }
    }

    /// Classifies `header` and, if it names a fragment, buffers or
    /// completes its group.
    ///
    /// `packet_bytes` is the full IP packet (header through payload);
    /// `header_len`/`payload` are derived from `header`.
    pub fn check_and_handle_fragment(&self, header: &Header, packet_bytes: &[u8], now: Instant) -> CheckResult {
        let descriptor = match header {
            Header::Ipv4(ipv4) => reassembler::classify_ipv4(ipv4),
            Header::Ipv6(ipv6) => {
                let rest = packet_bytes.get(crate::header::ipv6::BASE_HEADER_LEN..).unwrap_or(&[]);
                reassembler::classify_ipv6(ipv6, rest)
            }
            _ => None,
        };

        let Some(descriptor) = descriptor else {
            return CheckResult::NotFragment;
        };

        let header_len = descriptor.header_len;
        let payload = packet_bytes.get(header_len..).unwrap_or(&[]);

        if reassembler::is_hard_fail(&descriptor, payload.len(), &self.config) {
            return CheckResult::Fragment { reassembled: None };
        }

        let mut state = self.state.lock().expect("fragment table mutex poisoned");
        cache::maybe_evict(&mut state.entries, &mut state.last_cleanup, now, &self.config);

        let reassembled = self.handle_validated_fragment(&mut state.entries, &descriptor, header_len, packet_bytes, payload, now);
        CheckResult::Fragment { reassembled }
    }

    fn handle_validated_fragment(
        &self,
        entries: &mut FxHashMap<FragmentKey, FragmentEntry>,
        descriptor: &FragmentDescriptor,
        header_len: usize,
        packet_bytes: &[u8],
        payload: &[u8],
        now: Instant,
    ) -> Option<Vec<u8>> {
        let key = descriptor.key;

        if !entries.contains_key(&key) {
            entries.insert(key, FragmentEntry::new(descriptor.original_protocol, now));
        }
        let entry = entries.get_mut(&key).expect("just inserted or already present");
        entry.last_access_time = now;
        if descriptor.byte_offset() == 0 {
            entry.record_header_bytes(&packet_bytes[..header_len]);
        }

        if entry.fragment_count() >= self.config.max_fragment_count() {
            entries.remove(&key);
            tracing::debug!(target: logging::FRAGMENT_DROP, "fragment count exceeded for group, dropping");
            return None;
        }
        if entry.total_payload_size() as u64 + payload.len() as u64 > self.config.max_reassemble_size() as u64 {
            entries.remove(&key);
            tracing::debug!(target: logging::FRAGMENT_DROP, "reassembled size would exceed max, dropping group");
            return None;
        }

        match entry.insert(descriptor.byte_offset(), payload.to_vec(), descriptor.is_more_fragment) {
            InsertOutcome::Overlap => {
                entries.remove(&key);
                tracing::debug!(target: logging::FRAGMENT_DROP, "overlapping fragment detected, dropping group");
                None
            }
            InsertOutcome::Buffered => None,
            InsertOutcome::Completed => {
                let entry = entries.remove(&key).expect("present by construction");
                let header_bytes = entry.header_bytes().map(<[u8]>::to_vec);
                let payload = entry.rebuild_payload();
                match (header_bytes, payload) {
                    (Some(header_bytes), Some(payload)) => Some(self.rebuild_datagram(descriptor, &header_bytes, &payload)),
                    _ => {
                        tracing::debug!(target: logging::FRAGMENT_DROP, "gap found rebuilding group despite last fragment seen");
                        None
                    }
                }
            }
        }
    }

    fn rebuild_datagram(&self, descriptor: &FragmentDescriptor, header_bytes: &[u8], payload: &[u8]) -> Vec<u8> {
        match descriptor.key {
            FragmentKey::V4 { .. } => reassembler::rebuild_ipv4(header_bytes, payload),
            FragmentKey::V6 { .. } => reassembler::rebuild_ipv6(header_bytes, payload, descriptor.original_protocol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Ipv4Address;

    fn ipv4_fragment(more: bool, offset_bytes: u32, payload_len: usize, id: u16) -> (Header, Vec<u8>) {
        let header_len = 20;
        let header = Ipv4Header {
            version: 4,
            ihl: 5,
            tos: 0,
            total_len: (header_len + payload_len) as u16,
            identification: id,
            flags_reserved: false,
            flags_dont_fragment: false,
            flags_more_fragments: more,
            fragment_offset: (offset_bytes / 8) as u16,
            ttl: 64,
            next_protocol: 17,
            checksum: 0,
            src_addr: Ipv4Address::new([10, 0, 0, 1]),
            dst_addr: Ipv4Address::new([10, 0, 0, 2]),
        };
        let mut bytes = vec![0u8; header_len];
        bytes[0] = 0x45;
        bytes[2..4].copy_from_slice(&header.total_len.to_be_bytes());
        bytes[4..6].copy_from_slice(&id.to_be_bytes());
        let flags = if more { 0x2000u16 } else { 0 };
        let flags_and_offset = flags | header.fragment_offset;
        bytes[6..8].copy_from_slice(&flags_and_offset.to_be_bytes());
        bytes[9] = 17;
        bytes[12..16].copy_from_slice(&[10, 0, 0, 1]);
        bytes[16..20].copy_from_slice(&[10, 0, 0, 2]);
        bytes.extend(std::iter::repeat(0xab).take(payload_len));
        (Header::Ipv4(header), bytes)
    }

    #[test]
    fn unfragmented_packet_is_not_a_fragment() {
        let table = FragmentTable::new(EngineConfig::new());
        let (header, bytes) = ipv4_fragment(false, 0, 0, 1);
        let result = table.check_and_handle_fragment(&header, &bytes, Instant::now());
        assert_eq!(result, CheckResult::NotFragment);
    }

    #[test]
    fn two_fragment_group_reassembles() {
        let table = FragmentTable::new(EngineConfig::new());
        let (first, first_bytes) = ipv4_fragment(true, 0, 1000, 7);
        let result = table.check_and_handle_fragment(&first, &first_bytes, Instant::now());
        assert_eq!(result, CheckResult::Fragment { reassembled: None });

        let (second, second_bytes) = ipv4_fragment(false, 1000, 400, 7);
        let result = table.check_and_handle_fragment(&second, &second_bytes, Instant::now());
        match result {
            CheckResult::Fragment {
                reassembled: Some(bytes),
            } => {
                assert_eq!(bytes.len(), 1420);
                let total_len = u16::from_be_bytes([bytes[2], bytes[3]]);
                assert_eq!(total_len, 1420);
                let flags_and_offset = u16::from_be_bytes([bytes[6], bytes[7]]);
                assert_eq!(flags_and_offset, 0);
            }
            other => panic!("expected reassembled datagram, got {other:?}"),
        }
    }

    #[test]
    fn overlapping_fragment_drops_the_group() {
        let table = FragmentTable::new(EngineConfig::new());
        let (first, first_bytes) = ipv4_fragment(true, 0, 1000, 9);
        table.check_and_handle_fragment(&first, &first_bytes, Instant::now());

        let (second, second_bytes) = ipv4_fragment(true, 800, 400, 9);
        let result = table.check_and_handle_fragment(&second, &second_bytes, Instant::now());
        assert_eq!(result, CheckResult::Fragment { reassembled: None });

        // a fresh fragment for the same id now starts a brand new group
        let (third, third_bytes) = ipv4_fragment(false, 1400, 0, 9);
        let result = table.check_and_handle_fragment(&third, &third_bytes, Instant::now());
        assert_eq!(result, CheckResult::Fragment { reassembled: None });
    }
}
