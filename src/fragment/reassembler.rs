//! Per-packet fragment classification, validation, and datagram rebuilding.
//!
//! This module holds the pure logic; [`super::FragmentTable`] drives it
//! under its lock and owns the actual cache of [`super::entry::FragmentEntry`]
//! values.

use crate::config::EngineConfig;
use crate::header::ipv6::ext;
use crate::header::{Ipv4Header, Ipv6Header};

use super::key::FragmentKey;

/// Everything the reassembler needs about one IP packet to classify and
/// validate it as a (possible) fragment, independent of IP version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentDescriptor {
    pub key: FragmentKey,
    pub original_protocol: u8,
    /// Fragment offset in 8-byte units, as carried on the wire.
    pub frag_offset: u16,
    pub is_more_fragment: bool,
    /// Length of the header this fragment carries (IPv4: `ihl*4`; IPv6:
    /// base header plus every extension header up to and including the
    /// Fragment header).
    pub header_len: usize,
    /// The IPv4 `total_len` field, when this is a v4 descriptor; used for
    /// the `header_len > total_len` hard-fail check.
    pub declared_total_len: Option<u32>,
}

impl FragmentDescriptor {
    /// Byte offset corresponding to `frag_offset`.
    pub fn byte_offset(&self) -> u32 {
        self.frag_offset as u32 * 8
    }
}

/// Classifies an IPv4 packet as a fragment or not, per the decision tree's
/// first rule: `MF=0 && frag_offset=0` is never a fragment.
pub fn classify_ipv4(header: &Ipv4Header) -> Option<FragmentDescriptor> {
    if header.is_unfragmented() {
        return None;
    }
    Some(FragmentDescriptor {
        key: FragmentKey::V4 {
            src: header.src_addr.to_bytes(),
            dst: header.dst_addr.to_bytes(),
            identification: header.identification,
        },
        original_protocol: header.next_protocol,
        frag_offset: header.fragment_offset,
        is_more_fragment: header.flags_more_fragments,
        header_len: header.header_len(),
        declared_total_len: Some(header.total_len as u32),
    })
}

/// Classifies an IPv6 packet as a fragment or not, by walking the extension
/// chain specifically looking for a Fragment header.
///
/// `rest` is the packet bytes immediately following the 40-byte base
/// header. Returns `None` both when the chain is fragment-free and when it
/// is malformed (malformed chains are a decode failure handled earlier, by
/// `Ipv6Header::decode`, so in practice this only returns `None` for
/// "not fragmented").
pub fn classify_ipv6(header: &Ipv6Header, rest: &[u8]) -> Option<FragmentDescriptor> {
    match ext::find_fragment(rest, header.first_next_header) {
        ext::FragmentSearch::Found {
            header: frag,
            preceding_len,
            header_len,
        } => Some(FragmentDescriptor {
            key: FragmentKey::V6 {
                src: header.src_addr.to_bytes(),
                dst: header.dst_addr.to_bytes(),
                identification: frag.identification,
            },
            original_protocol: frag.next_header,
            frag_offset: frag.fragment_offset,
            is_more_fragment: frag.is_more_fragment,
            header_len: crate::header::ipv6::BASE_HEADER_LEN + preceding_len + header_len,
            declared_total_len: None,
        }),
        ext::FragmentSearch::NotFragmented | ext::FragmentSearch::Malformed => None,
    }
}

/// Validates a fragment against the specification's hard-fail rules, which
/// drop the packet with no state change (they precede any table lookup).
pub fn is_hard_fail(desc: &FragmentDescriptor, payload_len: usize, config: &EngineConfig) -> bool {
    if let Some(total_len) = desc.declared_total_len {
        if desc.header_len as u32 > total_len {
            return true;
        }
    }
    if desc.frag_offset > 8191 {
        return true;
    }
    if payload_len as u32 > config.max_frag_size() {
        return true;
    }
    if desc.is_more_fragment && payload_len == 0 {
        return true;
    }
    if payload_len > 65535 {
        return true;
    }
    let end = desc.byte_offset() as u64 + payload_len as u64;
    if end > config.max_reassemble_size() as u64 {
        return true;
    }
    if desc.frag_offset as u64 > (config.max_reassemble_size() / 8) as u64 {
        return true;
    }
    false
}

/// Rebuilds a complete IPv4 datagram from its (unmodified) original header
/// bytes and the reassembled payload, patching `total_len` and clearing the
/// fragmentation flags/offset.
pub fn rebuild_ipv4(header_bytes: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(header_bytes.len() + payload.len());
    buffer.extend_from_slice(header_bytes);
    buffer.extend_from_slice(payload);

    let total_len = buffer.len() as u16;
    buffer[2..4].copy_from_slice(&total_len.to_be_bytes());

    let flags_and_offset = u16::from_be_bytes([buffer[6], buffer[7]]);
    let cleared = flags_and_offset & 0x8000; // keep only the reserved bit
    buffer[6..8].copy_from_slice(&cleared.to_be_bytes());

    buffer
}

/// Rebuilds a complete IPv6 datagram. The Fragment extension header is left
/// in place (its length already counted toward `header_len`); only
/// `payload_len` and the base header's `next_header` are rewritten.
pub fn rebuild_ipv6(header_bytes: &[u8], payload: &[u8], original_protocol: u8) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(header_bytes.len() + payload.len());
    buffer.extend_from_slice(header_bytes);
    buffer.extend_from_slice(payload);

    let new_payload_len = (buffer.len() - crate::header::ipv6::BASE_HEADER_LEN) as u16;
    buffer[4..6].copy_from_slice(&new_payload_len.to_be_bytes());
    buffer[6] = original_protocol;

    buffer
}
