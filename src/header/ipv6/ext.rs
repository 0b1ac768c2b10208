//! The IPv6 extension-header walker.
//!
//! Realized as the explicit state machine the design notes call for, rather
//! than a `switch` embedded in a loop: each [`ExtensionWalker::step`] call
//! advances past exactly one extension header and reports what it found.
//! ESP and AH are opaque to this walker — it cannot see past them, so it
//! reports [`WalkStep::Stop`] and leaves the caller to treat everything from
//! that point on as undissectable payload.

use super::super::util::{u16_be, u32_be};

pub const HOP_BY_HOP: u8 = 0;
pub const ROUTING: u8 = 43;
pub const DESTINATION: u8 = 60;
pub const FRAGMENT: u8 = 44;
pub const ESP: u8 = 50;
pub const AH: u8 = 51;
pub const NO_NEXT: u8 = 59;

/// An option-bearing extension header's uniform `{next_header, len, options}`
/// framing (Hop-by-Hop, Routing, Destination).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionExtHeader {
    pub kind: u8,
    pub next_header: u8,
    /// The extension's raw length field (`extLen`); the encoded size is
    /// `(extLen + 1) * 8` bytes.
    pub ext_len: u8,
    /// Total encoded size of this extension header, in bytes.
    pub header_len: usize,
}

/// RFC 8200 §4.5's Fragment extension header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentExtHeader {
    pub next_header: u8,
    pub reserved: u8,
    pub fragment_offset: u16,
    pub is_more_fragment: bool,
    pub identification: u32,
}

/// The fixed size of a Fragment extension header, in bytes.
pub const FRAGMENT_HEADER_LEN: usize = 8;

/// The outcome of advancing the walker by one extension header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStep {
    /// An option-bearing extension header was consumed; `next_header` names
    /// what follows it.
    Advanced(OptionExtHeader),
    /// A Fragment header was found and fully decoded.
    FoundFragment(FragmentExtHeader),
    /// The chain reached a non-extension next-header value (a transport
    /// protocol, `NoNext`, or an opaque `ESP`/`AH` header) and cannot be
    /// walked further.
    Stop { next_header: u8 },
    /// The chain is internally inconsistent (a length field that overruns
    /// the remaining buffer, or an `extLen` that overflows the `(n+1)*8`
    /// computation).
    Malformed,
}

/// Walks an IPv6 extension-header chain starting just past the fixed
/// 40-byte base header.
pub struct ExtensionWalker<'a> {
    bytes: &'a [u8],
    offset: usize,
    next_header: u8,
}

impl<'a> ExtensionWalker<'a> {
    /// Creates a walker over `bytes` (everything after the base IPv6
    /// header), starting from the base header's `next_header` value.
    pub fn new(bytes: &'a [u8], next_header: u8) -> Self {
        Self {
            bytes,
            offset: 0,
            next_header,
        }
    }

    /// Total bytes of extension headers consumed so far.
    pub fn consumed(&self) -> usize {
        self.offset
    }

    /// Advances past one extension header, or reports why it could not.
    pub fn step(&mut self) -> WalkStep {
        match self.next_header {
            HOP_BY_HOP | ROUTING | DESTINATION => self.step_option_bearing(),
            FRAGMENT => self.step_fragment(),
            other => WalkStep::Stop { next_header: other },
        }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }

    fn step_option_bearing(&mut self) -> WalkStep {
        let kind = self.next_header;
        let remaining = self.remaining();
        if remaining.len() < 2 {
            return WalkStep::Malformed;
        }
        let next_header = remaining[0];
        let ext_len = remaining[1];
        let header_len = match (ext_len as usize + 1).checked_mul(8) {
            Some(len) => len,
            None => return WalkStep::Malformed,
        };
        if header_len > remaining.len() {
            return WalkStep::Malformed;
        }
        self.offset += header_len;
        self.next_header = next_header;
        WalkStep::Advanced(OptionExtHeader {
            kind,
            next_header,
            ext_len,
            header_len,
        })
    }

    fn step_fragment(&mut self) -> WalkStep {
        let remaining = self.remaining();
        if remaining.len() < FRAGMENT_HEADER_LEN {
            return WalkStep::Malformed;
        }
        let next_header = remaining[0];
        let reserved = remaining[1];
        let offset_flags = match u16_be(remaining, 2) {
            Some(v) => v,
            None => return WalkStep::Malformed,
        };
        let identification = match u32_be(remaining, 4) {
            Some(v) => v,
            None => return WalkStep::Malformed,
        };
        self.offset += FRAGMENT_HEADER_LEN;
        self.next_header = next_header;
        WalkStep::FoundFragment(FragmentExtHeader {
            next_header,
            reserved,
            fragment_offset: offset_flags >> 3,
            is_more_fragment: offset_flags & 0x1 != 0,
            identification,
        })
    }
}

/// The terminal outcome of walking every extension header in the chain
/// without specifically hunting for a Fragment header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkAllOutcome {
    /// The protocol the chain ultimately hands off to (a transport
    /// protocol, `NoNext`, or the opaque byte seen at `ESP`/`AH`).
    pub next_header: u8,
    /// Total bytes of extension headers consumed (not including the base
    /// 40-byte header).
    pub extensions_len: usize,
    /// The first Hop-by-Hop extension encountered, if any.
    pub hop_by_hop: Option<OptionExtHeader>,
    /// Whether a Fragment header was seen while walking (it is walked over,
    /// not specially handled, unless the caller asked to stop there).
    pub fragment: Option<FragmentExtHeader>,
}

/// Walks the entire extension chain, recording extension length and any
/// Hop-by-Hop / Fragment headers encountered, and stopping at the first
/// non-extension `next_header` (or a decode failure).
///
/// Returns `None` if the chain is malformed.
pub fn walk_all(bytes: &[u8], base_next_header: u8) -> Option<WalkAllOutcome> {
    let mut walker = ExtensionWalker::new(bytes, base_next_header);
    let mut hop_by_hop = None;
    let mut fragment = None;
    loop {
        match walker.step() {
            WalkStep::Advanced(ext) => {
                if ext.kind == HOP_BY_HOP && hop_by_hop.is_none() {
                    hop_by_hop = Some(ext);
                }
            }
            WalkStep::FoundFragment(frag) => {
                fragment = Some(frag);
            }
            WalkStep::Stop { next_header } => {
                return Some(WalkAllOutcome {
                    next_header,
                    extensions_len: walker.consumed(),
                    hop_by_hop,
                    fragment,
                });
            }
            WalkStep::Malformed => return None,
        }
    }
}

/// The outcome of walking the chain specifically to find a Fragment header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentSearch {
    /// A Fragment header was found; `preceding_len` is the number of
    /// extension bytes walked before it (not including the fragment header
    /// itself), and `header_len` is `preceding_len + 8`.
    Found {
        header: FragmentExtHeader,
        preceding_len: usize,
        header_len: usize,
    },
    /// The chain ended (transport protocol, `NoNext`, `ESP`, or `AH`)
    /// without a Fragment header.
    NotFragmented,
    /// The chain is internally inconsistent.
    Malformed,
}

/// Walks the chain looking only for a Fragment header, per the "Fragment
/// walker" contract: stops as soon as one is found, and treats `ESP`/`AH`
/// as a failure to locate one (the chain beyond them is opaque).
pub fn find_fragment(bytes: &[u8], base_next_header: u8) -> FragmentSearch {
    let mut walker = ExtensionWalker::new(bytes, base_next_header);
    loop {
        let before = walker.consumed();
        match walker.step() {
            WalkStep::Advanced(_) => continue,
            WalkStep::FoundFragment(header) => {
                return FragmentSearch::Found {
                    header,
                    preceding_len: before,
                    header_len: walker.consumed() - before,
                };
            }
            WalkStep::Stop { .. } => return FragmentSearch::NotFragmented,
            WalkStep::Malformed => return FragmentSearch::Malformed,
        }
    }
}
