//! The fragment group identity.

use std::hash::{Hash, Hasher};

/// Identifies a fragment group: the set of fragments that together
/// reassemble to one IPv4 or IPv6 datagram.
///
/// Hashing is implemented by hand over the fixed byte arrays rather than
/// derived, so it never depends on host alignment the way a `memcpy`-based
/// eight-bytes-at-a-time mix would — the specification calls this out
/// explicitly as a portability requirement, not an optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKey {
    V4 {
        src: [u8; 4],
        dst: [u8; 4],
        identification: u16,
    },
    V6 {
        src: [u8; 16],
        dst: [u8; 16],
        identification: u32,
    },
}

impl Hash for FragmentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            FragmentKey::V4 {
                src,
                dst,
                identification,
            } => {
                state.write_u8(4);
                state.write(src);
                state.write(dst);
                state.write_u16(*identification);
            }
            FragmentKey::V6 {
                src,
                dst,
                identification,
            } => {
                state.write_u8(6);
                state.write(src);
                state.write(dst);
                state.write_u32(*identification);
            }
        }
    }
}
