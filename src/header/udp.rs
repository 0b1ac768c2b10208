//! UDP decoding, per RFC 768.

use super::util::u16_be;

/// The fixed length of a UDP header, in bytes.
pub const HEADER_LEN: usize = 8;

/// A decoded UDP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    /// The datagram length in bytes, header included, as carried on the
    /// wire.
    pub total_len: u16,
    pub checksum: u16,
}

impl UdpHeader {
    /// Parses a UDP header from the start of `bytes`.
    ///
    /// Returns `None` if `bytes` is shorter than [`HEADER_LEN`].
    pub fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        let src_port = u16_be(bytes, 0)?;
        let dst_port = u16_be(bytes, 2)?;
        let total_len = u16_be(bytes, 4)?;
        let checksum = u16_be(bytes, 6)?;
        Some((
            Self {
                src_port,
                dst_port,
                total_len,
                checksum,
            },
            HEADER_LEN,
        ))
    }
}
