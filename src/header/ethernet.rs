//! Ethernet II decoding, per RFC 894.

use super::mac::MacAddr;
use super::util::{array, u16_be};
use super::NetworkProtocol;

/// The number of bytes in a fixed Ethernet II header.
pub const HEADER_LEN: usize = 14;

/// A decoded Ethernet II header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthernetHeader {
    pub dst_mac: MacAddr,
    pub src_mac: MacAddr,
    /// The raw EtherType field. Use [`EthernetHeader::network_protocol`] to
    /// get a typed value for the protocols this crate understands.
    pub next_protocol: u16,
}

impl EthernetHeader {
    /// The length of this header in bytes; always [`HEADER_LEN`].
    pub const fn header_len(&self) -> usize {
        HEADER_LEN
    }

    /// The `next_protocol` field as a [`NetworkProtocol`], or `None` if it
    /// names a protocol this crate does not decode.
    pub fn network_protocol(&self) -> Option<NetworkProtocol> {
        NetworkProtocol::from_ethertype(self.next_protocol)
    }

    /// Parses an Ethernet II header from the start of `bytes`.
    ///
    /// Returns `None` if `bytes` is shorter than [`HEADER_LEN`].
    pub fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        let dst_mac = MacAddr::new(array(bytes, 0)?);
        let src_mac = MacAddr::new(array(bytes, 6)?);
        let next_protocol = u16_be(bytes, 12)?;
        Some((
            Self {
                dst_mac,
                src_mac,
                next_protocol,
            },
            HEADER_LEN,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        let mut bytes = vec![0xff; 6]; // broadcast dst
        bytes.extend_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]); // src
        bytes.extend_from_slice(&[0x08, 0x00]); // IPv4
        bytes.extend_from_slice(b"payload");
        bytes
    }

    #[test]
    fn decodes_basic_header() {
        let bytes = sample();
        let (header, len) = EthernetHeader::decode(&bytes).unwrap();
        assert_eq!(len, HEADER_LEN);
        assert_eq!(header.dst_mac, MacAddr::BROADCAST);
        assert_eq!(header.src_mac, MacAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]));
        assert_eq!(header.network_protocol(), Some(NetworkProtocol::Ipv4));
    }

    #[test]
    fn rejects_truncated_input() {
        let bytes = sample();
        assert!(EthernetHeader::decode(&bytes[..13]).is_none());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(EthernetHeader::decode(&[]).is_none());
    }
}
