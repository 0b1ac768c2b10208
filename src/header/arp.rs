//! ARP decoding, per RFC 826, fixed to the IPv4-over-Ethernet layout.

use super::ipv4::Ipv4Address;
use super::mac::MacAddr;
use super::util::{array, u16_be};

/// The fixed length of an ARP packet for IPv4-over-Ethernet, in bytes.
pub const HEADER_LEN: usize = 28;

/// The ARP `oper` field's two defined values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Request,
    Reply,
    /// Any `oper` value this crate does not assign meaning to.
    Other(u16),
}

impl Operation {
    fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::Request,
            2 => Self::Reply,
            other => Self::Other(other),
        }
    }
}

/// A decoded ARP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArpHeader {
    pub hardware_type: u16,
    pub protocol_type: u16,
    pub hw_size: u8,
    pub proto_size: u8,
    pub opcode: Operation,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Address,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Address,
}

impl ArpHeader {
    /// Parses an ARP packet from the start of `bytes`.
    ///
    /// Returns `None` if `bytes` is shorter than [`HEADER_LEN`]. The fixed
    /// shape is not re-derived from `hw_size`/`proto_size`; those fields are
    /// exposed but not used to locate the address fields, matching the
    /// specification's IPv4-over-Ethernet-only scope.
    pub fn decode(bytes: &[u8]) -> Option<(Self, usize)> {
        if bytes.len() < HEADER_LEN {
            return None;
        }

        let hardware_type = u16_be(bytes, 0)?;
        let protocol_type = u16_be(bytes, 2)?;
        let hw_size = bytes[4];
        let proto_size = bytes[5];
        let opcode = Operation::from_u16(u16_be(bytes, 6)?);
        let sender_mac = MacAddr::new(array(bytes, 8)?);
        let sender_ip = Ipv4Address::new(array(bytes, 14)?);
        let target_mac = MacAddr::new(array(bytes, 18)?);
        let target_ip = Ipv4Address::new(array(bytes, 24)?);

        Some((
            Self {
                hardware_type,
                protocol_type,
                hw_size,
                proto_size,
                opcode,
                sender_mac,
                sender_ip,
                target_mac,
                target_ip,
            },
            HEADER_LEN,
        ))
    }
}
