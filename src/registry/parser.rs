//! The application-layer parser contract.

use std::time::Instant;

use crate::header::Header;

/// What an [`AppParser`] reports about one candidate PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseResult {
    /// `consumed_len` bytes were a complete PDU this parser recognised; the
    /// dispatcher should loop on the remainder of the payload.
    Success,
    /// The PDU is present but incomplete (typically transport
    /// segmentation); the dispatcher should stop and report the packet as
    /// buffered without consuming anything further.
    Continue,
    /// This parser does not recognise the bytes; the dispatcher should try
    /// the next candidate.
    Failure,
}

/// A pluggable application-layer protocol parser.
///
/// Parser bodies themselves (FTP, Modbus, S7, and so on) are external
/// collaborators; this crate only specifies the contract and the dispatch
/// policy around it.
pub trait AppParser: Send + Sync {
    /// A stable identifier for this parser, unique within one
    /// [`super::ParserRegistry`].
    fn protocol_id(&self) -> u32;

    /// Attempts to parse one PDU starting at the front of `payload`.
    ///
    /// `transport_header` is the header of the layer that carried this
    /// payload (`Tcp`, `Udp`, or absent for a [`crate::dispatch::DataSource::Serial`]
    /// capture). Returns the outcome plus how many bytes of `payload` were
    /// consumed; the consumed count is only meaningful when the outcome is
    /// [`ParseResult::Success`].
    fn parse(&self, now: Instant, total_len: usize, transport_header: Option<&Header>, payload: &[u8]) -> (ParseResult, usize);
}
