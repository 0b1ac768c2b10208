//! The error taxonomy for the dissection pipeline.
//!
//! These are kept deliberately small: most anomalies produced by hostile or
//! malformed traffic (cache saturation, fragment overlap, oversize
//! fragments) are absorbed silently by dropping the offending fragment
//! group rather than surfaced as an error, per the engine's threat model.
//! What remains here is either a genuine decode failure or a condition the
//! caller needs to react to (buffered fragment, recursion limit, a stopped
//! callback).

use thiserror::Error as ThisError;

/// Which layer a decode failure occurred at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Ethernet,
    Network,
    Transport,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Layer::Ethernet => "ethernet",
            Layer::Network => "network",
            Layer::Transport => "transport",
        };
        f.write_str(name)
    }
}

/// The typed outcome of one [`crate::dispatch::Engine::parse`] call.
///
/// The public contract of `parse` is the small-integer status code from the
/// specification (see [`DissectError::code`]); this enum exists so internal
/// logic and tests can reason about and assert on the *kind* of outcome
/// rather than magic numbers.
#[derive(Debug, ThisError, Clone, Copy, PartialEq, Eq)]
pub enum DissectError {
    /// The caller passed a zero-length buffer.
    #[error("empty input")]
    EmptyInput,
    /// A header was truncated or self-inconsistent.
    #[error("failed to decode the {0} header")]
    DecodeFailed(Layer),
    /// The packet was a fragment and has been buffered awaiting peers.
    #[error("fragment buffered awaiting the rest of the datagram")]
    FragmentBuffered,
    /// Nested fragmentation exceeded `max_recursion_depth`.
    #[error("recursion limit exceeded while re-dissecting a reassembled datagram")]
    RecursionLimit,
    /// An application parser reported a `consumed_len` of zero or more than
    /// the remaining payload.
    #[error("application parser returned an invalid consumed length")]
    AppParserConsumeInvalid,
    /// A layer callback returned `false`. Not an error condition; dispatch
    /// stopped cleanly for this packet.
    #[error("a layer callback requested an early stop")]
    CallbackStop,
}

impl DissectError {
    /// The caller-visible status code, per the dispatcher's return-code
    /// contract.
    pub const fn code(self) -> i32 {
        match self {
            DissectError::EmptyInput => -1,
            DissectError::CallbackStop => 0,
            DissectError::DecodeFailed(Layer::Ethernet) => 1,
            DissectError::DecodeFailed(Layer::Network) => 2,
            DissectError::DecodeFailed(Layer::Transport) => 3,
            DissectError::AppParserConsumeInvalid => 4,
            DissectError::FragmentBuffered => 5,
            DissectError::RecursionLimit => 6,
        }
    }
}
