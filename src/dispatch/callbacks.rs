//! The per-layer callback triple, behind a single lock.
//!
//! All three callbacks are grouped under one `Mutex` because a caller
//! typically wires up all three (or none) together at startup; per the
//! concurrency design note, the lock is never held across an actual
//! callback invocation — [`super::Engine`] clones the `Arc` out and drops
//! the guard before calling it.

use std::sync::Arc;
use std::time::Instant;

use crate::header::{EthernetHeader, Header};

pub type EthernetCallback = Arc<dyn Fn(Instant, usize, &EthernetHeader, &[u8]) -> bool + Send + Sync>;
/// `parent` is the header of the enclosing layer (Ethernet, for a network
/// callback), if any — a borrowed back-reference valid only for this call.
pub type NetworkCallback = Arc<dyn Fn(Instant, usize, &Header, Option<&Header>, &[u8]) -> bool + Send + Sync>;
/// `parent` is the network-layer header this transport header was carried
/// in, if any.
pub type TransportCallback = Arc<dyn Fn(Instant, usize, &Header, Option<&Header>, &[u8]) -> bool + Send + Sync>;

#[derive(Default)]
pub(super) struct CallbackSet {
    pub ethernet: Option<EthernetCallback>,
    pub network: Option<NetworkCallback>,
    pub transport: Option<TransportCallback>,
}
