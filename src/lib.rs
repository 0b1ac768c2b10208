//! A live packet dissection and reassembly engine.
//!
//! This crate consumes link-layer frames handed to it one at a time by a
//! capture source (not part of this crate) and emits structured, layered
//! protocol decodings through user-registered callbacks. It combines four
//! concerns:
//!
//! - Layered decoding of Ethernet II, IPv4/IPv6/ARP, and TCP/UDP/ICMP/ICMPv6,
//!   with correct IPv6 extension header traversal.
//! - IPv4/IPv6 fragment reassembly with bounded memory, eviction, and
//!   RFC 5722 overlap rejection.
//! - Application-layer dispatch over a registry of pluggable parsers, with a
//!   port-indexed fast path and a sticky last-successful parser.
//! - Recursion-safe re-entry: a freshly reassembled datagram is re-dissected
//!   from the network layer down, bounded by a configurable recursion depth.
//!
//! # Organization
//!
//! - [`header`] holds the polymorphic [`header::Header`] tagged union and the
//!   per-layer decoders.
//! - [`fragment`] implements reassembly and cache eviction.
//! - [`registry`] implements the application-parser contract and dispatch
//!   policy.
//! - [`dispatch`] ties the above together behind [`dispatch::Engine::parse`].

pub mod config;
pub mod error;
mod logging;

pub mod header;
pub mod fragment;
pub mod registry;
pub mod dispatch;

pub use config::EngineConfig;
pub use dispatch::{DataSource, Engine};
pub use error::DissectError;
pub use header::Header;
pub use registry::{AppParser, ParseResult};

use std::hash::BuildHasherDefault;
/// A hash map keyed for speed rather than DoS resistance, used for the
/// high-rate, short-lived lookups in the fragment cache and port map.
pub(crate) type FxHashMap<K, V> = std::collections::HashMap<K, V, BuildHasherDefault<rustc_hash::FxHasher>>;
