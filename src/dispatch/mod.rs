//! The top-level entry point: drives per-layer decoding, fragment
//! reassembly re-entry, and application-layer dispatch.

mod callbacks;

pub use callbacks::{EthernetCallback, NetworkCallback, TransportCallback};

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::{DissectError, Layer};
use crate::fragment::{CheckResult, FragmentTable};
use crate::header::{ArpHeader, EthernetHeader, Header, HeaderChain, Ipv4Header, Ipv6Header, NetworkProtocol, TcpHeader, TransportProtocol, UdpHeader};
use crate::header::icmp::IcmpHeader;
use crate::logging;
use crate::registry::{AppParser, DuplicateParser, ParseResult, ParserRegistry};

use callbacks::CallbackSet;

/// Where the bytes handed to [`Engine::parse`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// A frame straight off a network interface: run the full Ethernet →
    /// network → transport → application pipeline.
    Network,
    /// A byte stream with no link/network/transport framing (e.g. a serial
    /// link): hand the bytes straight to the application dispatcher.
    Serial,
}

/// Ties together configuration, the fragment reassembly table, the parser
/// registry, and the three layer callbacks.
pub struct Engine {
    config: EngineConfig,
    fragments: FragmentTable,
    registry: ParserRegistry,
    callbacks: Mutex<CallbackSet>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            fragments: FragmentTable::new(config),
            registry: ParserRegistry::new(),
            callbacks: Mutex::new(CallbackSet::default()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Registers an application parser against zero or more ports. See
    /// [`ParserRegistry::add_parser`].
    pub fn add_app_parser(&self, parser: Arc<dyn AppParser>, ports: &[u16]) -> Result<(), DuplicateParser> {
        self.registry.add_parser(parser, ports)
    }

    pub fn set_ethernet_callback(&self, callback: EthernetCallback) {
        self.callbacks.lock().expect("callback lock poisoned").ethernet = Some(callback);
    }

    pub fn set_network_callback(&self, callback: NetworkCallback) {
        self.callbacks.lock().expect("callback lock poisoned").network = Some(callback);
    }

    pub fn set_transport_callback(&self, callback: TransportCallback) {
        self.callbacks.lock().expect("callback lock poisoned").transport = Some(callback);
    }

    /// Runs the dissection pipeline over one packet.
    ///
    /// Returns the specification's small-integer status code; see
    /// [`DissectError::code`] for the mapping.
    pub fn parse(&self, bytes: &[u8], source: DataSource) -> i32 {
        if bytes.is_empty() {
            return DissectError::EmptyInput.code();
        }
        match source {
            DataSource::Serial => self.dispatch_application(None, bytes),
            DataSource::Network => self.parse_ethernet(bytes),
        }
    }

    fn parse_ethernet(&self, bytes: &[u8]) -> i32 {
        let now = Instant::now();
        let Some((header, header_len)) = EthernetHeader::decode(bytes) else {
            tracing::debug!(target: logging::DECODE_FAIL, layer = %Layer::Ethernet, "ethernet header decode failed");
            return DissectError::DecodeFailed(Layer::Ethernet).code();
        };
        let payload = &bytes[header_len..];

        if !self.invoke_ethernet(now, bytes.len(), &header, payload) {
            return DissectError::CallbackStop.code();
        }

        let Some(protocol) = header.network_protocol() else {
            tracing::debug!(target: logging::DECODE_FAIL, layer = %Layer::Network, ethertype = header.next_protocol, "unrecognised ethertype");
            return DissectError::DecodeFailed(Layer::Network).code();
        };

        let mut chain = HeaderChain::new();
        chain.push(Header::from(header));
        let total_len = bytes.len();
        self.parse_network(protocol, payload, 0, &mut chain, total_len)
    }

    /// `total_len` is the length of the top-level buffer this dissection
    /// call started from — the captured frame on first entry, or the
    /// rebuilt datagram's own size when re-entering after reassembly —
    /// handed uniformly to the network and transport callbacks the way the
    /// original passes `dataLen` to every layer callback within one call.
    fn parse_network(&self, protocol: NetworkProtocol, bytes: &[u8], depth: u8, chain: &mut HeaderChain, total_len: usize) -> i32 {
        if depth >= self.config.max_recursion_depth() {
            tracing::warn!(target: logging::RECURSION_LIMIT, depth, "recursion limit exceeded re-dissecting a reassembled datagram");
            return DissectError::RecursionLimit.code();
        }

        let now = Instant::now();
        let decoded = match protocol {
            NetworkProtocol::Ipv4 => Ipv4Header::decode(bytes).map(|(h, len)| (Header::Ipv4(h), len)),
            NetworkProtocol::Ipv6 => Ipv6Header::decode(bytes).map(|(h, len)| (Header::Ipv6(h), len)),
            NetworkProtocol::Arp => ArpHeader::decode(bytes).map(|(h, len)| (Header::Arp(h), len)),
        };
        let (header, header_len) = match decoded {
            Some(pair) => pair,
            None => {
                tracing::debug!(target: logging::DECODE_FAIL, layer = %Layer::Network, "network header decode failed");
                return DissectError::DecodeFailed(Layer::Network).code();
            }
        };
        let payload = &bytes[header_len..];
        let index = chain.push(header.clone());

        // The fragment check runs before the network callback gate: a raw
        // fragment (buffered or about to be recursed into) never reaches
        // `network_cb` — only a complete, non-fragmented datagram does.
        match self.fragments.check_and_handle_fragment(&header, bytes, now) {
            CheckResult::NotFragment => {
                if !self.invoke_network(now, total_len, &header, chain.parent(index), payload) {
                    return DissectError::CallbackStop.code();
                }
                self.parse_transport(&header, payload, chain, total_len)
            }
            CheckResult::Fragment { reassembled: None } => DissectError::FragmentBuffered.code(),
            CheckResult::Fragment {
                reassembled: Some(datagram),
            } => {
                let total_len = datagram.len();
                self.parse_network(protocol, &datagram, depth + 1, chain, total_len)
            }
        }
    }

    fn parse_transport(&self, network_header: &Header, bytes: &[u8], chain: &mut HeaderChain, total_len: usize) -> i32 {
        let protocol_number = match network_header {
            Header::Arp(_) => return 0,
            Header::Ipv4(header) => header.next_protocol,
            Header::Ipv6(header) => header.next_header,
            _ => return DissectError::DecodeFailed(Layer::Transport).code(),
        };

        let Some(protocol) = TransportProtocol::from_protocol_number(protocol_number) else {
            tracing::debug!(target: logging::DECODE_FAIL, layer = %Layer::Transport, protocol_number, "unrecognised transport protocol number");
            return DissectError::DecodeFailed(Layer::Transport).code();
        };

        let now = Instant::now();
        let decoded = match protocol {
            TransportProtocol::Tcp => TcpHeader::decode(bytes).map(|(h, len)| (Header::Tcp(h), len)),
            TransportProtocol::Udp => UdpHeader::decode(bytes).map(|(h, len)| (Header::Udp(h), len)),
            TransportProtocol::Icmp | TransportProtocol::Icmpv6 => IcmpHeader::decode(bytes).map(|(h, len)| (Header::Icmp(h), len)),
        };
        let Some((header, header_len)) = decoded else {
            tracing::debug!(target: logging::DECODE_FAIL, layer = %Layer::Transport, "transport header decode failed");
            return DissectError::DecodeFailed(Layer::Transport).code();
        };
        let payload = &bytes[header_len..];

        let index = chain.push(header.clone());
        if !self.invoke_transport(now, total_len, &header, chain.parent(index), payload) {
            return DissectError::CallbackStop.code();
        }

        self.dispatch_application(Some(&header), payload)
    }

    fn dispatch_application(&self, transport_header: Option<&Header>, payload: &[u8]) -> i32 {
        let now = Instant::now();
        let (dst_port, src_port) = transport_header.map(transport_ports).unwrap_or((None, None));
        let fallback = self.registry.ordered_parsers();

        let mut offset = 0usize;
        let mut sticky: Option<Arc<dyn AppParser>> = None;

        while offset < payload.len() {
            let remaining = &payload[offset..];
            let mut tried: Vec<u32> = Vec::new();
            let mut candidates: Vec<Arc<dyn AppParser>> = Vec::new();

            if let Some(parser) = sticky.clone() {
                candidates.push(parser);
            }
            for port in [dst_port, src_port].into_iter().flatten() {
                if let Some(parser) = self.registry.port_parser(port) {
                    candidates.push(parser);
                }
            }
            candidates.extend(fallback.iter().cloned());

            let mut matched: Option<(Arc<dyn AppParser>, usize)> = None;
            for parser in candidates {
                let protocol_id = parser.protocol_id();
                if tried.contains(&protocol_id) {
                    continue;
                }
                tried.push(protocol_id);

                match parser.parse(now, payload.len(), transport_header, remaining) {
                    (ParseResult::Success, consumed) => {
                        matched = Some((parser, consumed));
                        break;
                    }
                    (ParseResult::Continue, _) => return DissectError::FragmentBuffered.code(),
                    (ParseResult::Failure, _) => continue,
                }
            }

            match matched {
                Some((parser, consumed)) => {
                    if consumed == 0 || consumed > remaining.len() {
                        return if offset > 0 { 0 } else { DissectError::AppParserConsumeInvalid.code() };
                    }
                    sticky = Some(parser);
                    offset += consumed;
                }
                None => return 0,
            }
        }

        0
    }

    fn invoke_ethernet(&self, now: Instant, total_len: usize, header: &EthernetHeader, payload: &[u8]) -> bool {
        let callback = self.callbacks.lock().expect("callback lock poisoned").ethernet.clone();
        match callback {
            Some(callback) => callback(now, total_len, header, payload),
            None => true,
        }
    }

    fn invoke_network(&self, now: Instant, total_len: usize, header: &Header, parent: Option<&Header>, payload: &[u8]) -> bool {
        let callback = self.callbacks.lock().expect("callback lock poisoned").network.clone();
        match callback {
            Some(callback) => callback(now, total_len, header, parent, payload),
            None => true,
        }
    }

    fn invoke_transport(&self, now: Instant, total_len: usize, header: &Header, parent: Option<&Header>, payload: &[u8]) -> bool {
        let callback = self.callbacks.lock().expect("callback lock poisoned").transport.clone();
        match callback {
            Some(callback) => callback(now, total_len, header, parent, payload),
            None => true,
        }
    }
}

fn transport_ports(header: &Header) -> (Option<u16>, Option<u16>) {
    match header {
        Header::Tcp(tcp) => (Some(tcp.dst_port), Some(tcp.src_port)),
        Header::Udp(udp) => (Some(udp.dst_port), Some(udp.src_port)),
        _ => (None, None),
    }
}
