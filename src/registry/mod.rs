//! The application-parser registry: an ordered list for fallback probing
//! plus a port-keyed multimap for the fast path, behind one `RwLock` (read
//! for every dispatch, write only when a parser is registered or removed).

mod parser;
pub use parser::{AppParser, ParseResult};

use std::sync::{Arc, RwLock};

use crate::FxHashMap;

/// Returned when registering a parser whose `protocol_id` is already
/// present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateParser(pub u32);

impl std::fmt::Display for DuplicateParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "a parser with protocol_id {} is already registered", self.0)
    }
}

impl std::error::Error for DuplicateParser {}

struct Inner {
    ordered: Vec<Arc<dyn AppParser>>,
    by_port: FxHashMap<u16, Vec<Arc<dyn AppParser>>>,
}

/// The registry of application-layer parsers available to the dispatcher.
pub struct ParserRegistry {
    inner: RwLock<Inner>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                ordered: Vec::new(),
                by_port: FxHashMap::default(),
            }),
        }
    }

    /// Registers `parser` against zero or more ports. Fails if a parser
    /// with the same `protocol_id` is already registered; the registry is
    /// left unchanged in that case.
    pub fn add_parser(&self, parser: Arc<dyn AppParser>, ports: &[u16]) -> Result<(), DuplicateParser> {
        let mut inner = self.inner.write().expect("parser registry lock poisoned");
        let protocol_id = parser.protocol_id();
        if inner.ordered.iter().any(|p| p.protocol_id() == protocol_id) {
            return Err(DuplicateParser(protocol_id));
        }
        inner.ordered.push(parser.clone());
        for &port in ports {
            inner.by_port.entry(port).or_default().push(parser.clone());
        }
        Ok(())
    }

    /// Removes a parser by `protocol_id` from both the ordered list and
    /// every port it was mapped against. A no-op if no such parser exists.
    pub fn remove_parser(&self, protocol_id: u32) {
        let mut inner = self.inner.write().expect("parser registry lock poisoned");
        inner.ordered.retain(|p| p.protocol_id() != protocol_id);
        for list in inner.by_port.values_mut() {
            list.retain(|p| p.protocol_id() != protocol_id);
        }
        inner.by_port.retain(|_, list| !list.is_empty());
    }

    /// The first parser mapped to `port`, if any (the port map allows
    /// several parsers per port; only the first is tried by the fast
    /// path).
    pub fn port_parser(&self, port: u16) -> Option<Arc<dyn AppParser>> {
        let inner = self.inner.read().expect("parser registry lock poisoned");
        inner.by_port.get(&port).and_then(|list| list.first().cloned())
    }

    /// Every registered parser, in registration order, for the fallback
    /// linear probe.
    pub fn ordered_parsers(&self) -> Vec<Arc<dyn AppParser>> {
        self.inner.read().expect("parser registry lock poisoned").ordered.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    struct StubParser(u32);

    impl AppParser for StubParser {
        fn protocol_id(&self) -> u32 {
            self.0
        }

        fn parse(&self, _now: Instant, _total_len: usize, _transport_header: Option<&crate::header::Header>, _payload: &[u8]) -> (ParseResult, usize) {
            (ParseResult::Failure, 0)
        }
    }

    #[test]
    fn rejects_duplicate_protocol_id() {
        let registry = ParserRegistry::new();
        registry.add_parser(Arc::new(StubParser(1)), &[502]).unwrap();
        let err = registry.add_parser(Arc::new(StubParser(1)), &[503]).unwrap_err();
        assert_eq!(err.0, 1);
    }

    #[test]
    fn port_map_allows_multiple_parsers_but_fast_path_takes_first() {
        let registry = ParserRegistry::new();
        registry.add_parser(Arc::new(StubParser(1)), &[502]).unwrap();
        registry.add_parser(Arc::new(StubParser(2)), &[502]).unwrap();
        assert_eq!(registry.port_parser(502).unwrap().protocol_id(), 1);
    }

    #[test]
    fn remove_purges_list_and_port_map() {
        let registry = ParserRegistry::new();
        registry.add_parser(Arc::new(StubParser(1)), &[502]).unwrap();
        registry.remove_parser(1);
        assert!(registry.port_parser(502).is_none());
        assert!(registry.ordered_parsers().is_empty());
    }

    #[test]
    fn removed_protocol_id_can_be_re_registered() {
        let registry = ParserRegistry::new();
        registry.add_parser(Arc::new(StubParser(1)), &[502]).unwrap();
        registry.remove_parser(1);
        assert!(registry.add_parser(Arc::new(StubParser(1)), &[503]).is_ok());
    }
}
