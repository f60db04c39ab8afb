//! Parser catalog with confidence-ranked auto-detection.
//!
//! The registry is the only shared mutable state in the engine. The
//! id-to-parser mapping sits behind a `RwLock` (single writer, many
//! readers); detection and parsing take a read lock only long enough to
//! clone the candidate handles. Insertion order is preserved because it is
//! load-bearing: equal-confidence candidates resolve in registration order.

use std::cmp::Ordering;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::protocols::{CanOpenParser, CanOpenParserFactory, ModbusRtuParser, RawSerialParser};
use crate::{ParseContext, ParseResult, ParserFactory, PortType, ProtocolParser};

#[derive(Default)]
struct Catalog {
    parsers: Vec<Arc<dyn ProtocolParser>>,
    factories: Vec<Arc<dyn ParserFactory>>,
}

/// Process-wide catalog of protocol parsers and factories.
///
/// # Examples
/// ```
/// use buswatch_core::{Direction, ParseContext, ParserRegistry};
///
/// let registry = ParserRegistry::with_builtins();
/// assert!(registry.get("modbus-rtu").is_some());
///
/// let context = ParseContext::serial(Direction::Receive, 0);
/// let result = registry.parse_with("raw-serial", &[0x42], &context).unwrap();
/// assert_eq!(result.protocol, "Raw Serial");
/// ```
pub struct ParserRegistry {
    catalog: RwLock<Catalog>,
}

impl ParserRegistry {
    /// Empty registry; parsers must be registered explicitly.
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(Catalog::default()),
        }
    }

    /// Registry pre-populated with the built-in parsers: MODBUS RTU and
    /// CANopen first, the raw serial fallback last, plus the CANopen
    /// factory.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(ModbusRtuParser));
        registry.register(Arc::new(CanOpenParser::new()));
        registry.register(Arc::new(RawSerialParser));
        registry.register_factory(Arc::new(CanOpenParserFactory));
        registry
    }

    /// Insert `parser` by id. A duplicate id overwrites the existing entry
    /// in place (a warning-level notice, not an error) so built-ins can be
    /// replaced at runtime.
    pub fn register(&self, parser: Arc<dyn ProtocolParser>) {
        let mut catalog = self.catalog.write().expect("registry lock poisoned");
        if let Some(existing) = catalog.parsers.iter_mut().find(|p| p.id() == parser.id()) {
            warn!(id = parser.id(), "parser already registered, overwriting");
            *existing = parser;
        } else {
            debug!(id = parser.id(), name = parser.name(), "registered parser");
            catalog.parsers.push(parser);
        }
    }

    /// Insert `factory` by id, overwriting in place on duplicates.
    pub fn register_factory(&self, factory: Arc<dyn ParserFactory>) {
        let mut catalog = self.catalog.write().expect("registry lock poisoned");
        if let Some(existing) = catalog.factories.iter_mut().find(|f| f.id() == factory.id()) {
            warn!(id = factory.id(), "factory already registered, overwriting");
            *existing = factory;
        } else {
            debug!(id = factory.id(), name = factory.name(), "registered factory");
            catalog.factories.push(factory);
        }
    }

    /// Remove the parser with `id`; returns whether anything was removed.
    pub fn unregister(&self, id: &str) -> bool {
        let mut catalog = self.catalog.write().expect("registry lock poisoned");
        let before = catalog.parsers.len();
        catalog.parsers.retain(|p| p.id() != id);
        catalog.parsers.len() != before
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn ProtocolParser>> {
        let catalog = self.catalog.read().expect("registry lock poisoned");
        catalog.parsers.iter().find(|p| p.id() == id).cloned()
    }

    pub fn get_factory(&self, id: &str) -> Option<Arc<dyn ParserFactory>> {
        let catalog = self.catalog.read().expect("registry lock poisoned");
        catalog.factories.iter().find(|f| f.id() == id).cloned()
    }

    /// All parsers, in registration order.
    pub fn get_all(&self) -> Vec<Arc<dyn ProtocolParser>> {
        let catalog = self.catalog.read().expect("registry lock poisoned");
        catalog.parsers.clone()
    }

    /// Parsers declaring support for `port_type`, in registration order.
    pub fn get_for_port_type(&self, port_type: PortType) -> Vec<Arc<dyn ProtocolParser>> {
        let catalog = self.catalog.read().expect("registry lock poisoned");
        catalog
            .parsers
            .iter()
            .filter(|p| p.supports(port_type))
            .cloned()
            .collect()
    }

    /// Score every parser registered for the context's port type and parse
    /// with the highest-confidence candidate.
    ///
    /// The sort is stable and descending, so equal confidence preserves
    /// registration order. Returns `None` only when no candidate claims any
    /// confidence — with the raw fallback registered this never happens for
    /// serial input.
    pub fn auto_detect_and_parse(&self, data: &[u8], context: &ParseContext) -> Option<ParseResult> {
        let candidates = self.get_for_port_type(context.port_type);
        if candidates.is_empty() {
            return None;
        }

        let mut scored: Vec<(Arc<dyn ProtocolParser>, f32)> = candidates
            .into_iter()
            .map(|parser| {
                let confidence = parser.detect(data, context);
                (parser, confidence)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let (winner, confidence) = &scored[0];
        if *confidence > 0.0 {
            Some(winner.parse(data, context))
        } else {
            None
        }
    }

    /// Dispatch directly to the parser with `id`, bypassing detection.
    /// Returns `None` when the id is unknown.
    pub fn parse_with(&self, id: &str, data: &[u8], context: &ParseContext) -> Option<ParseResult> {
        let parser = self.get(id);
        if parser.is_none() {
            warn!(id, "parser not found");
        }
        Some(parser?.parse(data, context))
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
