//! The polymorphic parser contract.
//!
//! Protocols plug into the engine through [`ProtocolParser`]; protocols that
//! need construction-time configuration additionally provide a
//! [`ParserFactory`]. Both are object-safe so the registry can hold them
//! behind `Arc<dyn _>` without knowing the concrete types.

use std::sync::Arc;

use thiserror::Error;

use crate::{ParseContext, ParseResult, PortType};

/// A protocol implementation: identity, port support, heuristic detection
/// and decoding.
///
/// Implementations must be `Send + Sync`; the built-in parsers are stateless
/// and shared freely across concurrent calls. Factory-created parsers may
/// carry configuration state but must not mutate it during `detect`/`parse`.
pub trait ProtocolParser: Send + Sync {
    /// Unique identifier used for registry lookup (e.g. `"modbus-rtu"`).
    fn id(&self) -> &str;

    /// Human-readable display name (e.g. `"MODBUS RTU"`).
    fn name(&self) -> &str;

    /// Short description for catalog listings.
    fn description(&self) -> &str;

    /// Port types this parser can decode.
    fn port_types(&self) -> &[PortType];

    /// Score how likely `data` belongs to this protocol, in `[0, 1]`.
    ///
    /// A hard 0 means "certainly not mine"; the registry never dispatches to
    /// a zero-confidence parser.
    fn detect(&self, data: &[u8], context: &ParseContext) -> f32;

    /// Decode `data` into a [`ParseResult`].
    ///
    /// Never fails outright: fatal anomalies produce `success = false` with
    /// an `errors` entry and a minimal field set.
    fn parse(&self, data: &[u8], context: &ParseContext) -> ParseResult;

    /// Whether this parser declares support for `port_type`.
    fn supports(&self, port_type: PortType) -> bool {
        self.port_types().contains(&port_type)
    }
}

/// Errors from [`ParserFactory::create`].
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("invalid parser configuration: {0}")]
    InvalidConfig(String),
}

/// Builds configured parser instances for protocols that need
/// construction-time state (e.g. a site-specific PDO mapping).
///
/// Not required by the built-in parsers, but part of the contract surface so
/// other protocols can use it without engine changes.
pub trait ParserFactory: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn port_types(&self) -> &[PortType];

    /// Create a parser instance from a JSON configuration value.
    fn create(&self, config: &serde_json::Value) -> Result<Arc<dyn ProtocolParser>, FactoryError>;
}
