//! BusWatch core library for field-bus frame detection and decoding.
//!
//! This crate implements the protocol engine behind the live monitoring
//! view: a capture layer delivers raw bytes plus per-port context, and the
//! engine identifies which protocol produced them, decodes the frame into an
//! ordered, display-agnostic field list, and returns a uniform result.
//! Parsing is byte-oriented and side-effect free; there is no I/O anywhere
//! in this crate. Protocol byte conventions live in each protocol's `layout`
//! and `codes` modules so parsers stay minimal and consistent.
//!
//! Invariants:
//! - `ParseResult::raw` is always byte-identical to the input.
//! - Field order within a result is fixed per protocol and part of the
//!   contract.
//! - Auto-detection is deterministic: confidence ties resolve in
//!   registration order (stable sort).
//!
//! Version française (résumé):
//! Cette crate fournit le moteur de décodage de trames bus de terrain :
//! octets bruts + contexte de port -> détection heuristique du protocole ->
//! décodage en liste de champs ordonnée. Aucune E/S, résultats
//! déterministes, départage des égalités par ordre d'enregistrement.
//!
//! # Examples
//! ```
//! use buswatch_core::{Direction, ParseContext, ParserRegistry};
//!
//! let registry = ParserRegistry::with_builtins();
//! let frame = [0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD];
//! let context = ParseContext::serial(Direction::Receive, 0);
//!
//! let result = registry.auto_detect_and_parse(&frame, &context).unwrap();
//! assert!(result.success);
//! assert_eq!(result.protocol, "MODBUS RTU");
//! ```

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub mod bytes;
mod parser;
pub mod protocols;
mod registry;

pub use parser::{FactoryError, ParserFactory, ProtocolParser};
pub use registry::ParserRegistry;

/// Data direction relative to the monitored device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "tx")]
    Transmit,
    #[serde(rename = "rx")]
    Receive,
}

impl Direction {
    /// Short uppercase label used in summaries ("TX" / "RX").
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Transmit => "TX",
            Direction::Receive => "RX",
        }
    }
}

/// Physical transport the bytes were captured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    Serial,
    Can,
}

/// CAN-specific frame metadata.
///
/// Present on a [`ParseContext`] exactly when the port type is CAN. The
/// `Default` value (id 0, dlc 0, no flags) is a sane stand-in when the
/// capture layer could not supply metadata.
///
/// # Examples
/// ```
/// use buswatch_core::CanMeta;
///
/// let meta = CanMeta { id: 0x701, dlc: 1, ..CanMeta::default() };
/// assert!(!meta.ext);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanMeta {
    /// 11-bit (standard) or 29-bit (extended) identifier.
    pub id: u32,
    /// Declared data length code (0-8).
    pub dlc: u8,
    /// Remote transmission request flag.
    pub rtr: bool,
    /// Extended-identifier flag; selects the 29-bit ID space.
    pub ext: bool,
}

/// Immutable per-call facts about the captured frame.
///
/// Built by the capture/transport layer, consumed by every parser. CAN-only
/// metadata is `None` for serial ports and `Some` for CAN ports; the
/// constructors enforce this.
///
/// # Examples
/// ```
/// use buswatch_core::{CanMeta, Direction, ParseContext, PortType};
///
/// let serial = ParseContext::serial(Direction::Transmit, 1);
/// assert!(serial.can.is_none());
///
/// let can = ParseContext::can(Direction::Receive, 0, CanMeta { id: 0x80, ..CanMeta::default() });
/// assert_eq!(can.port_type, PortType::Can);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseContext {
    pub direction: Direction,
    pub port_type: PortType,
    /// Zero-based index of the originating port.
    pub port_index: u32,
    /// Capture timestamp in seconds since the Unix epoch, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    /// CAN frame metadata; `None` exactly when `port_type` is serial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can: Option<CanMeta>,
}

impl ParseContext {
    /// Context for a serial (RS-485/RS-232) port.
    pub fn serial(direction: Direction, port_index: u32) -> Self {
        Self {
            direction,
            port_type: PortType::Serial,
            port_index,
            timestamp: None,
            can: None,
        }
    }

    /// Context for a CAN port.
    pub fn can(direction: Direction, port_index: u32, can: CanMeta) -> Self {
        Self {
            direction,
            port_type: PortType::Can,
            port_index,
            timestamp: None,
            can: Some(can),
        }
    }

    /// Attach a capture timestamp (seconds since the Unix epoch).
    pub fn with_timestamp(mut self, ts: f64) -> Self {
        self.timestamp = Some(ts);
        self
    }

    /// CAN metadata, defaulted when the capture layer supplied none.
    ///
    /// Only meaningful for CAN contexts; serial contexts get the default.
    pub fn can_meta(&self) -> CanMeta {
        self.can.unwrap_or_default()
    }

    /// RFC3339 rendering of the capture timestamp, when present and valid.
    pub fn timestamp_rfc3339(&self) -> Option<String> {
        let ts = self.timestamp?;
        let odt = OffsetDateTime::from_unix_timestamp_nanos((ts * 1e9) as i128).ok()?;
        odt.format(&Rfc3339).ok()
    }
}

/// A decoded field value: either display text or a plain number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(i64),
    Text(String),
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One decoded element, in display order.
///
/// `bytes` is the exact sub-slice of the input the field was derived from;
/// synthetic/summary fields leave it empty. `highlight` is an opaque
/// presentation hint carried through unchanged.
///
/// # Examples
/// ```
/// use buswatch_core::ParsedField;
///
/// let field = ParsedField::number("Slave Address", vec![0x01], 1)
///     .with_description("station 1");
/// assert_eq!(field.name, "Slave Address");
/// assert_eq!(field.bytes, vec![0x01]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedField {
    pub name: String,
    pub bytes: Vec<u8>,
    pub value: FieldValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
}

impl ParsedField {
    /// Field with a textual value.
    pub fn text(name: impl Into<String>, bytes: Vec<u8>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes,
            value: FieldValue::Text(value.into()),
            description: None,
            highlight: None,
        }
    }

    /// Field with a numeric value.
    pub fn number(name: impl Into<String>, bytes: Vec<u8>, value: i64) -> Self {
        Self {
            name: name.into(),
            bytes,
            value: FieldValue::Number(value),
            description: None,
            highlight: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_highlight(mut self, highlight: impl Into<String>) -> Self {
        self.highlight = Some(highlight.into());
        self
    }
}

/// The unit returned by any parser.
///
/// `raw` always equals the bytes passed in, for audit and re-parse.
/// Non-fatal decode anomalies land in `warnings` on a `success = true`
/// result; parse-aborting anomalies land in `errors` with
/// `success = false`. Even a failed result carries at least a length/hex
/// fallback field.
///
/// # Examples
/// ```
/// use buswatch_core::{Direction, ParseContext, ParserRegistry};
///
/// let registry = ParserRegistry::with_builtins();
/// let context = ParseContext::serial(Direction::Receive, 0);
/// let result = registry.auto_detect_and_parse(b"hello\r\n", &context).unwrap();
/// assert_eq!(result.raw, b"hello\r\n");
/// assert!(result.errors.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub success: bool,
    /// Human name of the parser that produced this result.
    pub protocol: String,
    /// Specific decoded message kind, e.g. "Read Holding Registers".
    pub message_type: String,
    /// One-line description for list views.
    pub summary: String,
    /// Decoded fields in protocol-defined order.
    pub fields: Vec<ParsedField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// The exact input bytes, unmodified.
    pub raw: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_context_has_no_can_meta() {
        let ctx = ParseContext::serial(Direction::Receive, 2);
        assert_eq!(ctx.port_type, PortType::Serial);
        assert!(ctx.can.is_none());
        assert_eq!(ctx.can_meta(), CanMeta::default());
    }

    #[test]
    fn can_context_carries_meta() {
        let meta = CanMeta {
            id: 0x601,
            dlc: 8,
            rtr: false,
            ext: false,
        };
        let ctx = ParseContext::can(Direction::Transmit, 0, meta);
        assert_eq!(ctx.can, Some(meta));
    }

    #[test]
    fn timestamp_formats_as_rfc3339() {
        let ctx = ParseContext::serial(Direction::Receive, 0).with_timestamp(0.0);
        assert_eq!(
            ctx.timestamp_rfc3339().as_deref(),
            Some("1970-01-01T00:00:00Z")
        );

        let ctx = ParseContext::serial(Direction::Receive, 0);
        assert!(ctx.timestamp_rfc3339().is_none());
    }

    #[test]
    fn field_value_serializes_untagged() {
        let num = serde_json::to_value(FieldValue::Number(17)).unwrap();
        assert_eq!(num, serde_json::json!(17));
        let text = serde_json::to_value(FieldValue::Text("0x11".into())).unwrap();
        assert_eq!(text, serde_json::json!("0x11"));
    }

    #[test]
    fn result_omits_empty_error_lists() {
        let result = ParseResult {
            success: true,
            protocol: "Raw Serial".to_string(),
            message_type: "Raw Data".to_string(),
            summary: "1 byte RX".to_string(),
            fields: vec![ParsedField::number("Length", vec![], 1)],
            errors: vec![],
            warnings: vec![],
            raw: vec![0x42],
        };
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("errors").is_none());
        assert!(value.get("warnings").is_none());
        assert_eq!(value["raw"], serde_json::json!([0x42]));
    }
}
