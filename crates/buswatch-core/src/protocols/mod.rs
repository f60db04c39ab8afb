//! Protocol decoding modules.
//!
//! Each protocol follows a layered structure:
//! - `layout`/`cob`: byte offsets, ranges and id decomposition (source of
//!   truth)
//! - `codes`: standard name tables
//! - `parser`: domain-level decoding into [`crate::ParseResult`]
//! - `error`: explicit, actionable errors where hard failures exist
//!
//! Parsers are pure and contain no I/O; the registry handles selection and
//! dispatch. Adding a protocol means implementing
//! [`crate::ProtocolParser`] in a new sub-module and registering it — no
//! call sites change.

pub mod canopen;
pub mod modbus;
pub mod raw_serial;

pub use canopen::{CanOpenParser, CanOpenParserFactory};
pub use modbus::ModbusRtuParser;
pub use raw_serial::RawSerialParser;
