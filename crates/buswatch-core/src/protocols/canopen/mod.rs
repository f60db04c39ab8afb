//! CANopen decoding (CiA 301 communication profile + CiA 402 drive
//! profile).
//!
//! The parser decomposes the 11-bit COB-ID into a function code and node
//! id, dispatches on the pre-defined connection set (NMT, SYNC, EMCY,
//! Heartbeat, SDO, PDO), and names object dictionary accesses via the
//! static CiA 301/402 tables. Statusword and controlword values are decoded
//! bit by bit into the CiA 402 state machine.
//!
//! COB-ID ranges live in `cob`, service code tables in `codes`, the object
//! dictionary in `dictionary`/`cia402`. `factory` builds parsers with
//! site-specific PDO mappings.

pub mod cia402;
pub mod cob;
pub mod codes;
pub mod dictionary;
pub mod factory;
pub mod parser;

pub use factory::CanOpenParserFactory;
pub use parser::{CanOpenParser, PdoField};
