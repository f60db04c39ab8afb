//! MODBUS RTU decoding.
//!
//! The parser validates frame length and the trailing CRC16, then decodes
//! the address/function/payload structure into display fields. Detection is
//! strict: a CRC mismatch scores zero confidence so corrupt or foreign
//! traffic falls through to the raw fallback instead of being guessed at.
//!
//! Byte offsets live in `layout`, the standard function/exception tables in
//! `codes`, and the CRC16 implementation in `crc`.

pub mod codes;
pub mod crc;
pub mod error;
pub mod layout;
pub mod parser;

pub use parser::ModbusRtuParser;
