//! Standard MODBUS function and exception code tables.

pub const READ_COILS: u8 = 0x01;
pub const READ_DISCRETE_INPUTS: u8 = 0x02;
pub const READ_HOLDING_REGISTERS: u8 = 0x03;
pub const READ_INPUT_REGISTERS: u8 = 0x04;
pub const WRITE_SINGLE_COIL: u8 = 0x05;
pub const WRITE_SINGLE_REGISTER: u8 = 0x06;
pub const READ_EXCEPTION_STATUS: u8 = 0x07;
pub const DIAGNOSTICS: u8 = 0x08;
pub const GET_COMM_EVENT_COUNTER: u8 = 0x0B;
pub const GET_COMM_EVENT_LOG: u8 = 0x0C;
pub const WRITE_MULTIPLE_COILS: u8 = 0x0F;
pub const WRITE_MULTIPLE_REGISTERS: u8 = 0x10;
pub const REPORT_SLAVE_ID: u8 = 0x11;
pub const READ_FILE_RECORD: u8 = 0x14;
pub const WRITE_FILE_RECORD: u8 = 0x15;
pub const MASK_WRITE_REGISTER: u8 = 0x16;
pub const READ_WRITE_MULTIPLE_REGISTERS: u8 = 0x17;
pub const READ_FIFO_QUEUE: u8 = 0x18;

/// Name of a standard public function code.
pub fn function_name(code: u8) -> Option<&'static str> {
    match code {
        READ_COILS => Some("Read Coils"),
        READ_DISCRETE_INPUTS => Some("Read Discrete Inputs"),
        READ_HOLDING_REGISTERS => Some("Read Holding Registers"),
        READ_INPUT_REGISTERS => Some("Read Input Registers"),
        WRITE_SINGLE_COIL => Some("Write Single Coil"),
        WRITE_SINGLE_REGISTER => Some("Write Single Register"),
        READ_EXCEPTION_STATUS => Some("Read Exception Status"),
        DIAGNOSTICS => Some("Diagnostics"),
        GET_COMM_EVENT_COUNTER => Some("Get Comm Event Counter"),
        GET_COMM_EVENT_LOG => Some("Get Comm Event Log"),
        WRITE_MULTIPLE_COILS => Some("Write Multiple Coils"),
        WRITE_MULTIPLE_REGISTERS => Some("Write Multiple Registers"),
        REPORT_SLAVE_ID => Some("Report Slave ID"),
        READ_FILE_RECORD => Some("Read File Record"),
        WRITE_FILE_RECORD => Some("Write File Record"),
        MASK_WRITE_REGISTER => Some("Mask Write Register"),
        READ_WRITE_MULTIPLE_REGISTERS => Some("Read/Write Multiple Registers"),
        READ_FIFO_QUEUE => Some("Read FIFO Queue"),
        _ => None,
    }
}

/// Codes commonly seen on real buses; used to nudge detection confidence.
pub fn is_common_function(code: u8) -> bool {
    matches!(
        code,
        READ_COILS
            | READ_DISCRETE_INPUTS
            | READ_HOLDING_REGISTERS
            | READ_INPUT_REGISTERS
            | WRITE_SINGLE_COIL
            | WRITE_SINGLE_REGISTER
            | WRITE_MULTIPLE_COILS
            | WRITE_MULTIPLE_REGISTERS
    )
}

/// Name of a standard exception code (1-11).
pub fn exception_name(code: u8) -> Option<&'static str> {
    match code {
        0x01 => Some("Illegal Function"),
        0x02 => Some("Illegal Data Address"),
        0x03 => Some("Illegal Data Value"),
        0x04 => Some("Slave Device Failure"),
        0x05 => Some("Acknowledge"),
        0x06 => Some("Slave Device Busy"),
        0x07 => Some("Negative Acknowledge"),
        0x08 => Some("Memory Parity Error"),
        0x0A => Some("Gateway Path Unavailable"),
        0x0B => Some("Gateway Target Device Failed to Respond"),
        _ => None,
    }
}
