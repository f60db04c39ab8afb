use crate::bytes::{read_u16_be, to_hex};
use crate::{ParseContext, ParseResult, ParsedField, PortType};

use super::codes;
use super::crc;
use super::error::ModbusError;
use super::layout;

const DETECT_CRC_VALID: f32 = 0.85;
const DETECT_CRC_VALID_COMMON_FUNCTION: f32 = 0.95;

/// MODBUS RTU frame decoder for serial ports.
///
/// Detection is CRC-gated: a frame whose trailing CRC16 does not match
/// scores a hard zero so the raw fallback wins instead. Corrupt frames are
/// only decoded when a caller forces this parser by id, in which case the
/// mismatch is surfaced as a warning.
pub struct ModbusRtuParser;

impl crate::ProtocolParser for ModbusRtuParser {
    fn id(&self) -> &str {
        "modbus-rtu"
    }

    fn name(&self) -> &str {
        "MODBUS RTU"
    }

    fn description(&self) -> &str {
        "MODBUS RTU protocol over RS-485/RS-232"
    }

    fn port_types(&self) -> &[PortType] {
        &[PortType::Serial]
    }

    fn detect(&self, data: &[u8], context: &ParseContext) -> f32 {
        if context.port_type != PortType::Serial {
            return 0.0;
        }
        if data.len() < layout::MIN_FRAME_LEN {
            return 0.0;
        }
        if !crc::verify(data) {
            return 0.0;
        }

        let function = data[layout::FUNCTION_OFFSET] & layout::FUNCTION_MASK;
        if codes::is_common_function(function) {
            DETECT_CRC_VALID_COMMON_FUNCTION
        } else {
            DETECT_CRC_VALID
        }
    }

    fn parse(&self, data: &[u8], _context: &ParseContext) -> ParseResult {
        if data.len() < layout::MIN_FRAME_LEN {
            let err = ModbusError::TooShort {
                needed: layout::MIN_FRAME_LEN,
                actual: data.len(),
            };
            return ParseResult {
                success: false,
                protocol: self.name().to_string(),
                message_type: "Invalid".to_string(),
                summary: "Frame too short".to_string(),
                fields: vec![
                    ParsedField::text("Raw Data", data.to_vec(), to_hex(data, " "))
                        .with_description(format!("{} bytes", data.len())),
                ],
                errors: vec![err.to_string()],
                warnings: vec![],
                raw: data.to_vec(),
            };
        }

        let mut fields = Vec::new();
        let mut warnings = Vec::new();

        let slave = data[layout::ADDRESS_OFFSET];
        let mut addr_field = ParsedField::number("Slave Address", vec![slave], slave as i64)
            .with_highlight("#4fc3f7");
        if slave == layout::BROADCAST_ADDRESS {
            addr_field = addr_field.with_description("Broadcast");
        }
        fields.push(addr_field);
        if slave > layout::MAX_SLAVE_ADDRESS {
            warnings.push(format!(
                "slave address {slave} outside the valid range 1-{}",
                layout::MAX_SLAVE_ADDRESS
            ));
        }

        let function_byte = data[layout::FUNCTION_OFFSET];
        let is_exception = function_byte & layout::EXCEPTION_FLAG != 0;
        let function = function_byte & layout::FUNCTION_MASK;
        let function_name =
            codes::function_name(function).unwrap_or("Unknown Function");

        let function_desc = if is_exception {
            format!("Exception: {function_name}")
        } else {
            function_name.to_string()
        };
        fields.push(
            ParsedField::text(
                "Function Code",
                vec![function_byte],
                format!("0x{function_byte:02X}"),
            )
            .with_description(function_desc)
            .with_highlight(if is_exception { "#ef5350" } else { "#81c784" }),
        );

        let payload = &data[layout::DATA_OFFSET..data.len() - layout::CRC_LEN];
        let crc_field_bytes = &data[data.len() - layout::CRC_LEN..];

        if is_exception {
            parse_exception(payload, &mut fields);
        } else {
            parse_function_payload(function, payload, &mut fields);
        }

        // CRC field last: received value alongside the recomputed one. A
        // mismatch reaching parse means detection was bypassed via
        // parse_with, so it is a warning, not an error.
        let received_crc = u16::from_le_bytes([crc_field_bytes[0], crc_field_bytes[1]]);
        let computed_crc = crc::crc16(&data[..data.len() - layout::CRC_LEN]);
        let crc_valid = received_crc == computed_crc;
        fields.push(
            ParsedField::text(
                "CRC",
                crc_field_bytes.to_vec(),
                format!("0x{received_crc:04X}"),
            )
            .with_description(if crc_valid {
                "valid".to_string()
            } else {
                format!("mismatch (computed 0x{computed_crc:04X})")
            })
            .with_highlight(if crc_valid { "#81c784" } else { "#ef5350" }),
        );
        if !crc_valid {
            warnings.push(format!(
                "CRC mismatch: frame carries 0x{received_crc:04X}, computed 0x{computed_crc:04X}"
            ));
        }

        let message_type = if is_exception {
            format!("Exception: {function_name}")
        } else {
            function_name.to_string()
        };
        let summary = summarize(slave, function, is_exception, payload);

        ParseResult {
            success: true,
            protocol: self.name().to_string(),
            message_type,
            summary,
            fields,
            errors: vec![],
            warnings,
            raw: data.to_vec(),
        }
    }
}

fn parse_exception(payload: &[u8], fields: &mut Vec<ParsedField>) {
    if let Some(&code) = payload.first() {
        fields.push(
            ParsedField::number("Exception Code", vec![code], code as i64)
                .with_description(codes::exception_name(code).unwrap_or("Unknown"))
                .with_highlight("#ef5350"),
        );
    }
}

fn parse_function_payload(function: u8, payload: &[u8], fields: &mut Vec<ParsedField>) {
    match function {
        codes::READ_COILS | codes::READ_DISCRETE_INPUTS => {
            parse_read_bits(payload, fields);
        }
        codes::READ_HOLDING_REGISTERS | codes::READ_INPUT_REGISTERS => {
            parse_read_registers(payload, fields);
        }
        codes::WRITE_SINGLE_COIL => parse_write_single_coil(payload, fields),
        codes::WRITE_SINGLE_REGISTER => parse_write_single_register(payload, fields),
        codes::WRITE_MULTIPLE_COILS => parse_write_multiple_coils(payload, fields),
        codes::WRITE_MULTIPLE_REGISTERS => parse_write_multiple_registers(payload, fields),
        _ => {
            if !payload.is_empty() {
                fields.push(
                    ParsedField::text("Data", payload.to_vec(), to_hex(payload, " "))
                        .with_highlight("#ffb74d"),
                );
            }
        }
    }
}

/// Requests carry start address + quantity (4 bytes); responses carry a
/// byte count followed by packed coil status bits.
fn parse_read_bits(payload: &[u8], fields: &mut Vec<ParsedField>) {
    if payload.len() == 4 {
        push_address_quantity(payload, "Quantity", fields);
    } else if !payload.is_empty() {
        let byte_count = payload[0];
        fields.push(
            ParsedField::number("Byte Count", vec![byte_count], byte_count as i64)
                .with_highlight("#ce93d8"),
        );
        if payload.len() > 1 {
            let coil_data = &payload[1..];
            fields.push(
                ParsedField::text("Coil Status", coil_data.to_vec(), to_hex(coil_data, " "))
                    .with_description(format_coil_bits(coil_data))
                    .with_highlight("#90caf9"),
            );
        }
    }
}

fn parse_read_registers(payload: &[u8], fields: &mut Vec<ParsedField>) {
    if payload.len() == 4 {
        let quantity = read_u16_be(payload, 2);
        push_start_address(payload, fields);
        fields.push(
            ParsedField::number("Quantity", payload[2..4].to_vec(), quantity as i64)
                .with_description(format!("{quantity} registers"))
                .with_highlight("#ce93d8"),
        );
    } else if !payload.is_empty() {
        let byte_count = payload[0];
        fields.push(
            ParsedField::number("Byte Count", vec![byte_count], byte_count as i64)
                .with_highlight("#ce93d8"),
        );
        let registers = &payload[1..];
        let mut offset = 0;
        while offset + 1 < registers.len() {
            let value = read_u16_be(registers, offset);
            fields.push(
                ParsedField::number(
                    format!("Register {}", offset / 2),
                    registers[offset..offset + 2].to_vec(),
                    value as i64,
                )
                .with_description(format!("0x{value:04X}"))
                .with_highlight("#90caf9"),
            );
            offset += 2;
        }
    }
}

fn parse_write_single_coil(payload: &[u8], fields: &mut Vec<ParsedField>) {
    if payload.len() >= 4 {
        let address = read_u16_be(payload, 0);
        let value = read_u16_be(payload, 2);
        fields.push(
            ParsedField::number("Coil Address", payload[..2].to_vec(), address as i64)
                .with_description(format!("0x{address:04X}"))
                .with_highlight("#ffb74d"),
        );
        let on = value == layout::COIL_ON;
        fields.push(
            ParsedField::text("Value", payload[2..4].to_vec(), if on { "ON" } else { "OFF" })
                .with_description(format!("0x{value:04X}"))
                .with_highlight(if on { "#81c784" } else { "#ef5350" }),
        );
    }
}

fn parse_write_single_register(payload: &[u8], fields: &mut Vec<ParsedField>) {
    if payload.len() >= 4 {
        let address = read_u16_be(payload, 0);
        let value = read_u16_be(payload, 2);
        fields.push(
            ParsedField::number("Register Address", payload[..2].to_vec(), address as i64)
                .with_description(format!("0x{address:04X}"))
                .with_highlight("#ffb74d"),
        );
        fields.push(
            ParsedField::number("Value", payload[2..4].to_vec(), value as i64)
                .with_description(format!("0x{value:04X}"))
                .with_highlight("#90caf9"),
        );
    }
}

fn parse_write_multiple_coils(payload: &[u8], fields: &mut Vec<ParsedField>) {
    if payload.len() >= 5 {
        push_address_quantity(&payload[..4], "Quantity", fields);
        let byte_count = payload[4];
        fields.push(
            ParsedField::number("Byte Count", vec![byte_count], byte_count as i64)
                .with_highlight("#ce93d8"),
        );
        if payload.len() > 5 {
            let coil_data = &payload[5..];
            fields.push(
                ParsedField::text("Coil Values", coil_data.to_vec(), to_hex(coil_data, " "))
                    .with_highlight("#90caf9"),
            );
        }
    } else if payload.len() == 4 {
        // Echo response.
        push_address_quantity(payload, "Quantity", fields);
    }
}

fn parse_write_multiple_registers(payload: &[u8], fields: &mut Vec<ParsedField>) {
    if payload.len() >= 5 {
        let quantity = read_u16_be(payload, 2);
        push_start_address(payload, fields);
        fields.push(
            ParsedField::number("Quantity", payload[2..4].to_vec(), quantity as i64)
                .with_description(format!("{quantity} registers"))
                .with_highlight("#ce93d8"),
        );
        let byte_count = payload[4];
        fields.push(
            ParsedField::number("Byte Count", vec![byte_count], byte_count as i64)
                .with_highlight("#ce93d8"),
        );
        let values = &payload[5..];
        let limit = values.len().min(byte_count as usize);
        let mut offset = 0;
        while offset + 1 < limit {
            let value = read_u16_be(values, offset);
            fields.push(
                ParsedField::number(
                    format!("Value {}", offset / 2),
                    values[offset..offset + 2].to_vec(),
                    value as i64,
                )
                .with_description(format!("0x{value:04X}"))
                .with_highlight("#90caf9"),
            );
            offset += 2;
        }
    } else if payload.len() == 4 {
        // Echo response.
        push_address_quantity(payload, "Quantity Written", fields);
    }
}

fn push_start_address(payload: &[u8], fields: &mut Vec<ParsedField>) {
    let address = read_u16_be(payload, 0);
    fields.push(
        ParsedField::number("Start Address", payload[..2].to_vec(), address as i64)
            .with_description(format!("0x{address:04X}"))
            .with_highlight("#ffb74d"),
    );
}

fn push_address_quantity(payload: &[u8], quantity_name: &str, fields: &mut Vec<ParsedField>) {
    push_start_address(payload, fields);
    let quantity = read_u16_be(payload, 2);
    fields.push(
        ParsedField::number(quantity_name, payload[2..4].to_vec(), quantity as i64)
            .with_highlight("#ce93d8"),
    );
}

fn format_coil_bits(data: &[u8]) -> String {
    let mut bits = String::with_capacity(data.len() * 8);
    for byte in data {
        for bit in 0..8 {
            bits.push(if byte >> bit & 1 == 1 { '1' } else { '0' });
        }
    }
    bits
}

fn summarize(slave: u8, function: u8, is_exception: bool, payload: &[u8]) -> String {
    if is_exception {
        let name = payload
            .first()
            .and_then(|&c| codes::exception_name(c))
            .unwrap_or("Unknown");
        return format!("Slave {slave}: Exception {name}");
    }

    match function {
        codes::READ_HOLDING_REGISTERS | codes::READ_INPUT_REGISTERS => {
            if payload.len() == 4 {
                let addr = read_u16_be(payload, 0);
                let qty = read_u16_be(payload, 2);
                return format!("Slave {slave}: Read {qty} regs @ 0x{addr:04X}");
            }
            if let Some(&byte_count) = payload.first() {
                return format!("Slave {slave}: Response {} registers", byte_count / 2);
            }
        }
        codes::WRITE_SINGLE_REGISTER => {
            if payload.len() >= 4 {
                let addr = read_u16_be(payload, 0);
                let value = read_u16_be(payload, 2);
                return format!("Slave {slave}: Write {value} @ 0x{addr:04X}");
            }
        }
        codes::WRITE_MULTIPLE_REGISTERS => {
            if payload.len() >= 4 {
                let addr = read_u16_be(payload, 0);
                let qty = read_u16_be(payload, 2);
                return format!("Slave {slave}: Write {qty} regs @ 0x{addr:04X}");
            }
        }
        _ => {}
    }

    let name = codes::function_name(function).unwrap_or("Unknown Function");
    format!("Slave {slave}: {name}")
}
