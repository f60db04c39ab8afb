use std::collections::HashMap;

use crate::bytes::{read_i16_le, read_u16_le, read_u32_le, to_hex};
use crate::{CanMeta, ParseContext, ParseResult, ParsedField, PortType};

use super::cia402;
use super::cob::{self, CobInfo, CobService};
use super::codes;
use super::dictionary;

const DETECT_KNOWN_SERVICE: f32 = 0.9;
const DETECT_DLC_MISMATCH: f32 = 0.5;
const DETECT_RTR: f32 = 0.6;
const DETECT_UNKNOWN_COB: f32 = 0.2;

/// One mapped PDO field: display name plus width in bits (8, 16 or 32).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdoField {
    pub name: String,
    pub bits: u8,
}

/// CANopen (CiA 301 + CiA 402) frame decoder.
///
/// The default instance carries no PDO mappings and shows PDO payloads as
/// hex plus generic little-endian interpretations. A configured instance
/// (via [`super::CanOpenParserFactory`]) decodes mapped PDOs field by
/// field.
#[derive(Default)]
pub struct CanOpenParser {
    pdo_mappings: HashMap<u32, Vec<PdoField>>,
}

impl CanOpenParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pdo_mappings(pdo_mappings: HashMap<u32, Vec<PdoField>>) -> Self {
        Self { pdo_mappings }
    }
}

impl crate::ProtocolParser for CanOpenParser {
    fn id(&self) -> &str {
        "canopen"
    }

    fn name(&self) -> &str {
        "CANOpen"
    }

    fn description(&self) -> &str {
        "CANOpen protocol (CiA 301 + CiA 402)"
    }

    fn port_types(&self) -> &[PortType] {
        &[PortType::Can]
    }

    fn detect(&self, data: &[u8], context: &ParseContext) -> f32 {
        if context.port_type != PortType::Can {
            return 0.0;
        }
        let Some(meta) = context.can else {
            return 0.0;
        };

        let info = cob::classify(meta.id, meta.ext);
        if !info.service.is_known() {
            return DETECT_UNKNOWN_COB;
        }
        if meta.rtr && data.is_empty() {
            return DETECT_RTR;
        }
        if meta.dlc as usize == data.len() {
            DETECT_KNOWN_SERVICE
        } else {
            DETECT_DLC_MISMATCH
        }
    }

    fn parse(&self, data: &[u8], context: &ParseContext) -> ParseResult {
        let meta = context.can_meta();
        let info = cob::classify(meta.id, meta.ext);

        let mut fields = Vec::new();
        let mut warnings = Vec::new();

        push_cob_fields(&mut fields, meta, info);

        if meta.dlc as usize != data.len() {
            warnings.push(format!(
                "declared DLC {} does not match payload length {}",
                meta.dlc,
                data.len()
            ));
        }

        // Remote frames carry no payload by definition; classification is
        // all there is to show.
        if meta.rtr && data.is_empty() {
            return ParseResult {
                success: true,
                protocol: self.name().to_string(),
                message_type: format!("{} RTR", info.service.label()),
                summary: format!("RTR request for COB-ID 0x{:03X}", meta.id),
                fields,
                errors: vec![],
                warnings,
                raw: data.to_vec(),
            };
        }

        let mut message_type = info.service.label();
        let summary;

        match info.service {
            CobService::Nmt => {
                parse_nmt(data, &mut fields, &mut warnings);
                summary = nmt_summary(data);
            }
            CobService::Sync => {
                if let Some(&counter) = data.first() {
                    fields.push(
                        ParsedField::number("Counter", vec![counter], counter as i64)
                            .with_highlight("#ce93d8"),
                    );
                }
                summary = "SYNC".to_string();
            }
            CobService::Emergency => {
                parse_emergency(data, &mut fields);
                summary = emergency_summary(data, info.node_id.unwrap_or(0));
            }
            CobService::Heartbeat => {
                parse_heartbeat(data, &mut fields);
                summary = heartbeat_summary(data, info.node_id.unwrap_or(0));
            }
            CobService::SdoTx | CobService::SdoRx => {
                let sdo = parse_sdo(data, &mut fields, info.service, info.node_id.unwrap_or(0));
                message_type = sdo.message_type;
                summary = sdo.summary;
            }
            CobService::Tpdo(_) | CobService::Rpdo(_) => {
                self.parse_pdo(meta.id, data, &mut fields, &mut warnings);
                summary = format!(
                    "{} Node {}: {} bytes",
                    info.service.label(),
                    info.node_id.unwrap_or(0),
                    data.len()
                );
            }
            CobService::Time | CobService::LssTx | CobService::LssRx => {
                if !data.is_empty() {
                    fields.push(
                        ParsedField::text("Data", data.to_vec(), to_hex(data, " "))
                            .with_highlight("#90caf9"),
                    );
                }
                summary = info.service.label();
            }
            CobService::Unknown => {
                if !data.is_empty() {
                    fields.push(
                        ParsedField::text("Data", data.to_vec(), to_hex(data, " "))
                            .with_highlight("#ffb74d"),
                    );
                }
                warnings.push(format!(
                    "unrecognized COB-ID function code 0x{:X}",
                    cob::function_code(meta.id)
                ));
                summary = format!("Unknown COB-ID 0x{:X}", meta.id);
            }
        }

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

impl CanOpenParser {
    fn parse_pdo(
        &self,
        cob_id: u32,
        data: &[u8],
        fields: &mut Vec<ParsedField>,
        warnings: &mut Vec<String>,
    ) {
        if data.is_empty() {
            return;
        }

        fields.push(
            ParsedField::text("PDO Data", data.to_vec(), to_hex(data, " "))
                .with_description(format!("{} bytes", data.len()))
                .with_highlight("#90caf9"),
        );

        if let Some(mapping) = self.pdo_mappings.get(&cob_id) {
            let mut offset = 0usize;
            for field in mapping {
                let width = field.bits as usize / 8;
                if offset + width > data.len() {
                    warnings.push(format!(
                        "PDO mapping expects {} more byte(s) for \"{}\"",
                        offset + width - data.len(),
                        field.name
                    ));
                    break;
                }
                let slice = data[offset..offset + width].to_vec();
                let value = match width {
                    1 => data[offset] as i64,
                    2 => read_u16_le(data, offset) as i64,
                    4 => read_u32_le(data, offset) as i64,
                    _ => {
                        warnings.push(format!(
                            "unsupported PDO field width {} bits for \"{}\"",
                            field.bits, field.name
                        ));
                        break;
                    }
                };
                fields.push(
                    ParsedField::number(field.name.clone(), slice, value)
                        .with_description(format!("U{} LE", field.bits))
                        .with_highlight("#90caf9"),
                );
                offset += width;
            }
            return;
        }

        // No mapping configured: offer generic interpretations of the head.
        if data.len() >= 2 {
            let u16_le = read_u16_le(data, 0);
            let i16_le = read_i16_le(data, 0);
            fields.push(
                ParsedField::number("As U16 LE", data[..2].to_vec(), u16_le as i64)
                    .with_highlight("#e0e0e0"),
            );
            if i16_le as i64 != u16_le as i64 {
                fields.push(
                    ParsedField::number("As I16 LE", data[..2].to_vec(), i16_le as i64)
                        .with_highlight("#e0e0e0"),
                );
            }
        }
        if data.len() >= 4 {
            let u32_le = read_u32_le(data, 0);
            fields.push(
                ParsedField::number("As U32 LE", data[..4].to_vec(), u32_le as i64)
                    .with_highlight("#e0e0e0"),
            );
        }
    }
}

fn push_cob_fields(fields: &mut Vec<ParsedField>, meta: CanMeta, info: CobInfo) {
    let cob_desc = match info.node_id {
        Some(node) => format!("{} (Node {})", info.service.label(), node),
        None => info.service.label(),
    };
    fields.push(
        ParsedField::text(
            "COB-ID",
            vec![(meta.id >> 8) as u8, (meta.id & 0xFF) as u8],
            format!("0x{:03X}", meta.id),
        )
        .with_description(cob_desc)
        .with_highlight("#4fc3f7"),
    );
    fields.push(
        ParsedField::number("Function Code", vec![], cob::function_code(meta.id) as i64)
            .with_description(info.service.label())
            .with_highlight("#81c784"),
    );
    fields.push(
        ParsedField::number("Node ID", vec![], cob::node_id(meta.id) as i64)
            .with_highlight("#ffb74d"),
    );
}

fn parse_nmt(data: &[u8], fields: &mut Vec<ParsedField>, warnings: &mut Vec<String>) {
    if data.len() < 2 {
        warnings.push("NMT payload shorter than 2 bytes".to_string());
        return;
    }
    let command = data[0];
    let target = data[1];
    fields.push(
        ParsedField::text("Command", vec![command], format!("0x{command:02X}"))
            .with_description(codes::nmt_command_name(command).unwrap_or("Unknown"))
            .with_highlight("#81c784"),
    );
    fields.push(
        ParsedField::number("Target Node", vec![target], target as i64)
            .with_description(if target == 0 {
                "All Nodes (Broadcast)".to_string()
            } else {
                format!("Node {target}")
            })
            .with_highlight("#ffb74d"),
    );
}

fn nmt_summary(data: &[u8]) -> String {
    if data.len() >= 2 {
        let command = codes::nmt_command_name(data[0]).unwrap_or("Unknown");
        let node = if data[1] == 0 {
            "All".to_string()
        } else {
            format!("Node {}", data[1])
        };
        format!("NMT {command} -> {node}")
    } else {
        "NMT".to_string()
    }
}

fn parse_emergency(data: &[u8], fields: &mut Vec<ParsedField>) {
    if data.len() < 8 {
        if !data.is_empty() {
            fields.push(
                ParsedField::text("Data", data.to_vec(), to_hex(data, " "))
                    .with_highlight("#90caf9"),
            );
        }
        return;
    }

    let error_code = read_u16_le(data, 0);
    fields.push(
        ParsedField::text("Error Code", data[..2].to_vec(), format!("0x{error_code:04X}"))
            .with_description(codes::emergency_error_name(error_code).unwrap_or("Unknown"))
            .with_highlight("#ef5350"),
    );

    let register = data[2];
    let mut register_field =
        ParsedField::text("Error Register", vec![register], format!("0x{register:02X}"))
            .with_highlight("#ffb74d");
    let bits = dictionary::error_register_bits(register);
    if !bits.is_empty() {
        register_field = register_field.with_description(bits.join(", "));
    }
    fields.push(register_field);

    let mfg = &data[3..8];
    fields.push(
        ParsedField::text("Manufacturer Data", mfg.to_vec(), to_hex(mfg, " "))
            .with_highlight("#90caf9"),
    );
}

fn emergency_summary(data: &[u8], node: u8) -> String {
    if data.len() >= 2 {
        let code = read_u16_le(data, 0);
        let name = codes::emergency_error_name(code).unwrap_or("Unknown");
        format!("EMCY Node {node}: {name}")
    } else {
        format!("EMCY Node {node}")
    }
}

fn parse_heartbeat(data: &[u8], fields: &mut Vec<ParsedField>) {
    if let Some(&state) = data.first() {
        let operational = state == 0x05;
        fields.push(
            ParsedField::text("NMT State", vec![state], format!("0x{state:02X}"))
                .with_description(codes::nmt_state_name(state).unwrap_or("Unknown"))
                .with_highlight(if operational { "#81c784" } else { "#ffb74d" }),
        );
    }
}

fn heartbeat_summary(data: &[u8], node: u8) -> String {
    match data.first() {
        Some(&state) => {
            let name = codes::nmt_state_name(state).unwrap_or("Unknown");
            format!("Heartbeat Node {node}: {name}")
        }
        None => format!("Heartbeat Node {node}"),
    }
}

struct SdoOutcome {
    message_type: String,
    summary: String,
}

const SDO_SPECIFIER_MASK: u8 = 0xE0;
const SDO_ABORT: u8 = 0x80;
const SDO_UPLOAD: u8 = 0x40;
const SDO_DOWNLOAD_REQ: u8 = 0x20;
const SDO_DOWNLOAD_RESP: u8 = 0x60;
const SDO_EXPEDITED: u8 = 0x02;
const SDO_SIZE_INDICATED: u8 = 0x01;

fn parse_sdo(
    data: &[u8],
    fields: &mut Vec<ParsedField>,
    service: CobService,
    node: u8,
) -> SdoOutcome {
    let Some(&command) = data.first() else {
        return SdoOutcome {
            message_type: "SDO".to_string(),
            summary: format!("SDO Node {node}: Empty"),
        };
    };

    if command & SDO_SPECIFIER_MASK == SDO_ABORT {
        return parse_sdo_abort(data, fields, node);
    }

    // Requests travel on the rx channel (client -> server).
    let is_request = service == CobService::SdoRx;

    if data.len() < 4 {
        fields.push(
            ParsedField::text("Command", vec![command], format!("0x{command:02X}"))
                .with_highlight("#81c784"),
        );
        if data.len() > 1 {
            fields.push(
                ParsedField::text("Data", data[1..].to_vec(), to_hex(&data[1..], " "))
                    .with_highlight("#90caf9"),
            );
        }
        return SdoOutcome {
            message_type: "SDO".to_string(),
            summary: format!("SDO Node {node}"),
        };
    }

    let index = read_u16_le(data, 1);
    let sub_index = data[3];
    let hit = dictionary::lookup(index, Some(sub_index));
    let object_name = hit
        .as_ref()
        .map(|h| h.name.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let index_desc = match &hit {
        Some(h) => format!("[{}] {} ({})", h.profile.label(), h.name, h.data_type),
        None => "Unknown".to_string(),
    };
    let index_str = format!("0x{index:04X}");

    let expedited = command & SDO_EXPEDITED != 0;
    let size_indicated = command & SDO_SIZE_INDICATED != 0;
    let data_size = if expedited && size_indicated {
        4 - (command >> 2 & 0x03) as usize
    } else {
        4
    };

    let (message_type, command_desc): (&str, String) =
        match (is_request, command & SDO_SPECIFIER_MASK) {
            (true, SDO_UPLOAD) => (
                "SDO Upload Request",
                "Upload Initiate (Read Request)".to_string(),
            ),
            (true, SDO_DOWNLOAD_REQ) => (
                "SDO Download Request",
                if expedited {
                    format!("Download {data_size} bytes (Write)")
                } else {
                    "Download Initiate (Write)".to_string()
                },
            ),
            (false, SDO_UPLOAD) => (
                "SDO Upload Response",
                if expedited {
                    format!("Upload {data_size} bytes")
                } else {
                    "Upload Initiate".to_string()
                },
            ),
            (false, SDO_DOWNLOAD_RESP) => (
                "SDO Download Response",
                "Download Confirmed (Write ACK)".to_string(),
            ),
            _ => ("SDO", format!("Specifier 0x{:X}", command >> 5)),
        };

    fields.push(
        ParsedField::text("Command", vec![command], format!("0x{command:02X}"))
            .with_description(command_desc)
            .with_highlight("#81c784"),
    );
    fields.push(
        ParsedField::text("Index", data[1..3].to_vec(), index_str.clone())
            .with_description(index_desc)
            .with_highlight("#ffb74d"),
    );
    fields.push(
        ParsedField::number("Sub-Index", vec![sub_index], sub_index as i64)
            .with_highlight("#ce93d8"),
    );

    let carries_data = matches!(
        (is_request, command & SDO_SPECIFIER_MASK),
        (true, SDO_DOWNLOAD_REQ) | (false, SDO_UPLOAD)
    );

    let summary = if carries_data && expedited && data.len() >= 8 {
        let (field, value_str) = decode_sdo_data(index, &data[4..4 + data_size]);
        fields.push(field);
        let verb = if is_request { "Write" } else { "Response" };
        format!("SDO {verb} Node {node}: {index_str}:{sub_index} = {value_str} ({object_name})")
    } else {
        if data.len() >= 8 && !carries_data {
            let reserved = &data[4..8];
            fields.push(
                ParsedField::text("Reserved", reserved.to_vec(), to_hex(reserved, " "))
                    .with_description("(unused)")
                    .with_highlight("#64748b"),
            );
        }
        let verb = match (is_request, command & SDO_SPECIFIER_MASK) {
            (true, SDO_UPLOAD) => "Read",
            (true, _) => "Write",
            (false, SDO_DOWNLOAD_RESP) => "Write ACK",
            (false, _) => "Response",
        };
        format!("SDO {verb} Node {node}: {index_str}:{sub_index} ({object_name})")
    };

    SdoOutcome {
        message_type: message_type.to_string(),
        summary,
    }
}

fn parse_sdo_abort(data: &[u8], fields: &mut Vec<ParsedField>, node: u8) -> SdoOutcome {
    fields.push(
        ParsedField::text("Command", vec![data[0]], format!("0x{:02X}", data[0]))
            .with_description("Abort Transfer")
            .with_highlight("#ef5350"),
    );

    if data.len() >= 4 {
        let index = read_u16_le(data, 1);
        fields.push(
            ParsedField::text("Index", data[1..3].to_vec(), format!("0x{index:04X}"))
                .with_highlight("#ffb74d"),
        );
        fields.push(
            ParsedField::number("Sub-Index", vec![data[3]], data[3] as i64)
                .with_highlight("#ce93d8"),
        );
    }

    if data.len() >= 8 {
        let abort_code = read_u32_le(data, 4);
        let abort_name = codes::sdo_abort_name(abort_code).unwrap_or("Unknown");
        fields.push(
            ParsedField::text("Abort Code", data[4..8].to_vec(), format!("0x{abort_code:08X}"))
                .with_description(abort_name)
                .with_highlight("#ef5350"),
        );
        return SdoOutcome {
            message_type: "SDO Abort".to_string(),
            summary: format!("SDO Abort Node {node}: {abort_name}"),
        };
    }

    SdoOutcome {
        message_type: "SDO Abort".to_string(),
        summary: format!("SDO Abort Node {node}"),
    }
}

/// Decode an expedited SDO data payload, with semantic rendering for the
/// well-known drive and heartbeat objects.
fn decode_sdo_data(index: u16, data: &[u8]) -> (ParsedField, String) {
    let (value, description, value_str): (i64, Option<String>, String) = match index {
        0x6040 if data.len() >= 2 => {
            let word = read_u16_le(data, 0);
            let decoded = cia402::decode_controlword(word);
            (
                word as i64,
                Some(decoded.command.to_string()),
                format!("{word} ({})", decoded.command),
            )
        }
        0x6041 if data.len() >= 2 => {
            let word = read_u16_le(data, 0);
            let decoded = cia402::decode_statusword(word);
            (
                word as i64,
                Some(decoded.state.label().to_string()),
                format!("{word} ({})", decoded.state),
            )
        }
        0x6060 | 0x6061 if !data.is_empty() => {
            let mode = data[0] as i8;
            let name = cia402::operation_mode_name(mode).unwrap_or("Unknown");
            (mode as i64, Some(name.to_string()), format!("{mode} ({name})"))
        }
        0x1017 if data.len() >= 2 => {
            let ms = read_u16_le(data, 0);
            (ms as i64, Some(format!("{ms} ms")), format!("{ms} ms"))
        }
        _ => match data.len() {
            1 => (data[0] as i64, None, data[0].to_string()),
            2 => {
                let v = read_u16_le(data, 0);
                (v as i64, None, v.to_string())
            }
            4 => {
                let v = read_u32_le(data, 0);
                (v as i64, None, v.to_string())
            }
            _ => {
                let hex = to_hex(data, " ");
                let field = ParsedField::text("Data", data.to_vec(), hex.clone())
                    .with_highlight("#90caf9");
                return (field, hex);
            }
        },
    };

    let mut field =
        ParsedField::number("Data", data.to_vec(), value).with_highlight("#90caf9");
    if let Some(desc) = description {
        field = field.with_description(desc);
    }
    (field, value_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, FieldValue, ProtocolParser};

    fn can_ctx(id: u32, dlc: u8) -> ParseContext {
        ParseContext::can(
            Direction::Receive,
            0,
            CanMeta {
                id,
                dlc,
                rtr: false,
                ext: false,
            },
        )
    }

    fn field<'a>(result: &'a ParseResult, name: &str) -> &'a ParsedField {
        result
            .fields
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("missing field {name}"))
    }

    #[test]
    fn detect_scores_known_cob_ids_high() {
        let parser = CanOpenParser::new();
        let confidence = parser.detect(&[0x05], &can_ctx(0x701, 1));
        assert!(confidence >= 0.8, "confidence {confidence}");
    }

    #[test]
    fn detect_penalizes_dlc_mismatch() {
        let parser = CanOpenParser::new();
        let confidence = parser.detect(&[0x05], &can_ctx(0x701, 4));
        assert!(confidence > 0.0 && confidence < 0.8);
    }

    #[test]
    fn detect_unknown_cob_is_low() {
        let parser = CanOpenParser::new();
        let confidence = parser.detect(&[0x00], &can_ctx(0x7F0, 1));
        assert!(confidence > 0.0 && confidence <= 0.2);
    }

    #[test]
    fn detect_rejects_serial_context() {
        let parser = CanOpenParser::new();
        let ctx = ParseContext::serial(Direction::Receive, 0);
        assert_eq!(parser.detect(&[0x05], &ctx), 0.0);
    }

    #[test]
    fn parse_heartbeat_operational() {
        let parser = CanOpenParser::new();
        let result = parser.parse(&[0x05], &can_ctx(0x701, 1));

        assert!(result.success);
        assert_eq!(result.message_type, "Heartbeat");
        assert_eq!(result.summary, "Heartbeat Node 1: Operational");
        assert_eq!(field(&result, "Node ID").value, FieldValue::Number(1));
        assert_eq!(
            field(&result, "NMT State").description.as_deref(),
            Some("Operational")
        );
    }

    #[test]
    fn parse_nmt_broadcast() {
        let parser = CanOpenParser::new();
        let result = parser.parse(&[0x01, 0x00], &can_ctx(0x000, 2));

        assert_eq!(result.message_type, "NMT");
        assert_eq!(result.summary, "NMT Start (Operational) -> All");
        assert_eq!(
            field(&result, "Target Node").description.as_deref(),
            Some("All Nodes (Broadcast)")
        );
    }

    #[test]
    fn parse_sdo_upload_request_names_statusword() {
        let parser = CanOpenParser::new();
        let frame = [0x40, 0x41, 0x60, 0x00, 0x00, 0x00, 0x00, 0x00];
        let result = parser.parse(&frame, &can_ctx(0x601, 8));

        assert_eq!(result.message_type, "SDO Upload Request");
        let index = field(&result, "Index");
        assert_eq!(index.value, FieldValue::Text("0x6041".to_string()));
        assert!(index.description.as_deref().unwrap().contains("Statusword"));
        assert_eq!(field(&result, "Sub-Index").value, FieldValue::Number(0));
        assert!(result.summary.contains("Statusword"));

        let names: Vec<&str> = result.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["COB-ID", "Function Code", "Node ID", "Command", "Index", "Sub-Index", "Reserved"]
        );
    }

    #[test]
    fn parse_sdo_upload_response_decodes_statusword_state() {
        // Expedited upload response, 2 bytes: statusword 0x0637.
        let parser = CanOpenParser::new();
        let frame = [0x4B, 0x41, 0x60, 0x00, 0x37, 0x06, 0x00, 0x00];
        let result = parser.parse(&frame, &can_ctx(0x581, 8));

        assert_eq!(result.message_type, "SDO Upload Response");
        let data = field(&result, "Data");
        assert_eq!(data.value, FieldValue::Number(0x0637));
        assert_eq!(data.description.as_deref(), Some("Operation Enabled"));
        assert!(result.summary.contains("Operation Enabled"));
    }

    #[test]
    fn parse_sdo_download_request_controlword() {
        // Expedited download, 2 bytes: controlword 0x000F.
        let parser = CanOpenParser::new();
        let frame = [0x2B, 0x40, 0x60, 0x00, 0x0F, 0x00, 0x00, 0x00];
        let result = parser.parse(&frame, &can_ctx(0x601, 8));

        assert_eq!(result.message_type, "SDO Download Request");
        let data = field(&result, "Data");
        assert_eq!(data.description.as_deref(), Some("Enable Operation"));
    }

    #[test]
    fn parse_sdo_abort() {
        let parser = CanOpenParser::new();
        let frame = [0x80, 0x41, 0x60, 0x00, 0x00, 0x00, 0x02, 0x06];
        let result = parser.parse(&frame, &can_ctx(0x581, 8));

        assert_eq!(result.message_type, "SDO Abort");
        let abort = field(&result, "Abort Code");
        assert_eq!(abort.value, FieldValue::Text("0x06020000".to_string()));
        assert_eq!(abort.description.as_deref(), Some("Object does not exist"));
        assert_eq!(result.summary, "SDO Abort Node 1: Object does not exist");
    }

    #[test]
    fn parse_emergency_frame() {
        let parser = CanOpenParser::new();
        let frame = [0x10, 0x81, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00];
        let result = parser.parse(&frame, &can_ctx(0x085, 8));

        assert_eq!(result.message_type, "EMCY");
        let code = field(&result, "Error Code");
        assert_eq!(code.description.as_deref(), Some("CAN Overrun"));
        let register = field(&result, "Error Register");
        assert!(register.description.as_deref().unwrap().contains("Generic Error"));
    }

    #[test]
    fn parse_pdo_without_mapping_shows_interpretations() {
        let parser = CanOpenParser::new();
        let frame = [0x34, 0x12, 0x00, 0x00];
        let result = parser.parse(&frame, &can_ctx(0x181, 4));

        assert_eq!(result.message_type, "TPDO1");
        let names: Vec<&str> = result.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["COB-ID", "Function Code", "Node ID", "PDO Data", "As U16 LE", "As U32 LE"]
        );
        assert_eq!(field(&result, "As U16 LE").value, FieldValue::Number(0x1234));
    }

    #[test]
    fn parse_pdo_with_mapping_decodes_fields() {
        let mut mappings = HashMap::new();
        mappings.insert(
            0x181,
            vec![
                PdoField {
                    name: "Statusword".to_string(),
                    bits: 16,
                },
                PdoField {
                    name: "Velocity".to_string(),
                    bits: 16,
                },
            ],
        );
        let parser = CanOpenParser::with_pdo_mappings(mappings);
        let frame = [0x37, 0x06, 0xE8, 0x03];
        let result = parser.parse(&frame, &can_ctx(0x181, 4));

        let status = field(&result, "Statusword");
        assert_eq!(status.value, FieldValue::Number(0x0637));
        let velocity = field(&result, "Velocity");
        assert_eq!(velocity.value, FieldValue::Number(1000));
    }

    #[test]
    fn rtr_frame_yields_minimal_fields() {
        let parser = CanOpenParser::new();
        let ctx = ParseContext::can(
            Direction::Receive,
            0,
            CanMeta {
                id: 0x181,
                dlc: 0,
                rtr: true,
                ext: false,
            },
        );
        let result = parser.parse(&[], &ctx);
        assert!(result.success);
        assert_eq!(result.message_type, "TPDO1 RTR");
        let names: Vec<&str> = result.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["COB-ID", "Function Code", "Node ID"]);
    }

    #[test]
    fn dlc_mismatch_is_a_warning_not_an_error() {
        let parser = CanOpenParser::new();
        let result = parser.parse(&[0x05], &can_ctx(0x701, 4));
        assert!(result.success);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("DLC"));
    }

    #[test]
    fn unknown_cob_id_warns_but_succeeds() {
        let parser = CanOpenParser::new();
        let result = parser.parse(&[0xAB], &can_ctx(0x7F0, 1));
        assert!(result.success);
        assert!(result.warnings.iter().any(|w| w.contains("unrecognized")));
        assert_eq!(result.message_type, "Unknown");
    }

    #[test]
    fn parse_is_idempotent() {
        let parser = CanOpenParser::new();
        let frame = [0x40, 0x41, 0x60, 0x00, 0x00, 0x00, 0x00, 0x00];
        let first = parser.parse(&frame, &can_ctx(0x601, 8));
        let second = parser.parse(&frame, &can_ctx(0x601, 8));
        assert_eq!(first, second);
    }
}
