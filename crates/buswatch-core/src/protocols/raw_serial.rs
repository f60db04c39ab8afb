//! Always-available fallback for serial ports.
//!
//! Scores a fixed low confidence for any non-empty payload so the
//! registry's auto-detect path always has a candidate; displaying raw bytes
//! with heuristic hints beats displaying nothing. Never fails.

use crate::bytes::{read_u16_be, read_u16_le, read_u32_be, read_u32_le, to_hex};
use crate::{ParseContext, ParseResult, ParsedField, PortType};

/// Fixed confidence of the fallback; above zero so it always wins over "no
/// protocol", below every genuine match.
pub const FALLBACK_CONFIDENCE: f32 = 0.1;

/// Raw serial data display with basic analysis.
pub struct RawSerialParser;

impl crate::ProtocolParser for RawSerialParser {
    fn id(&self) -> &str {
        "raw-serial"
    }

    fn name(&self) -> &str {
        "Raw Serial"
    }

    fn description(&self) -> &str {
        "Raw serial data display with basic analysis"
    }

    fn port_types(&self) -> &[PortType] {
        &[PortType::Serial]
    }

    fn detect(&self, data: &[u8], context: &ParseContext) -> f32 {
        if context.port_type != PortType::Serial || data.is_empty() {
            return 0.0;
        }
        FALLBACK_CONFIDENCE
    }

    fn parse(&self, data: &[u8], context: &ParseContext) -> ParseResult {
        let mut fields = Vec::new();

        fields.push(
            ParsedField::text("Length", vec![], format!("{} bytes", data.len()))
                .with_highlight("#4fc3f7"),
        );
        fields.push(
            ParsedField::text("Hex Data", data.to_vec(), to_hex(data, " "))
                .with_highlight("#94a3b8"),
        );

        if let Some(ascii) = try_decode_ascii(data) {
            fields.push(
                ParsedField::text("ASCII", vec![], ascii)
                    .with_description("Printable characters")
                    .with_highlight("#22d3ee"),
            );
        }

        if data.len() >= 2 {
            let le = read_u16_le(data, 0);
            let be = read_u16_be(data, 0);
            fields.push(
                ParsedField::number("First 2 bytes (U16 LE)", data[..2].to_vec(), le as i64)
                    .with_description(format!("0x{le:04X}"))
                    .with_highlight("#e0e0e0"),
            );
            if be != le {
                fields.push(
                    ParsedField::number("First 2 bytes (U16 BE)", data[..2].to_vec(), be as i64)
                        .with_description(format!("0x{be:04X}"))
                        .with_highlight("#e0e0e0"),
                );
            }
        }

        if data.len() >= 4 {
            let le = read_u32_le(data, 0);
            let be = read_u32_be(data, 0);
            fields.push(
                ParsedField::number("First 4 bytes (U32 LE)", data[..4].to_vec(), le as i64)
                    .with_description(format!("0x{le:08X}"))
                    .with_highlight("#e0e0e0"),
            );
            if be != le {
                fields.push(
                    ParsedField::number("First 4 bytes (U32 BE)", data[..4].to_vec(), be as i64)
                        .with_description(format!("0x{be:08X}"))
                        .with_highlight("#e0e0e0"),
                );
            }
        }

        let hints = analyze(data);
        if !hints.is_empty() {
            fields.push(
                ParsedField::text("Analysis", vec![], hints.join(", "))
                    .with_highlight("#fbbf24"),
            );
        }

        ParseResult {
            success: true,
            protocol: self.name().to_string(),
            message_type: "Raw Data".to_string(),
            summary: format!("{} bytes {}", data.len(), context.direction.label()),
            fields,
            errors: vec![],
            warnings: vec![],
            raw: data.to_vec(),
        }
    }
}

fn is_printable(byte: u8) -> bool {
    (32..127).contains(&byte)
}

/// ASCII rendering: printable bytes pass through, CR/LF/TAB become escape
/// sequences, everything else becomes '.'. Returned only when at least half
/// the bytes are printable or whitespace.
fn try_decode_ascii(data: &[u8]) -> Option<String> {
    if data.is_empty() {
        return None;
    }

    let mut rendered = String::with_capacity(data.len());
    let mut printable = 0usize;
    for &byte in data {
        match byte {
            b if is_printable(b) => {
                rendered.push(b as char);
                printable += 1;
            }
            0x0D => {
                rendered.push_str("\\r");
                printable += 1;
            }
            0x0A => {
                rendered.push_str("\\n");
                printable += 1;
            }
            0x09 => {
                rendered.push_str("\\t");
                printable += 1;
            }
            _ => rendered.push('.'),
        }
    }

    if printable * 2 >= data.len() {
        Some(rendered)
    } else {
        None
    }
}

fn analyze(data: &[u8]) -> Vec<&'static str> {
    let mut hints = Vec::new();

    if !data.is_empty()
        && data
            .iter()
            .all(|&b| is_printable(b) || b == 0x0D || b == 0x0A)
    {
        hints.push("All printable ASCII");
    }

    if data.len() >= 2 && data[data.len() - 2] == 0x0D && data[data.len() - 1] == 0x0A {
        hints.push("Ends with CRLF");
    }
    if data.last() == Some(&0x0A) {
        hints.push("Ends with LF");
    }

    if data.contains(&0x00) {
        hints.push("Contains NULL bytes");
    }

    if data.len() >= 2 && data[0] == 0x7E {
        hints.push("Possible HDLC frame (0x7E)");
    }
    if data.len() >= 2 && data[0] == 0xAA && data[1] == 0x55 {
        hints.push("Common sync pattern (0xAA55)");
    }
    if data.len() >= 2 && data[0] == 0x55 && data[1] == 0xAA {
        hints.push("Common sync pattern (0x55AA)");
    }

    hints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, FieldValue, ProtocolParser};

    fn serial_ctx() -> ParseContext {
        ParseContext::serial(Direction::Receive, 0)
    }

    #[test]
    fn detect_is_fixed_low_for_any_payload() {
        let parser = RawSerialParser;
        assert_eq!(parser.detect(&[0xFF], &serial_ctx()), FALLBACK_CONFIDENCE);
        assert_eq!(parser.detect(&[0; 64], &serial_ctx()), FALLBACK_CONFIDENCE);
        assert_eq!(parser.detect(&[], &serial_ctx()), 0.0);
    }

    #[test]
    fn detect_rejects_can_port() {
        let parser = RawSerialParser;
        let ctx = ParseContext::can(Direction::Receive, 0, crate::CanMeta::default());
        assert_eq!(parser.detect(&[0x01], &ctx), 0.0);
    }

    #[test]
    fn parse_never_fails() {
        let parser = RawSerialParser;
        let result = parser.parse(&[], &serial_ctx());
        assert!(result.success);
        assert!(!result.fields.is_empty());
    }

    #[test]
    fn field_order_for_text_payload() {
        let parser = RawSerialParser;
        let result = parser.parse(b"OK\r\n", &serial_ctx());

        let names: Vec<&str> = result.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["Length", "Hex Data", "ASCII", "First 2 bytes (U16 LE)",
             "First 2 bytes (U16 BE)", "First 4 bytes (U32 LE)",
             "First 4 bytes (U32 BE)", "Analysis"]
        );
        let ascii = &result.fields[2];
        assert_eq!(ascii.value, FieldValue::Text("OK\\r\\n".to_string()));

        let analysis = result.fields.last().unwrap();
        let FieldValue::Text(hints) = &analysis.value else {
            panic!("analysis should be text");
        };
        assert!(hints.contains("All printable ASCII"));
        assert!(hints.contains("Ends with CRLF"));
        assert!(hints.contains("Ends with LF"));
    }

    #[test]
    fn ascii_omitted_for_binary_payload() {
        let parser = RawSerialParser;
        let result = parser.parse(&[0x00, 0x01, 0x02, 0x80], &serial_ctx());
        assert!(result.fields.iter().all(|f| f.name != "ASCII"));

        let analysis = result.fields.last().unwrap();
        let FieldValue::Text(hints) = &analysis.value else {
            panic!("analysis should be text");
        };
        assert!(hints.contains("Contains NULL bytes"));
    }

    #[test]
    fn palindromic_words_skip_the_be_variant() {
        let parser = RawSerialParser;
        let result = parser.parse(&[0x5A, 0x5A], &serial_ctx());
        let names: Vec<&str> = result.fields.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"First 2 bytes (U16 LE)"));
        assert!(!names.contains(&"First 2 bytes (U16 BE)"));
    }

    #[test]
    fn sync_markers_are_reported() {
        let parser = RawSerialParser;
        let result = parser.parse(&[0xAA, 0x55, 0x01], &serial_ctx());
        let analysis = result.fields.last().unwrap();
        let FieldValue::Text(hints) = &analysis.value else {
            panic!("analysis should be text");
        };
        assert!(hints.contains("0xAA55"));

        let result = parser.parse(&[0x7E, 0x01, 0x02], &serial_ctx());
        let analysis = result.fields.last().unwrap();
        let FieldValue::Text(hints) = &analysis.value else {
            panic!("analysis should be text");
        };
        assert!(hints.contains("HDLC"));
    }
}
