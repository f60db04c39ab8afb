//! End-to-end engine behavior through the public registry API.

use buswatch_core::{
    CanMeta, Direction, FieldValue, ParseContext, ParserFactory, ParserRegistry, PortType,
    ProtocolParser,
};

fn serial_rx() -> ParseContext {
    ParseContext::serial(Direction::Receive, 0)
}

fn can_rx(id: u32, dlc: u8) -> ParseContext {
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

#[test]
fn modbus_request_auto_detects() {
    let registry = ParserRegistry::with_builtins();
    let frame = [0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD];

    let parser = registry.get("modbus-rtu").unwrap();
    assert!(parser.detect(&frame, &serial_rx()) >= 0.8);

    let result = registry.auto_detect_and_parse(&frame, &serial_rx()).unwrap();
    assert!(result.success);
    assert_eq!(result.protocol, "MODBUS RTU");
    assert_eq!(result.message_type, "Read Holding Registers");
    assert!(result.errors.is_empty());

    let start = result
        .fields
        .iter()
        .find(|f| f.name == "Start Address")
        .unwrap();
    assert_eq!(start.value, FieldValue::Number(0));
    let quantity = result.fields.iter().find(|f| f.name == "Quantity").unwrap();
    assert_eq!(quantity.value, FieldValue::Number(10));
}

#[test]
fn corrupt_modbus_frame_falls_back_to_raw_serial() {
    let registry = ParserRegistry::with_builtins();
    let mut frame = vec![0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD];
    *frame.last_mut().unwrap() ^= 0xFF;

    let parser = registry.get("modbus-rtu").unwrap();
    assert_eq!(parser.detect(&frame, &serial_rx()), 0.0);

    let result = registry.auto_detect_and_parse(&frame, &serial_rx()).unwrap();
    assert_eq!(result.protocol, "Raw Serial");
    assert!(result.success);
}

#[test]
fn serial_port_always_gets_a_result() {
    let registry = ParserRegistry::with_builtins();
    for payload in [&[0x00u8][..], b"garbage", &[0xDE, 0xAD, 0xBE, 0xEF]] {
        let result = registry.auto_detect_and_parse(payload, &serial_rx());
        assert!(result.is_some(), "no result for {payload:02X?}");
    }
}

#[test]
fn canopen_heartbeat_decodes_node_and_state() {
    let registry = ParserRegistry::with_builtins();
    let result = registry
        .auto_detect_and_parse(&[0x05], &can_rx(0x701, 1))
        .unwrap();

    assert_eq!(result.protocol, "CANOpen");
    assert_eq!(result.summary, "Heartbeat Node 1: Operational");
    let node = result.fields.iter().find(|f| f.name == "Node ID").unwrap();
    assert_eq!(node.value, FieldValue::Number(1));
}

#[test]
fn canopen_sdo_statusword_lookup() {
    let registry = ParserRegistry::with_builtins();
    let frame = [0x40, 0x41, 0x60, 0x00, 0x00, 0x00, 0x00, 0x00];
    let result = registry
        .auto_detect_and_parse(&frame, &can_rx(0x601, 8))
        .unwrap();

    let index = result.fields.iter().find(|f| f.name == "Index").unwrap();
    assert_eq!(index.value, FieldValue::Text("0x6041".to_string()));
    assert!(index.description.as_deref().unwrap().contains("Statusword"));
    let sub = result.fields.iter().find(|f| f.name == "Sub-Index").unwrap();
    assert_eq!(sub.value, FieldValue::Number(0));
}

#[test]
fn parse_is_idempotent_through_the_registry() {
    let registry = ParserRegistry::with_builtins();
    let frame = [0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD];

    let first = registry.auto_detect_and_parse(&frame, &serial_rx()).unwrap();
    let second = registry.auto_detect_and_parse(&frame, &serial_rx()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn raw_input_is_preserved_verbatim() {
    let registry = ParserRegistry::with_builtins();
    let frame = [0x7E, 0x00, 0x41, 0x7E];
    let result = registry.auto_detect_and_parse(&frame, &serial_rx()).unwrap();
    assert_eq!(result.raw, frame);
}

#[test]
fn forced_parser_bypasses_detection() {
    let registry = ParserRegistry::with_builtins();
    let mut frame = vec![0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD];
    *frame.last_mut().unwrap() ^= 0xFF;

    // Auto-detect refuses the corrupt frame, but forcing by id decodes it
    // with a CRC warning.
    let result = registry.parse_with("modbus-rtu", &frame, &serial_rx()).unwrap();
    assert_eq!(result.protocol, "MODBUS RTU");
    assert!(result.success);
    assert!(result.warnings.iter().any(|w| w.contains("CRC mismatch")));
}

#[test]
fn factory_built_parser_can_replace_the_builtin() {
    let registry = ParserRegistry::with_builtins();
    let factory = registry.get_factory("canopen").unwrap();
    let configured = factory
        .create(&serde_json::json!({
            "pdo": { "0x181": [ { "name": "Velocity", "bits": 16 } ] }
        }))
        .unwrap();

    let before = registry.get_all().len();
    registry.register(configured);
    assert_eq!(registry.get_all().len(), before);

    let result = registry
        .auto_detect_and_parse(&[0xE8, 0x03], &can_rx(0x181, 2))
        .unwrap();
    let velocity = result.fields.iter().find(|f| f.name == "Velocity").unwrap();
    assert_eq!(velocity.value, FieldValue::Number(1000));
}

#[test]
fn registry_is_shareable_across_threads() {
    use std::sync::Arc;

    let registry = Arc::new(ParserRegistry::with_builtins());
    let frame = [0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD];

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for _ in 0..50 {
                    let result = registry
                        .auto_detect_and_parse(&frame, &serial_rx())
                        .unwrap();
                    assert_eq!(result.protocol, "MODBUS RTU");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn port_type_filter_is_honored() {
    let registry = ParserRegistry::with_builtins();
    // A Modbus-looking payload on a CAN port must not reach the Modbus
    // parser.
    let frame = [0x01, 0x03, 0x00, 0x00, 0x00, 0x0A, 0xC5, 0xCD];
    let result = registry
        .auto_detect_and_parse(&frame, &can_rx(0x181, 8))
        .unwrap();
    assert_eq!(result.protocol, "CANOpen");

    assert!(
        registry
            .get_for_port_type(PortType::Can)
            .iter()
            .all(|p| p.id() != "modbus-rtu")
    );
}
