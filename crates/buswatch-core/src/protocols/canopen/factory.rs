use std::collections::HashMap;
use std::sync::Arc;

use crate::{FactoryError, ParserFactory, PortType, ProtocolParser};

use super::parser::{CanOpenParser, PdoField};

/// Builds [`CanOpenParser`] instances with site-specific PDO mappings.
///
/// Configuration shape:
///
/// ```json
/// { "pdo": { "0x181": [ { "name": "Statusword", "bits": 16 },
///                       { "name": "Velocity",   "bits": 16 } ] } }
/// ```
///
/// COB-ID keys accept hex (`"0x181"`) or decimal strings; widths must be 8,
/// 16 or 32 bits. Registering the created parser overwrites the built-in
/// `canopen` entry, which is how a project-specific dictionary extension is
/// deployed without engine changes.
pub struct CanOpenParserFactory;

impl ParserFactory for CanOpenParserFactory {
    fn id(&self) -> &str {
        "canopen"
    }

    fn name(&self) -> &str {
        "CANOpen"
    }

    fn description(&self) -> &str {
        "CANOpen parser with configurable PDO mappings"
    }

    fn port_types(&self) -> &[PortType] {
        &[PortType::Can]
    }

    fn create(&self, config: &serde_json::Value) -> Result<Arc<dyn ProtocolParser>, FactoryError> {
        let mut mappings: HashMap<u32, Vec<PdoField>> = HashMap::new();

        let Some(pdo) = config.get("pdo") else {
            return Ok(Arc::new(CanOpenParser::new()));
        };
        let entries = pdo
            .as_object()
            .ok_or_else(|| FactoryError::InvalidConfig("\"pdo\" must be an object".to_string()))?;

        for (key, value) in entries {
            let cob_id = parse_cob_id(key)?;
            let list = value.as_array().ok_or_else(|| {
                FactoryError::InvalidConfig(format!("mapping for {key} must be an array"))
            })?;
            let mut fields = Vec::with_capacity(list.len());
            for item in list {
                fields.push(parse_field(key, item)?);
            }
            mappings.insert(cob_id, fields);
        }

        Ok(Arc::new(CanOpenParser::with_pdo_mappings(mappings)))
    }
}

fn parse_cob_id(key: &str) -> Result<u32, FactoryError> {
    let parsed = match key.strip_prefix("0x").or_else(|| key.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => key.parse(),
    };
    parsed.map_err(|_| FactoryError::InvalidConfig(format!("invalid COB-ID key \"{key}\"")))
}

fn parse_field(key: &str, item: &serde_json::Value) -> Result<PdoField, FactoryError> {
    let name = item
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| {
            FactoryError::InvalidConfig(format!("mapping for {key} is missing a field name"))
        })?
        .to_string();
    let bits = item.get("bits").and_then(|b| b.as_u64()).ok_or_else(|| {
        FactoryError::InvalidConfig(format!("field \"{name}\" is missing a bit width"))
    })?;
    if !matches!(bits, 8 | 16 | 32) {
        return Err(FactoryError::InvalidConfig(format!(
            "field \"{name}\" has unsupported width {bits} (expected 8, 16 or 32)"
        )));
    }
    Ok(PdoField {
        name,
        bits: bits as u8,
    })
}
