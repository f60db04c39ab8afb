//! COB-ID decomposition for the CANopen pre-defined connection set.
//!
//! An 11-bit COB-ID splits into a 4-bit function code (`id >> 7`) and a
//! 7-bit node id (`id & 0x7F`). Extended (29-bit) identifiers are outside
//! the pre-defined set and classify as unknown.

pub const NODE_ID_MASK: u32 = 0x7F;
pub const FUNCTION_SHIFT: u32 = 7;
pub const MAX_STANDARD_ID: u32 = 0x7FF;

pub const NMT_ID: u32 = 0x000;
pub const SYNC_ID: u32 = 0x080;
pub const TIME_ID: u32 = 0x100;
pub const EMCY_BASE: u32 = 0x080;
pub const SDO_TX_BASE: u32 = 0x580;
pub const SDO_RX_BASE: u32 = 0x600;
pub const HEARTBEAT_BASE: u32 = 0x700;
pub const LSS_TX_ID: u32 = 0x7E4;
pub const LSS_RX_ID: u32 = 0x7E5;

/// Service addressed by a COB-ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CobService {
    Nmt,
    Sync,
    Emergency,
    Time,
    /// Transmit PDO 1-4.
    Tpdo(u8),
    /// Receive PDO 1-4.
    Rpdo(u8),
    /// SDO server -> client (response).
    SdoTx,
    /// SDO client -> server (request).
    SdoRx,
    Heartbeat,
    LssTx,
    LssRx,
    Unknown,
}

impl CobService {
    pub fn label(&self) -> String {
        match self {
            CobService::Nmt => "NMT".to_string(),
            CobService::Sync => "SYNC".to_string(),
            CobService::Emergency => "EMCY".to_string(),
            CobService::Time => "TIME".to_string(),
            CobService::Tpdo(n) => format!("TPDO{n}"),
            CobService::Rpdo(n) => format!("RPDO{n}"),
            CobService::SdoTx => "SDO (tx)".to_string(),
            CobService::SdoRx => "SDO (rx)".to_string(),
            CobService::Heartbeat => "Heartbeat".to_string(),
            CobService::LssTx => "LSS (tx)".to_string(),
            CobService::LssRx => "LSS (rx)".to_string(),
            CobService::Unknown => "Unknown".to_string(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, CobService::Unknown)
    }
}

/// Classified COB-ID: service plus node id where the service carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CobInfo {
    pub service: CobService,
    pub node_id: Option<u8>,
}

/// 4-bit function code portion of an 11-bit COB-ID.
pub fn function_code(cob_id: u32) -> u8 {
    ((cob_id & MAX_STANDARD_ID) >> FUNCTION_SHIFT) as u8
}

/// 7-bit node id portion of an 11-bit COB-ID.
pub fn node_id(cob_id: u32) -> u8 {
    (cob_id & NODE_ID_MASK) as u8
}

/// Map a COB-ID onto the pre-defined connection set.
pub fn classify(cob_id: u32, ext: bool) -> CobInfo {
    if ext || cob_id > MAX_STANDARD_ID {
        return CobInfo {
            service: CobService::Unknown,
            node_id: None,
        };
    }

    let node = Some(node_id(cob_id));
    match cob_id {
        NMT_ID => known(CobService::Nmt, None),
        SYNC_ID => known(CobService::Sync, None),
        TIME_ID => known(CobService::Time, None),
        0x081..=0x0FF => known(CobService::Emergency, node),
        0x180..=0x1FF => known(CobService::Tpdo(1), node),
        0x200..=0x27F => known(CobService::Rpdo(1), node),
        0x280..=0x2FF => known(CobService::Tpdo(2), node),
        0x300..=0x37F => known(CobService::Rpdo(2), node),
        0x380..=0x3FF => known(CobService::Tpdo(3), node),
        0x400..=0x47F => known(CobService::Rpdo(3), node),
        0x480..=0x4FF => known(CobService::Tpdo(4), node),
        0x500..=0x57F => known(CobService::Rpdo(4), node),
        0x580..=0x5FF => known(CobService::SdoTx, node),
        0x600..=0x67F => known(CobService::SdoRx, node),
        0x700..=0x77F => known(CobService::Heartbeat, node),
        LSS_TX_ID => known(CobService::LssTx, None),
        LSS_RX_ID => known(CobService::LssRx, None),
        _ => known(CobService::Unknown, None),
    }
}

fn known(service: CobService, node_id: Option<u8>) -> CobInfo {
    CobInfo { service, node_id }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposition() {
        assert_eq!(function_code(0x701), 0xE);
        assert_eq!(node_id(0x701), 1);
        assert_eq!(function_code(0x000), 0);
        assert_eq!(node_id(0x67F), 0x7F);
    }

    #[test]
    fn classify_broadcast_services() {
        assert_eq!(classify(0x000, false).service, CobService::Nmt);
        assert_eq!(classify(0x080, false).service, CobService::Sync);
        assert_eq!(classify(0x100, false).service, CobService::Time);
        assert_eq!(classify(0x000, false).node_id, None);
    }

    #[test]
    fn classify_node_services() {
        let hb = classify(0x701, false);
        assert_eq!(hb.service, CobService::Heartbeat);
        assert_eq!(hb.node_id, Some(1));

        let sdo_rx = classify(0x601, false);
        assert_eq!(sdo_rx.service, CobService::SdoRx);
        assert_eq!(sdo_rx.node_id, Some(1));

        let sdo_tx = classify(0x581, false);
        assert_eq!(sdo_tx.service, CobService::SdoTx);

        let emcy = classify(0x085, false);
        assert_eq!(emcy.service, CobService::Emergency);
        assert_eq!(emcy.node_id, Some(5));
    }

    #[test]
    fn classify_pdo_bands() {
        assert_eq!(classify(0x181, false).service, CobService::Tpdo(1));
        assert_eq!(classify(0x201, false).service, CobService::Rpdo(1));
        assert_eq!(classify(0x4FF, false).service, CobService::Tpdo(4));
        assert_eq!(classify(0x57F, false).service, CobService::Rpdo(4));
    }

    #[test]
    fn classify_lss_and_unknown() {
        assert_eq!(classify(0x7E4, false).service, CobService::LssTx);
        assert_eq!(classify(0x7E5, false).service, CobService::LssRx);
        assert_eq!(classify(0x7F0, false).service, CobService::Unknown);
        // Extended identifiers are outside the pre-defined set.
        assert_eq!(classify(0x701, true).service, CobService::Unknown);
        assert_eq!(classify(0x1FFF_0701, false).service, CobService::Unknown);
    }
}
