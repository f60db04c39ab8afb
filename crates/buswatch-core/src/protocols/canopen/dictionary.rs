//! CANopen object dictionary: the CiA 301 communication profile plus
//! range-derived SDO/PDO parameter names.
//!
//! The tables are static and read-only; lookups never allocate except for
//! range-derived names. Drive-profile objects (CiA 402) live in
//! [`super::cia402`] and are consulted after the communication profile.

use std::borrow::Cow;

/// Object access class, as published in the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Ro,
    Rw,
    Wo,
    Const,
}

impl Access {
    pub fn label(&self) -> &'static str {
        match self {
            Access::Ro => "RO",
            Access::Rw => "RW",
            Access::Wo => "WO",
            Access::Const => "CONST",
        }
    }
}

/// One object dictionary entry. `sub_index` of `None` matches any sub-index.
#[derive(Debug, Clone, Copy)]
pub struct DictEntry {
    pub index: u16,
    pub sub_index: Option<u8>,
    pub name: &'static str,
    pub data_type: &'static str,
    pub access: Access,
}

const fn entry(index: u16, name: &'static str, data_type: &'static str, access: Access) -> DictEntry {
    DictEntry {
        index,
        sub_index: None,
        name,
        data_type,
        access,
    }
}

const fn sub_entry(
    index: u16,
    sub_index: u8,
    name: &'static str,
    data_type: &'static str,
    access: Access,
) -> DictEntry {
    DictEntry {
        index,
        sub_index: Some(sub_index),
        name,
        data_type,
        access,
    }
}

/// CiA 301 communication profile (0x1000 region).
static COMMUNICATION_PROFILE: &[DictEntry] = &[
    entry(0x1000, "Device Type", "U32", Access::Ro),
    entry(0x1001, "Error Register", "U8", Access::Ro),
    entry(0x1002, "Manufacturer Status Register", "U32", Access::Ro),
    entry(0x1003, "Pre-defined Error Field", "U32[]", Access::Ro),
    entry(0x1005, "COB-ID SYNC", "U32", Access::Rw),
    entry(0x1006, "Communication Cycle Period", "U32", Access::Rw),
    entry(0x1007, "Synchronous Window Length", "U32", Access::Rw),
    entry(0x1008, "Manufacturer Device Name", "STRING", Access::Ro),
    entry(0x1009, "Manufacturer HW Version", "STRING", Access::Ro),
    entry(0x100A, "Manufacturer SW Version", "STRING", Access::Ro),
    entry(0x100C, "Guard Time", "U16", Access::Rw),
    entry(0x100D, "Life Time Factor", "U8", Access::Rw),
    entry(0x1010, "Store Parameters", "U32", Access::Rw),
    entry(0x1011, "Restore Default Parameters", "U32", Access::Rw),
    entry(0x1012, "COB-ID Timestamp", "U32", Access::Rw),
    entry(0x1013, "High Resolution Timestamp", "U32", Access::Rw),
    entry(0x1014, "COB-ID Emergency", "U32", Access::Rw),
    entry(0x1015, "Inhibit Time Emergency", "U16", Access::Rw),
    entry(0x1016, "Consumer Heartbeat Time", "U32[]", Access::Rw),
    entry(0x1017, "Producer Heartbeat Time", "U16", Access::Rw),
    sub_entry(0x1018, 0, "Identity Object - Number of Entries", "U8", Access::Ro),
    sub_entry(0x1018, 1, "Vendor ID", "U32", Access::Ro),
    sub_entry(0x1018, 2, "Product Code", "U32", Access::Ro),
    sub_entry(0x1018, 3, "Revision Number", "U32", Access::Ro),
    sub_entry(0x1018, 4, "Serial Number", "U32", Access::Ro),
    entry(0x1019, "Sync Counter Overflow Value", "U8", Access::Rw),
    entry(0x1020, "Verify Configuration", "U32[]", Access::Rw),
    entry(0x1021, "Store EDS", "DOMAIN", Access::Ro),
    entry(0x1022, "Store Format", "U8", Access::Ro),
    entry(0x1023, "OS Command", "DOMAIN", Access::Rw),
    entry(0x1024, "OS Command Mode", "U8", Access::Wo),
    entry(0x1025, "OS Debugger Interface", "DOMAIN", Access::Rw),
    entry(0x1026, "OS Prompt", "U8[]", Access::Ro),
    entry(0x1027, "Module List", "U16[]", Access::Ro),
    entry(0x1028, "Emergency Consumer", "U32[]", Access::Rw),
    entry(0x1029, "Error Behavior", "U8[]", Access::Rw),
];

const SDO_SERVER_START: u16 = 0x1200;
const SDO_SERVER_END: u16 = 0x127F;
const SDO_CLIENT_START: u16 = 0x1280;
const SDO_CLIENT_END: u16 = 0x12FF;
const RPDO_COMM_START: u16 = 0x1400;
const RPDO_COMM_END: u16 = 0x15FF;
const RPDO_MAP_START: u16 = 0x1600;
const RPDO_MAP_END: u16 = 0x17FF;
const TPDO_COMM_START: u16 = 0x1800;
const TPDO_COMM_END: u16 = 0x19FF;
const TPDO_MAP_START: u16 = 0x1A00;
const TPDO_MAP_END: u16 = 0x1BFF;

/// Profile a dictionary hit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Cia301,
    Cia402,
}

impl Profile {
    pub fn label(&self) -> &'static str {
        match self {
            Profile::Cia301 => "CiA 301",
            Profile::Cia402 => "CiA 402",
        }
    }
}

/// Result of an object dictionary lookup.
#[derive(Debug, Clone)]
pub struct DictHit {
    pub name: Cow<'static, str>,
    pub data_type: &'static str,
    pub profile: Profile,
}

fn find_in(table: &'static [DictEntry], index: u16, sub_index: Option<u8>) -> Option<&'static DictEntry> {
    // Exact (index, sub-index) match wins over an index-only entry.
    if let Some(sub) = sub_index {
        if let Some(exact) = table
            .iter()
            .find(|e| e.index == index && e.sub_index == Some(sub))
        {
            return Some(exact);
        }
    }
    table
        .iter()
        .find(|e| e.index == index && e.sub_index.is_none())
}

fn range_derived(index: u16) -> Option<DictHit> {
    let name = match index {
        SDO_SERVER_START..=SDO_SERVER_END => {
            format!("SDO Server {} Parameter", index - SDO_SERVER_START)
        }
        SDO_CLIENT_START..=SDO_CLIENT_END => {
            format!("SDO Client {} Parameter", index - SDO_CLIENT_START)
        }
        RPDO_COMM_START..=RPDO_COMM_END => {
            format!("RPDO {} Communication Parameter", index - RPDO_COMM_START)
        }
        RPDO_MAP_START..=RPDO_MAP_END => {
            format!("RPDO {} Mapping Parameter", index - RPDO_MAP_START)
        }
        TPDO_COMM_START..=TPDO_COMM_END => {
            format!("TPDO {} Communication Parameter", index - TPDO_COMM_START)
        }
        TPDO_MAP_START..=TPDO_MAP_END => {
            format!("TPDO {} Mapping Parameter", index - TPDO_MAP_START)
        }
        _ => return None,
    };
    Some(DictHit {
        name: Cow::Owned(name),
        data_type: "RECORD",
        profile: Profile::Cia301,
    })
}

/// Look up `(index, sub_index)` across the CiA 301 communication profile,
/// the range-derived parameter regions, and the CiA 402 drive profile, in
/// that order.
pub fn lookup(index: u16, sub_index: Option<u8>) -> Option<DictHit> {
    if let Some(entry) = find_in(COMMUNICATION_PROFILE, index, sub_index) {
        return Some(DictHit {
            name: Cow::Borrowed(entry.name),
            data_type: entry.data_type,
            profile: Profile::Cia301,
        });
    }
    if let Some(hit) = range_derived(index) {
        return Some(hit);
    }
    if let Some(entry) = find_in(super::cia402::objects(), index, sub_index) {
        return Some(DictHit {
            name: Cow::Borrowed(entry.name),
            data_type: entry.data_type,
            profile: Profile::Cia402,
        });
    }
    None
}

/// Decode the error register (object 0x1001) bit by bit.
pub fn error_register_bits(value: u8) -> Vec<&'static str> {
    const BITS: [&str; 8] = [
        "Generic Error",
        "Current Error",
        "Voltage Error",
        "Temperature Error",
        "Communication Error",
        "Device Profile Specific",
        "Reserved",
        "Manufacturer Specific",
    ];
    (0..8)
        .filter(|bit| value >> bit & 1 == 1)
        .map(|bit| BITS[bit as usize])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn communication_profile_lookup() {
        let hit = lookup(0x1000, None).unwrap();
        assert_eq!(hit.name, "Device Type");
        assert_eq!(hit.profile, Profile::Cia301);

        let hit = lookup(0x1017, Some(0)).unwrap();
        assert_eq!(hit.name, "Producer Heartbeat Time");
    }

    #[test]
    fn identity_sub_indices() {
        let hit = lookup(0x1018, Some(1)).unwrap();
        assert_eq!(hit.name, "Vendor ID");
        let hit = lookup(0x1018, Some(4)).unwrap();
        assert_eq!(hit.name, "Serial Number");
    }

    #[test]
    fn range_derived_names() {
        let hit = lookup(0x1200, None).unwrap();
        assert_eq!(hit.name, "SDO Server 0 Parameter");
        let hit = lookup(0x1402, None).unwrap();
        assert_eq!(hit.name, "RPDO 2 Communication Parameter");
        let hit = lookup(0x1A01, None).unwrap();
        assert_eq!(hit.name, "TPDO 1 Mapping Parameter");
    }

    #[test]
    fn drive_profile_fallthrough() {
        let hit = lookup(0x6041, Some(0)).unwrap();
        assert_eq!(hit.name, "Statusword");
        assert_eq!(hit.profile, Profile::Cia402);
    }

    #[test]
    fn unknown_index() {
        assert!(lookup(0x2000, None).is_none());
    }

    #[test]
    fn error_register_decode() {
        assert_eq!(
            error_register_bits(0x11),
            vec!["Generic Error", "Communication Error"]
        );
        assert!(error_register_bits(0).is_empty());
    }
}
