//! CiA 402 drive profile: object table, statusword/controlword decode and
//! the drive state machine.

use super::dictionary::{Access, DictEntry};

const fn entry(index: u16, name: &'static str, data_type: &'static str, access: Access) -> DictEntry {
    DictEntry {
        index,
        sub_index: None,
        name,
        data_type,
        access,
    }
}

static DRIVE_PROFILE: &[DictEntry] = &[
    entry(0x6040, "Controlword", "U16", Access::Rw),
    entry(0x6041, "Statusword", "U16", Access::Ro),
    entry(0x6060, "Modes of Operation", "I8", Access::Rw),
    entry(0x6061, "Modes of Operation Display", "I8", Access::Ro),
    entry(0x6062, "Position Demand Value", "I32", Access::Ro),
    entry(0x6063, "Position Actual Internal Value", "I32", Access::Ro),
    entry(0x6064, "Position Actual Value", "I32", Access::Ro),
    entry(0x6065, "Following Error Window", "U32", Access::Rw),
    entry(0x6066, "Following Error Time Out", "U16", Access::Rw),
    entry(0x6067, "Position Window", "U32", Access::Rw),
    entry(0x6068, "Position Window Time", "U16", Access::Rw),
    entry(0x606B, "Velocity Demand Value", "I32", Access::Ro),
    entry(0x606C, "Velocity Actual Value", "I32", Access::Ro),
    entry(0x606D, "Velocity Window", "U16", Access::Rw),
    entry(0x606E, "Velocity Window Time", "U16", Access::Rw),
    entry(0x606F, "Velocity Threshold", "U16", Access::Rw),
    entry(0x6070, "Velocity Threshold Time", "U16", Access::Rw),
    entry(0x6071, "Target Torque", "I16", Access::Rw),
    entry(0x6072, "Max Torque", "U16", Access::Rw),
    entry(0x6073, "Max Current", "U16", Access::Rw),
    entry(0x6074, "Torque Demand Value", "I16", Access::Ro),
    entry(0x6075, "Motor Rated Current", "U32", Access::Rw),
    entry(0x6076, "Motor Rated Torque", "U32", Access::Rw),
    entry(0x6077, "Torque Actual Value", "I16", Access::Ro),
    entry(0x6078, "Current Actual Value", "I16", Access::Ro),
    entry(0x6079, "DC Link Circuit Voltage", "U32", Access::Ro),
    entry(0x607A, "Target Position", "I32", Access::Rw),
    entry(0x607B, "Position Range Limit", "I32[]", Access::Rw),
    entry(0x607C, "Home Offset", "I32", Access::Rw),
    entry(0x607D, "Software Position Limit", "I32[]", Access::Rw),
    entry(0x607E, "Polarity", "U8", Access::Rw),
    entry(0x607F, "Max Profile Velocity", "U32", Access::Rw),
    entry(0x6080, "Max Motor Speed", "U32", Access::Rw),
    entry(0x6081, "Profile Velocity", "U32", Access::Rw),
    entry(0x6082, "End Velocity", "U32", Access::Rw),
    entry(0x6083, "Profile Acceleration", "U32", Access::Rw),
    entry(0x6084, "Profile Deceleration", "U32", Access::Rw),
    entry(0x6085, "Quick Stop Deceleration", "U32", Access::Rw),
    entry(0x6086, "Motion Profile Type", "I16", Access::Rw),
    entry(0x608F, "Position Encoder Resolution", "U32[]", Access::Rw),
    entry(0x6090, "Velocity Encoder Resolution", "U32[]", Access::Rw),
    entry(0x6091, "Gear Ratio", "U32[]", Access::Rw),
    entry(0x6092, "Feed Constant", "U32[]", Access::Rw),
    entry(0x6098, "Homing Method", "I8", Access::Rw),
    entry(0x6099, "Homing Speeds", "U32[]", Access::Rw),
    entry(0x609A, "Homing Acceleration", "U32", Access::Rw),
    entry(0x60FD, "Digital Inputs", "U32", Access::Ro),
    entry(0x60FE, "Digital Outputs", "U32[]", Access::Rw),
    entry(0x60FF, "Target Velocity", "I32", Access::Rw),
    entry(0x6502, "Supported Drive Modes", "U32", Access::Ro),
];

/// The drive-profile object table (0x6000 region).
pub fn objects() -> &'static [DictEntry] {
    DRIVE_PROFILE
}

/// Modes of Operation (objects 0x6060/0x6061).
pub fn operation_mode_name(mode: i8) -> Option<&'static str> {
    match mode {
        0 => Some("No mode"),
        1 => Some("Profile Position (PP)"),
        2 => Some("Velocity"),
        3 => Some("Profile Velocity (PV)"),
        4 => Some("Torque Profile (TQ)"),
        6 => Some("Homing (HM)"),
        7 => Some("Interpolated Position (IP)"),
        8 => Some("Cyclic Synchronous Position (CSP)"),
        9 => Some("Cyclic Synchronous Velocity (CSV)"),
        10 => Some("Cyclic Synchronous Torque (CST)"),
        _ => None,
    }
}

const STATUSWORD_BITS: [&str; 16] = [
    "Ready to Switch On",
    "Switched On",
    "Operation Enabled",
    "Fault",
    "Voltage Enabled",
    "Quick Stop",
    "Switch On Disabled",
    "Warning",
    "Manufacturer Specific (8)",
    "Remote",
    "Target Reached",
    "Internal Limit Active",
    "Op Mode Specific (12) / Set-Point Ack",
    "Op Mode Specific (13) / Following Error",
    "Manufacturer Specific (14)",
    "Manufacturer Specific (15)",
];

const CONTROLWORD_BITS: [&str; 16] = [
    "Switch On",
    "Enable Voltage",
    "Quick Stop",
    "Enable Operation",
    "Op Mode Specific (4)",
    "Op Mode Specific (5)",
    "Op Mode Specific (6)",
    "Fault Reset",
    "Halt",
    "Op Mode Specific (9)",
    "Reserved",
    "Manufacturer Specific (11)",
    "Manufacturer Specific (12)",
    "Manufacturer Specific (13)",
    "Manufacturer Specific (14)",
    "Manufacturer Specific (15)",
];

/// CiA 402 state machine state, as encoded in the statusword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveState {
    NotReadyToSwitchOn,
    SwitchOnDisabled,
    ReadyToSwitchOn,
    SwitchedOn,
    OperationEnabled,
    QuickStopActive,
    FaultReactionActive,
    Fault,
    Unknown,
}

impl DriveState {
    pub fn label(&self) -> &'static str {
        match self {
            DriveState::NotReadyToSwitchOn => "Not Ready to Switch On",
            DriveState::SwitchOnDisabled => "Switch On Disabled",
            DriveState::ReadyToSwitchOn => "Ready to Switch On",
            DriveState::SwitchedOn => "Switched On",
            DriveState::OperationEnabled => "Operation Enabled",
            DriveState::QuickStopActive => "Quick Stop Active",
            DriveState::FaultReactionActive => "Fault Reaction Active",
            DriveState::Fault => "Fault",
            DriveState::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for DriveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Decoded statusword: state machine state, set bits, active warnings.
#[derive(Debug, Clone)]
pub struct StatuswordDecode {
    pub state: DriveState,
    pub bits: Vec<&'static str>,
    pub warnings: Vec<&'static str>,
}

/// Decode a statusword (object 0x6041).
pub fn decode_statusword(word: u16) -> StatuswordDecode {
    let bits = set_bits(word, &STATUSWORD_BITS);

    let rtso = word & 1 != 0;
    let so = word >> 1 & 1 != 0;
    let oe = word >> 2 & 1 != 0;
    let fault = word >> 3 & 1 != 0;
    let qs = word >> 5 & 1 != 0;
    let sod = word >> 6 & 1 != 0;

    let state = if fault {
        if rtso && so && oe {
            DriveState::FaultReactionActive
        } else {
            DriveState::Fault
        }
    } else if !rtso && !so && !oe && sod {
        DriveState::SwitchOnDisabled
    } else if rtso && !so && !oe && !qs {
        DriveState::QuickStopActive
    } else if rtso && !so && !oe && qs {
        DriveState::ReadyToSwitchOn
    } else if rtso && so && !oe && qs {
        DriveState::SwitchedOn
    } else if rtso && so && oe && qs {
        DriveState::OperationEnabled
    } else if !rtso && !so && !oe && !sod {
        DriveState::NotReadyToSwitchOn
    } else {
        DriveState::Unknown
    };

    let mut warnings = Vec::new();
    if word >> 7 & 1 != 0 {
        warnings.push("Warning active");
    }
    if word >> 11 & 1 != 0 {
        warnings.push("Internal limit active");
    }
    if word >> 13 & 1 != 0 {
        warnings.push("Following error");
    }

    StatuswordDecode {
        state,
        bits,
        warnings,
    }
}

/// Decoded controlword: derived command plus set bits.
#[derive(Debug, Clone)]
pub struct ControlwordDecode {
    pub command: &'static str,
    pub bits: Vec<&'static str>,
}

/// Decode a controlword (object 0x6040).
pub fn decode_controlword(word: u16) -> ControlwordDecode {
    let bits = set_bits(word, &CONTROLWORD_BITS);

    let so = word & 1 != 0;
    let ev = word >> 1 & 1 != 0;
    let qs = word >> 2 & 1 != 0;
    let eo = word >> 3 & 1 != 0;
    let fr = word >> 7 & 1 != 0;

    let command = if fr {
        "Fault Reset"
    } else if !qs {
        "Quick Stop"
    } else if !ev {
        "Disable Voltage"
    } else if !so {
        "Shutdown"
    } else if !eo {
        "Switch On"
    } else {
        "Enable Operation"
    };

    ControlwordDecode { command, bits }
}

fn set_bits(word: u16, names: &[&'static str; 16]) -> Vec<&'static str> {
    (0..16)
        .filter(|bit| word >> bit & 1 == 1)
        .map(|bit| names[bit as usize])
        .collect()
}
