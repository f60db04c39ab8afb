pub const ADDRESS_OFFSET: usize = 0;
pub const FUNCTION_OFFSET: usize = 1;
pub const DATA_OFFSET: usize = 2;

/// Address (1) + function code (1) + CRC (2).
pub const MIN_FRAME_LEN: usize = 4;
pub const CRC_LEN: usize = 2;

pub const BROADCAST_ADDRESS: u8 = 0;
pub const MAX_SLAVE_ADDRESS: u8 = 247;

/// High bit of the function byte marks an exception response.
pub const EXCEPTION_FLAG: u8 = 0x80;
pub const FUNCTION_MASK: u8 = 0x7F;

/// Write Single Coil asserts the output with this value; 0x0000 clears it.
pub const COIL_ON: u16 = 0xFF00;
