use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModbusError {
    #[error("frame too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
}
