//! Error types for protocol operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid MAC address: {0}")]
    InvalidMacAddress(String),

    #[error("Invalid datapath ID: {0}")]
    InvalidDatapathId(String),

    #[error("Frame too short: {len} bytes (min: {min})")]
    FrameTooShort { len: usize, min: usize },

    #[error("Missing required field: {0}")]
    MissingField(String),
}
