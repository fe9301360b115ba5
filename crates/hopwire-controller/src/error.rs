//! Controller error types

use thiserror::Error;

/// Controller-specific errors
///
/// None of these stop event processing; they are reported to the caller or
/// logged and counted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControllerError {
    #[error("Control channel closed")]
    ChannelClosed,

    #[error("Controller is not running")]
    Stopped,

    #[error("Controller worker failed: {0}")]
    Worker(String),
}

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, ControllerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ControllerError::ChannelClosed.to_string(),
            "Control channel closed"
        );
        assert_eq!(
            ControllerError::Worker("panicked".to_string()).to_string(),
            "Controller worker failed: panicked"
        );
    }
}
