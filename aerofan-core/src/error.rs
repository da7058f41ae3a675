//! Error types for the AeroFan system

use thiserror::Error;

/// Core error type for AeroFan operations
#[derive(Error, Debug)]
pub enum AeroFanError {
    /// Settings document violates the schema (structure, ranges, ordering)
    #[error("Settings error: {0}")]
    Settings(String),

    /// Curve cannot be built into a duty lookup
    #[error("Invalid curve: {0}")]
    InvalidCurve(String),

    /// A temperature sensor read failed
    #[error("Sensor error: {0}")]
    Sensor(String),

    /// A fan duty write failed
    #[error("Actuator error: {0}")]
    Actuator(String),

    /// Fan index out of range
    #[error("Fan ID out of range: {fan_id} (must be 0-{max})", max = max_fans - 1)]
    InvalidFanId { fan_id: u8, max_fans: usize },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for AeroFan operations
pub type Result<T> = std::result::Result<T, AeroFanError>;

impl From<serde_json::Error> for AeroFanError {
    fn from(err: serde_json::Error) -> Self {
        AeroFanError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: AeroFanError = json_err.into();

        match err {
            AeroFanError::Serialization(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AeroFanError = io_err.into();

        match err {
            AeroFanError::Io(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = AeroFanError::Settings("curve must have exactly 11 points".to_string());
        assert_eq!(
            format!("{}", err),
            "Settings error: curve must have exactly 11 points"
        );

        let err = AeroFanError::Sensor("cpu read timed out".to_string());
        assert_eq!(format!("{}", err), "Sensor error: cpu read timed out");

        let err = AeroFanError::InvalidFanId {
            fan_id: 5,
            max_fans: 3,
        };
        assert_eq!(format!("{}", err), "Fan ID out of range: 5 (must be 0-2)");
    }
}
