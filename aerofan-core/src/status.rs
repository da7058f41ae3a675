//! Per-fan observability records

use serde::{Deserialize, Serialize};

use crate::settings::FanMode;

/// Fan status information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanStatus {
    /// Fan index
    pub fan_id: u8,
    /// Mode the fan is currently governed by
    pub mode: FanMode,
    /// Last duty percentage commanded to this fan, if any
    pub last_commanded_duty: Option<u8>,
    /// Last sensor/actuator error observed for this fan's group, if any
    pub last_error: Option<String>,
}

impl FanStatus {
    /// Fresh status record for a fan that has not been commanded yet.
    pub fn new(fan_id: u8, mode: FanMode) -> Self {
        Self {
            fan_id,
            mode,
            last_commanded_duty: None,
            last_error: None,
        }
    }
}
