//! AeroFan Core Library
//!
//! Shared types, curve evaluation, smoothing, and the settings model for the
//! AeroFan controller. This crate is used by the daemon and the hardware
//! abstraction layer.

pub mod curve;
pub mod error;
pub mod paths;
pub mod settings;
pub mod smoothing;
pub mod status;

// Re-export commonly used types
pub use curve::{Curve, CurvePoint, DutyLookup};
pub use error::{AeroFanError, Result};
pub use paths::default_settings_path;
pub use settings::{
    default_curve, FanConfig, FanMode, Settings, CURVE_POINT_COUNT, MIN_CURVE_INTERVAL_MS,
};
pub use smoothing::MovingAverage;
pub use status::FanStatus;
