//! AeroFan Hardware Abstraction
//!
//! Capability interfaces to the vendor fan/thermal driver, plus a mock
//! backend for development and testing.

pub mod mock;
pub mod ports;

pub use mock::{DutyCommand, MockHardware};
pub use ports::{ActuatorPort, SensorPort};
