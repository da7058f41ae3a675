//! Capability interfaces to the vendor hardware driver
//!
//! The vendor driver itself (ACPI/WMI thermal tables, per-fan PWM registers)
//! lives outside this workspace; the engine only depends on these two traits.
//! Mock implementations allow running and testing without hardware.

use async_trait::async_trait;

use aerofan_core::Result;

/// Temperature sensor access.
#[async_trait]
pub trait SensorPort: Send + Sync {
    /// Read the CPU package temperature in integer Celsius.
    async fn cpu_temperature(&self) -> Result<i64>;

    /// Read the hottest GPU temperature in integer Celsius.
    ///
    /// Returns 0 when no GPU is enumerable; that is not an error.
    async fn gpu_temperature(&self) -> Result<i64>;
}

/// Fan duty actuation.
#[async_trait]
pub trait ActuatorPort: Send + Sync {
    /// Set one fan's duty cycle as a percentage (0-100).
    async fn set_fan_duty(&self, fan_id: u8, percent: u8) -> Result<()>;

    /// Set every fan's duty cycle as a percentage (0-100).
    async fn set_all_fan_duty(&self, percent: u8) -> Result<()>;

    /// Number of fans the hardware exposes.
    fn fan_count(&self) -> usize;
}
