//! Mock hardware backend
//!
//! Implements both ports with settable temperatures, recorded duty writes,
//! and failure injection. Used by the daemon's `--mock` mode and by the
//! engine tests.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use aerofan_core::{AeroFanError, Result};

use crate::ports::{ActuatorPort, SensorPort};

/// A duty command recorded by the mock actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DutyCommand {
    /// `set_fan_duty(fan_id, percent)`
    Single { fan_id: u8, percent: u8 },
    /// `set_all_fan_duty(percent)`
    All { percent: u8 },
}

/// Mock sensor + actuator backend.
#[derive(Debug)]
pub struct MockHardware {
    fan_count: usize,
    cpu_temp: AtomicI64,
    gpu_temp: AtomicI64,
    fail_sensors: AtomicBool,
    fail_actuator: AtomicBool,
    writes: Mutex<Vec<DutyCommand>>,
}

impl MockHardware {
    /// Create a mock backend exposing `fan_count` fans at 40/35 C.
    pub fn new(fan_count: usize) -> Arc<Self> {
        Arc::new(Self {
            fan_count,
            cpu_temp: AtomicI64::new(40),
            gpu_temp: AtomicI64::new(35),
            fail_sensors: AtomicBool::new(false),
            fail_actuator: AtomicBool::new(false),
            writes: Mutex::new(Vec::new()),
        })
    }

    /// Set the temperatures subsequent reads will report.
    pub fn set_temperatures(&self, cpu: i64, gpu: i64) {
        self.cpu_temp.store(cpu, Ordering::SeqCst);
        self.gpu_temp.store(gpu, Ordering::SeqCst);
    }

    /// Make subsequent sensor reads fail (or recover).
    pub fn fail_sensors(&self, fail: bool) {
        self.fail_sensors.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent duty writes fail (or recover).
    pub fn fail_actuator(&self, fail: bool) {
        self.fail_actuator.store(fail, Ordering::SeqCst);
    }

    /// All duty commands recorded so far, oldest first.
    pub async fn writes(&self) -> Vec<DutyCommand> {
        self.writes.lock().await.clone()
    }

    /// Most recent duty command, if any.
    pub async fn last_write(&self) -> Option<DutyCommand> {
        self.writes.lock().await.last().copied()
    }

    /// Forget all recorded duty commands.
    pub async fn clear_writes(&self) {
        self.writes.lock().await.clear();
    }
}

#[async_trait]
impl SensorPort for MockHardware {
    async fn cpu_temperature(&self) -> Result<i64> {
        if self.fail_sensors.load(Ordering::SeqCst) {
            return Err(AeroFanError::Sensor("mock cpu read failure".to_string()));
        }
        Ok(self.cpu_temp.load(Ordering::SeqCst))
    }

    async fn gpu_temperature(&self) -> Result<i64> {
        if self.fail_sensors.load(Ordering::SeqCst) {
            return Err(AeroFanError::Sensor("mock gpu read failure".to_string()));
        }
        Ok(self.gpu_temp.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl ActuatorPort for MockHardware {
    async fn set_fan_duty(&self, fan_id: u8, percent: u8) -> Result<()> {
        if fan_id as usize >= self.fan_count {
            return Err(AeroFanError::InvalidFanId {
                fan_id,
                max_fans: self.fan_count,
            });
        }
        if self.fail_actuator.load(Ordering::SeqCst) {
            return Err(AeroFanError::Actuator("mock write failure".to_string()));
        }
        debug!(fan_id, percent, "mock duty write");
        self.writes
            .lock()
            .await
            .push(DutyCommand::Single { fan_id, percent });
        Ok(())
    }

    async fn set_all_fan_duty(&self, percent: u8) -> Result<()> {
        if self.fail_actuator.load(Ordering::SeqCst) {
            return Err(AeroFanError::Actuator("mock write failure".to_string()));
        }
        debug!(percent, "mock all-fan duty write");
        self.writes.lock().await.push(DutyCommand::All { percent });
        Ok(())
    }

    fn fan_count(&self) -> usize {
        self.fan_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_writes_in_order() {
        let hw = MockHardware::new(3);

        hw.set_fan_duty(0, 40).await.unwrap();
        hw.set_all_fan_duty(100).await.unwrap();

        assert_eq!(
            hw.writes().await,
            vec![
                DutyCommand::Single {
                    fan_id: 0,
                    percent: 40
                },
                DutyCommand::All { percent: 100 },
            ]
        );
        assert_eq!(hw.last_write().await, Some(DutyCommand::All { percent: 100 }));
    }

    #[tokio::test]
    async fn test_mock_rejects_out_of_range_fan() {
        let hw = MockHardware::new(2);
        let result = hw.set_fan_duty(2, 50).await;
        assert!(matches!(
            result,
            Err(AeroFanError::InvalidFanId { fan_id: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_sensor_failure_injection() {
        let hw = MockHardware::new(1);
        hw.set_temperatures(60, 10);
        assert_eq!(hw.cpu_temperature().await.unwrap(), 60);
        assert_eq!(hw.gpu_temperature().await.unwrap(), 10);

        hw.fail_sensors(true);
        assert!(hw.cpu_temperature().await.is_err());
        assert!(hw.gpu_temperature().await.is_err());

        hw.fail_sensors(false);
        assert_eq!(hw.cpu_temperature().await.unwrap(), 60);
    }

    #[tokio::test]
    async fn test_mock_actuator_failure_injection() {
        let hw = MockHardware::new(1);
        hw.fail_actuator(true);
        assert!(hw.set_all_fan_duty(50).await.is_err());
        assert!(hw.writes().await.is_empty());

        hw.fail_actuator(false);
        hw.set_all_fan_duty(50).await.unwrap();
        assert_eq!(hw.writes().await.len(), 1);
    }
}
