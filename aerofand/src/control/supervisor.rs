//! Control supervisor: the settings-driven loop lifecycle
//!
//! The supervisor owns all runtime control state explicitly — no globals —
//! so independent supervisors can coexist (and be tested) side by side.
//! Applying a settings document is validate-then-swap: validation failures
//! leave the running loops untouched; on success every previous loop is
//! cancelled and joined before any new group starts, so at most one writer
//! ever owns a fan index.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use aerofan_core::{AeroFanError, FanMode, FanStatus, Result, Settings};
use aerofan_hardware::{ActuatorPort, SensorPort};

use super::group::{ControlGroup, FanTarget, RunningLoop};

/// Shared per-fan status records, updated by immediate writes and ticks.
#[derive(Clone, Default)]
pub struct StatusBoard {
    inner: Arc<RwLock<HashMap<u8, FanStatus>>>,
}

impl StatusBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the records for a freshly applied settings document.
    ///
    /// When synced, every fan reports fans[0]'s mode, the policy actually
    /// governing it.
    pub(crate) async fn reset(&self, settings: &Settings) {
        let mut inner = self.inner.write().await;
        inner.clear();
        for (i, fan) in settings.fans.iter().enumerate() {
            let mode = if settings.fan_sync {
                settings.fans[0].mode
            } else {
                fan.mode
            };
            inner.insert(i as u8, FanStatus::new(i as u8, mode));
        }
    }

    /// Record a successfully commanded duty for the given fan indices.
    pub(crate) async fn record_duty(&self, indices: &[u8], duty: u8) {
        let mut inner = self.inner.write().await;
        for &fan_id in indices {
            if let Some(status) = inner.get_mut(&fan_id) {
                status.last_commanded_duty = Some(duty);
                status.last_error = None;
            }
        }
    }

    /// Record a sensor or actuator failure for the given fan indices.
    pub(crate) async fn record_error(&self, indices: &[u8], error: &AeroFanError) {
        let mut inner = self.inner.write().await;
        for &fan_id in indices {
            if let Some(status) = inner.get_mut(&fan_id) {
                status.last_error = Some(error.to_string());
            }
        }
    }

    /// Current records, ordered by fan index.
    pub async fn snapshot(&self) -> Vec<FanStatus> {
        let inner = self.inner.read().await;
        let mut statuses: Vec<FanStatus> = inner.values().cloned().collect();
        statuses.sort_by_key(|s| s.fan_id);
        statuses
    }
}

/// Orchestrates control loops from settings documents.
pub struct ControlSupervisor {
    sensors: Arc<dyn SensorPort>,
    actuator: Arc<dyn ActuatorPort>,
    active: Mutex<Vec<RunningLoop>>,
    status: StatusBoard,
}

impl ControlSupervisor {
    /// Create a supervisor over the given hardware ports, with no loops
    /// running.
    pub fn new(sensors: Arc<dyn SensorPort>, actuator: Arc<dyn ActuatorPort>) -> Self {
        Self {
            sensors,
            actuator,
            active: Mutex::new(Vec::new()),
            status: StatusBoard::new(),
        }
    }

    /// Apply a settings document.
    ///
    /// Validates first (a rejected document changes nothing), then cancels
    /// every running loop before starting the groups the document requires.
    /// Startup duty-write failures do not roll anything back: remaining
    /// groups are still started and the first failure is returned, since the
    /// old loops are already gone and stale control would be worse.
    pub async fn apply(&self, settings: &Settings) -> Result<()> {
        settings.validate(self.actuator.fan_count())?;

        // Holding the lock across cancel-and-restart serializes concurrent
        // applies and upholds the one-writer-per-fan invariant.
        let mut active = self.active.lock().await;
        Self::cancel_loops(&mut active).await;

        self.status.reset(settings).await;

        let groups = ControlGroup::derive(settings);
        info!(
            "applying settings: {} group(s), sync={}",
            groups.len(),
            settings.fan_sync
        );

        let mut first_error = None;
        for group in &groups {
            let result = match group.config.mode {
                FanMode::Off => self.command_immediate(group.target, 0).await,
                FanMode::Fixed => {
                    self.command_immediate(group.target, group.config.specific_value)
                        .await
                }
                FanMode::Curve => RunningLoop::spawn(
                    group,
                    self.sensors.clone(),
                    self.actuator.clone(),
                    self.status.clone(),
                )
                .map(|running| active.push(running)),
            };
            if let Err(e) = result {
                warn!("group {:?} failed to start: {}", group.target, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// One-shot duty write for off/fixed groups; never schedules a task.
    async fn command_immediate(&self, target: FanTarget, duty: u8) -> Result<()> {
        let result = match target {
            FanTarget::All => self.actuator.set_all_fan_duty(duty).await,
            FanTarget::Index(i) => self.actuator.set_fan_duty(i, duty).await,
        };
        let indices = target.indices(self.actuator.fan_count());
        match &result {
            Ok(()) => self.status.record_duty(&indices, duty).await,
            Err(e) => self.status.record_error(&indices, e).await,
        }
        result
    }

    /// Cancel every running loop, returning once all tasks have exited.
    pub async fn cancel_all(&self) {
        let mut active = self.active.lock().await;
        Self::cancel_loops(&mut active).await;
    }

    async fn cancel_loops(active: &mut Vec<RunningLoop>) {
        for running in active.drain(..) {
            running.cancel().await;
        }
    }

    /// Number of loops currently running.
    pub async fn active_loops(&self) -> usize {
        self.active.lock().await.len()
    }

    /// Stop all loops, then park every fan at duty 0.
    ///
    /// The order matters: loops must be gone before the final write so no
    /// tick can overwrite the parked duty.
    pub async fn shutdown(&self) -> Result<()> {
        self.cancel_all().await;
        self.actuator.set_all_fan_duty(0).await?;
        let indices: Vec<u8> = (0..self.actuator.fan_count() as u8).collect();
        self.status.record_duty(&indices, 0).await;
        Ok(())
    }

    /// Per-fan observability snapshot.
    pub async fn current_status(&self) -> Vec<FanStatus> {
        self.status.snapshot().await
    }
}
