//! Control groups and their periodic control loops
//!
//! A control group is the unit of scheduling: one fan, or the whole fan set
//! when fan_sync is on. Curve-mode groups run as a spawned tokio task that
//! samples, smooths, evaluates, and commands duty on a fixed cadence.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use aerofan_core::{DutyLookup, FanConfig, MovingAverage, Result, Settings};
use aerofan_hardware::{ActuatorPort, SensorPort};

use super::supervisor::StatusBoard;

/// The fan set a control group commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanTarget {
    /// Every fan at once (fan_sync)
    All,
    /// A single fan index
    Index(u8),
}

impl FanTarget {
    /// Fan indices covered by this target on a machine with `fan_count` fans.
    pub fn indices(&self, fan_count: usize) -> Vec<u8> {
        match self {
            FanTarget::All => (0..fan_count as u8).collect(),
            FanTarget::Index(i) => vec![*i],
        }
    }
}

/// One unit of scheduling: a fan target plus the policy that governs it.
#[derive(Debug, Clone)]
pub struct ControlGroup {
    /// Fans this group owns exclusively
    pub target: FanTarget,
    /// Policy applied to the target
    pub config: FanConfig,
}

impl ControlGroup {
    /// Derive the control groups a settings document requires.
    ///
    /// Synced: one group driving all fans from fans[0]'s policy. Unsynced:
    /// one group per fan index, each with its own policy. Targets are
    /// disjoint either way, so no two groups ever write the same fan index.
    pub fn derive(settings: &Settings) -> Vec<ControlGroup> {
        if settings.fan_sync {
            vec![ControlGroup {
                target: FanTarget::All,
                config: settings.fans[0].clone(),
            }]
        } else {
            settings
                .fans
                .iter()
                .enumerate()
                .map(|(i, config)| ControlGroup {
                    target: FanTarget::Index(i as u8),
                    config: config.clone(),
                })
                .collect()
        }
    }
}

/// Owned state of one running curve-mode loop.
///
/// Each loop task owns its own lookups and smoothers outright; nothing is
/// shared between groups except the hardware ports and the status board.
struct LoopContext {
    target: FanTarget,
    indices: Vec<u8>,
    cpu_lookup: DutyLookup,
    gpu_lookup: DutyLookup,
    cpu_avg: MovingAverage,
    gpu_avg: MovingAverage,
    sensors: Arc<dyn SensorPort>,
    actuator: Arc<dyn ActuatorPort>,
    status: StatusBoard,
}

impl LoopContext {
    /// One sample-evaluate-command cycle.
    ///
    /// A sensor read failure skips the cycle entirely: no duty command is
    /// issued and the previously commanded duty persists on the hardware.
    async fn tick(&mut self) {
        let cpu = match self.sensors.cpu_temperature().await {
            Ok(temp) => temp,
            Err(e) => {
                warn!("cpu temperature read failed, skipping tick: {}", e);
                self.status.record_error(&self.indices, &e).await;
                return;
            }
        };
        let gpu = match self.sensors.gpu_temperature().await {
            Ok(temp) => temp,
            Err(e) => {
                warn!("gpu temperature read failed, skipping tick: {}", e);
                self.status.record_error(&self.indices, &e).await;
                return;
            }
        };

        let cpu_duty = self.cpu_lookup.evaluate(self.cpu_avg.push(cpu) as f64);
        let gpu_duty = self.gpu_lookup.evaluate(self.gpu_avg.push(gpu) as f64);
        // Either subsystem overheating must be able to drive cooling.
        let duty = cpu_duty.max(gpu_duty);

        debug!(group = ?self.target, cpu, gpu, cpu_duty, gpu_duty, duty, "tick");

        let result = match self.target {
            FanTarget::All => self.actuator.set_all_fan_duty(duty).await,
            FanTarget::Index(i) => self.actuator.set_fan_duty(i, duty).await,
        };
        match result {
            Ok(()) => self.status.record_duty(&self.indices, duty).await,
            Err(e) => {
                warn!("duty write failed, retrying next tick: {}", e);
                self.status.record_error(&self.indices, &e).await;
            }
        }
    }
}

/// Handle to a running curve-mode loop.
///
/// Owns the stop channel and the task handle; dropping it without calling
/// [`RunningLoop::cancel`] aborts nothing, so the supervisor always cancels
/// explicitly.
pub struct RunningLoop {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RunningLoop {
    /// Build the group's lookups and smoothers and spawn its periodic task.
    ///
    /// The task sleeps `curve_interval` after each completed tick, so ticks
    /// of the same group never overlap; a long tick simply delays the next.
    pub fn spawn(
        group: &ControlGroup,
        sensors: Arc<dyn SensorPort>,
        actuator: Arc<dyn ActuatorPort>,
        status: StatusBoard,
    ) -> Result<RunningLoop> {
        let fan_count = actuator.fan_count();
        let interval = Duration::from_millis(group.config.curve_interval);
        let mut ctx = LoopContext {
            target: group.target,
            indices: group.target.indices(fan_count),
            cpu_lookup: DutyLookup::build(&group.config.cpu_curve)?,
            gpu_lookup: DutyLookup::build(&group.config.gpu_curve)?,
            cpu_avg: MovingAverage::new(group.config.moving_average),
            gpu_avg: MovingAverage::new(group.config.moving_average),
            sensors,
            actuator,
            status,
        };

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            debug!(group = ?ctx.target, interval_ms = interval.as_millis() as u64, "control loop started");
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = sleep(interval) => {}
                }
                // Cancellation is only observed between ticks: an in-flight
                // tick always runs to completion.
                ctx.tick().await;
            }
            debug!(group = ?ctx.target, "control loop stopped");
        });

        Ok(RunningLoop { stop_tx, handle })
    }

    /// Stop the loop; resolves only once the task has fully exited.
    ///
    /// No duty command is issued on cancellation; the caller decides the
    /// final duty.
    pub async fn cancel(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!("control loop task ended abnormally: {}", e);
        }
    }
}
