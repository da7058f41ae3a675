//! AeroFan control daemon
//!
//! Loads the persisted settings document, applies it to the control
//! supervisor, and runs until SIGINT/SIGTERM. On shutdown all control loops
//! are cancelled and every fan is parked at duty 0, so fans are never left
//! at an arbitrary duty with the controller gone.
//!
//! The vendor sensor/actuator driver is an external collaborator; the daemon
//! currently runs against the simulated backend (`--mock`).

mod control;
mod shutdown;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use aerofan_core::{default_settings_path, Settings};
use aerofan_hardware::{ActuatorPort, MockHardware, SensorPort};
use control::ControlSupervisor;

/// AeroFan control daemon
#[derive(Parser, Debug)]
#[command(name = "aerofand")]
#[command(version, about = "AeroFan fan control daemon", long_about = None)]
struct Args {
    /// Path to the settings document
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Run with the simulated hardware backend
    #[arg(long)]
    mock: bool,

    /// Fan count exposed by the simulated backend
    #[arg(long, default_value_t = 3)]
    fans: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.verbose);

    info!("AeroFan daemon starting...");

    // Determine settings path: CLI flag > env var > default
    let settings_path = args.settings.unwrap_or_else(|| {
        std::env::var("AEROFAN_SETTINGS")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_settings_path())
    });
    info!("Settings file: {}", settings_path.display());

    if !args.mock {
        error!(
            "No hardware backend configured. The vendor driver ships with the\n  \
             platform integration; use --mock to run with the simulated backend."
        );
        std::process::exit(1);
    }

    let hardware = MockHardware::new(args.fans);
    info!("Simulated backend: {} fan(s)", hardware.fan_count());

    let sensors: Arc<dyn SensorPort> = hardware.clone();
    let actuator: Arc<dyn ActuatorPort> = hardware;
    let fan_count = actuator.fan_count();

    let settings = Settings::load_or_default(&settings_path, fan_count);
    let supervisor = ControlSupervisor::new(sensors, actuator);

    supervisor.apply(&settings).await?;
    info!(
        "Settings applied: {} fan(s), sync={}",
        fan_count, settings.fan_sync
    );
    for status in supervisor.current_status().await {
        info!(
            "  Fan {}: mode={:?}, duty={:?}",
            status.fan_id, status.mode, status.last_commanded_duty
        );
    }

    shutdown::shutdown_signal().await;

    info!("Stopping control loops and parking fans at duty 0");
    if let Err(e) = supervisor.shutdown().await {
        warn!("Failed to park fans during shutdown: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
