//! The fan control engine
//!
//! Control groups are derived from the settings document; curve-mode groups
//! run periodic loops, and the supervisor owns their whole lifecycle.

mod group;
mod supervisor;

pub use supervisor::ControlSupervisor;
