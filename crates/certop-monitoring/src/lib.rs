//! Certop Monitoring - lightweight system probe (uptime, last scheduled
//! check, certificate store size) and the liveness payload.

pub mod handler;
pub mod plugin;
pub mod service;

pub use handler::{configure_routes, liveness, LivenessResponse, MonitoringApiDoc, MonitoringState};
pub use plugin::MonitoringPlugin;
pub use service::{MonitoringProbe, MonitoringSnapshot};
