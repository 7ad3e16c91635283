//! Certop Logs - access to the log files written by the provisioning tool
//! and its cron jobs: tail for the UI, truncate to clear.

pub mod handler;
pub mod plugin;
pub mod service;

pub use handler::{configure_routes, LogsApiDoc, LogsState};
pub use plugin::LogsPlugin;
pub use service::{LogKind, LogStore};
