// core/src/utils/mod.rs
pub mod error;
pub mod logging;
pub mod models;

// Polling defaults shared between the library and the daemon
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_ALERT_THRESHOLD_MB: u64 = 5000;
