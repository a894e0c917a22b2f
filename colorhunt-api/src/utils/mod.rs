//! Utility modules for colorhunt-api

pub mod db_retry;
pub mod pool_monitor;

pub use db_retry::retry_on_conflict;
pub use pool_monitor::{begin_monitored, MonitoredTransaction};
