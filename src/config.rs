//! Monitor configuration

use std::time::Duration;

/// Tunables for the monitoring core
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Max samples retained per metric series (FIFO beyond this)
    pub metric_capacity: usize,
    /// Evaluator tick period
    pub eval_interval: Duration,
    /// Per-channel notification send timeout
    pub notify_timeout: Duration,
    /// Default age cutoff for `cleanup_old_metrics`
    pub metric_retention_days: i64,
    /// Default age cutoff for `cleanup_resolved_alerts`
    pub alert_retention_days: i64,
    /// Event bus buffer size
    pub event_capacity: usize,
    /// Parity mode with the legacy evaluator: create a fresh alert on every
    /// breached tick, with no dedup and no resolution transition.
    pub compat_always_create: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            metric_capacity: 1000,
            eval_interval: Duration::from_secs(30),
            notify_timeout: Duration::from_secs(5),
            metric_retention_days: 7,
            alert_retention_days: 30,
            event_capacity: 256,
            compat_always_create: false,
        }
    }
}
