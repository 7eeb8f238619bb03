//! Service health snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall health classification for a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        };
        f.write_str(s)
    }
}

/// Latest-value health snapshot for one service.
///
/// One record per service id; each write overwrites the previous snapshot
/// and fans out five derived metrics into the metric store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub service_id: String,
    pub status: HealthStatus,
    pub uptime_percent: f64,
    pub error_rate_percent: f64,
    pub response_time_ms: f64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    /// Set by the registry when the snapshot is recorded
    pub last_check: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

impl ServiceHealth {
    /// The five (name, value, unit) pairs fanned out as derived metrics.
    pub(crate) fn derived_metrics(&self) -> [(&'static str, f64, &'static str); 5] {
        [
            ("uptime_percent", self.uptime_percent, "percent"),
            ("error_rate_percent", self.error_rate_percent, "percent"),
            ("response_time_ms", self.response_time_ms, "ms"),
            ("cpu_percent", self.cpu_percent, "percent"),
            ("memory_percent", self.memory_percent, "percent"),
        ]
    }
}
