//! Metric observations and the canonical series key

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical series key shared by every writer and the evaluator.
///
/// Rules reference a series by this exact key (`AlertRule::metric`); deriving
/// it anywhere else invites lookup mismatches, so all call sites go through
/// this function.
pub fn metric_key(service_id: &str, name: &str) -> String {
    format!("{}:{}", service_id, name)
}

/// A single timestamped numeric observation. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    /// Metric name, e.g. "response_time_ms"
    pub name: String,
    /// Observed value
    pub value: f64,
    /// Unit label, e.g. "ms", "percent"
    pub unit: String,
    /// Assigned by the store at record time
    pub timestamp: DateTime<Utc>,
    /// Free-form dimension tags
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Owning tenant, if the host is multi-tenant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Service the observation belongs to
    pub service_id: String,
}

impl Metric {
    /// The canonical key this metric is stored under.
    pub fn key(&self) -> String {
        metric_key(&self.service_id, &self.name)
    }
}
