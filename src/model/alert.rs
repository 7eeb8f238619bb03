//! Alert rules and alert instances

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comparison operator applied to the window mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOperator {
    Gt,
    Lt,
    Eq,
    Gte,
    Lte,
}

impl RuleOperator {
    /// Evaluate `value <op> threshold`.
    pub fn compare(&self, value: f64, threshold: f64) -> bool {
        match self {
            RuleOperator::Gt => value > threshold,
            RuleOperator::Lt => value < threshold,
            RuleOperator::Eq => value == threshold,
            RuleOperator::Gte => value >= threshold,
            RuleOperator::Lte => value <= threshold,
        }
    }

    /// Symbol for log/notification messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            RuleOperator::Gt => ">",
            RuleOperator::Lt => "<",
            RuleOperator::Eq => "==",
            RuleOperator::Gte => ">=",
            RuleOperator::Lte => "<=",
        }
    }
}

impl std::str::FromStr for RuleOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gt" => Ok(RuleOperator::Gt),
            "lt" => Ok(RuleOperator::Lt),
            "eq" => Ok(RuleOperator::Eq),
            "gte" => Ok(RuleOperator::Gte),
            "lte" => Ok(RuleOperator::Lte),
            other => Err(format!("unknown operator '{}'", other)),
        }
    }
}

/// Alert/incident severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Chat-channel accent color for this severity.
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Low => "#36a64f",
            Severity::Medium => "#ff9800",
            Severity::High => "#ff5722",
            Severity::Critical => "#f44336",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// Threshold rule evaluated against a rolling window of one metric series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    /// Generated at create time; immutable thereafter
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Canonical series key, `service_id:metric_name` (see [`metric_key`])
    ///
    /// [`metric_key`]: crate::model::metric_key
    pub metric: String,
    pub threshold: f64,
    pub operator: RuleOperator,
    /// Trailing window length; samples older than this are ignored
    pub duration_seconds: i64,
    pub severity: Severity,
    pub enabled: bool,
    /// Channel ids the dispatcher fans breaches out to
    pub channels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// Whether an alert is live or has cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Firing,
    Resolved,
}

/// A concrete breach of a rule's windowed condition.
///
/// At most one firing alert exists per rule id at any instant; a sustained
/// breach keeps the same alert, and a cleared condition resolves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub rule_id: String,
    /// Canonical series key the rule watched
    pub metric: String,
    /// Window mean at trigger time
    pub value: f64,
    pub threshold: f64,
    pub severity: Severity,
    pub status: AlertStatus,
    pub triggered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub service_id: String,
    pub message: String,
}
