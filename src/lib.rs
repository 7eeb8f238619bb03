//! Opswatch: embedded operational-intelligence core
//!
//! An in-process monitoring library: producers feed metrics and service
//! health snapshots in, a recurring evaluator checks threshold rules against
//! rolling time windows, alerts fire and resolve with strict per-rule
//! deduplication, and operators track incidents through a validated
//! lifecycle. Notifications go out through injected channel transports.
//!
//! # Features
//!
//! - **Bounded metric series**: per-key FIFO retention of the most recent
//!   K samples
//! - **Service health registry**: latest-value snapshots that fan out into
//!   derived metrics
//! - **Windowed threshold rules**: mean-over-trailing-window comparison with
//!   gt/lt/eq/gte/lte operators
//! - **Alert dedup & resolution**: at most one firing alert per rule, with
//!   an explicit resolved transition
//! - **Pluggable notifications**: chat/email/webhook payloads delivered via
//!   injected transports with per-channel timeouts
//! - **Incident lifecycle**: open → investigating → resolved → closed, with
//!   forced overrides for operators
//! - **Event stream**: every state change published with an RFC 3339
//!   timestamp
//!
//! # Example
//!
//! ```no_run
//! use opswatch::config::MonitorConfig;
//! use opswatch::model::{metric_key, RuleOperator, Severity};
//! use opswatch::monitor::Monitor;
//! use opswatch::rules::RuleSpec;
//! use opswatch::store::MetricDraft;
//!
//! # async fn demo() {
//! let monitor = Monitor::new(MonitorConfig::default());
//!
//! monitor.create_rule(
//!     RuleSpec::new("cpu high", metric_key("api", "cpu_percent"), RuleOperator::Gt, 80.0)
//!         .with_duration_seconds(300)
//!         .with_severity(Severity::High)
//!         .with_channel("oncall-chat"),
//! ).unwrap();
//!
//! monitor.record_metric(MetricDraft::new("api", "cpu_percent", 92.0).with_unit("percent"));
//! monitor.start().await;
//! # }
//! ```

pub mod config;
pub mod evaluator;
pub mod events;
pub mod incidents;
pub mod model;
pub mod monitor;
pub mod notify;
pub mod retention;
pub mod rules;
pub mod store;

// Re-export commonly used types
pub use config::MonitorConfig;
pub use incidents::{IncidentDraft, IncidentError, IncidentPatch};
pub use model::{
    Alert, AlertRule, AlertStatus, HealthStatus, Incident, IncidentStatus, Metric, RuleOperator,
    Severity,
};
pub use monitor::Monitor;
pub use notify::{ChannelKind, Notification, NotificationChannel, NotifyError};
pub use rules::{RuleError, RulePatch, RuleSpec};
pub use store::{HealthDraft, MetricDraft};
