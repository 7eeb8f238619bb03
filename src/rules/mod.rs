//! Alert rule registry
//!
//! Validated CRUD over threshold-rule configuration. Rule content is owned
//! by the host domain; this registry only enforces structural validity and
//! id integrity.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::events::{Event, EventBus};
use crate::model::{fresh_id, AlertRule, RuleOperator, Severity};

/// Errors from rule mutations
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    #[error("rule '{0}' not found")]
    NotFound(String),
}

/// Rule fields as submitted by the host; the registry generates the id.
#[derive(Debug, Clone)]
pub struct RuleSpec {
    pub name: String,
    /// Canonical series key, `service_id:metric_name`
    pub metric: String,
    pub threshold: f64,
    pub operator: RuleOperator,
    pub duration_seconds: i64,
    pub severity: Severity,
    pub enabled: bool,
    pub channels: Vec<String>,
    pub tenant_id: Option<String>,
}

impl RuleSpec {
    pub fn new(
        name: impl Into<String>,
        metric: impl Into<String>,
        operator: RuleOperator,
        threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            metric: metric.into(),
            threshold,
            operator,
            duration_seconds: 300,
            severity: Severity::Medium,
            enabled: true,
            channels: Vec::new(),
            tenant_id: None,
        }
    }

    pub fn with_duration_seconds(mut self, duration_seconds: i64) -> Self {
        self.duration_seconds = duration_seconds;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channels.push(channel.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Partial rule update; unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct RulePatch {
    pub name: Option<String>,
    pub metric: Option<String>,
    pub threshold: Option<f64>,
    pub operator: Option<RuleOperator>,
    pub duration_seconds: Option<i64>,
    pub severity: Option<Severity>,
    pub enabled: Option<bool>,
    pub channels: Option<Vec<String>>,
}

/// Registry of threshold rules
pub struct AlertRuleRegistry {
    rules: RwLock<HashMap<String, AlertRule>>,
    bus: Arc<EventBus>,
}

impl AlertRuleRegistry {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Validate and store a new rule; returns the stored rule with its
    /// generated id.
    pub fn create(&self, spec: RuleSpec) -> Result<AlertRule, RuleError> {
        validate_duration(spec.duration_seconds)?;

        let rule = AlertRule {
            id: fresh_id("rule"),
            name: spec.name,
            metric: spec.metric,
            threshold: spec.threshold,
            operator: spec.operator,
            duration_seconds: spec.duration_seconds,
            severity: spec.severity,
            enabled: spec.enabled,
            channels: spec.channels,
            tenant_id: spec.tenant_id,
        };

        self.rules.write().insert(rule.id.clone(), rule.clone());
        self.bus.publish(Event::RuleCreated(rule.clone()));
        Ok(rule)
    }

    /// Merge a partial update into an existing rule.
    pub fn update(&self, id: &str, patch: RulePatch) -> Result<AlertRule, RuleError> {
        if let Some(duration) = patch.duration_seconds {
            validate_duration(duration)?;
        }

        let updated = {
            let mut rules = self.rules.write();
            let rule = rules
                .get_mut(id)
                .ok_or_else(|| RuleError::NotFound(id.to_string()))?;

            if let Some(name) = patch.name {
                rule.name = name;
            }
            if let Some(metric) = patch.metric {
                rule.metric = metric;
            }
            if let Some(threshold) = patch.threshold {
                rule.threshold = threshold;
            }
            if let Some(operator) = patch.operator {
                rule.operator = operator;
            }
            if let Some(duration) = patch.duration_seconds {
                rule.duration_seconds = duration;
            }
            if let Some(severity) = patch.severity {
                rule.severity = severity;
            }
            if let Some(enabled) = patch.enabled {
                rule.enabled = enabled;
            }
            if let Some(channels) = patch.channels {
                rule.channels = channels;
            }
            rule.clone()
        };

        self.bus.publish(Event::RuleUpdated(updated.clone()));
        Ok(updated)
    }

    /// Remove a rule, returning it.
    pub fn delete(&self, id: &str) -> Result<AlertRule, RuleError> {
        let removed = self
            .rules
            .write()
            .remove(id)
            .ok_or_else(|| RuleError::NotFound(id.to_string()))?;
        self.bus.publish(Event::RuleDeleted(removed.clone()));
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<AlertRule> {
        self.rules.read().get(id).cloned()
    }

    /// Cloned snapshot of all rules.
    pub fn list(&self) -> Vec<AlertRule> {
        self.rules.read().values().cloned().collect()
    }

    pub fn clear(&self) {
        self.rules.write().clear();
    }
}

fn validate_duration(duration_seconds: i64) -> Result<(), RuleError> {
    if duration_seconds < 0 {
        return Err(RuleError::InvalidRule(format!(
            "duration_seconds must be >= 0, got {}",
            duration_seconds
        )));
    }
    Ok(())
}
