//! Alert instances and the one-firing-per-rule discipline

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::model::{Alert, AlertStatus};

/// Store of firing and resolved alerts.
///
/// The compound operations the evaluator relies on (look up the firing alert
/// for a rule, then create or resolve) each hold the write lock for their
/// whole duration, which is what makes the at-most-one-firing-per-rule
/// invariant hold under concurrent callers.
pub struct AlertStore {
    alerts: RwLock<HashMap<String, Alert>>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self {
            alerts: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a new alert. Returns false (and stores nothing) if a firing
    /// alert already exists for the same rule, so a sustained breach cannot
    /// stack duplicates even across racing callers.
    pub fn insert_firing(&self, alert: Alert) -> bool {
        let mut alerts = self.alerts.write();
        let already_firing = alerts
            .values()
            .any(|a| a.rule_id == alert.rule_id && a.status == AlertStatus::Firing);
        if already_firing {
            return false;
        }
        alerts.insert(alert.id.clone(), alert);
        true
    }

    /// Insert unconditionally. Legacy compat path only; performs no dedup.
    pub fn insert_unchecked(&self, alert: Alert) {
        self.alerts.write().insert(alert.id.clone(), alert);
    }

    /// The currently firing alert for a rule, if any.
    pub fn firing_for_rule(&self, rule_id: &str) -> Option<Alert> {
        self.alerts
            .read()
            .values()
            .find(|a| a.rule_id == rule_id && a.status == AlertStatus::Firing)
            .cloned()
    }

    /// Transition the firing alert for `rule_id` to resolved. Returns the
    /// updated alert, or None when nothing was firing.
    pub fn resolve_firing(&self, rule_id: &str, resolved_at: DateTime<Utc>) -> Option<Alert> {
        let mut alerts = self.alerts.write();
        let firing = alerts
            .values_mut()
            .find(|a| a.rule_id == rule_id && a.status == AlertStatus::Firing)?;
        firing.status = AlertStatus::Resolved;
        firing.resolved_at = Some(resolved_at);
        Some(firing.clone())
    }

    pub fn get(&self, id: &str) -> Option<Alert> {
        self.alerts.read().get(id).cloned()
    }

    /// All alerts, optionally filtered by status, newest first.
    pub fn list(&self, status: Option<AlertStatus>) -> Vec<Alert> {
        let alerts = self.alerts.read();
        let mut result: Vec<Alert> = alerts
            .values()
            .filter(|a| status.map_or(true, |s| a.status == s))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.triggered_at.cmp(&a.triggered_at));
        result
    }

    /// Remove resolved alerts whose `resolved_at` is older than `cutoff`.
    pub fn cleanup_resolved(&self, cutoff: DateTime<Utc>) -> usize {
        let mut alerts = self.alerts.write();
        let before = alerts.len();
        alerts.retain(|_, a| {
            !(a.status == AlertStatus::Resolved
                && a.resolved_at.map_or(false, |t| t < cutoff))
        });
        before - alerts.len()
    }

    pub fn len(&self) -> usize {
        self.alerts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.read().is_empty()
    }

    pub fn clear(&self) {
        self.alerts.write().clear();
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}
