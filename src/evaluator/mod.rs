//! Recurring windowed threshold evaluation
//!
//! On each tick, every enabled rule is checked against the mean of its
//! metric series over the rule's trailing window. A breach with no live
//! alert raises one and notifies; a sustained breach keeps the existing
//! alert; a cleared condition resolves it. An empty window does neither —
//! absence of data never triggers or clears an alert.
//!
//! Ticks never overlap: the loop awaits each pass before selecting again,
//! and the interval is set to skip (not queue) ticks that land during a
//! long pass.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::events::{Event, EventBus};
use crate::model::{fresh_id, Alert, AlertRule, AlertStatus};
use crate::notify::Dispatcher;
use crate::rules::AlertRuleRegistry;
use crate::store::{AlertStore, MetricStore};

/// What a single rule evaluation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// No samples in the window; rule skipped
    NoData,
    /// Condition did not hold and nothing was firing
    Pass,
    /// Condition held; new alert created and dispatched
    Triggered,
    /// Condition held but the rule already had a firing alert
    StillFiring,
    /// Condition stopped holding; the firing alert was resolved
    Resolved,
}

/// Per-rule evaluation errors. Caught and logged by the pass; one rule's
/// failure never stops the remaining rules.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("non-finite sample data in window for '{0}'")]
    BadSamples(String),
}

/// Windowed threshold evaluator
pub struct Evaluator {
    rules: Arc<AlertRuleRegistry>,
    metrics: Arc<MetricStore>,
    alerts: Arc<AlertStore>,
    dispatcher: Arc<Dispatcher>,
    bus: Arc<EventBus>,
    /// Legacy parity: create a fresh alert on every breached tick
    compat_always_create: bool,
}

impl Evaluator {
    pub fn new(
        rules: Arc<AlertRuleRegistry>,
        metrics: Arc<MetricStore>,
        alerts: Arc<AlertStore>,
        dispatcher: Arc<Dispatcher>,
        bus: Arc<EventBus>,
        compat_always_create: bool,
    ) -> Self {
        Self {
            rules,
            metrics,
            alerts,
            dispatcher,
            bus,
            compat_always_create,
        }
    }

    /// Spawn the recurring tick loop. Returns a handle whose `stop` halts
    /// the loop deterministically (no tick fires after it returns).
    pub fn start(self: Arc<Self>, period: Duration) -> EvaluatorHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let evaluator = self;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        evaluator.evaluate_pass().await;
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Alert evaluator shutting down");
                        break;
                    }
                }
            }
        });

        EvaluatorHandle { shutdown_tx, task }
    }

    /// Run one full evaluation pass over all enabled rules. Public so hosts
    /// and tests can drive evaluation without the timer.
    pub async fn evaluate_pass(&self) {
        for rule in self.rules.list() {
            if !rule.enabled {
                continue;
            }
            match self.evaluate_rule(&rule).await {
                Ok(outcome) => {
                    tracing::trace!(rule_id = %rule.id, ?outcome, "Rule evaluated");
                }
                Err(e) => {
                    tracing::error!(rule_id = %rule.id, error = %e, "Rule evaluation failed");
                }
            }
        }
    }

    /// Evaluate one rule against its trailing window.
    pub async fn evaluate_rule(&self, rule: &AlertRule) -> Result<RuleOutcome, EvalError> {
        let now = Utc::now();
        let since = now - chrono::Duration::seconds(rule.duration_seconds);
        let samples = self.metrics.query_key(&rule.metric, Some(since), None);

        if samples.is_empty() {
            return Ok(RuleOutcome::NoData);
        }

        let mean = samples.iter().map(|m| m.value).sum::<f64>() / samples.len() as f64;
        if !mean.is_finite() {
            return Err(EvalError::BadSamples(rule.metric.clone()));
        }

        let breached = rule.operator.compare(mean, rule.threshold);

        if breached {
            if self.compat_always_create {
                let alert = self.build_alert(rule, mean, &samples);
                self.alerts.insert_unchecked(alert.clone());
                self.bus.publish(Event::AlertTriggered(alert.clone()));
                self.dispatcher.dispatch(&alert, rule).await;
                return Ok(RuleOutcome::Triggered);
            }

            if self.alerts.firing_for_rule(&rule.id).is_some() {
                return Ok(RuleOutcome::StillFiring);
            }

            let alert = self.build_alert(rule, mean, &samples);
            if !self.alerts.insert_firing(alert.clone()) {
                // Lost a race with another pass; the invariant held.
                return Ok(RuleOutcome::StillFiring);
            }

            tracing::warn!(
                rule_id = %rule.id,
                alert_id = %alert.id,
                mean,
                threshold = rule.threshold,
                "Alert triggered"
            );
            self.bus.publish(Event::AlertTriggered(alert.clone()));
            self.dispatcher.dispatch(&alert, rule).await;
            return Ok(RuleOutcome::Triggered);
        }

        if self.compat_always_create {
            // Legacy parity has no resolution transition; cleared conditions
            // leave stacked alerts untouched.
            return Ok(RuleOutcome::Pass);
        }

        if let Some(resolved) = self.alerts.resolve_firing(&rule.id, now) {
            tracing::info!(
                rule_id = %rule.id,
                alert_id = %resolved.id,
                "Alert resolved"
            );
            self.bus.publish(Event::AlertResolved(resolved));
            return Ok(RuleOutcome::Resolved);
        }

        Ok(RuleOutcome::Pass)
    }

    fn build_alert(&self, rule: &AlertRule, mean: f64, samples: &[crate::model::Metric]) -> Alert {
        Alert {
            id: fresh_id("alert"),
            rule_id: rule.id.clone(),
            metric: rule.metric.clone(),
            value: mean,
            threshold: rule.threshold,
            severity: rule.severity,
            status: AlertStatus::Firing,
            triggered_at: Utc::now(),
            resolved_at: None,
            tenant_id: rule.tenant_id.clone(),
            service_id: samples[0].service_id.clone(),
            message: format!(
                "{}: mean {:.2} {} threshold {} over {}s",
                rule.metric,
                mean,
                rule.operator.symbol(),
                rule.threshold,
                rule.duration_seconds
            ),
        }
    }
}

/// Running evaluator loop
pub struct EvaluatorHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl EvaluatorHandle {
    /// Signal shutdown and wait for the loop to exit.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}
