//! Monitor facade
//!
//! Wires the stores, evaluator, dispatcher, and incident manager over a
//! shared event bus and exposes the full inbound surface the host calls.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::sync::Mutex;

use crate::config::MonitorConfig;
use crate::events::{EventBus, EventEnvelope};
use crate::evaluator::{Evaluator, EvaluatorHandle};
use crate::incidents::{IncidentDraft, IncidentError, IncidentManager, IncidentPatch};
use crate::model::{
    Alert, AlertRule, AlertStatus, Incident, IncidentStatus, Metric, ServiceHealth,
};
use crate::notify::{Dispatcher, NotificationChannel};
use crate::retention;
use crate::rules::{AlertRuleRegistry, RuleError, RulePatch, RuleSpec};
use crate::store::{AlertStore, HealthDraft, HealthRegistry, MetricDraft, MetricStore};

/// The embedded operational-intelligence core.
///
/// Producers call the `record_*` methods concurrently; the evaluator runs as
/// a single recurring task started by [`start`](Self::start). All state is
/// in-memory and lost on [`shutdown`](Self::shutdown) or process exit.
pub struct Monitor {
    config: MonitorConfig,
    bus: Arc<EventBus>,
    metrics: Arc<MetricStore>,
    health: Arc<HealthRegistry>,
    rules: Arc<AlertRuleRegistry>,
    alerts: Arc<AlertStore>,
    incidents: Arc<IncidentManager>,
    dispatcher: Arc<Dispatcher>,
    evaluator: Arc<Evaluator>,
    eval_handle: Mutex<Option<EvaluatorHandle>>,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Self {
        let bus = Arc::new(EventBus::new(config.event_capacity));
        let metrics = Arc::new(MetricStore::new(config.metric_capacity, Arc::clone(&bus)));
        let health = Arc::new(HealthRegistry::new(Arc::clone(&metrics), Arc::clone(&bus)));
        let rules = Arc::new(AlertRuleRegistry::new(Arc::clone(&bus)));
        let alerts = Arc::new(AlertStore::new());
        let incidents = Arc::new(IncidentManager::new(Arc::clone(&bus)));
        let dispatcher = Arc::new(Dispatcher::new(config.notify_timeout));
        let evaluator = Arc::new(Evaluator::new(
            Arc::clone(&rules),
            Arc::clone(&metrics),
            Arc::clone(&alerts),
            Arc::clone(&dispatcher),
            Arc::clone(&bus),
            config.compat_always_create,
        ));

        Self {
            config,
            bus,
            metrics,
            health,
            rules,
            alerts,
            incidents,
            dispatcher,
            evaluator,
            eval_handle: Mutex::new(None),
        }
    }

    // ---- producers ----

    pub fn record_metric(&self, draft: MetricDraft) -> Metric {
        self.metrics.record(draft)
    }

    pub fn record_health(&self, draft: HealthDraft) -> ServiceHealth {
        self.health.record(draft)
    }

    // ---- rule CRUD ----

    pub fn create_rule(&self, spec: RuleSpec) -> Result<AlertRule, RuleError> {
        self.rules.create(spec)
    }

    pub fn update_rule(&self, id: &str, patch: RulePatch) -> Result<AlertRule, RuleError> {
        self.rules.update(id, patch)
    }

    pub fn delete_rule(&self, id: &str) -> Result<AlertRule, RuleError> {
        self.rules.delete(id)
    }

    // ---- incidents ----

    pub fn create_incident(&self, draft: IncidentDraft) -> Incident {
        self.incidents.create(draft)
    }

    pub fn update_incident(
        &self,
        id: &str,
        patch: IncidentPatch,
    ) -> Result<Incident, IncidentError> {
        self.incidents.update(id, patch)
    }

    pub fn resolve_incident(
        &self,
        id: &str,
        resolution: impl Into<String>,
        root_cause: Option<String>,
    ) -> Result<Incident, IncidentError> {
        self.incidents.resolve(id, resolution, root_cause)
    }

    // ---- notification channels ----

    pub fn register_channel(&self, id: impl Into<String>, channel: Arc<dyn NotificationChannel>) {
        self.dispatcher.register(id, channel);
    }

    pub fn unregister_channel(&self, id: &str) -> bool {
        self.dispatcher.unregister(id)
    }

    // ---- queries ----

    pub fn query_metrics(
        &self,
        service_id: &str,
        name: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Vec<Metric> {
        self.metrics.query(service_id, name, from, to)
    }

    pub fn service_health(&self, service_id: &str) -> Option<ServiceHealth> {
        self.health.get(service_id)
    }

    pub fn all_service_health(&self) -> Vec<ServiceHealth> {
        self.health.get_all()
    }

    pub fn alerts(&self, status: Option<AlertStatus>) -> Vec<Alert> {
        self.alerts.list(status)
    }

    pub fn incidents(&self, status: Option<IncidentStatus>) -> Vec<Incident> {
        self.incidents.list(status)
    }

    pub fn alert_rules(&self) -> Vec<AlertRule> {
        self.rules.list()
    }

    /// Subscribe to the outbound event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.bus.subscribe()
    }

    // ---- retention ----

    /// Prune metric samples older than the given (or configured) day count.
    pub fn cleanup_old_metrics(&self, older_than_days: Option<i64>) -> usize {
        let days = older_than_days.unwrap_or(self.config.metric_retention_days);
        retention::cleanup_old_metrics(&self.metrics, days)
    }

    /// Prune resolved alerts older than the given (or configured) day count.
    pub fn cleanup_resolved_alerts(&self, older_than_days: Option<i64>) -> usize {
        let days = older_than_days.unwrap_or(self.config.alert_retention_days);
        retention::cleanup_resolved_alerts(&self.alerts, days)
    }

    // ---- lifecycle ----

    /// Launch the recurring evaluator. Calling again while running is a
    /// no-op.
    pub async fn start(&self) {
        let mut handle = self.eval_handle.lock().await;
        if handle.is_some() {
            return;
        }
        *handle = Some(Arc::clone(&self.evaluator).start(self.config.eval_interval));
        tracing::info!(
            interval_secs = self.config.eval_interval.as_secs(),
            "Monitor started"
        );
    }

    /// Run a single evaluation pass without the timer.
    pub async fn evaluate_once(&self) {
        self.evaluator.evaluate_pass().await;
    }

    /// Stop the evaluator (no tick fires after this returns) and clear all
    /// in-memory state. Safe to call more than once.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.eval_handle.lock().await.take() {
            handle.stop().await;
        }
        self.metrics.clear();
        self.health.clear();
        self.rules.clear();
        self.alerts.clear();
        self.incidents.clear();
        tracing::info!("Monitor shut down");
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{metric_key, HealthStatus, RuleOperator, Severity};
    use crate::notify::{ChannelKind, Notification, NotifyError};
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use std::time::Duration;

    struct RecordingChannel {
        sent: SyncMutex<Vec<Notification>>,
    }

    impl RecordingChannel {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: SyncMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl NotificationChannel for RecordingChannel {
        fn kind(&self) -> ChannelKind {
            ChannelKind::Chat
        }

        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.sent.lock().push(notification.clone());
            Ok(())
        }
    }

    fn healthy_draft(service_id: &str, cpu: f64) -> HealthDraft {
        HealthDraft {
            service_id: service_id.to_string(),
            status: HealthStatus::Degraded,
            uptime_percent: 99.0,
            error_rate_percent: 1.0,
            response_time_ms: 200.0,
            cpu_percent: cpu,
            memory_percent: 50.0,
            tenant_id: None,
        }
    }

    #[tokio::test]
    async fn test_health_breach_raises_and_notifies() {
        let monitor = Monitor::default();
        let channel = RecordingChannel::new();
        monitor.register_channel("slack", Arc::clone(&channel) as Arc<dyn NotificationChannel>);

        monitor
            .create_rule(
                RuleSpec::new(
                    "cpu high",
                    metric_key("api", "cpu_percent"),
                    RuleOperator::Gt,
                    80.0,
                )
                .with_severity(Severity::Critical)
                .with_channel("slack"),
            )
            .unwrap();

        monitor.record_health(healthy_draft("api", 95.0));
        monitor.evaluate_once().await;

        let firing = monitor.alerts(Some(AlertStatus::Firing));
        assert_eq!(firing.len(), 1);
        assert_eq!(firing[0].metric, "api:cpu_percent");
        assert_eq!(channel.sent.lock().len(), 1);

        // Health recovers: the alert resolves on the next pass.
        for _ in 0..20 {
            monitor.record_health(healthy_draft("api", 10.0));
        }
        monitor.evaluate_once().await;
        assert!(monitor.alerts(Some(AlertStatus::Firing)).is_empty());
        assert_eq!(monitor.alerts(Some(AlertStatus::Resolved)).len(), 1);
    }

    #[tokio::test]
    async fn test_queries_cover_all_stores() {
        let monitor = Monitor::default();

        monitor.record_metric(MetricDraft::new("api", "latency_ms", 120.0));
        monitor.record_health(healthy_draft("api", 40.0));
        monitor
            .create_rule(RuleSpec::new(
                "latency",
                metric_key("api", "latency_ms"),
                RuleOperator::Gt,
                500.0,
            ))
            .unwrap();
        let incident = monitor.create_incident(IncidentDraft::new(
            "slow api",
            "p99 latency regression",
            Severity::Medium,
        ));

        assert_eq!(
            monitor.query_metrics("api", "latency_ms", None, None).len(),
            1
        );
        assert_eq!(
            monitor.service_health("api").unwrap().status,
            HealthStatus::Degraded
        );
        assert_eq!(monitor.all_service_health().len(), 1);
        assert_eq!(monitor.alert_rules().len(), 1);
        assert_eq!(
            monitor.incidents(Some(IncidentStatus::Open))[0].id,
            incident.id
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticking_and_clears_state() {
        let monitor = Monitor::default();
        monitor
            .create_rule(RuleSpec::new(
                "cpu high",
                metric_key("api", "cpu_percent"),
                RuleOperator::Gt,
                80.0,
            ))
            .unwrap();

        monitor.start().await;
        monitor.shutdown().await;

        // Rules were cleared, and the loop is gone: breach data plus a long
        // wait produces no alerts.
        assert!(monitor.alert_rules().is_empty());
        monitor.record_metric(MetricDraft::new("api", "cpu_percent", 99.0));
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(monitor.alerts(None).is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let monitor = Monitor::default();
        monitor.start().await;
        monitor.shutdown().await;
        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_start_twice_is_noop() {
        let monitor = Monitor::default();
        monitor.start().await;
        monitor.start().await;
        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_retention_defaults_from_config() {
        let monitor = Monitor::default();
        monitor.record_metric(MetricDraft::new("api", "latency_ms", 1.0));

        // Nothing is older than the 7-day default.
        assert_eq!(monitor.cleanup_old_metrics(None), 0);
        assert_eq!(monitor.cleanup_resolved_alerts(None), 0);
        assert_eq!(
            monitor.query_metrics("api", "latency_ms", None, None).len(),
            1
        );
    }
}
