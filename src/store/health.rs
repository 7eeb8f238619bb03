//! Latest-value service health snapshots

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;

use crate::events::{Event, EventBus};
use crate::model::{HealthStatus, ServiceHealth};
use crate::store::{MetricDraft, MetricStore};

/// A health check result as submitted by a producer; `last_check` is
/// assigned by the registry.
#[derive(Debug, Clone)]
pub struct HealthDraft {
    pub service_id: String,
    pub status: HealthStatus,
    pub uptime_percent: f64,
    pub error_rate_percent: f64,
    pub response_time_ms: f64,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub tenant_id: Option<String>,
}

/// One snapshot per service, overwritten on every write. Each write also
/// fans five derived metrics into the metric store under the service's
/// canonical keys, so threshold rules can watch health dimensions directly.
pub struct HealthRegistry {
    snapshots: DashMap<String, ServiceHealth>,
    metrics: Arc<MetricStore>,
    bus: Arc<EventBus>,
}

impl HealthRegistry {
    pub fn new(metrics: Arc<MetricStore>, bus: Arc<EventBus>) -> Self {
        Self {
            snapshots: DashMap::new(),
            metrics,
            bus,
        }
    }

    /// Upsert the snapshot for `draft.service_id` and record the derived
    /// metrics, all stamped with the same check time.
    pub fn record(&self, draft: HealthDraft) -> ServiceHealth {
        let now = Utc::now();
        let health = ServiceHealth {
            service_id: draft.service_id,
            status: draft.status,
            uptime_percent: draft.uptime_percent,
            error_rate_percent: draft.error_rate_percent,
            response_time_ms: draft.response_time_ms,
            cpu_percent: draft.cpu_percent,
            memory_percent: draft.memory_percent,
            last_check: now,
            tenant_id: draft.tenant_id,
        };

        self.snapshots
            .insert(health.service_id.clone(), health.clone());

        for (name, value, unit) in health.derived_metrics() {
            let mut metric =
                MetricDraft::new(health.service_id.as_str(), name, value).with_unit(unit);
            metric.tenant_id = health.tenant_id.clone();
            self.metrics.record_at(metric, now);
        }

        self.bus.publish(Event::HealthUpdated(health.clone()));
        health
    }

    pub fn get(&self, service_id: &str) -> Option<ServiceHealth> {
        self.snapshots.get(service_id).map(|h| h.clone())
    }

    pub fn get_all(&self) -> Vec<ServiceHealth> {
        self.snapshots.iter().map(|e| e.value().clone()).collect()
    }

    pub fn clear(&self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (HealthRegistry, Arc<MetricStore>) {
        let bus = Arc::new(EventBus::default());
        let metrics = Arc::new(MetricStore::new(100, Arc::clone(&bus)));
        (HealthRegistry::new(Arc::clone(&metrics), bus), metrics)
    }

    fn draft(service_id: &str, status: HealthStatus) -> HealthDraft {
        HealthDraft {
            service_id: service_id.to_string(),
            status,
            uptime_percent: 99.5,
            error_rate_percent: 0.5,
            response_time_ms: 180.0,
            cpu_percent: 40.0,
            memory_percent: 65.0,
            tenant_id: None,
        }
    }

    #[test]
    fn test_record_upserts_latest_snapshot() {
        let (registry, _) = registry();

        registry.record(draft("api", HealthStatus::Healthy));
        registry.record(draft("api", HealthStatus::Degraded));

        let snapshot = registry.get("api").unwrap();
        assert_eq!(snapshot.status, HealthStatus::Degraded);
        assert_eq!(registry.get_all().len(), 1);
    }

    #[test]
    fn test_record_fans_out_five_metrics() {
        let (registry, metrics) = registry();

        registry.record(draft("api", HealthStatus::Healthy));

        for name in [
            "uptime_percent",
            "error_rate_percent",
            "response_time_ms",
            "cpu_percent",
            "memory_percent",
        ] {
            assert_eq!(
                metrics.query("api", name, None, None).len(),
                1,
                "missing derived metric {}",
                name
            );
        }
        let cpu = &metrics.query("api", "cpu_percent", None, None)[0];
        assert_eq!(cpu.value, 40.0);
        assert_eq!(cpu.unit, "percent");
    }

    #[tokio::test]
    async fn test_record_publishes_health_updated() {
        let bus = Arc::new(EventBus::default());
        let metrics = Arc::new(MetricStore::new(100, Arc::clone(&bus)));
        let registry = HealthRegistry::new(metrics, Arc::clone(&bus));
        let mut rx = bus.subscribe();

        registry.record(draft("api", HealthStatus::Unhealthy));

        // Five metric.recorded events precede the health.updated event.
        let mut kinds = Vec::new();
        for _ in 0..6 {
            kinds.push(rx.recv().await.unwrap().kind);
        }
        assert_eq!(kinds.iter().filter(|k| *k == "metric.recorded").count(), 5);
        assert_eq!(kinds.last().unwrap(), "health.updated");
    }

    #[test]
    fn test_get_unknown_service() {
        let (registry, _) = registry();
        assert!(registry.get("ghost").is_none());
    }
}
