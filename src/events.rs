//! Outbound event bus
//!
//! Every state change publishes an [`EventEnvelope`] to a broadcast channel
//! the host application can subscribe to (dashboards, audit logs). Publishing
//! with no subscribers is not an error, and a lagging subscriber never blocks
//! a producer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::model::{Alert, AlertRule, Incident, Metric, ServiceHealth};

/// Domain event payloads
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Event {
    MetricRecorded(Metric),
    HealthUpdated(ServiceHealth),
    RuleCreated(AlertRule),
    RuleUpdated(AlertRule),
    RuleDeleted(AlertRule),
    AlertTriggered(Alert),
    AlertResolved(Alert),
    IncidentCreated(Incident),
    IncidentUpdated(Incident),
}

impl Event {
    /// Dotted event kind as consumed by the host's event bus.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::MetricRecorded(_) => "metric.recorded",
            Event::HealthUpdated(_) => "health.updated",
            Event::RuleCreated(_) => "alert.rule.created",
            Event::RuleUpdated(_) => "alert.rule.updated",
            Event::RuleDeleted(_) => "alert.rule.deleted",
            Event::AlertTriggered(_) => "alert.triggered",
            Event::AlertResolved(_) => "alert.resolved",
            Event::IncidentCreated(_) => "incident.created",
            Event::IncidentUpdated(_) => "incident.updated",
        }
    }
}

/// Event plus its publication timestamp (serializes as RFC 3339)
#[derive(Debug, Clone, Serialize)]
pub struct EventEnvelope {
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

/// Broadcast fan-out for domain events
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Silently dropped when nobody is subscribed.
    pub fn publish(&self, event: Event) {
        let envelope = EventEnvelope {
            kind: event.kind().to_string(),
            timestamp: Utc::now(),
            event,
        };
        let _ = self.tx.send(envelope);
    }

    /// Subscribe to all subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
