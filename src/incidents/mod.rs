//! Incident lifecycle management
//!
//! Incidents are operator-driven: they reference alerts and services but are
//! never created or transitioned automatically. Status changes are checked
//! against the lifecycle graph unless the operator forces them.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use crate::events::{Event, EventBus};
use crate::model::{fresh_id, Incident, IncidentStatus, Severity};

/// Errors from incident mutations
#[derive(Debug, thiserror::Error)]
pub enum IncidentError {
    #[error("incident '{0}' not found")]
    NotFound(String),

    #[error("invalid incident transition: {from} -> {to}")]
    InvalidTransition {
        from: IncidentStatus,
        to: IncidentStatus,
    },
}

/// Incident fields as submitted at creation; id, status, and timestamps are
/// assigned by the manager.
#[derive(Debug, Clone)]
pub struct IncidentDraft {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub services: Vec<String>,
    pub alerts: Vec<String>,
    pub assigned_to: Option<String>,
    pub tenant_id: Option<String>,
}

impl IncidentDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
            services: Vec::new(),
            alerts: Vec::new(),
            assigned_to: None,
            tenant_id: None,
        }
    }

    pub fn with_service(mut self, service_id: impl Into<String>) -> Self {
        self.services.push(service_id.into());
        self
    }

    pub fn with_alert(mut self, alert_id: impl Into<String>) -> Self {
        self.alerts.push(alert_id.into());
        self
    }

    pub fn with_assignee(mut self, operator: impl Into<String>) -> Self {
        self.assigned_to = Some(operator.into());
        self
    }
}

/// Partial incident update. A status change is validated against the
/// lifecycle graph unless `force` is set.
#[derive(Debug, Clone, Default)]
pub struct IncidentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<IncidentStatus>,
    pub services: Option<Vec<String>>,
    pub alerts: Option<Vec<String>>,
    pub assigned_to: Option<String>,
    pub root_cause: Option<String>,
    pub resolution: Option<String>,
    pub force: bool,
}

/// Store and state machine for operator incidents
pub struct IncidentManager {
    incidents: RwLock<HashMap<String, Incident>>,
    bus: Arc<EventBus>,
}

impl IncidentManager {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            incidents: RwLock::new(HashMap::new()),
            bus,
        }
    }

    /// Open a new incident.
    pub fn create(&self, draft: IncidentDraft) -> Incident {
        let now = Utc::now();
        let incident = Incident {
            id: fresh_id("incident"),
            title: draft.title,
            description: draft.description,
            severity: draft.severity,
            status: IncidentStatus::Open,
            services: draft.services,
            alerts: draft.alerts,
            assigned_to: draft.assigned_to,
            created_at: now,
            updated_at: now,
            resolved_at: None,
            root_cause: None,
            resolution: None,
            tenant_id: draft.tenant_id,
        };

        self.incidents
            .write()
            .insert(incident.id.clone(), incident.clone());
        self.bus.publish(Event::IncidentCreated(incident.clone()));
        incident
    }

    /// Apply a partial update. Repeating the current status is a no-op, not
    /// a violation; any other off-graph transition needs `patch.force`.
    pub fn update(&self, id: &str, patch: IncidentPatch) -> Result<Incident, IncidentError> {
        let updated = {
            let mut incidents = self.incidents.write();
            let incident = incidents
                .get_mut(id)
                .ok_or_else(|| IncidentError::NotFound(id.to_string()))?;

            if let Some(target) = patch.status {
                if target != incident.status
                    && !patch.force
                    && !incident.status.can_transition_to(target)
                {
                    return Err(IncidentError::InvalidTransition {
                        from: incident.status,
                        to: target,
                    });
                }
                if target == IncidentStatus::Resolved && incident.resolved_at.is_none() {
                    incident.resolved_at = Some(Utc::now());
                }
                incident.status = target;
            }

            if let Some(title) = patch.title {
                incident.title = title;
            }
            if let Some(description) = patch.description {
                incident.description = description;
            }
            if let Some(severity) = patch.severity {
                incident.severity = severity;
            }
            if let Some(services) = patch.services {
                incident.services = services;
            }
            if let Some(alerts) = patch.alerts {
                incident.alerts = alerts;
            }
            if let Some(assigned_to) = patch.assigned_to {
                incident.assigned_to = Some(assigned_to);
            }
            if let Some(root_cause) = patch.root_cause {
                incident.root_cause = Some(root_cause);
            }
            if let Some(resolution) = patch.resolution {
                incident.resolution = Some(resolution);
            }

            incident.updated_at = Utc::now();
            incident.clone()
        };

        self.bus.publish(Event::IncidentUpdated(updated.clone()));
        Ok(updated)
    }

    /// Convenience wrapper: transition to resolved with a resolution note.
    pub fn resolve(
        &self,
        id: &str,
        resolution: impl Into<String>,
        root_cause: Option<String>,
    ) -> Result<Incident, IncidentError> {
        self.update(
            id,
            IncidentPatch {
                status: Some(IncidentStatus::Resolved),
                resolution: Some(resolution.into()),
                root_cause,
                ..Default::default()
            },
        )
    }

    pub fn get(&self, id: &str) -> Option<Incident> {
        self.incidents.read().get(id).cloned()
    }

    /// All incidents, optionally filtered by status, newest first.
    pub fn list(&self, status: Option<IncidentStatus>) -> Vec<Incident> {
        let incidents = self.incidents.read();
        let mut result: Vec<Incident> = incidents
            .values()
            .filter(|i| status.map_or(true, |s| i.status == s))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }

    pub fn clear(&self) {
        self.incidents.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> IncidentManager {
        IncidentManager::new(Arc::new(EventBus::default()))
    }

    fn draft() -> IncidentDraft {
        IncidentDraft::new("api outage", "elevated error rates", Severity::Critical)
            .with_service("api")
            .with_alert("alert-1")
    }

    #[test]
    fn test_create_opens_incident() {
        let manager = manager();
        let incident = manager.create(draft());

        assert!(incident.id.starts_with("incident-"));
        assert_eq!(incident.status, IncidentStatus::Open);
        assert_eq!(incident.created_at, incident.updated_at);
        assert_eq!(manager.list(None).len(), 1);
    }

    #[test]
    fn test_resolve_sets_fields() {
        let manager = manager();
        let incident = manager.create(draft());

        let resolved = manager
            .resolve(&incident.id, "fixed", Some("root cause X".to_string()))
            .unwrap();

        assert_eq!(resolved.status, IncidentStatus::Resolved);
        assert!(resolved.resolved_at.is_some());
        assert_eq!(resolved.resolution.as_deref(), Some("fixed"));
        assert_eq!(resolved.root_cause.as_deref(), Some("root cause X"));
        assert!(resolved.updated_at > resolved.created_at);
    }

    #[test]
    fn test_open_to_closed_requires_force() {
        let manager = manager();
        let incident = manager.create(draft());

        let result = manager.update(
            &incident.id,
            IncidentPatch {
                status: Some(IncidentStatus::Closed),
                ..Default::default()
            },
        );
        assert!(matches!(
            result,
            Err(IncidentError::InvalidTransition {
                from: IncidentStatus::Open,
                to: IncidentStatus::Closed,
            })
        ));

        let forced = manager
            .update(
                &incident.id,
                IncidentPatch {
                    status: Some(IncidentStatus::Closed),
                    force: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(forced.status, IncidentStatus::Closed);
    }

    #[test]
    fn test_full_lifecycle_succeeds() {
        let manager = manager();
        let incident = manager.create(draft());

        for status in [
            IncidentStatus::Investigating,
            IncidentStatus::Resolved,
            IncidentStatus::Closed,
        ] {
            manager
                .update(
                    &incident.id,
                    IncidentPatch {
                        status: Some(status),
                        ..Default::default()
                    },
                )
                .unwrap();
        }

        assert_eq!(
            manager.get(&incident.id).unwrap().status,
            IncidentStatus::Closed
        );
    }

    #[test]
    fn test_same_status_update_is_noop() {
        let manager = manager();
        let incident = manager.create(draft());

        let updated = manager
            .update(
                &incident.id,
                IncidentPatch {
                    status: Some(IncidentStatus::Open),
                    assigned_to: Some("sam".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.status, IncidentStatus::Open);
        assert_eq!(updated.assigned_to.as_deref(), Some("sam"));
    }

    #[test]
    fn test_update_unknown_incident() {
        let manager = manager();
        assert!(matches!(
            manager.update("incident-missing", IncidentPatch::default()),
            Err(IncidentError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_filters_by_status() {
        let manager = manager();
        let a = manager.create(draft());
        manager.create(draft());

        manager
            .update(
                &a.id,
                IncidentPatch {
                    status: Some(IncidentStatus::Investigating),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(manager.list(None).len(), 2);
        assert_eq!(manager.list(Some(IncidentStatus::Open)).len(), 1);
        assert_eq!(manager.list(Some(IncidentStatus::Investigating)).len(), 1);
    }

    #[tokio::test]
    async fn test_create_and_update_publish_events() {
        let bus = Arc::new(EventBus::default());
        let manager = IncidentManager::new(Arc::clone(&bus));
        let mut rx = bus.subscribe();

        let incident = manager.create(draft());
        manager
            .resolve(&incident.id, "fixed", None)
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().kind, "incident.created");
        assert_eq!(rx.recv().await.unwrap().kind, "incident.updated");
    }
}
