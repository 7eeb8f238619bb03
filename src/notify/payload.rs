//! Channel payload builders

use crate::model::{Alert, AlertRule};

use super::ChannelKind;

/// Channel-shaped notification content
#[derive(Debug, Clone)]
pub enum NotificationPayload {
    Chat(ChatMessage),
    Email(EmailMessage),
    Webhook(serde_json::Value),
}

/// Structured chat message with a severity accent color
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub title: String,
    pub text: String,
    /// Hex color derived from severity
    pub color: String,
}

/// Plain-text email
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// `[SEVERITY] rule name`
    pub subject: String,
    pub body: String,
}

/// Build the payload shape a channel kind expects.
pub(super) fn build(kind: ChannelKind, alert: &Alert, rule: &AlertRule) -> NotificationPayload {
    match kind {
        ChannelKind::Chat => NotificationPayload::Chat(ChatMessage {
            title: rule.name.clone(),
            text: format!(
                "{} (metric {}, value {:.2}, threshold {})",
                alert.message, alert.metric, alert.value, alert.threshold
            ),
            color: alert.severity.color().to_string(),
        }),
        ChannelKind::Email => NotificationPayload::Email(EmailMessage {
            subject: format!(
                "[{}] {}",
                alert.severity.to_string().to_uppercase(),
                rule.name
            ),
            body: format!(
                "Alert: {}\nMetric: {}\nValue: {:.2}\nThreshold: {} {}\nTriggered at: {}\n",
                alert.message,
                alert.metric,
                alert.value,
                rule.operator.symbol(),
                alert.threshold,
                alert.triggered_at.to_rfc3339(),
            ),
        }),
        ChannelKind::Webhook => NotificationPayload::Webhook(serde_json::json!({
            "alert": alert,
            "rule": rule,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertStatus, RuleOperator, Severity};
    use chrono::Utc;

    fn fixtures(severity: Severity) -> (Alert, AlertRule) {
        let alert = Alert {
            id: "alert-1".to_string(),
            rule_id: "rule-1".to_string(),
            metric: "api:error_rate_percent".to_string(),
            value: 7.25,
            threshold: 5.0,
            severity,
            status: AlertStatus::Firing,
            triggered_at: Utc::now(),
            resolved_at: None,
            tenant_id: None,
            service_id: "api".to_string(),
            message: "error rate over threshold".to_string(),
        };
        let rule = AlertRule {
            id: "rule-1".to_string(),
            name: "error rate".to_string(),
            metric: "api:error_rate_percent".to_string(),
            threshold: 5.0,
            operator: RuleOperator::Gt,
            duration_seconds: 120,
            severity,
            enabled: true,
            channels: vec!["slack".to_string()],
            tenant_id: None,
        };
        (alert, rule)
    }

    #[test]
    fn test_chat_color_mapping() {
        for (severity, color) in [
            (Severity::Low, "#36a64f"),
            (Severity::Medium, "#ff9800"),
            (Severity::High, "#ff5722"),
            (Severity::Critical, "#f44336"),
        ] {
            let (alert, rule) = fixtures(severity);
            match build(ChannelKind::Chat, &alert, &rule) {
                NotificationPayload::Chat(msg) => assert_eq!(msg.color, color),
                other => panic!("expected chat payload, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_email_subject_and_body() {
        let (alert, rule) = fixtures(Severity::Critical);
        match build(ChannelKind::Email, &alert, &rule) {
            NotificationPayload::Email(msg) => {
                assert_eq!(msg.subject, "[CRITICAL] error rate");
                assert!(msg.body.contains("api:error_rate_percent"));
                assert!(msg.body.contains("7.25"));
                assert!(msg.body.contains("> 5"));
            }
            other => panic!("expected email payload, got {:?}", other),
        }
    }

    #[test]
    fn test_webhook_payload_shape() {
        let (alert, rule) = fixtures(Severity::Medium);
        match build(ChannelKind::Webhook, &alert, &rule) {
            NotificationPayload::Webhook(json) => {
                assert_eq!(json["alert"]["id"], "alert-1");
                assert_eq!(json["rule"]["name"], "error rate");
                assert!(chrono::DateTime::parse_from_rfc3339(
                    json["timestamp"].as_str().unwrap()
                )
                .is_ok());
            }
            other => panic!("expected webhook payload, got {:?}", other),
        }
    }
}
