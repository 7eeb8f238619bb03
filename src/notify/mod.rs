//! Notification dispatch
//!
//! The core never talks to chat/email/webhook services itself. Transports
//! implement [`NotificationChannel`] and are registered under the channel
//! ids that rules reference; the dispatcher builds the kind-appropriate
//! payload and hands it over with a bounded timeout per send. One channel's
//! failure or stall never blocks the others.

mod payload;

pub use payload::{ChatMessage, EmailMessage, NotificationPayload};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::RwLock;

use crate::model::{Alert, AlertRule};

/// What kind of payload a transport expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Chat,
    Email,
    Webhook,
}

/// A built notification ready for delivery
#[derive(Debug, Clone)]
pub struct Notification {
    pub alert: Alert,
    pub rule: AlertRule,
    pub payload: NotificationPayload,
}

/// Notification delivery errors. Absorbed by the dispatcher; never reach
/// the evaluator.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("channel send failed: {0}")]
    ChannelFailed(String),

    #[error("channel send timed out after {0:?}")]
    TimedOut(Duration),

    #[error("no channel registered under '{0}'")]
    UnknownChannel(String),
}

/// An injected notification transport.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Payload shape this transport consumes.
    fn kind(&self) -> ChannelKind;

    /// Deliver one notification.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Fans alert notifications out to the channels a rule names.
pub struct Dispatcher {
    channels: RwLock<HashMap<String, Arc<dyn NotificationChannel>>>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            timeout,
        }
    }

    /// Register a transport under a channel id. Replaces any previous
    /// transport with the same id.
    pub fn register(&self, id: impl Into<String>, channel: Arc<dyn NotificationChannel>) {
        self.channels.write().insert(id.into(), channel);
    }

    pub fn unregister(&self, id: &str) -> bool {
        self.channels.write().remove(id).is_some()
    }

    /// Send to every channel the rule names. Failures are logged per channel
    /// and never abort the remaining sends.
    pub async fn dispatch(&self, alert: &Alert, rule: &AlertRule) {
        let targets: Vec<(String, Option<Arc<dyn NotificationChannel>>)> = {
            let channels = self.channels.read();
            rule.channels
                .iter()
                .map(|id| (id.clone(), channels.get(id).cloned()))
                .collect()
        };

        let sends = targets.into_iter().map(|(id, channel)| {
            let alert = alert.clone();
            let rule = rule.clone();
            async move {
                match channel {
                    Some(channel) => {
                        if let Err((error, alert_id)) =
                            self.send_one(&id, channel, alert, rule).await
                        {
                            tracing::error!(
                                channel = %id,
                                alert_id = %alert_id,
                                error = %error,
                                "Notification failed"
                            );
                        }
                    }
                    None => {
                        tracing::warn!(
                            channel = %id,
                            alert_id = %alert.id,
                            "Skipping unregistered notification channel"
                        );
                    }
                }
            }
        });

        join_all(sends).await;
    }

    async fn send_one(
        &self,
        id: &str,
        channel: Arc<dyn NotificationChannel>,
        alert: Alert,
        rule: AlertRule,
    ) -> Result<(), (NotifyError, String)> {
        let alert_id = alert.id.clone();
        let payload = payload::build(channel.kind(), &alert, &rule);
        let notification = Notification {
            alert,
            rule,
            payload,
        };

        match tokio::time::timeout(self.timeout, channel.send(&notification)).await {
            Ok(Ok(())) => {
                tracing::debug!(channel = %id, alert_id = %alert_id, "Notification sent");
                Ok(())
            }
            Ok(Err(e)) => Err((e, alert_id)),
            Err(_) => Err((NotifyError::TimedOut(self.timeout), alert_id)),
        }
    }
}
