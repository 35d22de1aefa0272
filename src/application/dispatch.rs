//! Notification dispatcher.
//!
//! Delivers rendered messages through a [`NotificationTransport`], retrying
//! transient failures with exponential backoff plus jitter. Permanent
//! failures stop retrying at once and are escalated as system errors. The
//! dispatcher never touches alert state: a failed delivery does not undo
//! the event that produced it.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::application::format;
use crate::domain::alert::AlertEvent;
use crate::domain::outlook::Outlook;
use crate::error::DispatchError;
use crate::port::outbound::notifier::NotificationTransport;

/// Retry and backoff settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total delivery attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt. Doubles on each retry.
    pub base_delay: Duration,
    /// Cap on the backoff delay, before jitter.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (1-based), without jitter.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Backoff plus up to 20% random jitter.
    fn jittered(&self, retry: u32) -> Duration {
        let base = self.backoff(retry);
        let range_ms = u64::try_from(base.as_millis() / 5).unwrap_or(u64::MAX);
        if range_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..=range_ms))
    }
}

/// Something worth telling the user.
#[derive(Debug, Clone)]
pub enum Notification {
    Alert(AlertEvent),
    /// Several events from one cycle, sent as one message.
    Batch { header: String, events: Vec<AlertEvent> },
    Outlook(Outlook),
    Text(String),
}

impl Notification {
    /// Render the message body.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Alert(event) => format::alert_message(event),
            Self::Batch { header, events } => format::batch_message(header, events),
            Self::Outlook(outlook) => format::outlook_message(outlook),
            Self::Text(text) => text.clone(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Alert(_) => "alert",
            Self::Batch { .. } => "batch",
            Self::Outlook(_) => "outlook",
            Self::Text(_) => "text",
        }
    }
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    Delivered { attempts: u32 },
    Failed { attempts: u32, error: DispatchError },
}

impl DispatchResult {
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// Failed with an error that retrying cannot fix.
    #[must_use]
    pub const fn is_escalation(&self) -> bool {
        matches!(self, Self::Failed { error, .. } if error.is_permanent())
    }
}

/// Sends notifications with retry.
pub struct Dispatcher {
    transport: Arc<dyn NotificationTransport>,
    policy: RetryPolicy,
}

impl Dispatcher {
    #[must_use]
    pub fn new(transport: Arc<dyn NotificationTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Deliver a notification. Never returns an error; the outcome is in
    /// the result.
    pub async fn dispatch(&self, notification: &Notification) -> DispatchResult {
        let message = notification.render();
        let kind = notification.kind();
        let target = self.transport.target();
        let max_attempts = self.policy.max_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.transport.deliver(&message).await {
                Ok(()) => {
                    info!(kind, transport = %target, attempts = attempt, "Notification delivered");
                    return DispatchResult::Delivered { attempts: attempt };
                }
                Err(e) if e.is_permanent() => {
                    error!(
                        kind,
                        transport = %target,
                        attempts = attempt,
                        error = %e,
                        "Notification transport rejected delivery, check credentials and target"
                    );
                    return DispatchResult::Failed {
                        attempts: attempt,
                        error: e,
                    };
                }
                Err(e) if attempt >= max_attempts => {
                    warn!(
                        kind,
                        transport = %target,
                        attempts = attempt,
                        error = %e,
                        "Notification delivery failed, giving up"
                    );
                    return DispatchResult::Failed {
                        attempts: attempt,
                        error: e,
                    };
                }
                Err(e) => {
                    let delay = self.policy.jittered(attempt);
                    debug!(
                        kind,
                        transport = %target,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Notification delivery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
