//! Notification transport port.
//!
//! Transports deliver an already formatted message to their configured
//! target. They classify failures so the dispatcher can decide whether to
//! retry.

use async_trait::async_trait;

use crate::error::DispatchError;

/// Outbound channel for alert and summary messages.
///
/// # Implementation Notes
///
/// - Implementations must be thread-safe (`Send + Sync`)
/// - Return [`DispatchError::Permanent`] for bad credentials or targets, so
///   retries are skipped
/// - Return [`DispatchError::Transient`] for network errors and timeouts
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Human-readable target for logs (never includes credentials).
    fn target(&self) -> String;

    /// Deliver one message.
    async fn deliver(&self, message: &str) -> Result<(), DispatchError>;
}
