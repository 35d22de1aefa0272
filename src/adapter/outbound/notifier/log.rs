//! Transport that writes notifications to the log.
//!
//! Used when no chat transport is configured, so alerts are still visible.

use async_trait::async_trait;
use tracing::info;

use crate::error::DispatchError;
use crate::port::outbound::notifier::NotificationTransport;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl NotificationTransport for LogTransport {
    fn target(&self) -> String {
        "log".to_string()
    }

    async fn deliver(&self, message: &str) -> Result<(), DispatchError> {
        info!(target: "tickwatch::notification", "{message}");
        Ok(())
    }
}
