use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tickwatch::error::DispatchError;
use tickwatch::port::NotificationTransport;

/// Collects delivered messages. Scripted failures are consumed first, one
/// per delivery attempt.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    attempts: Arc<Mutex<Vec<String>>>,
    delivered: Arc<Mutex<Vec<String>>>,
    failures: Arc<Mutex<VecDeque<DispatchError>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, error: DispatchError) {
        self.failures.lock().push_back(error);
    }

    pub fn delivered(&self) -> Vec<String> {
        self.delivered.lock().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.lock().len()
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    fn target(&self) -> String {
        "recording".to_string()
    }

    async fn deliver(&self, message: &str) -> Result<(), DispatchError> {
        self.attempts.lock().push(message.to_string());
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        self.delivered.lock().push(message.to_string());
        Ok(())
    }
}
