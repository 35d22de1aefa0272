//! Notification transports.
//!
//! Implements [`NotificationTransport`](crate::port::outbound::notifier::NotificationTransport)
//! for the supported backends.

pub mod log;
#[cfg(feature = "telegram")]
pub mod telegram;

pub use log::LogTransport;
#[cfg(feature = "telegram")]
pub use telegram::{TelegramConfig, TelegramTransport};
