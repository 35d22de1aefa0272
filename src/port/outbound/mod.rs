//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies: price providers,
//! notification transports, and durable storage.

pub mod notifier;
pub mod price;
pub mod store;
