//! Outbound adapters (driven side).

pub mod market;
pub mod notifier;
pub mod rules;
pub mod store;
