//! Inbound ports (driving side): operations the engine offers its callers.

pub mod monitor;
