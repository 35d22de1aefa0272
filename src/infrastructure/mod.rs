//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! monitoring logic.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading, logging and secrets
//! - [`runtime`] - Scheduled cycle loop with shutdown

pub mod bootstrap;
pub mod config;
pub mod runtime;
