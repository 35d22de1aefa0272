//! Portfolio and alert state repositories.

pub mod alerts;
pub mod json;
pub mod memory;

pub use alerts::JsonAlertStateFile;
pub use json::JsonPortfolioFile;
pub use memory::{MemoryAlertStore, MemoryPortfolioStore};
