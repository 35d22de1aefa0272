//! Infrastructure configuration modules.

pub mod logging;
pub mod secrets;
pub mod settings;

pub use secrets::Secrets;
pub use settings::Config;
