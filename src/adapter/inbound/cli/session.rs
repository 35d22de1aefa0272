//! Configuration and engine setup shared by the CLI handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::adapter::inbound::cli::paths;
use crate::application::engine::Engine;
use crate::error::{ConfigError, Result};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::{Config, Secrets};

/// Log level for one-shot commands, so their stdout is not buried in logs.
const ONE_SHOT_LOG_LEVEL: &str = "warn";

/// Where the configuration came from.
#[derive(Debug, Clone)]
pub enum ConfigOrigin {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Resolve and load the configuration.
///
/// An explicit path must exist. Without one, `./config.toml` then
/// `~/.tickwatch/config.toml` are tried before falling back to defaults.
///
/// # Errors
///
/// Returns an error if the chosen file cannot be read or is invalid.
pub fn load_config(explicit: Option<&Path>) -> Result<(Config, ConfigOrigin)> {
    let path = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(ConfigError::ReadFile(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} not found", path.display()),
                ))
                .into());
            }
            Some(path.to_path_buf())
        }
        None => paths::default_config(),
    };

    match path {
        Some(path) => {
            let config = Config::load(&path)?;
            Ok((config, ConfigOrigin::File(path)))
        }
        None => Ok((Config::default(), ConfigOrigin::Defaults)),
    }
}

/// A loaded configuration with its engine.
pub struct Session {
    pub config: Config,
    pub origin: ConfigOrigin,
    pub engine: Arc<Engine>,
}

impl Session {
    /// Open a session for a one-shot command.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, missing secrets, bad threshold rules
    /// or an unreadable portfolio file.
    pub async fn open(explicit: Option<&Path>) -> Result<Self> {
        let (mut config, origin) = load_config(explicit)?;
        if std::env::var_os("RUST_LOG").is_none() {
            config.logging.level = ONE_SHOT_LOG_LEVEL.to_string();
        }
        Self::with_config(config, origin).await
    }

    /// Open a session with an already-loaded configuration. Initializes
    /// logging from it.
    ///
    /// # Errors
    ///
    /// See [`Session::open`].
    pub async fn with_config(config: Config, origin: ConfigOrigin) -> Result<Self> {
        config.init_logging();
        debug!(config = %origin, "Configuration loaded");

        let secrets = Secrets::from_env(&config)?;
        let engine = Arc::new(bootstrap::build_engine(&config, &secrets).await?);
        Ok(Self {
            config,
            origin,
            engine,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_explicit_missing_path_is_error() {
        let err = load_config(Some(Path::new("/nonexistent/tickwatch.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
    }

    #[test]
    fn test_explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[monitor]\ninterval_secs = 15\n").unwrap();

        let (config, origin) = load_config(Some(&path)).unwrap();

        assert_eq!(config.monitor.interval_secs, 15);
        assert!(matches!(origin, ConfigOrigin::File(p) if p == path));
    }
}
