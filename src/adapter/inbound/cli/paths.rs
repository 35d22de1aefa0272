//! Path utilities for tickwatch.
//!
//! User data lives under `~/.tickwatch/`:
//! - `~/.tickwatch/config.toml` - configuration, when `./config.toml` is absent
//! - `~/.tickwatch/portfolio.json` - tracked tickers

use std::path::PathBuf;

/// Returns the tickwatch home directory (`~/.tickwatch/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tickwatch")
}

/// The config file used when `--config` is not given, if one exists.
pub fn default_config() -> Option<PathBuf> {
    [PathBuf::from("config.toml"), home_dir().join("config.toml")]
        .into_iter()
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_is_under_tickwatch() {
        assert!(home_dir().to_string_lossy().contains(".tickwatch"));
    }
}
