//! Threshold rule sources.
//!
//! The layout is a JSON object of sectors, each mapping tickers to rules:
//! `{"tech": {"AAPL": {"above": 200, "below": 180, "description": "..."}}}`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::rule::SectorRules;
use crate::error::ConfigError;
use crate::port::outbound::store::RuleSource;

/// Parse the sector layout from JSON text.
///
/// # Errors
///
/// Returns [`ConfigError::RulesParse`] for malformed JSON or a layout that
/// does not match.
pub fn parse_rules(json: &str) -> Result<SectorRules, ConfigError> {
    serde_json::from_str(json).map_err(ConfigError::RulesParse)
}

/// Rules read from a JSON file on every load.
#[derive(Debug, Clone)]
pub struct JsonRuleFile {
    path: PathBuf,
}

impl JsonRuleFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleSource for JsonRuleFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<SectorRules, ConfigError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::RulesRead {
            path: self.describe(),
            source,
        })?;
        parse_rules(&raw)
    }
}

/// Rules held in memory. Clones share the same rules, so a test can swap
/// them under a running rule book.
#[derive(Debug, Clone, Default)]
pub struct MemoryRuleSource {
    rules: Arc<Mutex<SectorRules>>,
}

impl MemoryRuleSource {
    #[must_use]
    pub fn new(rules: SectorRules) -> Self {
        Self {
            rules: Arc::new(Mutex::new(rules)),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::RulesParse`] if `json` is not a valid layout.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(parse_rules(json)?))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::RulesParse`] if `json` is not a valid layout;
    /// the held rules are then unchanged.
    pub fn replace_json(&self, json: &str) -> Result<(), ConfigError> {
        *self.rules.lock() = parse_rules(json)?;
        Ok(())
    }
}

impl RuleSource for MemoryRuleSource {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> Result<SectorRules, ConfigError> {
        Ok(self.rules.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::NamedTempFile;

    #[test]
    fn test_json_file_reads_sector_layout() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{"tech": {"AAPL": {"above": 200.5, "below": 180, "description": "Apple"}}}"#,
        )
        .unwrap();

        let rules = JsonRuleFile::new(file.path()).load().unwrap();
        let aapl = &rules["tech"]["AAPL"];
        assert_eq!(aapl.above, Some(dec!(200.5)));
        assert_eq!(aapl.below, Some(dec!(180)));
        assert_eq!(aapl.description, "Apple");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = JsonRuleFile::new("/nonexistent/alerts_config.json").load();
        assert!(matches!(result, Err(ConfigError::RulesRead { .. })));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            MemoryRuleSource::from_json(r#"{"tech": ["AAPL"]}"#),
            Err(ConfigError::RulesParse(_))
        ));
    }

    #[test]
    fn test_rule_without_description_is_parse_error() {
        assert!(matches!(
            MemoryRuleSource::from_json(r#"{"tech": {"AAPL": {"above": 200, "below": 180}}}"#),
            Err(ConfigError::RulesParse(_))
        ));
    }
}
