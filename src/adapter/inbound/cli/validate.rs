//! Handler for the `validate` command.
//!
//! Checks configuration, secrets and threshold rules without touching the
//! network or the portfolio file.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::session;
use crate::adapter::outbound::rules::JsonRuleFile;
use crate::domain::rule::RuleSet;
use crate::error::Result;
use crate::infrastructure::config::Secrets;
use crate::port::outbound::store::RuleSource;

/// Validate everything the engine needs at startup.
///
/// # Errors
///
/// Returns the first problem found; the binary exits non-zero on it.
pub fn execute(explicit: Option<&Path>) -> Result<()> {
    let (config, origin) = session::load_config(explicit)?;
    Secrets::from_env(&config)?;

    let source = JsonRuleFile::new(&config.rules.path);
    let rules = RuleSet::from_sectors(source.load()?)?;

    let mut sectors: BTreeMap<&str, usize> = BTreeMap::new();
    for rule in rules.iter() {
        *sectors.entry(rule.sector()).or_default() += 1;
    }

    if output::is_json() {
        output::document(&json!({
            "command": "validate",
            "valid": true,
            "config": origin.to_string(),
            "rules_path": config.rules.path,
            "rules": rules.len(),
            "sectors": sectors,
            "telegram": config.telegram.enabled,
        }));
        return Ok(());
    }

    output::section("Configuration Check");
    output::field("Config", &origin);
    output::success("Configuration is valid");

    output::section("Threshold Rules");
    output::field("File", config.rules.path.display());
    for (sector, count) in &sectors {
        output::field(sector, format!("{count} rule(s)"));
    }
    output::success(&format!("{} rule(s) loaded", rules.len()));

    if config.telegram.enabled {
        output::success("Telegram credentials detected");
    } else {
        output::field("Telegram", "disabled");
    }

    Ok(())
}
