//! Terminal rendering for the CLI.
//!
//! Three modes. `Human` prints banners, fields and colored tables. `Quiet`
//! keeps only results, alerts and problems. `Json` prints exactly one result
//! document per command on stdout (one per cycle under `run`); anything else
//! worth saying goes to stderr as a JSON line so stdout stays parseable.

use std::fmt::Display;
use std::sync::OnceLock;

use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::domain::alert::{AlertEvent, Direction};

/// How command results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Human,
    Quiet,
    Json,
}

impl Mode {
    /// `--json` wins over `--quiet`.
    #[must_use]
    pub const fn from_flags(json: bool, quiet: bool) -> Self {
        match (json, quiet) {
            (true, _) => Self::Json,
            (false, true) => Self::Quiet,
            (false, false) => Self::Human,
        }
    }
}

static MODE: OnceLock<Mode> = OnceLock::new();

/// Set the mode from the global flags. The first call wins.
pub fn configure(mode: Mode) {
    let _ = MODE.set(mode);
}

fn mode() -> Mode {
    MODE.get().copied().unwrap_or_default()
}

#[must_use]
pub fn is_json() -> bool {
    mode() == Mode::Json
}

fn chatty() -> bool {
    mode() == Mode::Human
}

fn to_stderr(kind: &str, message: &str) {
    eprintln!("{}", json!({ "type": kind, "message": message }));
}

/// Name and version line.
pub fn banner() {
    if chatty() {
        println!("{} {}", "tickwatch".bold(), env!("CARGO_PKG_VERSION").dimmed());
    }
}

pub fn section(title: &str) {
    if chatty() {
        println!();
        println!("{}", title.bold());
    }
}

pub fn field(label: &str, value: impl Display) {
    if chatty() {
        println!("  {:<12} {value}", label.dimmed());
    }
}

pub fn success(message: &str) {
    if chatty() {
        println!("  {} {message}", "✓".green());
    }
}

pub fn note(message: &str) {
    if chatty() {
        println!("  {}", message.dimmed());
    }
}

pub fn hint(message: &str) {
    if chatty() {
        println!("  {}: {}", "hint".cyan(), message.dimmed());
    }
}

/// Shown in every mode.
pub fn warning(message: &str) {
    match mode() {
        Mode::Json => to_stderr("warning", message),
        _ => println!("  {} {message}", "!".yellow().bold()),
    }
}

/// Fatal error line on stderr.
pub fn error(message: &str) {
    match mode() {
        Mode::Json => to_stderr("error", message),
        _ => eprintln!("{} {message}", "error:".red().bold()),
    }
}

/// A command's result document. Only printed in JSON mode.
pub fn document(value: &serde_json::Value) {
    if is_json() {
        println!("{value}");
    }
}

/// A result table, indented under the current section.
pub fn table<R: Tabled>(rows: impl IntoIterator<Item = R>) {
    if is_json() {
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    for line in table.to_string().lines() {
        println!("  {line}");
    }
}

/// Preformatted text such as a rendered message.
pub fn block(text: &str) {
    if is_json() {
        return;
    }
    for line in text.lines() {
        println!("  {line}");
    }
}

/// A threshold crossing from a cycle. Shown in quiet mode too.
pub fn alert(event: &AlertEvent) {
    if is_json() {
        return;
    }
    println!(
        "  {} {} {} {} {}",
        event.timestamp.format("%H:%M:%S").dimmed(),
        direction_marker(event.direction),
        event.ticker.bold(),
        price(Some(event.price)),
        format!("(limit {})", price(Some(event.threshold))).dimmed(),
    );
}

fn direction_marker(direction: Direction) -> String {
    match direction {
        Direction::Above => format!("{}", "▲ above".red()),
        Direction::Below => format!("{}", "▼ below".green()),
    }
}

/// Alert state cell: `armed`, or the fired direction.
#[must_use]
pub fn alert_state(direction: Option<Direction>) -> String {
    direction.map_or_else(|| "armed".to_string(), direction_marker)
}

/// `$123.45`, or `-` when absent.
#[must_use]
pub fn price(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("${v}"))
}

/// Price cell flagged when it comes from a stale snapshot.
#[must_use]
pub fn price_with_age(value: Option<Decimal>, stale: bool) -> String {
    let rendered = price(value);
    if stale && value.is_some() {
        format!("{rendered} {}", "(stale)".yellow())
    } else {
        rendered
    }
}

/// Ticker emphasis for inline messages.
#[must_use]
pub fn ticker(value: impl Display) -> String {
    format!("{}", value.to_string().cyan())
}
