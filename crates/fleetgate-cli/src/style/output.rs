//! Message helpers shared by every command.

use anyhow::Result;
use serde::Serialize;

use super::colors::SemanticStyle;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".granted(), msg);
}

/// Errors go to stderr so `--json` output stays parseable.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".denied(), msg);
}

pub fn print_warn(msg: &str) {
    println!("{} {}", "⚠".warning(), msg);
}

pub fn print_hint(msg: &str) {
    println!("{} {}", "→".muted(), msg.muted());
}

pub fn print_heading(msg: &str) {
    println!("{}", msg.header());
}

pub fn print_labeled(key: &str, value: &str) {
    println!("  {}: {}", key.muted(), value);
}

pub fn print_spacer() {
    println!();
}

/// Pretty-prints `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
