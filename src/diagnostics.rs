//! Diagnostic Output
//!
//! Helpers that print error text to stderr. Formatting of the error
//! messages themselves lives with the error types.

use colored::Colorize;
use serde_json::Value;

const RULE: &str = "-------------------------------------------------------";

/// Prints a highlighted prelude followed by the message to stderr.
pub fn eprint_error(prelude: &str, message: &str) {
    eprintln!();
    eprintln!("{}", prelude.red().bold());
    eprintln!("{}", RULE);
    eprintln!("{}", message);
}

/// Prints a titled, pretty-printed JSON value to stderr.
pub fn eprint_value(title: &str, value: &Value) {
    eprintln!("{}", RULE);
    eprintln!("{}:", title.yellow());
    eprintln!("{}", format_value(value));
}

/// Pretty-prints a value with two-space indentation.
///
/// Falls back to the compact form if pretty printing fails.
pub fn format_value(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
