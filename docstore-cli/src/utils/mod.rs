use anyhow::{Context, Result};
use colored::Colorize;
use docstore_crud::config::Config;
use serde::Serialize;
use std::path::Path;

/// Load configuration from `path`, or from the standard search path
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Config::load().context("Failed to load configuration"),
    }
}

/// Install JSON tracing when verbose output was requested
pub fn init_logging(config: &Config, verbose: bool) -> Result<()> {
    if verbose {
        docstore_crud::observability::init_tracing(config).context("Failed to initialize tracing")?;
    }
    Ok(())
}

/// Pretty-print a serializable value
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON")?;
    println!("{}", rendered);
    Ok(())
}

/// Success message with checkmark
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Info message
pub fn info(message: &str) {
    println!("{} {}", "→".blue().bold(), message);
}

/// Warning message
pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Section header
pub fn section(title: &str) {
    println!("\n{}", title.bold().underline());
}

/// Render a flag as on/off
pub fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}
