pub mod auth;
pub mod chat;
pub mod sessions;

use anyhow::{Context, Result};
use rustyline::DefaultEditor;

/// Reads a line from the terminal, e.g. a password that was not passed as a flag.
pub fn prompt(label: &str) -> Result<String> {
    let mut editor = DefaultEditor::new()?;
    let line = editor
        .readline(&format!("{}: ", label))
        .with_context(|| format!("Failed to read {}", label.to_lowercase()))?;
    Ok(line.trim().to_string())
}
