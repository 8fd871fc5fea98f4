//! Output formatters for CLI commands.
//!
//! Responsibilities:
//! - Provide the output formats: pretty JSON, compact JSON and plain text.
//! - Write formatted output to stdout or atomically to a file.
//!
//! Does NOT handle:
//! - Running the schema pipeline (see `commands`).
//!
//! Invariants:
//! - JSON formats print `null` when no spec or validation result exists, so
//!   output is always parseable.
//! - Formatters never print property values; schemas carry only names,
//!   types and encrypted values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use inspector_client::{EventSpecResponse, SchemaNode, TrackReport, ValidationResult};

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Compact,
    Text,
}

impl OutputFormat {
    /// Parse from string.
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "compact" | "jsonl" => Ok(OutputFormat::Compact),
            "text" | "txt" => Ok(OutputFormat::Text),
            _ => anyhow::bail!(
                "Invalid output format: {}. Valid options: json, compact, text",
                s
            ),
        }
    }
}

/// Formatter trait for the pipeline outputs.
pub trait Formatter {
    fn format_schema(&self, schema: &[SchemaNode]) -> Result<String>;

    /// Format a fetched spec; `None` when no spec is available.
    fn format_spec(&self, spec: Option<&EventSpecResponse>) -> Result<String>;

    /// Format a validation result; `None` when no spec is available.
    fn format_validation(&self, result: Option<&ValidationResult>) -> Result<String>;

    fn format_report(&self, report: &TrackReport) -> Result<String>;

    fn format_key(&self, key: &str) -> Result<String>;
}

/// Get a formatter for the specified output format.
pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Json => Box::new(JsonFormatter { pretty: true }),
        OutputFormat::Compact => Box::new(JsonFormatter { pretty: false }),
        OutputFormat::Text => Box::new(TextFormatter),
    }
}

/// Print to stdout, or write to `output_file` when set.
pub fn output_result(output: &str, format: OutputFormat, output_file: Option<&PathBuf>) -> Result<()> {
    if let Some(path) = output_file {
        write_to_file(output, path)
            .with_context(|| format!("Failed to write output to {}", path.display()))?;
        eprintln!("Results written to {} ({:?} format)", path.display(), format);
    } else {
        println!("{}", output);
    }
    Ok(())
}

/// Write formatted output to a file atomically.
///
/// Creates parent directories if needed, then writes a temp file in the
/// same directory and renames it over `path`.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    use std::fs;
    use std::io::Write;
    use tempfile::NamedTempFile;

    let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let parent_dir = if parent_dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent_dir
    };

    fs::create_dir_all(parent_dir)
        .with_context(|| format!("Failed to create directory: {}", parent_dir.display()))?;

    let mut temp_file = NamedTempFile::new_in(parent_dir)
        .with_context(|| format!("Failed to create temp file in: {}", parent_dir.display()))?;
    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write to temp file")?;
    temp_file.write_all(b"\n").context("Failed to write to temp file")?;
    temp_file.flush().context("Failed to flush temp file")?;

    temp_file
        .persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    Ok(())
}
