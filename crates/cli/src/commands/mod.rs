//! CLI command implementations.
//!
//! Responsibilities:
//! - Read event payloads from files or stdin.
//! - Build an [`Inspector`] from the resolved configuration.
//!
//! Does NOT handle:
//! - Output rendering (see `formatters`).

pub mod fetch_spec;
pub mod keygen;
pub mod schema;
pub mod track;
pub mod validate;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use inspector_client::{FileStorage, Inspector, KeyValueStorage, MemoryStorage};
use inspector_config::InspectorConfig;
use serde_json::Value;

use crate::formatters::{Formatter, OutputFormat, get_formatter};

/// Where and how a command prints its result.
pub struct OutputTarget {
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
}

impl OutputTarget {
    pub fn new(output_format: &str, output_file: Option<PathBuf>) -> Result<Self> {
        Ok(Self {
            format: OutputFormat::from_str(output_format)?,
            output_file,
        })
    }

    pub fn formatter(&self) -> Box<dyn Formatter> {
        get_formatter(self.format)
    }

    pub fn emit(&self, output: &str) -> Result<()> {
        crate::formatters::output_result(output, self.format, self.output_file.as_ref())
    }
}

/// Read a JSON payload from `input`, or from stdin when `input` is `-`.
pub fn read_payload(input: &Path) -> Result<Value> {
    let raw = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read event payload from stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read event payload: {}", input.display()))?
    };

    serde_json::from_str(&raw).context("Event payload is not valid JSON")
}

/// Build a tracker, persisting identity values in `storage_path` when set.
pub fn build_inspector(config: InspectorConfig, storage_path: Option<&Path>) -> Result<Inspector> {
    let storage: Arc<dyn KeyValueStorage> = match storage_path {
        Some(path) => Arc::new(FileStorage::open(path).context("Failed to open identity storage")?),
        None => Arc::new(MemoryStorage::new()),
    };

    Inspector::builder(config)
        .storage(storage)
        .build()
        .context("Failed to build inspector")
}
