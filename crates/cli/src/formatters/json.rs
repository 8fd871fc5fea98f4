//! JSON formatter implementation.
//!
//! Responsibilities:
//! - Format pipeline outputs as pretty or single-line JSON.
//!
//! Does NOT handle:
//! - Human-readable layouts (see `text`).

use anyhow::Result;
use inspector_client::{EventSpecResponse, SchemaNode, TrackReport, ValidationResult};
use serde::Serialize;

use crate::formatters::Formatter;

/// JSON formatter.
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(rendered)
    }
}

impl Formatter for JsonFormatter {
    fn format_schema(&self, schema: &[SchemaNode]) -> Result<String> {
        self.render(schema)
    }

    fn format_spec(&self, spec: Option<&EventSpecResponse>) -> Result<String> {
        self.render(&spec)
    }

    fn format_validation(&self, result: Option<&ValidationResult>) -> Result<String> {
        self.render(&result)
    }

    fn format_report(&self, report: &TrackReport) -> Result<String> {
        self.render(report)
    }

    fn format_key(&self, key: &str) -> Result<String> {
        self.render(&serde_json::json!({ "key": key }))
    }
}
