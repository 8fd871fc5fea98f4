//! Plain-text formatter implementation.
//!
//! Responsibilities:
//! - Render schemas as an indented property tree.
//! - Summarize specs, validation results and track reports for terminals.

use std::fmt::Write as _;

use anyhow::Result;
use inspector_client::{
    Delivery, EventSpecResponse, SchemaNode, TrackReport, ValidationResult,
    schema::SchemaChild,
};

use crate::formatters::Formatter;

const INDENT: &str = "  ";

/// Plain-text formatter.
pub struct TextFormatter;

fn write_nodes(out: &mut String, nodes: &[SchemaNode], depth: usize) {
    for node in nodes {
        let _ = write!(
            out,
            "{}{}: {}",
            INDENT.repeat(depth),
            node.property_name,
            node.property_type
        );
        if node.encrypted_property_value.is_some() {
            out.push_str(" (encrypted)");
        }
        out.push('\n');
        if let Some(props) = node.properties() {
            write_nodes(out, props, depth + 1);
        }
        if let Some(elements) = node.elements() {
            write_elements(out, elements, depth + 1);
        }
    }
}

fn write_elements(out: &mut String, elements: &[SchemaChild], depth: usize) {
    for (index, element) in elements.iter().enumerate() {
        let pad = INDENT.repeat(depth);
        match element {
            SchemaChild::Type(ty) => {
                let _ = writeln!(out, "{}[{}]: {}", pad, index, ty);
            }
            SchemaChild::Properties(props) => {
                let _ = writeln!(out, "{}[{}]: object", pad, index);
                write_nodes(out, props, depth + 1);
            }
            SchemaChild::List(items) => {
                let _ = writeln!(out, "{}[{}]: list", pad, index);
                write_elements(out, items, depth + 1);
            }
        }
    }
}

fn write_validation(out: &mut String, result: &ValidationResult) {
    let _ = writeln!(
        out,
        "Event: {}",
        result.event_id.as_deref().unwrap_or("N/A")
    );
    if let Some(variant) = &result.variant_id {
        let _ = writeln!(out, "Variant: {}", variant);
    }
    if result.is_valid() {
        out.push_str("Valid: yes\n");
        return;
    }
    let _ = writeln!(out, "Valid: no ({} errors)", result.errors.len());
    for error in &result.errors {
        let _ = write!(out, "{}{}: {:?}", INDENT, error.property_name, error.code);
        if let Some(expected) = &error.expected {
            let _ = write!(out, " (expected {})", expected);
        }
        out.push('\n');
    }
}

impl Formatter for TextFormatter {
    fn format_schema(&self, schema: &[SchemaNode]) -> Result<String> {
        if schema.is_empty() {
            return Ok("No properties.".to_string());
        }
        let mut out = String::new();
        write_nodes(&mut out, schema, 0);
        Ok(out.trim_end().to_string())
    }

    fn format_spec(&self, spec: Option<&EventSpecResponse>) -> Result<String> {
        let Some(spec) = spec else {
            return Ok("No spec available.".to_string());
        };
        let mut out = String::new();
        let _ = writeln!(
            &mut out,
            "Schema: {} (branch {}, action {})",
            spec.metadata.schema_id, spec.metadata.branch_id, spec.metadata.latest_action_id
        );
        for entry in &spec.events {
            let _ = writeln!(&mut out, "Event {}", entry.base_event_id);
            if !entry.variant_ids.is_empty() {
                let _ = writeln!(&mut out, "{}variants: {}", INDENT, entry.variant_ids.join(", "));
            }
            for name in entry.props.keys() {
                let _ = writeln!(&mut out, "{}{}", INDENT, name);
            }
        }
        Ok(out.trim_end().to_string())
    }

    fn format_validation(&self, result: Option<&ValidationResult>) -> Result<String> {
        let Some(result) = result else {
            return Ok("No spec available; event not validated.".to_string());
        };
        let mut out = String::new();
        write_validation(&mut out, result);
        Ok(out.trim_end().to_string())
    }

    fn format_report(&self, report: &TrackReport) -> Result<String> {
        let mut out = String::new();
        match &report.delivery {
            Delivery::Immediate { validation } => {
                out.push_str("Delivery: immediate\n");
                write_validation(&mut out, validation);
            }
            Delivery::Batched => out.push_str("Delivery: batched\n"),
            Delivery::FellBackToBatch => out.push_str("Delivery: batched (immediate send failed)\n"),
        }
        let _ = writeln!(&mut out, "Properties: {}", report.schema.len());
        write_nodes(&mut out, &report.schema, 1);
        Ok(out.trim_end().to_string())
    }

    fn format_key(&self, key: &str) -> Result<String> {
        Ok(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspector_client::SchemaType;
    use inspector_client::schema::SchemaChildren;

    #[test]
    fn test_schema_tree() {
        let schema = vec![
            SchemaNode::new("user", SchemaType::Object).with_children(SchemaChildren::Properties(
                vec![SchemaNode::new("id", SchemaType::Int)],
            )),
            SchemaNode::new("tags", SchemaType::List(Box::new(SchemaType::String))).with_children(
                SchemaChildren::Elements(vec![SchemaChild::Type(SchemaType::String)]),
            ),
        ];

        let output = TextFormatter.format_schema(&schema).unwrap();

        assert_eq!(
            output,
            "user: object\n  id: int\ntags: list(string)\n  [0]: string"
        );
    }

    #[test]
    fn test_empty_schema() {
        assert_eq!(TextFormatter.format_schema(&[]).unwrap(), "No properties.");
    }

    #[test]
    fn test_missing_validation() {
        let output = TextFormatter.format_validation(None).unwrap();
        assert!(output.contains("not validated"));
    }
}
