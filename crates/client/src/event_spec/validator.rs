//! Validation of inferred schemas against event specs.
//!
//! Responsibilities:
//! - Check required, type, pinned/allowed value, regex and range rules.
//! - Resolve which base event or variant the tracked event matches.
//!
//! Does NOT handle:
//! - Fetching or caching specs.
//!
//! Invariants:
//! - Errors carry only constraint metadata. Values are compared internally
//!   and never copied into a [`ValidationError`].
//! - Each property yields at most one error per error code.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::models::{EventSpecEntry, EventSpecMetadata, EventSpecResponse, PropertyConstraints};
use crate::schema::{SchemaChild, SchemaNode, SchemaType};

/// Kind of rule a property violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationErrorCode {
    RequiredMissing,
    TypeMismatch,
    ValueNotAllowed,
    ValueAboveMax,
    ValueBelowMin,
    PatternMismatch,
}

/// A privacy-safe validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Dotted path for nested properties.
    pub property_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    pub code: ValidationErrorCode,
    /// The violated constraint (type name, pattern, bound or allowed set).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
}

/// Outcome of validating one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub errors: Vec<ValidationError>,
    pub metadata: EventSpecMetadata,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate an inferred schema against a spec.
///
/// The first variant without errors wins, then the first base event without
/// errors, then the base event with the fewest errors.
pub fn validate_event(schema: &[SchemaNode], spec: &EventSpecResponse) -> ValidationResult {
    validate_event_logged(schema, spec, false)
}

/// [`validate_event`], warning about unusable spec rules when `log_enabled`.
pub fn validate_event_logged(
    schema: &[SchemaNode],
    spec: &EventSpecResponse,
    log_enabled: bool,
) -> ValidationResult {
    let mut checker = Checker::new(log_enabled);

    for entry in &spec.events {
        for variant_id in &entry.variant_ids {
            if validate_target(schema, entry, variant_id, &mut checker).is_empty() {
                return ValidationResult {
                    event_id: Some(entry.base_event_id.clone()),
                    variant_id: Some(variant_id.clone()),
                    errors: Vec::new(),
                    metadata: spec.metadata.clone(),
                };
            }
        }
    }

    let mut best: Option<(&EventSpecEntry, Vec<ValidationError>)> = None;
    for entry in &spec.events {
        let errors = validate_target(schema, entry, &entry.base_event_id, &mut checker);
        if errors.is_empty() {
            best = Some((entry, errors));
            break;
        }
        if best.as_ref().is_none_or(|(_, current)| errors.len() < current.len()) {
            best = Some((entry, errors));
        }
    }

    match best {
        Some((entry, errors)) => ValidationResult {
            event_id: Some(entry.base_event_id.clone()),
            variant_id: None,
            errors,
            metadata: spec.metadata.clone(),
        },
        None => ValidationResult {
            event_id: None,
            variant_id: None,
            errors: Vec::new(),
            metadata: spec.metadata.clone(),
        },
    }
}

fn validate_target(
    schema: &[SchemaNode],
    entry: &EventSpecEntry,
    target: &str,
    checker: &mut Checker,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    check_properties(schema, &entry.props, target, "", checker, &mut errors);

    let mut seen = Vec::new();
    errors.retain(|e: &ValidationError| {
        let key = (e.property_name.clone(), e.code);
        if seen.contains(&key) {
            false
        } else {
            seen.push(key);
            true
        }
    });
    errors
}

fn check_properties(
    schema: &[SchemaNode],
    props: &BTreeMap<String, PropertyConstraints>,
    target: &str,
    prefix: &str,
    checker: &mut Checker,
    errors: &mut Vec<ValidationError>,
) {
    for (name, constraints) in props {
        if !constraints.declared_by.contains(target) {
            continue;
        }
        let path = format!("{}{}", prefix, name);
        match schema.iter().find(|node| &node.property_name == name) {
            Some(node) => check_node(node, constraints, target, &path, checker, errors),
            None if constraints.required_by.contains(target) => {
                errors.push(error(&path, constraints, ValidationErrorCode::RequiredMissing, None));
            }
            None => {}
        }
    }
}

fn check_node(
    node: &SchemaNode,
    constraints: &PropertyConstraints,
    target: &str,
    path: &str,
    checker: &mut Checker,
    errors: &mut Vec<ValidationError>,
) {
    let required = constraints.required_by.contains(target);
    if node.property_type == SchemaType::Null && !required {
        return;
    }

    let declared = constraints.type_for(target).unwrap_or("any");
    let is_list = constraints.list_by.contains(target);
    checker.note_declared_type(declared);
    if !type_matches(&node.property_type, declared, is_list) {
        let expected = if is_list && !declared.starts_with("list") {
            format!("list({})", declared)
        } else {
            declared.to_string()
        };
        errors.push(error(
            path,
            constraints,
            ValidationErrorCode::TypeMismatch,
            Some(Value::String(expected)),
        ));
        return;
    }

    let samples = node.samples();
    if !samples.is_empty() {
        check_values(&samples, constraints, target, path, checker, errors);
    }

    if constraints.children.is_empty() {
        return;
    }
    let nested = format!("{}.", path);
    if let Some(props) = node.properties() {
        check_properties(props, &constraints.children, target, &nested, checker, errors);
    }
    if let Some(elements) = node.elements() {
        for element in elements {
            if let SchemaChild::Properties(props) = element {
                check_properties(props, &constraints.children, target, &nested, checker, errors);
            }
        }
    }
}

fn check_values(
    samples: &[Value],
    constraints: &PropertyConstraints,
    target: &str,
    path: &str,
    checker: &mut Checker,
    errors: &mut Vec<ValidationError>,
) {
    for pinned in constraints.pinned_values.iter().filter(|c| c.ids.contains(target)) {
        if samples.iter().any(|sample| !values_equal(sample, &pinned.value)) {
            errors.push(error(
                path,
                constraints,
                ValidationErrorCode::ValueNotAllowed,
                Some(pinned.value.clone()),
            ));
        }
    }

    for allowed in constraints.allowed_values.iter().filter(|c| c.ids.contains(target)) {
        let permitted = |sample: &Value| allowed.value.iter().any(|v| values_equal(sample, v));
        if !samples.iter().all(permitted) {
            errors.push(error(
                path,
                constraints,
                ValidationErrorCode::ValueNotAllowed,
                Some(Value::Array(allowed.value.clone())),
            ));
        }
    }

    for pattern in constraints.regex_patterns.iter().filter(|c| c.ids.contains(target)) {
        let Some(regex) = checker.regex(&pattern.value) else {
            continue;
        };
        let mismatch = samples
            .iter()
            .filter_map(Value::as_str)
            .any(|text| !regex.is_match(text));
        if mismatch {
            errors.push(error(
                path,
                constraints,
                ValidationErrorCode::PatternMismatch,
                Some(Value::String(pattern.value.clone())),
            ));
        }
    }

    for range in constraints.min_max_ranges.iter().filter(|c| c.ids.contains(target)) {
        let numbers: Vec<f64> = samples.iter().filter_map(Value::as_f64).collect();
        if let Some(max) = range.value.max
            && numbers.iter().any(|n| *n > max)
        {
            errors.push(error(
                path,
                constraints,
                ValidationErrorCode::ValueAboveMax,
                Some(Value::from(max)),
            ));
        }
        if let Some(min) = range.value.min
            && numbers.iter().any(|n| *n < min)
        {
            errors.push(error(
                path,
                constraints,
                ValidationErrorCode::ValueBelowMin,
                Some(Value::from(min)),
            ));
        }
    }
}

fn error(
    path: &str,
    constraints: &PropertyConstraints,
    code: ValidationErrorCode,
    expected: Option<Value>,
) -> ValidationError {
    ValidationError {
        property_name: path.to_string(),
        property_id: constraints.property_id.clone(),
        code,
        expected,
    }
}

/// Numbers compare by value so `1` equals `1.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn declared_type(tag: &str) -> Option<SchemaType> {
    match tag.trim().to_ascii_lowercase().as_str() {
        "string" => Some(SchemaType::String),
        "int" | "integer" => Some(SchemaType::Int),
        "float" | "number" | "double" => Some(SchemaType::Float),
        "bool" | "boolean" => Some(SchemaType::Boolean),
        "object" => Some(SchemaType::Object),
        "null" => Some(SchemaType::Null),
        other => other.parse().ok(),
    }
}

fn is_wildcard(tag: &str) -> bool {
    matches!(tag.trim().to_ascii_lowercase().as_str(), "" | "any" | "unknown")
}

fn scalar_matches(actual: &SchemaType, declared: &SchemaType) -> bool {
    match (actual, declared) {
        (SchemaType::Int, SchemaType::Float) => true,
        (SchemaType::List(a), SchemaType::List(d)) => {
            **a == SchemaType::Unknown || scalar_matches(a, d)
        }
        (a, d) => a == d,
    }
}

fn type_matches(actual: &SchemaType, declared: &str, is_list: bool) -> bool {
    let tag = declared.trim().to_ascii_lowercase();
    if is_list || tag == "list" {
        let SchemaType::List(inner) = actual else {
            return false;
        };
        if tag == "list" || is_wildcard(&tag) || **inner == SchemaType::Unknown {
            return true;
        }
        return match declared_type(&tag) {
            Some(SchemaType::List(d)) => scalar_matches(inner, &d),
            Some(d) => scalar_matches(inner, &d),
            None => true,
        };
    }
    if is_wildcard(&tag) {
        return true;
    }
    declared_type(&tag).is_none_or(|d| scalar_matches(actual, &d))
}

/// Per-validation state: compiled regexes and the logging switch.
#[derive(Default)]
struct Checker {
    compiled: BTreeMap<String, Option<Regex>>,
    log_enabled: bool,
}

impl Checker {
    fn new(log_enabled: bool) -> Self {
        Self {
            compiled: BTreeMap::new(),
            log_enabled,
        }
    }

    fn regex(&mut self, pattern: &str) -> Option<&Regex> {
        let log_enabled = self.log_enabled;
        self.compiled
            .entry(pattern.to_string())
            .or_insert_with(|| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    if log_enabled {
                        warn!(error = %e, "Invalid regex pattern in event spec, treating as unconstrained");
                    }
                    None
                }
            })
            .as_ref()
    }

    fn note_declared_type(&self, declared: &str) {
        if !self.log_enabled {
            return;
        }
        let tag = declared.trim().to_ascii_lowercase();
        if tag != "list" && !is_wildcard(&tag) && declared_type(&tag).is_none() {
            warn!(declared = %tag, "Unrecognized declared property type, skipping type check");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_satisfies_float() {
        assert!(type_matches(&SchemaType::Int, "float", false));
        assert!(!type_matches(&SchemaType::Float, "int", false));
    }

    #[test]
    fn test_list_types() {
        let ints = SchemaType::List(Box::new(SchemaType::Int));
        assert!(type_matches(&ints, "list", false));
        assert!(type_matches(&ints, "int", true));
        assert!(type_matches(&ints, "list(float)", false));
        assert!(!type_matches(&ints, "string", true));
        assert!(!type_matches(&SchemaType::Int, "int", true));
        let empty = SchemaType::List(Box::new(SchemaType::Unknown));
        assert!(type_matches(&empty, "string", true));
    }

    #[test]
    fn test_wildcards_skip_type_check() {
        assert!(type_matches(&SchemaType::Object, "any", false));
        assert!(type_matches(&SchemaType::String, "unknown", false));
    }

    #[test]
    fn test_values_equal_across_number_kinds() {
        assert!(values_equal(&Value::from(1), &Value::from(1.0)));
        assert!(!values_equal(&Value::from(1), &Value::from("1")));
    }

    #[test]
    fn test_invalid_regex_is_unconstrained() {
        let mut checker = Checker::default();
        assert!(checker.regex("([a-z").is_none());
        assert!(checker.regex("^[a-z]+$").is_some());
    }

    #[test]
    fn test_rule_warnings_only_when_logging_enabled() {
        let quiet = crate::testing::LogCapture::install();
        Checker::new(false).regex("([a-z");
        Checker::new(false).note_declared_type("widget");
        assert!(quiet.contents().is_empty());
        drop(quiet);

        let verbose = crate::testing::LogCapture::install();
        Checker::new(true).regex("([a-z");
        Checker::new(true).note_declared_type("widget");
        Checker::new(true).note_declared_type("list(int)");
        let logs = verbose.contents();
        assert!(logs.contains("Invalid regex pattern"));
        assert_eq!(logs.matches("Unrecognized declared property type").count(), 1);
    }
}
