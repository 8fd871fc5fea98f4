//! Event spec wire format and the parsed constraint model.
//!
//! The remote service returns one element per base event sharing the queried
//! name, each with its variants. Parsing folds every base event and its
//! variants into a single [`EventSpecEntry`] whose constraints remember which
//! ids impose them.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{ClientError, Result};

/// Metadata attached to a spec response and forwarded on validated events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSpecMetadata {
    pub schema_id: String,
    pub branch_id: String,
    pub latest_action_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

/// Numeric range constraint. Either bound may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MinMax {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// A single property rule as sent by the remote service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub property_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub is_list: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_max: Option<MinMax>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<BTreeMap<String, PropertySpec>>,
}

/// Base event as sent by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseEventWire {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub props: BTreeMap<String, PropertySpec>,
}

/// Variant as sent by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantWire {
    pub variant_id: String,
    #[serde(default)]
    pub name_suffix: String,
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub props: BTreeMap<String, PropertySpec>,
}

/// One element of the `events` array on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSpecWire {
    pub branch_id: String,
    pub base_event: BaseEventWire,
    #[serde(default)]
    pub variants: Vec<VariantWire>,
}

/// A constraint value and the event/variant ids imposing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint<T> {
    pub value: T,
    pub ids: BTreeSet<String>,
}

fn add_constraint<T: PartialEq>(list: &mut Vec<Constraint<T>>, value: T, id: &str) {
    match list.iter_mut().find(|c| c.value == value) {
        Some(existing) => {
            existing.ids.insert(id.to_string());
        }
        None => list.push(Constraint {
            value,
            ids: BTreeSet::from([id.to_string()]),
        }),
    }
}

/// All rules attached to one property name across a base event and its variants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    /// Ids whose props declare this property at all.
    pub declared_by: BTreeSet<String>,
    pub required_by: BTreeSet<String>,
    pub list_by: BTreeSet<String>,
    /// Declared type tag to the ids declaring it.
    pub type_by_ids: BTreeMap<String, BTreeSet<String>>,
    pub pinned_values: Vec<Constraint<Value>>,
    pub allowed_values: Vec<Constraint<Vec<Value>>>,
    pub regex_patterns: Vec<Constraint<String>>,
    pub min_max_ranges: Vec<Constraint<MinMax>>,
    pub children: BTreeMap<String, PropertyConstraints>,
}

impl PropertyConstraints {
    fn absorb(&mut self, spec: &PropertySpec, id: &str) {
        if self.property_id.is_none() {
            self.property_id = spec.id.clone();
        }
        self.declared_by.insert(id.to_string());
        if spec.required {
            self.required_by.insert(id.to_string());
        }
        if spec.is_list {
            self.list_by.insert(id.to_string());
        }
        self.type_by_ids
            .entry(spec.property_type.clone())
            .or_default()
            .insert(id.to_string());
        if let Some(pinned) = &spec.pinned_value {
            add_constraint(&mut self.pinned_values, pinned.clone(), id);
        }
        if let Some(allowed) = &spec.allowed_values {
            add_constraint(&mut self.allowed_values, allowed.clone(), id);
        }
        if let Some(pattern) = &spec.regex_pattern {
            add_constraint(&mut self.regex_patterns, pattern.clone(), id);
        }
        if let Some(range) = spec.min_max {
            add_constraint(&mut self.min_max_ranges, range, id);
        }
        if let Some(children) = &spec.children {
            absorb_props(&mut self.children, children, id);
        }
    }

    /// Declared type tag for `id`, if any.
    pub fn type_for(&self, id: &str) -> Option<&str> {
        self.type_by_ids
            .iter()
            .find(|(_, ids)| ids.contains(id))
            .map(|(tag, _)| tag.as_str())
    }

    /// Whether the property carries no rule of any kind.
    pub fn is_unconstrained(&self) -> bool {
        self.required_by.is_empty()
            && self.pinned_values.is_empty()
            && self.allowed_values.is_empty()
            && self.regex_patterns.is_empty()
            && self.min_max_ranges.is_empty()
            && self.children.values().all(PropertyConstraints::is_unconstrained)
    }
}

fn absorb_props(
    target: &mut BTreeMap<String, PropertyConstraints>,
    props: &BTreeMap<String, PropertySpec>,
    id: &str,
) {
    for (name, spec) in props {
        target.entry(name.clone()).or_default().absorb(spec, id);
    }
}

/// One base event plus its variants, with merged property constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSpecEntry {
    pub branch_id: String,
    pub base_event_id: String,
    /// Variant ids in wire order. Never contains `base_event_id`.
    pub variant_ids: Vec<String>,
    pub props: BTreeMap<String, PropertyConstraints>,
}

impl From<&EventSpecWire> for EventSpecEntry {
    fn from(wire: &EventSpecWire) -> Self {
        let base_id = wire.base_event.id.as_str();
        let mut props = BTreeMap::new();
        absorb_props(&mut props, &wire.base_event.props, base_id);

        let mut variant_ids = Vec::new();
        for variant in &wire.variants {
            if variant.variant_id == base_id || variant_ids.contains(&variant.variant_id) {
                continue;
            }
            absorb_props(&mut props, &variant.props, &variant.variant_id);
            variant_ids.push(variant.variant_id.clone());
        }

        Self {
            branch_id: wire.branch_id.clone(),
            base_event_id: base_id.to_string(),
            variant_ids,
            props,
        }
    }
}

/// A parsed spec for one event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpecResponse {
    pub events: Vec<EventSpecEntry>,
    pub metadata: EventSpecMetadata,
}

impl EventSpecResponse {
    /// Parse a response body.
    ///
    /// Requires an `events` array and metadata with string `schemaId`,
    /// `branchId` and `latestActionId`. Malformed event elements are skipped.
    pub fn parse(body: &str) -> Result<Self> {
        Self::parse_logged(body, false)
    }

    /// Parse a response body, logging skipped elements when `log_enabled`.
    pub fn parse_logged(body: &str, log_enabled: bool) -> Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        Self::decode(value, log_enabled)
    }

    /// Parse an already-decoded response body.
    pub fn from_value(value: Value) -> Result<Self> {
        Self::decode(value, false)
    }

    fn decode(mut value: Value, log_enabled: bool) -> Result<Self> {
        let metadata = value
            .get_mut("metadata")
            .map(Value::take)
            .ok_or_else(|| ClientError::InvalidResponse("missing metadata".to_string()))?;
        for field in ["schemaId", "branchId", "latestActionId"] {
            if !metadata.get(field).is_some_and(Value::is_string) {
                return Err(ClientError::InvalidResponse(format!(
                    "metadata.{} must be a string",
                    field
                )));
            }
        }
        let metadata: EventSpecMetadata = serde_json::from_value(metadata)?;

        let Some(Value::Array(raw_events)) = value.get_mut("events").map(Value::take) else {
            return Err(ClientError::InvalidResponse(
                "events must be an array".to_string(),
            ));
        };

        let mut events: Vec<EventSpecEntry> = Vec::with_capacity(raw_events.len());
        for raw in raw_events {
            match serde_json::from_value::<EventSpecWire>(raw) {
                Ok(wire) => {
                    if events.iter().any(|e| e.base_event_id == wire.base_event.id) {
                        if log_enabled {
                            warn!(event_id = %wire.base_event.id, "Skipping duplicate base event");
                        }
                        continue;
                    }
                    events.push(EventSpecEntry::from(&wire));
                }
                Err(e) => {
                    if log_enabled {
                        warn!(error = %e, "Skipping malformed event spec element");
                    }
                }
            }
        }

        Ok(Self { events, metadata })
    }
}
