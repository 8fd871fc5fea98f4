//! Recursive schema inference over JSON values.

use secrecy::SecretString;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::types::{SchemaChild, SchemaChildren, SchemaNode, SchemaType};
use crate::encryption::EncryptionContext;

/// Infer the schema of an event's properties.
///
/// Only objects produce nodes; `null` and any other top-level value yield an
/// empty vec. Never fails: an encryption failure on one property drops that
/// property's ciphertext and leaves its siblings untouched.
pub fn extract_schema(value: &Value, encryption: Option<&EncryptionContext>) -> Vec<SchemaNode> {
    match value {
        Value::Object(map) => properties(map, encryption),
        Value::Null => Vec::new(),
        other => {
            debug!(kind = %SchemaType::of(other), "Ignoring non-object event properties");
            Vec::new()
        }
    }
}

fn properties(map: &Map<String, Value>, encryption: Option<&EncryptionContext>) -> Vec<SchemaNode> {
    map.iter()
        .map(|(name, value)| property(name, value, encryption))
        .collect()
}

fn property(name: &str, value: &Value, encryption: Option<&EncryptionContext>) -> SchemaNode {
    let node = SchemaNode::new(name, SchemaType::of(value));
    match value {
        Value::Object(map) => {
            node.with_children(SchemaChildren::Properties(properties(map, encryption)))
        }
        Value::Array(items) => {
            let mut node = node.with_children(SchemaChildren::Elements(elements(items, encryption)));
            node.set_samples(
                items
                    .iter()
                    .filter(|item| SchemaType::of(item).is_primitive())
                    .map(|item| SecretString::from(item.to_string()))
                    .collect(),
            );
            node
        }
        scalar => {
            let mut node = node.with_sample(scalar);
            if let Some(ctx) = encryption {
                match ctx.encrypt(scalar) {
                    Ok(ciphertext) => node.encrypted_property_value = ciphertext,
                    Err(e) => warn!(property = %name, error = %e, "Failed to encrypt property value"),
                }
            }
            node
        }
    }
}

fn elements(items: &[Value], encryption: Option<&EncryptionContext>) -> Vec<SchemaChild> {
    dedup_tags(items.iter().map(|item| element(item, encryption)).collect())
}

fn element(item: &Value, encryption: Option<&EncryptionContext>) -> SchemaChild {
    match item {
        Value::Object(map) => SchemaChild::Properties(properties(map, encryption)),
        Value::Array(nested) => SchemaChild::List(elements(nested, encryption)),
        scalar => SchemaChild::Type(SchemaType::of(scalar)),
    }
}

/// Keep the first occurrence of each primitive tag. Object and list
/// elements are always kept.
fn dedup_tags(children: Vec<SchemaChild>) -> Vec<SchemaChild> {
    let mut seen: Vec<SchemaType> = Vec::new();
    children
        .into_iter()
        .filter(|child| match child {
            SchemaChild::Type(tag) if seen.contains(tag) => false,
            SchemaChild::Type(tag) => {
                seen.push(tag.clone());
                true
            }
            _ => true,
        })
        .collect()
}

/// Schema inference bound to an encryption context.
#[derive(Debug, Clone, Default)]
pub struct SchemaParser {
    encryption: Option<EncryptionContext>,
}

impl SchemaParser {
    /// Create a parser that never encrypts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser that encrypts primitive values when the context is active.
    pub fn with_encryption(encryption: EncryptionContext) -> Self {
        Self {
            encryption: Some(encryption),
        }
    }

    /// Infer the schema of a JSON value.
    pub fn extract(&self, value: &Value) -> Vec<SchemaNode> {
        extract_schema(value, self.encryption.as_ref())
    }

    /// Infer the schema of any serializable value.
    ///
    /// Fields skipped during serialization are absent from the result.
    pub fn extract_from<T: Serialize + ?Sized>(&self, value: &T) -> Vec<SchemaNode> {
        match serde_json::to_value(value) {
            Ok(json) => self.extract(&json),
            Err(e) => {
                warn!(error = %e, "Failed to serialize event properties");
                Vec::new()
            }
        }
    }
}
