//! Structural schema types produced by inference.

use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Inferred type of a property value.
///
/// Serializes as its tag string (`"int"`, `"list(string)"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Null,
    String,
    Int,
    Float,
    Boolean,
    Object,
    /// A list typed by its first element.
    List(Box<SchemaType>),
    Unknown,
}

impl SchemaType {
    /// Whether this is a scalar (non-container) type.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Object | Self::List(_))
    }

    /// Whether this is a list type of any element type.
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Classify a JSON value.
    ///
    /// Integral numbers are `int`. Other numbers are `float` only when their
    /// decimal rendering carries a fractional part.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::String(_) => Self::String,
            Value::Number(n) => {
                let fractional = match n.as_f64() {
                    Some(f) if !n.is_i64() && !n.is_u64() => number_text(f).contains('.'),
                    _ => false,
                };
                if fractional { Self::Float } else { Self::Int }
            }
            Value::Object(_) => Self::Object,
            Value::Array(items) => {
                Self::List(Box::new(items.first().map(Self::of).unwrap_or(Self::Unknown)))
            }
        }
    }
}

/// Shortest text for a float, switching to exponent notation outside
/// `[1e-6, 1e21)` the way ECMAScript number-to-string does.
fn number_text(f: f64) -> String {
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-6..1e21).contains(&magnitude) {
        format!("{:e}", f)
    } else {
        f.to_string()
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::String => f.write_str("string"),
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Boolean => f.write_str("boolean"),
            Self::Object => f.write_str("object"),
            Self::List(inner) => write!(f, "list({})", inner),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Error returned when a type tag cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown schema type tag: {0}")]
pub struct ParseSchemaTypeError(pub String);

impl FromStr for SchemaType {
    type Err = ParseSchemaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        if let Some(inner) = tag.strip_prefix("list(").and_then(|rest| rest.strip_suffix(')')) {
            return Ok(Self::List(Box::new(inner.parse()?)));
        }
        match tag {
            "null" => Ok(Self::Null),
            "string" => Ok(Self::String),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "boolean" => Ok(Self::Boolean),
            "object" => Ok(Self::Object),
            "unknown" => Ok(Self::Unknown),
            other => Err(ParseSchemaTypeError(other.to_string())),
        }
    }
}

impl Serialize for SchemaType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// One element descriptor inside a list node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaChild {
    /// A primitive element, reduced to its type tag.
    Type(SchemaType),
    /// An object element, described by its own properties.
    Properties(Vec<SchemaNode>),
    /// A nested list element.
    List(Vec<SchemaChild>),
}

/// Children of a container node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaChildren {
    /// Properties of an object node.
    Properties(Vec<SchemaNode>),
    /// Element descriptors of a list node.
    Elements(Vec<SchemaChild>),
}

/// One inferred property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    pub property_name: String,
    pub property_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<SchemaChildren>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_property_value: Option<String>,
    /// JSON text of the primitive value(s) seen for this property.
    #[serde(skip)]
    samples: Vec<SecretString>,
}

impl SchemaNode {
    /// Create a leaf node with no children and no samples.
    pub fn new(name: impl Into<String>, property_type: SchemaType) -> Self {
        Self {
            property_name: name.into(),
            property_type,
            children: None,
            encrypted_property_value: None,
            samples: Vec::new(),
        }
    }

    /// Attach children.
    pub fn with_children(mut self, children: SchemaChildren) -> Self {
        self.children = Some(children);
        self
    }

    /// Attach a value sample used by value constraint checks.
    pub fn with_sample(mut self, value: &Value) -> Self {
        self.samples.push(SecretString::from(value.to_string()));
        self
    }

    pub(crate) fn set_samples(&mut self, samples: Vec<SecretString>) {
        self.samples = samples;
    }

    /// Decoded value samples. Empty when the node was deserialized from the wire.
    pub fn samples(&self) -> Vec<Value> {
        self.samples
            .iter()
            .filter_map(|s| serde_json::from_str(s.expose_secret()).ok())
            .collect()
    }

    /// Object properties, when this node is an object.
    pub fn properties(&self) -> Option<&[SchemaNode]> {
        match &self.children {
            Some(SchemaChildren::Properties(props)) => Some(props),
            _ => None,
        }
    }

    /// List element descriptors, when this node is a list.
    pub fn elements(&self) -> Option<&[SchemaChild]> {
        match &self.children {
            Some(SchemaChildren::Elements(items)) => Some(items),
            _ => None,
        }
    }
}

impl PartialEq for SchemaNode {
    fn eq(&self, other: &Self) -> bool {
        self.property_name == other.property_name
            && self.property_type == other.property_type
            && self.children == other.children
            && self.encrypted_property_value == other.encrypted_property_value
    }
}
