//! Outbound event payload sent to the collector.

use serde::{Deserialize, Serialize};

use crate::event_spec::{EventSpecMetadata, ValidationError};
use crate::schema::SchemaNode;

/// Value of the `type` field on every event body.
pub const EVENT_BODY_TYPE: &str = "event";

/// One schema record as sent to `/inspector/v1/track`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSchemaBody {
    pub api_key: String,
    pub app_name: String,
    pub app_version: String,
    pub lib_version: String,
    pub lib_platform: String,
    pub env: String,
    pub message_id: String,
    pub created_at: String,
    pub session_id: String,
    pub anonymous_id: String,
    pub stream_id: String,
    pub sampling_rate: f64,
    #[serde(rename = "type")]
    pub body_type: String,
    pub event_name: String,
    pub event_properties: Vec<SchemaNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_spec_metadata: Option<EventSpecMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<ValidationError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
}

impl EventSchemaBody {
    /// Whether this body carries validation results.
    pub fn is_validated(&self) -> bool {
        self.event_spec_metadata.is_some()
    }
}
