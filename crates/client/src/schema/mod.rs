//! Schema inference for event properties.
//!
//! Responsibilities:
//! - Map arbitrary JSON values to a tree of [`SchemaNode`]s.
//! - Type lists by their first element and deduplicate primitive element tags.
//! - Attach ciphertext to primitive leaves when encryption is active.
//!
//! Does NOT handle:
//! - Validation against tracking plan rules (see [`crate::event_spec`]).
//!
//! Invariants:
//! - Inference is pure: the same input always yields an equal schema.
//! - Container nodes never carry ciphertext.
//! - Value samples are kept in memory only and never serialized.

mod parser;
mod types;

pub use parser::{SchemaParser, extract_schema};
pub use types::{ParseSchemaTypeError, SchemaChild, SchemaChildren, SchemaNode, SchemaType};
