//! Schema command implementation.

use std::path::Path;

use anyhow::Result;
use inspector_client::{EncryptionContext, extract_schema};
use tracing::debug;

use super::{OutputTarget, read_payload};

pub fn run(input: &Path, encryption: Option<EncryptionContext>, target: &OutputTarget) -> Result<()> {
    let payload = read_payload(input)?;
    let schema = extract_schema(&payload, encryption.as_ref());
    debug!(properties = schema.len(), "Inferred event schema");

    let output = target.formatter().format_schema(&schema)?;
    target.emit(&output)
}
