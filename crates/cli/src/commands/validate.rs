//! Validate command implementation.

use std::path::Path;

use anyhow::Result;
use inspector_config::InspectorConfig;

use super::{OutputTarget, build_inspector, read_payload};
use crate::cancellation::{CancellationToken, Cancelled};

pub struct ValidateArgs<'a> {
    pub event: &'a str,
    pub stream_id: Option<String>,
    pub strict: bool,
    pub input: &'a Path,
}

pub async fn run(
    config: InspectorConfig,
    storage_path: Option<&Path>,
    args: ValidateArgs<'_>,
    target: &OutputTarget,
    cancel: &CancellationToken,
) -> Result<()> {
    let payload = read_payload(args.input)?;
    let inspector = build_inspector(config, storage_path)?;
    if args.stream_id.is_some() {
        inspector.identity().set_stream_id(args.stream_id);
    }

    let result = tokio::select! {
        result = inspector.validate(args.event, &payload) => result,
        _ = cancel.cancelled() => return Err(Cancelled.into()),
    };

    let output = target.formatter().format_validation(result.as_ref())?;
    target.emit(&output)?;

    if args.strict
        && let Some(result) = &result
        && !result.is_valid()
    {
        anyhow::bail!(
            "Event '{}' failed validation with {} error(s)",
            args.event,
            result.errors.len()
        );
    }
    Ok(())
}
