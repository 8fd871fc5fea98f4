//! Track command implementation.

use std::path::Path;

use anyhow::Result;
use inspector_config::InspectorConfig;
use tracing::info;

use super::{OutputTarget, build_inspector, read_payload};
use crate::cancellation::{CancellationToken, Cancelled};

pub async fn run(
    config: InspectorConfig,
    storage_path: Option<&Path>,
    event: &str,
    stream_id: Option<String>,
    input: &Path,
    target: &OutputTarget,
    cancel: &CancellationToken,
) -> Result<()> {
    let payload = read_payload(input)?;
    let inspector = build_inspector(config, storage_path)?;
    if stream_id.is_some() {
        inspector.identity().set_stream_id(stream_id);
    }

    let report = tokio::select! {
        report = inspector.track_schema_from_event(event, &payload) => report,
        _ = cancel.cancelled() => return Err(Cancelled.into()),
    };
    info!(event, "Tracked event schema");

    let output = target.formatter().format_report(&report)?;
    target.emit(&output)
}
