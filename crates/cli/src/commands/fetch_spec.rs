//! Fetch-spec command implementation.

use std::path::Path;

use anyhow::Result;
use inspector_config::InspectorConfig;
use tracing::info;

use super::{OutputTarget, build_inspector};
use crate::cancellation::{CancellationToken, Cancelled};

pub async fn run(
    config: InspectorConfig,
    storage_path: Option<&Path>,
    event: &str,
    stream_id: Option<String>,
    target: &OutputTarget,
    cancel: &CancellationToken,
) -> Result<()> {
    let inspector = build_inspector(config, storage_path)?;
    if !inspector.fetcher().is_enabled() {
        info!("Spec fetching is disabled outside dev and staging");
    }

    let stream_id = stream_id.unwrap_or_else(|| inspector.identity().stream_id());
    let spec = tokio::select! {
        spec = inspector.lookup_spec(event, &stream_id) => spec,
        _ = cancel.cancelled() => return Err(Cancelled.into()),
    };

    let output = target.formatter().format_spec(spec.as_ref())?;
    target.emit(&output)
}
