//! Testing utilities for inspector client tests.
//!
//! Fixture loading, a recording [`EventTransport`], log capture and sample
//! payloads.
//! Available when running tests or when the `test-utils` feature is enabled.
//!
//! ```ignore
//! use inspector_client::testing::{RecordingTransport, load_fixture};
//!
//! let spec = load_fixture("event_spec/checkout.json");
//! let transport = RecordingTransport::new().failing_immediate();
//! ```

#[cfg(feature = "test-utils")]
pub mod generators;

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{ClientError, Result};
use crate::models::{EVENT_BODY_TYPE, EventSchemaBody};
use crate::transport::EventTransport;

/// Load a JSON fixture file from the crate's `fixtures/` directory.
///
/// # Panics
/// If the file cannot be read or is not valid JSON.
pub fn load_fixture(fixture_path: &str) -> serde_json::Value {
    let full_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(fixture_path);
    let content = std::fs::read_to_string(&full_path)
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", full_path.display()));
    serde_json::from_str(&content).expect("Invalid JSON in fixture")
}

/// Captures formatted log output on the current thread until dropped.
///
/// Under a current-thread tokio runtime this includes tasks spawned by the
/// code under test.
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    _guard: tracing::subscriber::DefaultGuard,
}

impl LogCapture {
    pub fn install() -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer = CaptureWriter(Arc::clone(&buffer));
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        Self {
            buffer,
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    pub fn contents(&self) -> String {
        let bytes = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[derive(Clone)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Minimal event body for transport tests.
pub fn sample_body(event_name: &str) -> EventSchemaBody {
    EventSchemaBody {
        api_key: "test-api-key".to_string(),
        app_name: "test-app".to_string(),
        app_version: "1.0.0".to_string(),
        lib_version: env!("CARGO_PKG_VERSION").to_string(),
        lib_platform: "rust".to_string(),
        env: "dev".to_string(),
        message_id: format!("msg-{}", event_name),
        created_at: "2026-01-01T00:00:00.000Z".to_string(),
        session_id: "session".to_string(),
        anonymous_id: "anon".to_string(),
        stream_id: "anon".to_string(),
        sampling_rate: 1.0,
        body_type: EVENT_BODY_TYPE.to_string(),
        event_name: event_name.to_string(),
        event_properties: Vec::new(),
        event_spec_metadata: None,
        validation_errors: None,
        event_id: None,
        variant_id: None,
    }
}

/// Transport that records every send instead of talking to the network.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    fail_immediate: bool,
    fail_batch: bool,
    immediate: Mutex<Vec<EventSchemaBody>>,
    batches: Mutex<Vec<Vec<EventSchemaBody>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `send_immediate` fail after recording.
    pub fn failing_immediate(mut self) -> Self {
        self.fail_immediate = true;
        self
    }

    /// Make `send_batch` fail after recording.
    pub fn failing_batch(mut self) -> Self {
        self.fail_batch = true;
        self
    }

    pub fn immediate(&self) -> Vec<EventSchemaBody> {
        self.immediate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn batches(&self) -> Vec<Vec<EventSchemaBody>> {
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// All batched bodies, flattened.
    pub fn batched(&self) -> Vec<EventSchemaBody> {
        self.batches().into_iter().flatten().collect()
    }
}

#[async_trait]
impl EventTransport for RecordingTransport {
    async fn send_batch(&self, events: Vec<EventSchemaBody>) -> Result<()> {
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(events);
        if self.fail_batch {
            return Err(ClientError::InvalidResponse("batch send failed".to_string()));
        }
        Ok(())
    }

    async fn send_immediate(&self, event: EventSchemaBody) -> Result<()> {
        self.immediate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
        if self.fail_immediate {
            return Err(ClientError::InvalidResponse(
                "immediate send failed".to_string(),
            ));
        }
        Ok(())
    }
}
