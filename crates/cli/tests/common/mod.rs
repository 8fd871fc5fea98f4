//! Shared test utilities for inspector CLI integration tests.
//!
//! Responsibilities:
//! - Provide a hermetic CLI command factory that prevents dotenv loading.
//! - Point the CLI at a mock server for both the collector and the spec service.
//!
//! Invariants / Assumptions:
//! - `INSPECTOR_API_KEY` is set to "test-api-key" unless removed by the test.
//! - Every other `INSPECTOR_*` variable is cleared to avoid host leakage.

use assert_cmd::Command;

#[allow(unused_imports)]
pub use inspector_client::testing::load_fixture;

pub const SPEC_PATH: &str = "/trackingPlan/eventSpec";
#[allow(dead_code)]
pub const TRACK_PATH: &str = "/inspector/v1/track";

const HOST_VARS: &[&str] = &[
    "INSPECTOR_ENV",
    "INSPECTOR_APP_NAME",
    "INSPECTOR_PUBLIC_ENCRYPTION_KEY",
    "INSPECTOR_ENDPOINT",
    "INSPECTOR_SPEC_BASE_URL",
    "INSPECTOR_SPEC_FETCH_TIMEOUT_MS",
    "INSPECTOR_TIMEOUT",
    "INSPECTOR_MAX_RETRIES",
    "INSPECTOR_SAMPLING_RATE",
    "INSPECTOR_SESSION_TIMEOUT",
    "INSPECTOR_LOG_ENABLED",
    "INSPECTOR_STORAGE_PATH",
    "INSPECTOR_METRICS_BIND",
    "INSPECTOR_OTLP_ENDPOINT",
];

/// Returns a hermetic `inspector` command for integration testing.
pub fn inspector_cmd() -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("inspector");

    cmd.env("DOTENV_DISABLED", "1");
    cmd.env("INSPECTOR_API_KEY", "test-api-key");
    cmd.env("INSPECTOR_APP_VERSION", "1.0.0");
    for var in HOST_VARS {
        cmd.env_remove(var);
    }

    cmd
}

/// Returns a hermetic command with the collector and spec service at `server_uri`.
#[allow(dead_code)]
pub fn inspector_cmd_with_server(server_uri: &str) -> Command {
    let mut cmd = inspector_cmd();
    cmd.env("INSPECTOR_ENDPOINT", server_uri)
        .env("INSPECTOR_SPEC_BASE_URL", server_uri)
        .env("INSPECTOR_SPEC_FETCH_TIMEOUT_MS", "2000");
    cmd
}

/// Path of a client fixture file.
#[allow(dead_code)]
pub fn fixture_path(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../client/fixtures")
        .join(name)
}
