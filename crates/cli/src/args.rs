//! CLI argument definitions and parsing.
//!
//! Responsibilities:
//! - Define the CLI structure using clap derive macros.
//! - Bind global options to `INSPECTOR_*` environment variables.
//!
//! Non-responsibilities:
//! - Does not execute commands (see `dispatch` module).
//! - Does not build the SDK configuration (see `config_context` module).

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use inspector_config::Environment;

#[derive(Parser, Debug)]
#[command(name = "inspector")]
#[command(
    about = "Infer, validate and track analytics event schemas against a tracking plan",
    long_about = None
)]
#[command(version)]
#[command(
    after_help = "Examples:\n  inspector schema event.json\n  cat event.json | inspector validate --event 'Checkout Completed' -\n  inspector --env staging track --event Signup signup.json\n  inspector keygen\n"
)]
pub struct Cli {
    /// Api key identifying the tracking-plan source
    #[arg(short = 'k', long, global = true, env = "INSPECTOR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Runtime environment (dev, staging, prod)
    #[arg(short, long, global = true, env = "INSPECTOR_ENV")]
    pub env: Option<Environment>,

    /// Application name attached to schema records
    #[arg(long, global = true, env = "INSPECTOR_APP_NAME")]
    pub app_name: Option<String>,

    /// Application version attached to schema records
    #[arg(long, global = true, env = "INSPECTOR_APP_VERSION")]
    pub app_version: Option<String>,

    /// Hex-encoded 256-bit key for property value encryption (dev/staging only)
    #[arg(
        long,
        global = true,
        env = "INSPECTOR_PUBLIC_ENCRYPTION_KEY",
        hide_env_values = true
    )]
    pub public_encryption_key: Option<String>,

    /// Collector endpoint receiving schema records
    #[arg(long, global = true, env = "INSPECTOR_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Base URL of the event spec service
    #[arg(long, global = true, env = "INSPECTOR_SPEC_BASE_URL")]
    pub spec_base_url: Option<String>,

    /// Upper bound for one spec lookup, in milliseconds
    #[arg(long, global = true, env = "INSPECTOR_SPEC_FETCH_TIMEOUT_MS")]
    pub spec_fetch_timeout_ms: Option<u64>,

    /// Collector request timeout in seconds
    #[arg(long, global = true, env = "INSPECTOR_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Maximum number of retries for collector requests
    #[arg(long, global = true, env = "INSPECTOR_MAX_RETRIES")]
    pub max_retries: Option<usize>,

    /// Persist identity values in this JSON file instead of memory
    #[arg(long, global = true, env = "INSPECTOR_STORAGE_PATH", value_name = "FILE")]
    pub storage_path: Option<PathBuf>,

    /// Emit spec pipeline diagnostics (cache, fetch, validation) at debug level
    #[arg(long, global = true)]
    pub log_enabled: bool,

    /// Output format (json, compact, text)
    #[arg(short, long, global = true, default_value = "json")]
    pub output: String,

    /// Output file path (saves results to file instead of stdout)
    #[arg(long, global = true, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long, global = true, env = "INSPECTOR_METRICS_BIND", value_name = "ADDR")]
    pub metrics_bind: Option<String>,

    /// OTLP endpoint for trace export (e.g. http://localhost:4317)
    #[arg(long, global = true, env = "INSPECTOR_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the inferred schema of a JSON event payload
    Schema {
        /// JSON file with event properties, or `-` for stdin
        input: PathBuf,
    },

    /// Fetch and print the tracking plan spec for an event
    FetchSpec {
        /// Event name to look up
        #[arg(long)]
        event: String,

        /// Stream id (defaults to the anonymous id)
        #[arg(long)]
        stream_id: Option<String>,
    },

    /// Validate a JSON event payload against the tracking plan
    Validate {
        /// Event name to validate as
        #[arg(long)]
        event: String,

        /// Stream id (defaults to the anonymous id)
        #[arg(long)]
        stream_id: Option<String>,

        /// Exit with an error when validation reports any issue
        #[arg(long)]
        strict: bool,

        /// JSON file with event properties, or `-` for stdin
        input: PathBuf,
    },

    /// Track a JSON event payload through the full pipeline
    Track {
        /// Event name to track
        #[arg(long)]
        event: String,

        /// Stream id (defaults to the anonymous id)
        #[arg(long)]
        stream_id: Option<String>,

        /// JSON file with event properties, or `-` for stdin
        input: PathBuf,
    },

    /// Generate a hex-encoded value encryption key
    Keygen,
}

impl Commands {
    /// Whether the command needs a full SDK configuration (api key and endpoints).
    pub fn needs_config(&self) -> bool {
        !matches!(self, Commands::Schema { .. } | Commands::Keygen)
    }
}
