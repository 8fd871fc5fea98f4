//! Inspector CLI - infer, validate and track analytics event schemas.
//!
//! Responsibilities:
//! - Parse command-line arguments and environment variables.
//! - Run the schema pipeline of the shared client library.
//! - Format and display results as JSON or text.
//!
//! Does NOT handle:
//! - Schema inference, spec fetching or validation (see `crates/client`).
//!
//! Invariants:
//! - `load_dotenv()` is called BEFORE CLI parsing so `.env` can provide clap defaults.
//! - Offline commands (`schema`, `keygen`) never build a configuration.

mod args;
mod cancellation;
mod commands;
mod config_context;
mod dispatch;
mod error;
mod formatters;

use args::Cli;
use cancellation::{CancellationToken, is_cancelled_error, print_cancelled_message};
use clap::Parser;
use config_context::{ConfigCommandContext, build_config};
use dispatch::run_command;
use error::{ExitCode, ExitCodeExt};
use inspector_client::metrics_exporter::MetricsExporter;
use inspector_client::tracing::TracingConfig;
use inspector_config::ConfigLoader;

#[tokio::main]
async fn main() {
    if let Err(e) = ConfigLoader::new().load_dotenv() {
        eprintln!("Failed to load environment: {}", e);
        std::process::exit(ExitCode::ConfigError.as_i32());
    }

    let cli = Cli::parse();

    let mut tracing_config = TracingConfig::new().with_service_name("inspector-cli");
    if let Some(endpoint) = &cli.otlp_endpoint {
        tracing_config = tracing_config.with_otlp_endpoint(endpoint);
    }
    if cli.log_enabled {
        tracing_config = tracing_config.with_default_filter("inspector_client=debug,warn");
    }
    let tracing_guard = match tracing_config.init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize tracing: {}", e);
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    };

    let _metrics_exporter = match cli.metrics_bind.as_deref() {
        Some(bind_addr) => match MetricsExporter::install(bind_addr) {
            Ok(exporter) => {
                tracing::info!("Metrics exporter started on http://{}/metrics", exporter.bind_addr());
                Some(exporter)
            }
            Err(e) => {
                eprintln!("Failed to start metrics exporter: {}", e);
                std::process::exit(ExitCode::GeneralError.as_i32());
            }
        },
        None => None,
    };

    let config_context = if cli.command.needs_config() {
        match build_config(&cli) {
            Ok(config) => ConfigCommandContext::Real(Box::new(config)),
            Err(e) => {
                eprintln!("{:#}", e);
                tracing_guard.shutdown();
                std::process::exit(e.exit_code().as_i32());
            }
        }
    } else {
        ConfigCommandContext::Offline
    };

    let cancel = CancellationToken::new();
    cancel.cancel_on_ctrl_c();

    let exit_code = match run_command(cli, config_context, &cancel).await {
        Ok(()) => ExitCode::Success,
        Err(e) if is_cancelled_error(&e) => {
            print_cancelled_message();
            ExitCode::Interrupted
        }
        Err(e) => {
            eprintln!("{:#}", e);
            e.exit_code()
        }
    };

    tracing_guard.shutdown();
    std::process::exit(exit_code.as_i32());
}
