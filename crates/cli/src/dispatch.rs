//! Command dispatch logic.
//!
//! Responsibilities:
//! - Route parsed CLI arguments to the command handlers.
//! - Hand each command its configuration, output target and cancellation token.
//!
//! Does NOT handle:
//! - CLI structure definitions (see `args` module).
//! - Configuration loading (see `main()` and `config_context`).

use anyhow::Result;

use crate::args::{Cli, Commands};
use crate::cancellation::CancellationToken;
use crate::commands::{self, OutputTarget, validate::ValidateArgs};
use crate::config_context::{ConfigCommandContext, encryption_context};

/// Dispatch CLI commands to their respective handlers.
pub(crate) async fn run_command(
    cli: Cli,
    config: ConfigCommandContext,
    cancel_token: &CancellationToken,
) -> Result<()> {
    let target = OutputTarget::new(&cli.output, cli.output_file.clone())?;
    let storage_path = cli.storage_path.as_deref();

    match &cli.command {
        Commands::Schema { input } => {
            let encryption = encryption_context(&cli)?;
            commands::schema::run(input, encryption, &target)?;
        }
        Commands::Keygen => {
            commands::keygen::run(&target)?;
        }
        Commands::FetchSpec { event, stream_id } => {
            let config = config.into_real_config()?;
            commands::fetch_spec::run(
                config,
                storage_path,
                event,
                stream_id.clone(),
                &target,
                cancel_token,
            )
            .await?;
        }
        Commands::Validate {
            event,
            stream_id,
            strict,
            input,
        } => {
            let config = config.into_real_config()?;
            let args = ValidateArgs {
                event,
                stream_id: stream_id.clone(),
                strict: *strict,
                input,
            };
            commands::validate::run(config, storage_path, args, &target, cancel_token).await?;
        }
        Commands::Track {
            event,
            stream_id,
            input,
        } => {
            let config = config.into_real_config()?;
            commands::track::run(
                config,
                storage_path,
                event,
                stream_id.clone(),
                input,
                &target,
                cancel_token,
            )
            .await?;
        }
    }

    Ok(())
}
