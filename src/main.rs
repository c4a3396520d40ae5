// file: src/main.rs
// version: 2.0.0
// guid: b8c9d0e1-f2a3-4456-8789-abcdef012345

//! kmachine - Main entry point

use clap::Parser;
use kmachine::{
    cli::{
        args::{Cli, Commands},
        commands::*,
    },
    logging::init_logger,
    Result,
};
use tokio::signal;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.verbose, cli.quiet)?;

    let storage = cli.storage_path();

    let shutdown_signal = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        warn!("Received Ctrl+C, aborting");
    };

    let command_future = async {
        match &cli.command {
            Commands::Provision { machine } => provision_command(&storage, machine).await,
            Commands::Env {
                machine,
                shell,
                unset,
                no_proxy,
            } => env_command(&storage, machine, shell.as_deref(), *unset, *no_proxy).await,
            Commands::Deploy { machine, kind } => {
                deploy_command(&storage, machine, (*kind).into()).await
            }
        }
    };

    tokio::select! {
        result = command_future => result,
        _ = shutdown_signal => {
            warn!("Interrupted; the remote host may be partially provisioned");
            std::process::exit(130);
        }
    }
}
