//! driveinvite CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use driveinvite_core::{TracingConfig, init_tracing};

use driveinvite_client::cli::{Cli, Command, ConfigAction};
use driveinvite_client::commands;
use driveinvite_client::config::AppConfig;
use driveinvite_client::error::{ClientError, ClientResult};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(TracingConfig::cli(cli.debug)) {
        eprintln!("warning: logging disabled: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = if cli.config.is_some() {
        AppConfig::load_from(&config_path).map_err(ClientError::Config)?
    } else {
        AppConfig::load().map_err(ClientError::Config)?
    };

    match cli.command {
        Command::Auth {
            client_id,
            client_secret,
            credentials_file,
            force,
        } => {
            commands::auth::run(
                client_id,
                client_secret,
                credentials_file,
                force,
                &config,
                &config_path,
            )
            .await
        }
        Command::Sync { folder, parent } => commands::sync::run(&folder, parent, &config).await,
        Command::Send(args) => commands::send::run(args, &config).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
