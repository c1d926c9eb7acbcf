//! Screen recorder CLI entry point

use std::process::ExitCode;

use clap::Parser;

use screen_recorder::cli::{
    app::{init_logging, load_merged_config, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands, RecorderOptions},
    config_cmd::handle_config_command,
    control_cmd::handle_ctl_command,
    presenter::Presenter,
    recorder_app::run_recorder,
};
use screen_recorder::domain::config::AppConfig;
use screen_recorder::domain::error::ConfigError;
use screen_recorder::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();
    let store = XdgConfigStore::new();
    let overrides = cli.config_overrides();

    // Handle subcommands
    match cli.command {
        Some(Commands::Config { action }) => {
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                let code = match e {
                    ConfigError::ValidationError { .. } => EXIT_USAGE_ERROR,
                    _ => EXIT_ERROR,
                };
                return ExitCode::from(code);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Ctl { action }) => {
            init_logging(AppConfig::defaults().log_level_or_default());
            if let Err(e) = handle_ctl_command(action, &presenter).await {
                presenter.error(&e);
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        None => {}
    }

    let config = match load_merged_config(&store, overrides).await {
        Ok(config) => config,
        Err(e) => {
            presenter.error(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };
    init_logging(config.log_level_or_default());
    tracing::debug!(?config, "configuration loaded");

    run_recorder(RecorderOptions::from_config(&config)).await
}
