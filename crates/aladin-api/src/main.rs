//! Aladin CLI entry point.
//!
//! Binary name: `aladin`
//!
//! Parses CLI arguments, loads config and usage from the data directory,
//! then dispatches to the command handler.

mod cli;
mod state;

use std::process::ExitCode;

use clap::Parser;
use clap_complete::generate;

use aladin_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing, verbosity_filter};
use cli::{Cli, Commands, ConfigAction, SecretAction, UsageAction};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(&TracingOptions {
        filter: verbosity_filter(cli.verbose, cli.quiet).to_string(),
        json: cli.log_json,
        enable_otel: cli.otel,
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "aladin", &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let state = AppState::init().await?;
    let outcome = run(&state, cli).await;

    state.shutdown();
    shutdown_tracing();

    let ok = outcome?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn run(state: &AppState, cli: Cli) -> anyhow::Result<bool> {
    let json = cli.json;

    match cli.command {
        Commands::Chat { message } => cli::chat::chat(state, &message, json).await,
        Commands::Model => cli::models::current_model(state, json).await.map(|()| true),
        Commands::Models => cli::models::list_models(state, json).await.map(|()| true),
        Commands::Ping => cli::models::ping(state, json).await,
        Commands::Validate { key } => cli::models::validate(state, key.as_deref(), json).await,
        Commands::Usage { action } => match action {
            None => cli::usage::show_usage(state, json).await.map(|()| true),
            Some(UsageAction::Reset) => cli::usage::reset_usage(state, json).await.map(|()| true),
        },
        Commands::Secret { action } => match action {
            SecretAction::Set { provider, value } => {
                cli::secret::set_secret(state, provider.as_deref(), value.as_deref(), json)
                    .await
                    .map(|()| true)
            }
            SecretAction::Show { provider } => {
                cli::secret::show_secret(state, provider.as_deref(), json)
                    .await
                    .map(|()| true)
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::config::show_config(state, json).await.map(|()| true),
        },
        Commands::Completions { .. } => Ok(true),
    }
}
