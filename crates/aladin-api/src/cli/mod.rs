//! CLI command definitions and dispatch for the `aladin` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod chat;
pub mod config;
pub mod models;
pub mod secret;
pub mod usage;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Talk to hosted or local LLM providers under a daily token budget.
#[derive(Parser)]
#[command(name = "aladin", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true, env = "ALADIN_LOG_JSON")]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "ALADIN_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one message to the configured provider.
    Chat {
        /// Message text.
        message: String,
    },

    /// Show the model the configured provider will use.
    Model,

    /// List models offered by the configured provider.
    Models,

    /// Check whether the configured provider is reachable.
    Ping,

    /// Validate the stored credential (or one given on the command line).
    Validate {
        /// Key to validate instead of the stored one.
        #[arg(long)]
        key: Option<String>,
    },

    /// Show today's token usage.
    Usage {
        #[command(subcommand)]
        action: Option<UsageAction>,
    },

    /// Manage provider credentials.
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },

    /// Inspect the gateway configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum UsageAction {
    /// Zero today's token count.
    Reset,
}

#[derive(Subcommand)]
pub enum SecretAction {
    /// Store a credential in the OS keychain.
    Set {
        /// Provider id (defaults to the configured family).
        #[arg(long)]
        provider: Option<String>,

        /// Secret value (prompted if not provided).
        #[arg(long)]
        value: Option<String>,
    },

    /// Show a masked credential and where it resolves from.
    Show {
        /// Provider id (defaults to the configured family).
        #[arg(long)]
        provider: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration.
    Show,
}
