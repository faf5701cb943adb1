//! Aily - command-line client for Lark Aily assistants
//!
//! Main entry point for the Aily CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ask, config, messages, records};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Aily - command-line client for Lark Aily assistants
#[derive(Parser)]
#[command(name = "aily")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Server base URL (overrides the config file)
    #[arg(long, global = true, env = "AILY_BASE_URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a message to an assistant app and wait for its reply
    Ask(ask::AskArgs),

    /// List the messages of a session
    Messages(messages::MessagesArgs),

    /// Show remembered session keys
    Records(records::RecordsArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing: console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "aily=debug,aily_client=debug,aily_session=debug,aily_config=debug,info"
    } else {
        "aily=info,aily_client=warn,aily_session=warn,warn"
    };

    let log_dir = aily_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "aily.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "aily=trace,aily_client=trace,aily_session=trace,aily_config=trace,info",
                )),
        )
        .init();

    // Create context for commands
    let ctx = commands::Context {
        base_url: cli.base_url,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    // Dispatch to command handlers
    match cli.command {
        Commands::Ask(args) => ask::run(args, &ctx).await,
        Commands::Messages(args) => messages::run(args, &ctx).await,
        Commands::Records(args) => records::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
