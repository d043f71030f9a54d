//! # referral
//!
//! Operator CLI for the referral program engine.
//!
//! This binary provides:
//! - **rule** inspection, admin mutation and audit history
//! - **code** issuance, redemption-time validation and redemption
//! - **account** registration for the bundled account directory
//!
//! Results are printed as JSON on stdout; failures print the public error
//! message on stderr and exit non-zero.

mod commands;
mod config;
mod error;

use referral_shared::context::Context;
use referral_store::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::commands::Command;
use crate::config::CliConfig;
use crate::error::CliError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,referral_engine=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    // -----------------------------------------------------------------------
    // 2. Load configuration and parse the command
    // -----------------------------------------------------------------------
    let config = CliConfig::from_env();
    tracing::debug!(?config, "Loaded configuration");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => exit_with(e),
    };

    // -----------------------------------------------------------------------
    // 3. Run against the store off the async runtime
    // -----------------------------------------------------------------------
    let result = tokio::task::spawn_blocking(move || run(&config, &command)).await?;

    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => exit_with(e),
    }
}

fn run(config: &CliConfig, command: &Command) -> Result<serde_json::Value, CliError> {
    let db = match &config.database_path {
        Some(path) => {
            info!(path = %path.display(), "opening database");
            Database::open_at(path, config.busy_timeout)?
        }
        None => Database::new(config.busy_timeout)?,
    };

    let ctx = match config.request_timeout {
        Some(timeout) => Context::background().with_timeout(timeout),
        None => Context::background(),
    };

    command.execute(&db, &ctx)
}

fn exit_with(err: CliError) -> ! {
    match &err {
        CliError::Engine(e) if e.kind() == referral_engine::ErrorKind::Internal => {
            tracing::error!(error = %e, "command failed");
        }
        CliError::Engine(referral_engine::EngineError::CodeGenerationExhausted { .. }) => {
            tracing::error!(error = %err, "referral code space exhausted");
        }
        CliError::Store(e) => tracing::error!(error = %e, "storage failure"),
        _ => {}
    }
    eprintln!("error: {}", err.user_message());
    std::process::exit(err.exit_code());
}
