//! Command-line front end for hoard snapshots.

mod commands;
mod error;

use crate::commands::{CreateArgs, RestoreArgs, Session, ValidateArgs};
use crate::error::{ErrorKind, Result};
use clap::{Parser, Subcommand};
use exn::ResultExt;
use hoard_config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hoard", version, about = "Snapshot and restore a manga and anime library")]
struct Cli {
    /// Extra configuration file, layered over the platform defaults
    #[arg(long, global = true, env = "HOARD_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Capture the libraries into a snapshot file
    Create(CreateArgs),
    /// Merge a snapshot file into the libraries
    Restore(RestoreArgs),
    /// Check a snapshot file against the installed sources
    Validate(ValidateArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(e.exit_status())
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let session = Session::open(&config).await?;
    let outcome = match cli.command {
        Command::Create(args) => commands::create(&config, &session, args).await,
        Command::Restore(args) => commands::restore(&session, args).await,
        Command::Validate(args) => commands::validate_file(&session, args).await,
    };
    session.close().await;
    outcome
}
