//! Jangbu CLI - Household ledger
//!
//! Usage:
//!   jangbu serve --port 3000                 Start the web server
//!   jangbu import --file bank.csv --account-type 생활비
//!   jangbu import --file card.csv --card-holder 철수
//!   jangbu status                            Show ledger status

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Serve { port, host } => commands::cmd_serve(&cli.db, &host, port).await,
        Commands::Import {
            file,
            account_type,
            card_holder,
            payment_type,
        } => commands::cmd_import(
            &cli.db,
            &file,
            account_type.as_deref(),
            card_holder.as_deref(),
            &payment_type,
        ),
        Commands::Status => commands::cmd_status(&cli.db),
    }
}
