//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Jangbu - Household ledger for Korean bank and card statements
#[derive(Parser)]
#[command(name = "jangbu")]
#[command(about = "Self-hosted household ledger with CSV statement imports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "jangbu.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Import a statement CSV from the command line
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Account bucket for a bank statement (e.g. 생활비)
        #[arg(short, long, conflicts_with = "card_holder")]
        account_type: Option<String>,

        /// Import as a card statement for this holder
        #[arg(long)]
        card_holder: Option<String>,

        /// Card payment type: 일시불 or 할부
        #[arg(long, default_value = "일시불", requires = "card_holder")]
        payment_type: String,
    },

    /// Show ledger status (row counts, months, accounts)
    Status,
}
