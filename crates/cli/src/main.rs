//! Clementine CLI - management tools.
//!
//! # Usage
//!
//! ```bash
//! # Reconcile all identity-provider users into the database
//! clementine-cli sync-users
//! ```
//!
//! # Commands
//!
//! - `sync-users` - Run the shared user reconciliation service

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "clementine-cli")]
#[command(author, version, about = "Clementine CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync all identity-provider users into the database
    SyncUsers,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::SyncUsers => commands::sync::sync_users().await?,
    }
    Ok(())
}
