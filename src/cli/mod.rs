//! CLI module for the Grounded QA Gateway
//!
//! - `serve`: run the HTTP server
//! - `ask`: answer one question from the terminal
//! - `sweep`: show how many chunks survive each similarity threshold

pub mod ask;
pub mod sweep;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

/// Grounded QA Gateway - cited answers from a curated corpus
#[derive(Parser)]
#[command(name = "grounded-qa-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Ask a single question and print the cited answer
    Ask(ask::AskArgs),

    /// Run one query at a ladder of similarity thresholds
    Sweep(sweep::SweepArgs),
}

/// Read `.env` and the layered configuration
pub(crate) fn load_config() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load()?;
    config.validate()?;
    Ok(config)
}
