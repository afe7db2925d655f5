//! CLI command definitions for the `bharat` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod ask;
pub mod key;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// India travel assistant backed by Gemini.
#[derive(Parser)]
#[command(name = "bharat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, env = "BHARAT_CONFIG", default_value = bharat_infra::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Port to listen on (overrides config).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Ask a single question and print the reply.
    Ask {
        /// The message to send.
        message: String,

        /// Traveller role (Tourist, Travel Agent, Local Guide, Backpacker).
        #[arg(short, long)]
        role: Option<String>,

        /// Session id; defaults to the shared session.
        #[arg(short, long)]
        session: Option<String>,

        /// Model id (overrides config).
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Check the configured API key against the upstream API.
    #[command(name = "validate-key")]
    ValidateKey,
}
