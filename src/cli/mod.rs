//! CLI module for the council server
//!
//! Provides command-line interface parsing and handling for the
//! council-server binary. Uses clap for argument parsing and owo-colors for
//! colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// council-server - Quad-Swarm Advisory Council
///
/// An advisory council server: one problem statement fanned out to four
/// retrieval-augmented perspectives, synthesized into a single two-path
/// verdict.
#[derive(Parser, Debug)]
#[command(
    name = "council-server",
    version,
    about = "Quad-Swarm Advisory Council server",
    long_about = "An advisory council server: one problem statement fanned out to four\n\
                  retrieval-augmented perspectives, each grounded in a knowledge store of\n\
                  practitioner wisdom, synthesized into a single two-path verdict.\n\n\
                  Run without arguments to start the server (requires council.toml).",
    after_help = "EXAMPLES:\n    \
                  council-server                       # Start the server (requires council.toml)\n    \
                  council-server --config my.toml      # Use a custom config file\n    \
                  council-server --port 9000           # Override the configured port\n    \
                  council-server config --validate     # Validate the configuration file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "council.toml", global = true)]
    pub config: PathBuf,

    /// Override the configured listen host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the configured listen port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show configuration information
    Config {
        /// Validate the configuration file and exit
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
