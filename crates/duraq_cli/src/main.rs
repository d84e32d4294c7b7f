//! duraq CLI
//!
//! Command-line tools for duraq channel maintenance.
//!
//! # Commands
//!
//! - `inspect` - Display channel statistics and a replay summary
//! - `verify` - Scan the log and report corruption
//! - `dump-log` - Print log records for debugging
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// duraq command-line channel tools.
#[derive(Parser)]
#[command(name = "duraq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the channel directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display channel statistics and a replay summary
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Scan the log and report corruption
    Verify,

    /// Print log records for debugging
    DumpLog {
        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Number of leading records to skip
        #[arg(short, long, default_value = "0")]
        skip: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Channel path required for inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Channel path required for verify")?;
            commands::verify::run(&path)?;
        }
        Commands::DumpLog {
            limit,
            skip,
            format,
        } => {
            let path = cli.path.ok_or("Channel path required for dump-log")?;
            commands::dump_log::run(&path, limit, skip, &format)?;
        }
        Commands::Version => {
            println!("duraq CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("duraq Core v{}", duraq_core::VERSION);
        }
    }

    Ok(())
}
