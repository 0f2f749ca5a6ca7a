//! Pollwatch CLI - pw command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

/// Pollwatch - portable polling file watcher
#[derive(Parser)]
#[command(name = "pw")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch files, directories or `dir/*.ext` patterns and print changes
    Watch {
        /// Paths or patterns to watch (quote wildcards)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Expand wildcard patterns in subdirectories too
        #[arg(short, long)]
        recursive: bool,

        /// Print the entries present at startup
        #[arg(long)]
        initial: bool,

        /// Print one JSON object per entry
        #[arg(long)]
        json: bool,

        /// Poll interval in milliseconds (default: 500)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Anchored glob matching instead of substring matching
        #[arg(long)]
        glob: bool,

        /// Gitignore-style pattern to skip during expansion (repeatable)
        #[arg(long = "exclude", value_name = "PATTERN")]
        excludes: Vec<String>,

        /// TOML config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Set the modification time of a path or of every wildcard match to now
    Touch {
        /// Path or pattern
        path: PathBuf,

        /// Expand wildcard patterns in subdirectories too
        #[arg(short, long)]
        recursive: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout carries change output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Watch { paths, recursive, initial, json, interval_ms, glob, excludes, config } => {
            let options = cmd::watch::WatchOptions {
                recursive,
                initial,
                json,
                interval_ms,
                glob,
                excludes,
                config,
            };
            cmd::watch::run(&paths, options).await
        }
        Commands::Touch { path, recursive } => cmd::touch::run(&path, recursive).await,
    }
}
