//! Watch paths until interrupted

use crate::output;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use pollwatch::{MatchMode, Registration, Watcher, WatcherConfig};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Flags of `pw watch`
#[derive(Debug, Default)]
pub struct WatchOptions {
    pub recursive: bool,
    pub initial: bool,
    pub json: bool,
    pub interval_ms: Option<u64>,
    pub glob: bool,
    pub excludes: Vec<String>,
    pub config: Option<PathBuf>,
}

pub async fn run(paths: &[PathBuf], options: WatchOptions) -> Result<()> {
    let config = build_config(&options)?;
    tracing::debug!("watch config: {:?}", config);
    let watcher = Watcher::with_config(config).context("Invalid watcher configuration")?;

    let mut watched = 0;
    for path in paths {
        if register(&watcher, path, &options)? {
            watched += 1;
        }
    }

    if watched == 0 {
        anyhow::bail!("None of the given paths exist");
    }

    eprintln!(
        "{} {} path(s) every {:?} (Ctrl-C to stop)",
        "Watching".green(),
        watched,
        watcher.poll_interval()
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    watcher.shutdown();
    eprintln!("{}", "Stopped".dimmed());
    Ok(())
}

/// Config file first, then command-line overrides
fn build_config(options: &WatchOptions) -> Result<WatcherConfig> {
    let mut config = match options.config {
        Some(ref path) => WatcherConfig::load(path)?,
        None => WatcherConfig::default(),
    };

    if let Some(interval_ms) = options.interval_ms {
        config.poll_interval_ms = interval_ms;
    }
    if options.glob {
        config.match_mode = MatchMode::Glob;
    }
    config.exclude.extend(options.excludes.iter().cloned());

    Ok(config)
}

fn register(watcher: &Watcher, path: &Path, options: &WatchOptions) -> Result<bool> {
    let json = options.json;
    let outcome = watcher
        .watch(path, options.recursive, options.initial, move |batch, initial| {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for entry in batch {
                let line = if json {
                    output::json_line(entry, initial)
                } else {
                    output::text_line(entry, initial)
                };
                let _ = writeln!(out, "{}", line);
            }
            let _ = out.flush();
        })
        .with_context(|| format!("Failed to watch {}", path.display()))?;

    match outcome {
        Registration::Added => Ok(true),
        Registration::AlreadyWatched => Ok(false),
        Registration::NotFound => {
            eprintln!("{} {}", "Not found:".yellow(), path.display());
            Ok(false)
        }
    }
}
