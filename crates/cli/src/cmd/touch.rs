//! Touch paths or wildcard matches

use anyhow::Result;
use owo_colors::OwoColorize;
use pollwatch::Watcher;
use std::path::Path;

pub async fn run(path: &Path, recursive: bool) -> Result<()> {
    let watcher = Watcher::new();
    let touched = watcher.touch(path, recursive);

    if touched == 0 {
        anyhow::bail!("Nothing to touch at {}", path.display());
    }

    println!("{} {} path(s)", "Touched".green(), touched);
    Ok(())
}
