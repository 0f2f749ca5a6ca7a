//! Change line formatting

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use pollwatch::{Entry, EntryKind, EntryStatus};
use serde_json::json;

/// Human-readable line for one entry
pub fn text_line(entry: &Entry, initial: bool) -> String {
    let status = match entry.status {
        EntryStatus::Created if initial => "present".dimmed().to_string(),
        EntryStatus::Created => "created".green().to_string(),
        EntryStatus::Modified => "modified".yellow().to_string(),
        EntryStatus::Removed => "removed".red().to_string(),
        EntryStatus::Renamed => "renamed".cyan().to_string(),
        EntryStatus::Unmodified => "unmodified".dimmed().to_string(),
    };

    let path = if entry.status == EntryStatus::Renamed {
        format!("{} -> {}", entry.last_path.display(), entry.path.display())
    } else {
        entry.path.display().to_string()
    };

    format!("{} {:<9} {:<4} {}", timestamp(entry), status, kind_tag(entry.kind), path)
}

/// JSON object for one entry
pub fn json_line(entry: &Entry, initial: bool) -> String {
    json!({
        "initial": initial,
        "status": entry.status,
        "kind": entry.kind,
        "path": entry.path,
        "last_path": entry.last_path,
        "size": entry.size,
        "modified": entry.last_mod_time.map(|t| DateTime::<Local>::from(t).to_rfc3339()),
    })
    .to_string()
}

fn kind_tag(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::RegularFile => "file",
        EntryKind::Directory => "dir",
        EntryKind::Other => "other",
        EntryKind::Unknown => "?",
    }
}

fn timestamp(entry: &Entry) -> String {
    match entry.last_mod_time {
        Some(time) => DateTime::<Local>::from(time).format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}
