//! Out-of-band modification time updates

use crate::matcher::{has_wildcard, Matcher, PathPattern};
use filetime::{set_file_mtime, FileTime};
use std::ops::ControlFlow;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Set the modification time of `path`, or of every match when it holds a
/// wildcard. Returns how many paths were updated.
pub fn touch(matcher: &Matcher, path: &Path, recursive: bool, time: SystemTime) -> usize {
    let mtime = FileTime::from_system_time(time);

    if path.exists() {
        return usize::from(set_mtime(path, mtime));
    }

    if !has_wildcard(path) {
        warn!("path not found: {}", path.display());
        return 0;
    }

    let pattern = PathPattern::resolve(path);
    let mut touched = 0;
    matcher.expand(&pattern, recursive, true, |p| {
        if set_mtime(p, mtime) {
            touched += 1;
        }
        ControlFlow::Continue(())
    });
    touched
}

fn set_mtime(path: &Path, mtime: FileTime) -> bool {
    match set_file_mtime(path, mtime) {
        Ok(()) => true,
        Err(e) => {
            debug!("failed to set mtime on {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    fn an_hour_ago() -> SystemTime {
        // Whole seconds survive every filesystem's timestamp resolution
        let secs = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs - 3600)
    }

    #[test]
    fn test_touch_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.txt");
        fs::write(&file, b"a").unwrap();

        let when = an_hour_ago();
        assert_eq!(touch(&Matcher::default(), &file, false, when), 1);
        assert_eq!(mtime(&file), when);
    }

    #[test]
    fn test_touch_wildcard_matches() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.log");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();
        let before = mtime(&b);

        let when = an_hour_ago();
        let touched = touch(&Matcher::default(), &temp_dir.path().join("*.txt"), false, when);

        assert_eq!(touched, 1);
        assert_eq!(mtime(&a), when);
        assert_eq!(mtime(&b), before);
    }

    #[test]
    fn test_touch_wildcard_on_empty_dir_touches_dir() {
        let temp_dir = TempDir::new().unwrap();
        let when = an_hour_ago();

        let touched = touch(&Matcher::default(), &temp_dir.path().join("*.txt"), false, when);
        assert_eq!(touched, 1);
        assert_eq!(mtime(temp_dir.path()), when);
    }

    #[test]
    fn test_touch_recursive_wildcard_visits_empty_subdirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let a = root.join("a.txt");
        let nested = root.join("sub/b.txt");
        let empty = root.join("empty");
        let other = root.join("sub/c.log");
        fs::create_dir(root.join("sub")).unwrap();
        fs::create_dir(&empty).unwrap();
        fs::write(&a, b"a").unwrap();
        fs::write(&nested, b"b").unwrap();
        fs::write(&other, b"c").unwrap();
        let before = mtime(&other);

        let when = an_hour_ago();
        let touched = touch(&Matcher::default(), &root.join("*.txt"), true, when);

        assert_eq!(touched, 3);
        assert_eq!(mtime(&a), when);
        assert_eq!(mtime(&nested), when);
        assert_eq!(mtime(&empty), when);
        assert_eq!(mtime(&other), before);
    }

    #[test]
    fn test_touch_missing_path_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.txt");

        assert_eq!(touch(&Matcher::default(), &missing, false, SystemTime::now()), 0);
        assert!(!missing.exists());
    }
}
