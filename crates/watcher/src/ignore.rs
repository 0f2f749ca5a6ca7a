//! Exclude rules for wildcard expansion
//!
//! Patterns use gitignore syntax and are evaluated against paths relative
//! to the root of the watch being expanded, so one rule set serves every
//! watch of an engine.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use pollwatch_core::{Result, WatchError};
use std::path::Path;

/// Compiled exclude patterns
#[derive(Debug, Clone)]
pub struct ExcludeRules {
    /// `None` when no patterns are configured
    gitignore: Option<Gitignore>,
}

impl ExcludeRules {
    /// Rules that exclude nothing
    pub fn none() -> Self {
        Self { gitignore: None }
    }

    /// Compile gitignore-syntax patterns
    pub fn new(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self::none());
        }

        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| WatchError::InvalidExclude {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
        }

        let gitignore = builder.build().map_err(|e| WatchError::InvalidExclude {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })?;

        Ok(Self {
            gitignore: Some(gitignore),
        })
    }

    /// Check if `relative` (a path below a watch root) is excluded
    pub fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        match self.gitignore {
            Some(ref gitignore) => gitignore.matched(relative, is_dir).is_ignore(),
            None => false,
        }
    }

    /// Number of compiled patterns
    pub fn len(&self) -> usize {
        self.gitignore.as_ref().map_or(0, |g| g.num_ignores() as usize)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ExcludeRules {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(patterns: &[&str]) -> ExcludeRules {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        ExcludeRules::new(&patterns).unwrap()
    }

    #[test]
    fn test_no_patterns_excludes_nothing() {
        let rules = ExcludeRules::none();
        assert!(rules.is_empty());
        assert!(!rules.is_excluded(Path::new("target"), true));
        assert!(!rules.is_excluded(Path::new("a.swp"), false));
    }

    #[test]
    fn test_basename_patterns() {
        let rules = rules(&["*.swp", "target/"]);
        assert_eq!(rules.len(), 2);

        assert!(rules.is_excluded(Path::new("notes.swp"), false));
        assert!(rules.is_excluded(Path::new("sub/notes.swp"), false));
        assert!(rules.is_excluded(Path::new("target"), true));
        assert!(rules.is_excluded(Path::new("sub/target"), true));

        // Directory-only pattern does not hit a file of the same name
        assert!(!rules.is_excluded(Path::new("target"), false));
        assert!(!rules.is_excluded(Path::new("src/main.rs"), false));
    }

    #[test]
    fn test_negation() {
        let rules = rules(&["*.log", "!keep.log"]);
        assert!(rules.is_excluded(Path::new("debug.log"), false));
        assert!(!rules.is_excluded(Path::new("keep.log"), false));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let patterns = vec!["*.swp".to_string(), "{a,b".to_string()];
        match ExcludeRules::new(&patterns) {
            Err(WatchError::InvalidExclude { pattern, message }) => {
                assert_eq!(pattern, "{a,b");
                assert!(!message.is_empty());
            }
            other => panic!("expected InvalidExclude, got {:?}", other),
        }
    }
}
