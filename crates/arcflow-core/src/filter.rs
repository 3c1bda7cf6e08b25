//! Entry filtering: explicit path filters, include/exclude glob
//! patterns, and base-path rewriting.
//!
//! Filters are configured before a session starts and are immutable
//! once the engine enters the started state (the worker silently
//! ignores filter mutations mid-session).

use std::path::Path;
use std::path::PathBuf;

use glob::Pattern;

use crate::error::ArchiveError;
use crate::error::Result;

/// Decision for one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// The entry is part of the output, under the given (possibly
    /// rewritten) path.
    Included(PathBuf),
    /// The entry is skipped; its data is never decoded.
    Excluded,
}

impl FilterDecision {
    /// Returns `true` for [`FilterDecision::Excluded`].
    #[must_use]
    pub const fn is_excluded(&self) -> bool {
        matches!(self, Self::Excluded)
    }
}

/// Ordered filter rules applied to every entry of a session.
///
/// Rules are applied in order:
///
/// 1. If the explicit filter list is non-empty, the entry path must
///    match one of its entries exactly.
/// 2. Exclude patterns take precedence over include patterns.
/// 3. If include patterns exist, the entry must match at least one.
/// 4. If a base path is configured, the entry path is rewritten
///    relative to it; entries outside the base, or naming the base
///    root itself, are excluded.
///
/// Patterns use shell glob semantics (`*`, `?`, character classes).
///
/// # Examples
///
/// ```
/// use arcflow_core::filter::EntryFilter;
/// use std::path::Path;
///
/// let mut filter = EntryFilter::new();
/// filter.add_exclude_pattern("*.log").unwrap();
///
/// assert!(filter.evaluate(Path::new("build.log")).is_excluded());
/// assert!(!filter.evaluate(Path::new("src/main.rs")).is_excluded());
/// ```
#[derive(Debug, Default, Clone)]
pub struct EntryFilter {
    explicit: Vec<String>,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    base_path: Option<PathBuf>,
}

impl EntryFilter {
    /// Creates an empty filter that includes everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an explicit path filter. When at least one explicit filter
    /// is present, only exactly matching entry paths are included.
    pub fn add_filter<S: Into<String>>(&mut self, path: S) {
        let path = path.into();
        if !path.is_empty() {
            self.explicit.push(path);
        }
    }

    /// Adds an include glob pattern.
    pub fn add_include_pattern(&mut self, pattern: &str) -> Result<()> {
        self.include.push(compile(pattern)?);
        Ok(())
    }

    /// Adds an exclude glob pattern. Excludes win over includes.
    pub fn add_exclude_pattern(&mut self, pattern: &str) -> Result<()> {
        self.exclude.push(compile(pattern)?);
        Ok(())
    }

    /// Sets the base path entries are rewritten against. An empty path
    /// clears it.
    pub fn set_base_path<P: Into<PathBuf>>(&mut self, base: P) {
        let base = base.into();
        self.base_path = if base.as_os_str().is_empty() {
            None
        } else {
            Some(base)
        };
    }

    /// Returns `true` when no rule is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.explicit.is_empty()
            && self.include.is_empty()
            && self.exclude.is_empty()
            && self.base_path.is_none()
    }

    /// Applies the rules to an entry path.
    #[must_use]
    pub fn evaluate(&self, path: &Path) -> FilterDecision {
        let text = path.to_string_lossy();

        if !self.explicit.is_empty() && !self.explicit.iter().any(|f| f.as_str() == text) {
            return FilterDecision::Excluded;
        }

        if self.exclude.iter().any(|p| p.matches(&text)) {
            return FilterDecision::Excluded;
        }

        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(&text)) {
            return FilterDecision::Excluded;
        }

        match &self.base_path {
            Some(base) => match path.strip_prefix(base) {
                Ok(rel) if rel.as_os_str().is_empty() => FilterDecision::Excluded,
                Ok(rel) => FilterDecision::Included(rel.to_path_buf()),
                Err(_) => FilterDecision::Excluded,
            },
            None => FilterDecision::Included(path.to_path_buf()),
        }
    }
}

fn compile(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).map_err(|e| ArchiveError::UnknownError {
        context: format!("invalid pattern '{pattern}': {e}"),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_includes_everything() {
        let filter = EntryFilter::new();
        assert!(filter.is_empty());
        assert_eq!(
            filter.evaluate(Path::new("any/path.txt")),
            FilterDecision::Included(PathBuf::from("any/path.txt"))
        );
    }

    #[test]
    fn test_explicit_filter_exact_match() {
        let mut filter = EntryFilter::new();
        filter.add_filter("keep/me.txt");

        assert!(!filter.evaluate(Path::new("keep/me.txt")).is_excluded());
        assert!(filter.evaluate(Path::new("keep/other.txt")).is_excluded());
        // Prefixes are not matches.
        assert!(filter.evaluate(Path::new("keep/me.txt.bak")).is_excluded());
    }

    #[test]
    fn test_empty_explicit_filter_ignored() {
        let mut filter = EntryFilter::new();
        filter.add_filter("");
        assert!(!filter.evaluate(Path::new("anything")).is_excluded());
    }

    #[test]
    fn test_exclude_pattern() {
        let mut filter = EntryFilter::new();
        filter.add_exclude_pattern("*.tmp").unwrap();

        assert!(filter.evaluate(Path::new("scratch.tmp")).is_excluded());
        assert!(filter.evaluate(Path::new("dir/scratch.tmp")).is_excluded());
        assert!(!filter.evaluate(Path::new("scratch.txt")).is_excluded());
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let mut filter = EntryFilter::new();
        filter.add_include_pattern("*.txt").unwrap();
        filter.add_exclude_pattern("secret*").unwrap();

        assert!(!filter.evaluate(Path::new("notes.txt")).is_excluded());
        assert!(filter.evaluate(Path::new("secret.txt")).is_excluded());
    }

    #[test]
    fn test_include_patterns_restrict() {
        let mut filter = EntryFilter::new();
        filter.add_include_pattern("docs/*").unwrap();

        assert!(!filter.evaluate(Path::new("docs/a.md")).is_excluded());
        assert!(filter.evaluate(Path::new("src/a.rs")).is_excluded());
    }

    #[test]
    fn test_question_mark_and_classes() {
        let mut filter = EntryFilter::new();
        filter.add_exclude_pattern("file?.o").unwrap();
        filter.add_exclude_pattern("[ab]*.rs").unwrap();

        assert!(filter.evaluate(Path::new("file1.o")).is_excluded());
        assert!(!filter.evaluate(Path::new("file10.o")).is_excluded());
        assert!(filter.evaluate(Path::new("alpha.rs")).is_excluded());
        assert!(filter.evaluate(Path::new("beta.rs")).is_excluded());
        assert!(!filter.evaluate(Path::new("gamma.rs")).is_excluded());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut filter = EntryFilter::new();
        let result = filter.add_exclude_pattern("[unclosed");
        assert!(result.is_err());
    }

    #[test]
    fn test_base_path_rewrites() {
        let mut filter = EntryFilter::new();
        filter.set_base_path("bundle");

        assert_eq!(
            filter.evaluate(Path::new("bundle/bin/tool")),
            FilterDecision::Included(PathBuf::from("bin/tool"))
        );
    }

    #[test]
    fn test_base_path_excludes_outsiders_and_root() {
        let mut filter = EntryFilter::new();
        filter.set_base_path("bundle");

        assert!(filter.evaluate(Path::new("other/file")).is_excluded());
        assert!(filter.evaluate(Path::new("bundle")).is_excluded());
    }

    #[test]
    fn test_empty_base_path_clears() {
        let mut filter = EntryFilter::new();
        filter.set_base_path("bundle");
        filter.set_base_path("");
        assert!(!filter.evaluate(Path::new("other/file")).is_excluded());
    }

    #[test]
    fn test_rules_apply_in_order() {
        let mut filter = EntryFilter::new();
        filter.add_filter("bundle/keep.txt");
        filter.set_base_path("bundle");

        // Explicit filter sees the original path; base path rewrites
        // afterwards.
        assert_eq!(
            filter.evaluate(Path::new("bundle/keep.txt")),
            FilterDecision::Included(PathBuf::from("keep.txt"))
        );
        assert!(filter.evaluate(Path::new("bundle/drop.txt")).is_excluded());
    }
}
