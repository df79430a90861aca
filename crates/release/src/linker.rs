//! Issue reference linking.
//!
//! Rewrites bare issue identifiers in a Markdown document into links to the
//! issue tracker. Identifiers that already sit inside a Markdown link, either
//! in its text or its target, are left untouched, so linking an already
//! linked document is a no-op.

use crate::config::IssueTrackerConfig;
use crate::error::{Error, Result};
use regex::{Captures, Regex};

/// Rewrites issue identifiers into `[ID](BASE_URL/ID)` links.
#[derive(Debug, Clone)]
pub struct ReferenceLinker {
    pattern: Regex,
    base_url: String,
}

impl ReferenceLinker {
    /// Create a linker for `issue_pattern` pointing at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if the issue pattern is not a valid regex,
    /// and [`Error::Config`] if it matches an empty string.
    pub fn new(issue_pattern: &str, base_url: &str) -> Result<Self> {
        // Existing links are matched first and copied through unchanged.
        let combined = format!(r"\[[^\]\n]*\]\([^)\n]*\)|(?P<issue>{issue_pattern})");
        let pattern = Regex::new(&combined).map_err(|e| Error::pattern(issue_pattern, e))?;
        if pattern.is_match("") {
            return Err(Error::config(
                format!("issue pattern {issue_pattern} matches an empty string"),
                "Use a pattern such as \"IOSSDK-\\d+\"",
            ));
        }

        Ok(Self {
            pattern,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a linker from the issue tracker configuration.
    ///
    /// Returns `Ok(None)` when no base URL is configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if the configured issue pattern is invalid.
    pub fn from_config(tracker: &IssueTrackerConfig) -> Result<Option<Self>> {
        if tracker.base_url.trim().is_empty() {
            return Ok(None);
        }
        Self::new(&tracker.issue_pattern, &tracker.base_url).map(Some)
    }

    /// The URL for a single issue.
    #[must_use]
    pub fn url_for(&self, issue_id: &str) -> String {
        format!("{}/{issue_id}", self.base_url)
    }

    /// Link every bare issue identifier in `document`.
    #[must_use]
    pub fn link(&self, document: &str) -> String {
        self.pattern
            .replace_all(document, |caps: &Captures<'_>| match caps.name("issue") {
                Some(issue) => format!("[{}]({})", issue.as_str(), self.url_for(issue.as_str())),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linker() -> ReferenceLinker {
        ReferenceLinker::new(r"IOSSDK-\d+", "https://jira.example.com/browse/").unwrap()
    }

    #[test]
    fn test_link_bare_reference() {
        assert_eq!(
            linker().link("- [FIX] fixes IOSSDK-13 bar"),
            "- [FIX] fixes [IOSSDK-13](https://jira.example.com/browse/IOSSDK-13) bar"
        );
    }

    #[test]
    fn test_link_every_occurrence() {
        let out = linker().link("IOSSDK-1 and IOSSDK-2\nIOSSDK-1 again");
        assert_eq!(out.matches("](https://jira.example.com/browse/").count(), 3);
    }

    #[test]
    fn test_link_is_idempotent() {
        let doc = "## SDK Version 1.2.0 / 2024-03-05\n\n- [NEW] implements IOSSDK-12 foo\n";
        let once = linker().link(doc);
        assert_eq!(linker().link(&once), once);
    }

    #[test]
    fn test_link_leaves_markers_alone() {
        let doc = "- [NEW] implements IOSSDK-12 foo";
        assert!(linker().link(doc).starts_with("- [NEW] implements [IOSSDK-12]("));
    }

    #[test]
    fn test_link_skips_reference_inside_other_link() {
        let doc = "see [the ticket](https://jira.example.com/browse/IOSSDK-5)";
        assert_eq!(linker().link(doc), doc);
    }

    #[test]
    fn test_link_without_matches() {
        assert_eq!(linker().link("nothing to see"), "nothing to see");
        assert_eq!(linker().link(""), "");
    }

    #[test]
    fn test_from_config_without_base_url() {
        let tracker = IssueTrackerConfig::default();
        assert!(ReferenceLinker::from_config(&tracker).unwrap().is_none());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            ReferenceLinker::new("IOSSDK-(", "https://x"),
            Err(Error::Pattern { .. })
        ));
    }

    #[test]
    fn test_empty_matching_pattern_is_rejected() {
        assert!(matches!(
            ReferenceLinker::new(r"\d*", "https://x"),
            Err(Error::Config { .. })
        ));
    }
}
