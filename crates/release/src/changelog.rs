//! Changelog extraction and rendering.
//!
//! Feature and fix entries are pulled out of free-form text (commit or issue
//! descriptions) by two independent line rules of the shape
//! `<prefix> <keyword> <ISSUE-ID><suffix>`, rendered into a dated Markdown
//! section, and prepended to the existing changelog. The keyword itself is
//! not part of the entry text.

use crate::config::{ChangelogConfig, IssueTrackerConfig};
use crate::error::{Error, Result};
use crate::linker::ReferenceLinker;
use crate::version::Version;
use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Kind of a changelog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A new feature.
    Feature,
    /// A bug fix.
    Fix,
}

impl ChangeKind {
    /// Marker used when rendering an entry of this kind.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Feature => "[NEW]",
            Self::Fix => "[FIX]",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feature => write!(f, "feature"),
            Self::Fix => write!(f, "fix"),
        }
    }
}

/// A single extracted change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    /// Whether this is a feature or a fix.
    pub kind: ChangeKind,
    /// The issue identifier referenced by the line.
    pub issue_id: String,
    /// The matching line with the keyword dropped, trimmed.
    pub text: String,
}

/// Entries found in one block of text, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedChanges {
    /// Feature entries.
    pub features: Vec<ChangelogEntry>,
    /// Fix entries.
    pub fixes: Vec<ChangelogEntry>,
}

impl ExtractedChanges {
    /// Whether neither rule matched anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty() && self.fixes.is_empty()
    }
}

/// Scans text for feature and fix lines.
#[derive(Debug, Clone)]
pub struct ChangelogExtractor {
    feature_rule: Regex,
    fix_rule: Regex,
}

impl ChangelogExtractor {
    /// Build an extractor from an issue pattern and the two keywords.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if the issue pattern is not a valid regex.
    pub fn new(
        issue_pattern: &str,
        feature_keyword: &str,
        fix_keyword: &str,
        case_insensitive: bool,
    ) -> Result<Self> {
        Ok(Self {
            feature_rule: line_rule(issue_pattern, feature_keyword, case_insensitive)?,
            fix_rule: line_rule(issue_pattern, fix_keyword, case_insensitive)?,
        })
    }

    /// Build an extractor from the release configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if the configured issue pattern is invalid.
    pub fn from_config(tracker: &IssueTrackerConfig, changelog: &ChangelogConfig) -> Result<Self> {
        Self::new(
            &tracker.issue_pattern,
            &changelog.feature_keyword,
            &changelog.fix_keyword,
            changelog.case_insensitive,
        )
    }

    /// Extract every feature and fix line from `text`.
    #[must_use]
    pub fn extract(&self, text: &str) -> ExtractedChanges {
        let changes = ExtractedChanges {
            features: collect(&self.feature_rule, ChangeKind::Feature, text),
            fixes: collect(&self.fix_rule, ChangeKind::Fix, text),
        };
        debug!(
            features = changes.features.len(),
            fixes = changes.fixes.len(),
            "Extracted changelog entries"
        );
        changes
    }
}

fn line_rule(issue_pattern: &str, keyword: &str, case_insensitive: bool) -> Result<Regex> {
    let pattern = format!(
        r"^(?P<prefix>.*){} (?P<issue>{issue_pattern})(?P<suffix>.*)$",
        regex::escape(keyword)
    );
    RegexBuilder::new(&pattern)
        .multi_line(true)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| Error::pattern(issue_pattern, e))
}

fn collect(rule: &Regex, kind: ChangeKind, text: &str) -> Vec<ChangelogEntry> {
    rule.captures_iter(text)
        .filter_map(|caps| {
            let issue = caps.name("issue")?.as_str();
            let part = |name| caps.name(name).map_or("", |m| m.as_str());
            let text = format!("{}{issue}{}", part("prefix"), part("suffix"));
            Some(ChangelogEntry {
                kind,
                issue_id: issue.to_string(),
                text: text.trim().to_string(),
            })
        })
        .collect()
}

/// One released version's block in the changelog.
#[derive(Debug, Clone)]
pub struct ChangelogSection {
    /// Text placed before the version in the heading.
    pub heading_prefix: String,
    /// Version being released.
    pub version: Version,
    /// Release date.
    pub date: NaiveDate,
    /// Changes for this version.
    pub changes: ExtractedChanges,
}

impl ChangelogSection {
    /// Create a new section.
    #[must_use]
    pub fn new(
        heading_prefix: impl Into<String>,
        version: Version,
        date: NaiveDate,
        changes: ExtractedChanges,
    ) -> Self {
        Self {
            heading_prefix: heading_prefix.into(),
            version,
            date,
            changes,
        }
    }

    /// Format this section as Markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        use std::fmt::Write;
        let mut output = String::new();

        let _ = writeln!(
            output,
            "## {} {} / {}\n",
            self.heading_prefix,
            self.version,
            self.date.format("%Y-%m-%d")
        );

        // Features always precede fixes.
        for entry in self.changes.features.iter().chain(&self.changes.fixes) {
            let _ = writeln!(output, "- {} {}", entry.kind.marker(), entry.text);
        }

        output
    }
}

/// Place `section` above `existing`, leaving prior content untouched.
#[must_use]
pub fn prepend_section(section: &str, existing: &str) -> String {
    if existing.trim().is_empty() {
        section.to_string()
    } else {
        format!("{}\n\n{existing}", section.trim_end_matches('\n'))
    }
}

/// Reads, extends and rewrites the changelog file.
pub struct ChangelogGenerator {
    extractor: ChangelogExtractor,
    heading_prefix: String,
}

impl ChangelogGenerator {
    /// Create a generator from an extractor and a heading prefix.
    #[must_use]
    pub fn new(extractor: ChangelogExtractor, heading_prefix: impl Into<String>) -> Self {
        Self {
            extractor,
            heading_prefix: heading_prefix.into(),
        }
    }

    /// Create a generator from the release configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if the configured issue pattern is invalid.
    pub fn from_config(tracker: &IssueTrackerConfig, changelog: &ChangelogConfig) -> Result<Self> {
        Ok(Self::new(
            ChangelogExtractor::from_config(tracker, changelog)?,
            changelog.heading_prefix.clone(),
        ))
    }

    /// Extract entries from `text` and build the section for `version`.
    #[must_use]
    pub fn section(&self, version: &Version, date: NaiveDate, text: &str) -> ChangelogSection {
        ChangelogSection::new(
            self.heading_prefix.clone(),
            version.clone(),
            date,
            self.extractor.extract(text),
        )
    }

    /// Prepend a section to the changelog at `path` and relink the document.
    ///
    /// A missing file is treated as an empty changelog. The read, prepend,
    /// link and write happen as one step; callers must not run two updates
    /// against the same file concurrently.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written.
    pub fn update_file(
        &self,
        path: &Path,
        section: &ChangelogSection,
        linker: Option<&ReferenceLinker>,
    ) -> Result<()> {
        let existing = if path.exists() {
            fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?
        } else {
            String::new()
        };

        let mut content = prepend_section(&section.to_markdown(), &existing);
        if let Some(linker) = linker {
            content = linker.link(&content);
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::file_write(parent, e))?;
        }

        fs::write(path, content).map_err(|e| Error::file_write(path, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn extractor() -> ChangelogExtractor {
        ChangelogExtractor::new(r"IOSSDK-\d+", "implements", "fixes", true).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[test]
    fn test_extract_empty_input() {
        let changes = extractor().extract("");
        assert!(changes.features.is_empty());
        assert!(changes.fixes.is_empty());
        assert!(changes.is_empty());
    }

    #[test]
    fn test_extract_feature_and_fix() {
        let changes = extractor().extract("implements IOSSDK-12 foo\nfixes IOSSDK-13 bar");
        assert_eq!(changes.features.len(), 1);
        assert_eq!(changes.features[0].issue_id, "IOSSDK-12");
        assert_eq!(changes.features[0].text, "IOSSDK-12 foo");
        assert_eq!(changes.fixes[0].text, "IOSSDK-13 bar");
        assert_eq!(changes.fixes.len(), 1);
        assert_eq!(changes.fixes[0].issue_id, "IOSSDK-13");
        assert_eq!(changes.fixes[0].kind, ChangeKind::Fix);
    }

    #[test]
    fn test_extract_every_line_in_order() {
        let text = "Add geofencing, implements IOSSDK-1\n\
                    unrelated line\n\
                    Beacon support implements IOSSDK-7 (partial)\n\
                    Crash on launch fixes IOSSDK-3\n";
        let changes = extractor().extract(text);
        let ids: Vec<_> = changes.features.iter().map(|e| e.issue_id.as_str()).collect();
        assert_eq!(ids, vec!["IOSSDK-1", "IOSSDK-7"]);
        assert_eq!(changes.features[0].text, "Add geofencing, IOSSDK-1");
        assert_eq!(changes.features[1].text, "Beacon support IOSSDK-7 (partial)");
        assert_eq!(changes.fixes.len(), 1);
    }

    #[test]
    fn test_extract_text_with_grouped_issue_pattern() {
        let grouped =
            ChangelogExtractor::new(r"(IOSSDK|MOB)-\d+", "implements", "fixes", true).unwrap();
        let changes = grouped.extract("Wallet passes implements MOB-4 for iOS");
        assert_eq!(changes.features[0].issue_id, "MOB-4");
        assert_eq!(changes.features[0].text, "Wallet passes MOB-4 for iOS");
    }

    #[test]
    fn test_extract_case_sensitivity() {
        let text = "IMPLEMENTS iossdk-4 shouting";
        assert_eq!(extractor().extract(text).features.len(), 1);

        let strict = ChangelogExtractor::new(r"IOSSDK-\d+", "implements", "fixes", false).unwrap();
        assert!(strict.extract(text).is_empty());
    }

    #[test]
    fn test_extract_line_matching_both_rules() {
        let changes = extractor().extract("fixes IOSSDK-2 and implements IOSSDK-9");
        assert_eq!(changes.features.len(), 1);
        assert_eq!(changes.fixes.len(), 1);
        assert_eq!(changes.features[0].issue_id, "IOSSDK-9");
        assert_eq!(changes.fixes[0].issue_id, "IOSSDK-2");
    }

    #[test]
    fn test_extract_invalid_pattern() {
        let result = ChangelogExtractor::new("IOSSDK-(", "implements", "fixes", true);
        assert!(matches!(result, Err(Error::Pattern { .. })));
    }

    #[test]
    fn test_section_to_markdown() {
        let changes = extractor().extract("fixes IOSSDK-13 bar\nimplements IOSSDK-12 foo");
        let section = ChangelogSection::new("SDK Version", Version::new(1, 2, 0), date(), changes);
        assert_eq!(
            section.to_markdown(),
            "## SDK Version 1.2.0 / 2024-03-05\n\n\
             - [NEW] IOSSDK-12 foo\n\
             - [FIX] IOSSDK-13 bar\n"
        );
    }

    #[test]
    fn test_section_without_entries() {
        let section = ChangelogSection::new(
            "SDK Version",
            Version::new(1, 2, 0).with_prerelease("dev.1"),
            date(),
            ExtractedChanges::default(),
        );
        assert_eq!(section.to_markdown(), "## SDK Version 1.2.0-dev.1 / 2024-03-05\n\n");
    }

    #[test]
    fn test_prepend_section() {
        assert_eq!(prepend_section("## new\n", ""), "## new\n");
        assert_eq!(prepend_section("## new\n", "## old\n"), "## new\n\n## old\n");
    }

    #[test]
    fn test_update_file_new() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("CHANGELOG.md");
        let generator = ChangelogGenerator::new(extractor(), "SDK Version");

        let section = generator.section(&Version::new(1, 0, 0), date(), "implements IOSSDK-1 init");
        generator.update_file(&path, &section, None).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("## SDK Version 1.0.0 / 2024-03-05"));
        assert!(content.contains("- [NEW] IOSSDK-1 init"));
    }

    #[test]
    fn test_update_file_preserves_history() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("CHANGELOG.md");
        let history = "## SDK Version 0.9.0 / 2023-01-01\n\n- [FIX] old fix\n";
        fs::write(&path, history).unwrap();

        let generator = ChangelogGenerator::new(extractor(), "SDK Version");
        let section = generator.section(&Version::new(1, 0, 0), date(), "fixes IOSSDK-8 thing");
        generator.update_file(&path, &section, None).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.ends_with(history));
        assert!(
            content.find("## SDK Version 1.0.0").unwrap()
                < content.find("## SDK Version 0.9.0").unwrap()
        );
    }

    #[test]
    fn test_update_file_links_references() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("CHANGELOG.md");
        let generator = ChangelogGenerator::new(extractor(), "SDK Version");
        let linker = ReferenceLinker::new(r"IOSSDK-\d+", "https://jira.example.com/browse").unwrap();

        let section = generator.section(&Version::new(1, 0, 0), date(), "fixes IOSSDK-8 thing");
        generator.update_file(&path, &section, Some(&linker)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[IOSSDK-8](https://jira.example.com/browse/IOSSDK-8)"));
    }
}
