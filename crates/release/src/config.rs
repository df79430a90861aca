//! Release configuration types.
//!
//! This module defines the Rust representation of `bumpkin.toml`. The
//! configuration is loaded once at start-up and passed by reference to every
//! component; nothing reads it from ambient state.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "bumpkin.toml";

/// Placeholder substituted with the version in git messages and tag names.
pub const VERSION_PLACEHOLDER: &str = "%VERSION%";

/// Complete release configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Package metadata settings.
    pub package: PackageConfig,
    /// Issue tracker settings.
    #[serde(rename = "issueTracker")]
    pub issue_tracker: IssueTrackerConfig,
    /// Changelog generation settings.
    pub changelog: ChangelogConfig,
    /// Version header settings.
    pub header: HeaderConfig,
    /// Git-related release settings.
    pub git: ReleaseGitConfig,
    /// External pod bump tool settings.
    #[serde(rename = "bumpTool")]
    pub bump_tool: BumpToolConfig,
}

impl ReleaseConfig {
    /// Load the configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration if the file exists, otherwise use defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be loaded.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Check the configuration for values that would fail later in the run.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid or empty-matching issue pattern, or
    /// for empty keywords.
    pub fn validate(&self) -> Result<()> {
        let issue = Regex::new(&self.issue_tracker.issue_pattern)
            .map_err(|e| Error::pattern(&self.issue_tracker.issue_pattern, e))?;
        if issue.is_match("") {
            return Err(Error::config(
                "issueTracker.issuePattern must not match an empty string",
                "Use a pattern such as \"IOSSDK-\\d+\"",
            ));
        }

        if self.changelog.feature_keyword.trim().is_empty()
            || self.changelog.fix_keyword.trim().is_empty()
        {
            return Err(Error::config(
                "changelog keywords must not be empty",
                "Set changelog.featureKeyword and changelog.fixKeyword",
            ));
        }

        if self.git.create_tag && self.git.tag_name.trim().is_empty() {
            return Err(Error::config(
                "git.tagName must not be empty when git.createTag is set",
                "Use a template such as \"%VERSION%\"",
            ));
        }

        Ok(())
    }
}

/// Package metadata configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Path to the JSON manifest holding the `version` field.
    pub manifest: PathBuf,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("package.json"),
        }
    }
}

/// Issue tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueTrackerConfig {
    /// Base URL that issue identifiers are appended to. Linking is skipped
    /// while this is empty.
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    /// Regex matching a single issue identifier.
    #[serde(rename = "issuePattern")]
    pub issue_pattern: String,
}

impl Default for IssueTrackerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            issue_pattern: r"IOSSDK-\d+".to_string(),
        }
    }
}

/// Changelog generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Path to the changelog file relative to the project root.
    pub path: PathBuf,
    /// Text placed before the version in each section heading.
    #[serde(rename = "headingPrefix")]
    pub heading_prefix: String,
    /// Keyword marking a feature line.
    #[serde(rename = "featureKeyword")]
    pub feature_keyword: String,
    /// Keyword marking a fix line.
    #[serde(rename = "fixKeyword")]
    pub fix_keyword: String,
    /// Whether extraction ignores case.
    #[serde(rename = "caseInsensitive")]
    pub case_insensitive: bool,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("CHANGELOG.md"),
            heading_prefix: "SDK Version".to_string(),
            feature_keyword: "implements".to_string(),
            fix_keyword: "fixes".to_string(),
            case_insensitive: true,
        }
    }
}

/// Version header configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Destination of the generated header.
    pub path: PathBuf,
    /// Suffix used in `VERSION_STRING` when the version has no prerelease.
    #[serde(rename = "releaseLabel")]
    pub release_label: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Pod/Classes/Version.h"),
            release_label: "release".to_string(),
        }
    }
}

/// Git-related release configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseGitConfig {
    /// Whether to commit the bumped files.
    pub commit: bool,
    /// Commit message template.
    #[serde(rename = "commitMessage")]
    pub commit_message: String,
    /// Files included in the bump commit.
    #[serde(rename = "commitFiles")]
    pub commit_files: Vec<PathBuf>,
    /// Whether to create a tag.
    #[serde(rename = "createTag")]
    pub create_tag: bool,
    /// Tag name template.
    #[serde(rename = "tagName")]
    pub tag_name: String,
    /// Tag message template.
    #[serde(rename = "tagMessage")]
    pub tag_message: String,
    /// Whether to push after bumping.
    #[serde(rename = "pushOnBump")]
    pub push_on_bump: bool,
    /// Remote to push to.
    #[serde(rename = "pushTo")]
    pub push_to: String,
    /// Prerelease label attached when bumping a prerelease.
    #[serde(rename = "prereleaseLabel")]
    pub prerelease_label: String,
}

impl Default for ReleaseGitConfig {
    fn default() -> Self {
        Self {
            commit: true,
            commit_message: "#bump Release %VERSION%".to_string(),
            commit_files: vec![
                PathBuf::from("package.json"),
                PathBuf::from("Qwasi.podspec"),
                PathBuf::from("Pod/Classes/Version.h"),
            ],
            create_tag: true,
            tag_name: VERSION_PLACEHOLDER.to_string(),
            tag_message: "Release %VERSION%".to_string(),
            push_on_bump: true,
            push_to: "origin".to_string(),
            prerelease_label: "dev".to_string(),
        }
    }
}

impl ReleaseGitConfig {
    /// Format the commit message for a version.
    #[must_use]
    pub fn format_commit_message(&self, version: &str) -> String {
        self.commit_message.replace(VERSION_PLACEHOLDER, version)
    }

    /// Format the tag name for a version.
    #[must_use]
    pub fn format_tag(&self, version: &str) -> String {
        self.tag_name.replace(VERSION_PLACEHOLDER, version)
    }

    /// Format the tag message for a version.
    #[must_use]
    pub fn format_tag_message(&self, version: &str) -> String {
        self.tag_message.replace(VERSION_PLACEHOLDER, version)
    }
}

/// External bump tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BumpToolConfig {
    /// Whether the tool runs during `bump`.
    pub enabled: bool,
    /// Program to execute.
    pub program: String,
    /// Arguments placed before the version.
    pub args: Vec<String>,
}

impl Default for BumpToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "/usr/local/bin/podspec-bump".to_string(),
            args: vec!["-w".to_string()],
        }
    }
}
