//! Version parsing, classification and bumping.
//!
//! This module provides semantic versioning support including:
//! - Version parsing and formatting
//! - Build number derivation from the prerelease label
//! - Release/prerelease classification driving the bump strategy

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Build number used when the version carries no usable prerelease number.
pub const FALLBACK_BUILD_NUMBER: u64 = 1000;

/// A semantic version following the `SemVer` 2.0.0 specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Version {
    /// Major version number.
    pub major: u64,
    /// Minor version number.
    pub minor: u64,
    /// Patch version number.
    pub patch: u64,
    /// Pre-release identifier (e.g., "dev.3", "beta").
    pub prerelease: Option<String>,
    /// Build metadata (e.g., "20230101", "commit.abc123").
    pub build: Option<String>,
}

impl Version {
    /// Create a new version.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build: None,
        }
    }

    /// Create a version with a pre-release identifier.
    #[must_use]
    pub fn with_prerelease(mut self, prerelease: impl Into<String>) -> Self {
        self.prerelease = Some(prerelease.into());
        self
    }

    /// Create a version with build metadata.
    #[must_use]
    pub fn with_build(mut self, build: impl Into<String>) -> Self {
        self.build = Some(build.into());
        self
    }

    /// The `MAJOR.MINOR.PATCH` core without prerelease or build metadata.
    #[must_use]
    pub fn short(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    /// Check if this is a pre-release version.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Classify this version as a release or a prerelease.
    #[must_use]
    pub fn release_kind(&self) -> ReleaseKind {
        ReleaseKind::of(self)
    }

    /// Derive the integer build number from the prerelease label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBuildNumber`] when a dotted prerelease label
    /// does not end in a numeric segment.
    pub fn build_number(&self) -> Result<u64> {
        build_number(self.prerelease.as_deref())
    }

    /// Apply a bump strategy to this version.
    ///
    /// `label` is the prerelease identifier used by [`BumpStrategy::Prerelease`];
    /// it is ignored for patch bumps. Build metadata never survives a bump.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionOutOfRange`] when the patch number or the
    /// numeric prerelease tail is already at its maximum.
    pub fn bump(&self, strategy: BumpStrategy, label: &str) -> Result<Self> {
        let core = Self::new(self.major, self.minor, self.patch);
        let next_patch = || {
            self.patch
                .checked_add(1)
                .map(|patch| Self::new(self.major, self.minor, patch))
                .ok_or_else(|| Error::version_out_of_range(self.to_string()))
        };

        match (strategy, self.prerelease.as_deref()) {
            // Finalizing a prerelease keeps its core version.
            (BumpStrategy::Patch, Some(_)) => Ok(core),
            (BumpStrategy::Patch, None) => next_patch(),
            (BumpStrategy::Prerelease, Some(pre)) => next_prerelease(pre, label)
                .map(|pre| core.with_prerelease(pre))
                .ok_or_else(|| Error::version_out_of_range(self.to_string())),
            (BumpStrategy::Prerelease, None) => {
                Ok(next_patch()?.with_prerelease(start_prerelease(label)))
            }
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        // Remove leading 'v' if present
        let candidate = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let parsed = semver::Version::parse(candidate).map_err(|_| Error::invalid_version(s))?;

        Ok(Self {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            prerelease: (!parsed.pre.is_empty()).then(|| parsed.pre.as_str().to_string()),
            build: (!parsed.build.is_empty()).then(|| parsed.build.as_str().to_string()),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{pre}")?;
        }
        if let Some(ref build) = self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl TryFrom<String> for Version {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Derive a build number from an optional prerelease label.
///
/// - no prerelease: [`FALLBACK_BUILD_NUMBER`]
/// - dotted label (`dev.3`): the last segment, which must be numeric
/// - single segment: its numeric value, or the fallback when it is not a number
///
/// # Errors
///
/// Returns [`Error::InvalidBuildNumber`] when the last segment of a dotted
/// label is not a non-negative integer.
pub fn build_number(prerelease: Option<&str>) -> Result<u64> {
    let Some(pre) = prerelease else {
        return Ok(FALLBACK_BUILD_NUMBER);
    };

    match pre.rsplit_once('.') {
        Some((_, last)) => last
            .parse()
            .map_err(|_| Error::invalid_build_number(pre, last)),
        None => Ok(pre.parse().unwrap_or_else(|_| {
            warn!(
                prerelease = pre,
                fallback = FALLBACK_BUILD_NUMBER,
                "Prerelease label has no numeric part, using fallback build number"
            );
            FALLBACK_BUILD_NUMBER
        })),
    }
}

/// Whether a version is a final release or a prerelease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseKind {
    /// A version without a prerelease label.
    Release,
    /// A version carrying a prerelease label.
    Prerelease,
}

impl ReleaseKind {
    /// Classify a version.
    #[must_use]
    pub fn of(version: &Version) -> Self {
        if version.prerelease.is_none() {
            Self::Release
        } else {
            Self::Prerelease
        }
    }

    /// Check if this is a final release.
    #[must_use]
    pub const fn is_release(self) -> bool {
        matches!(self, Self::Release)
    }

    /// The bump strategy to apply for this kind of version.
    #[must_use]
    pub const fn bump_strategy(self) -> BumpStrategy {
        match self {
            Self::Release => BumpStrategy::Patch,
            Self::Prerelease => BumpStrategy::Prerelease,
        }
    }

    /// The prerelease label to attach when bumping, if any.
    #[must_use]
    pub fn prerelease_label(self, label: &str) -> Option<&str> {
        match self {
            Self::Release => None,
            Self::Prerelease => Some(label),
        }
    }
}

impl fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Release => write!(f, "release"),
            Self::Prerelease => write!(f, "prerelease"),
        }
    }
}

/// How to compute the next version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpStrategy {
    /// Increment the patch number, or finalize a prerelease.
    Patch,
    /// Increment the numeric tail of the prerelease label.
    Prerelease,
}

impl fmt::Display for BumpStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patch => write!(f, "patch"),
            Self::Prerelease => write!(f, "prerelease"),
        }
    }
}

fn start_prerelease(label: &str) -> String {
    if label.is_empty() {
        "0".to_string()
    } else {
        format!("{label}.0")
    }
}

/// `None` when the numeric tail cannot be incremented.
fn next_prerelease(current: &str, label: &str) -> Option<String> {
    let mut segments: Vec<String> = current.split('.').map(str::to_string).collect();

    if !label.is_empty() && segments.first().map(String::as_str) != Some(label) {
        return Some(start_prerelease(label));
    }

    let last_numeric = segments
        .iter()
        .rposition(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()));

    match last_numeric.and_then(|idx| segments[idx].parse::<u64>().ok().map(|n| (idx, n))) {
        Some((idx, n)) => segments[idx] = n.checked_add(1)?.to_string(),
        None => segments.push("0".to_string()),
    }

    Some(segments.join("."))
}
