//! Error types for release bookkeeping operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for release operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while deriving versions or writing release artifacts.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Failed to parse or validate a version string.
    #[error("Invalid version: {version}")]
    #[diagnostic(
        code(bumpkin::release::invalid_version),
        help("Version must follow semantic versioning (e.g., 1.0.0, 2.1.0-dev.1)")
    )]
    InvalidVersion {
        /// The invalid version string
        version: String,
    },

    /// Bumping would overflow a numeric version component.
    #[error("Cannot bump {version}: component out of range")]
    #[diagnostic(
        code(bumpkin::release::version_out_of_range),
        help("Numeric version components must stay below 18446744073709551615 to be bumped")
    )]
    VersionOutOfRange {
        /// The version that could not be bumped
        version: String,
    },

    /// The prerelease label does not end in a numeric segment.
    #[error("Invalid build number in prerelease '{prerelease}': segment '{segment}' is not numeric")]
    #[diagnostic(
        code(bumpkin::release::invalid_build_number),
        help("Dotted prerelease labels must end in a number, e.g. dev.3")
    )]
    InvalidBuildNumber {
        /// The full prerelease label
        prerelease: String,
        /// The segment that failed to parse
        segment: String,
    },

    /// Failed to read an input file.
    #[error("Failed to read {}", path.display())]
    #[diagnostic(code(bumpkin::release::file_read))]
    FileRead {
        /// The path that could not be read
        path: PathBuf,
        /// The underlying source error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an output file.
    #[error("Failed to write {}", path.display())]
    #[diagnostic(
        code(bumpkin::release::file_write),
        help("Check that the destination directory exists and is writable")
    )]
    FileWrite {
        /// The path that could not be written
        path: PathBuf,
        /// The underlying source error
        #[source]
        source: std::io::Error,
    },

    /// Package manifest error (package.json).
    #[error("Manifest error: {message}")]
    #[diagnostic(
        code(bumpkin::release::manifest),
        help("Check that the manifest exists and has a string \"version\" field")
    )]
    Manifest {
        /// The error message
        message: String,
        /// The manifest file path
        path: Option<PathBuf>,
    },

    /// Configuration error.
    #[error("Release configuration error: {message}")]
    #[diagnostic(code(bumpkin::release::config), help("{help}"))]
    Config {
        /// The error message
        message: String,
        /// Help text for the user
        help: String,
    },

    /// A configured pattern failed to compile.
    #[error("Invalid pattern '{pattern}'")]
    #[diagnostic(
        code(bumpkin::release::pattern),
        help("Patterns use Rust regex syntax, e.g. IOSSDK-\\d+")
    )]
    Pattern {
        /// The offending pattern
        pattern: String,
        /// The underlying regex error
        #[source]
        source: regex::Error,
    },

    /// Version control operation error.
    #[error("Git error: {message}")]
    #[diagnostic(
        code(bumpkin::release::git),
        help("Ensure you are in a git repository and have the necessary permissions")
    )]
    Git {
        /// The error message
        message: String,
    },

    /// The external bump tool failed.
    #[error("Bump tool failed: {message}")]
    #[diagnostic(code(bumpkin::release::bump_tool))]
    BumpTool {
        /// The error message
        message: String,
    },

    /// Wrapped I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(bumpkin::release::io))]
    Io(#[from] std::io::Error),

    /// Wrapped JSON error.
    #[error("JSON error: {0}")]
    #[diagnostic(code(bumpkin::release::json))]
    Json(#[from] serde_json::Error),

    /// Wrapped TOML parsing error.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(bumpkin::release::toml_parse))]
    TomlParse(#[from] toml::de::Error),
}

impl Error {
    /// Create a new invalid version error.
    #[must_use]
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// Create a new out-of-range bump error.
    #[must_use]
    pub fn version_out_of_range(version: impl Into<String>) -> Self {
        Self::VersionOutOfRange {
            version: version.into(),
        }
    }

    /// Create a new invalid build number error.
    #[must_use]
    pub fn invalid_build_number(prerelease: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::InvalidBuildNumber {
            prerelease: prerelease.into(),
            segment: segment.into(),
        }
    }

    /// Create a new file read error.
    #[must_use]
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Create a new file write error.
    #[must_use]
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a new manifest error.
    #[must_use]
    pub fn manifest(message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Manifest {
            message: message.into(),
            path,
        }
    }

    /// Create a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a new pattern error.
    #[must_use]
    pub fn pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Create a new git error.
    #[must_use]
    pub fn git(message: impl Into<String>) -> Self {
        Self::Git {
            message: message.into(),
        }
    }

    /// Create a new bump tool error.
    #[must_use]
    pub fn bump_tool(message: impl Into<String>) -> Self {
        Self::BumpTool {
            message: message.into(),
        }
    }
}
