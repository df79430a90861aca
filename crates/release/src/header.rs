//! Generated version header.
//!
//! The library's build consumes a tiny Objective-C header with three
//! constants. It is rewritten from scratch on every run.

use crate::error::{Error, Result};
use crate::version::Version;
use std::fs;
use std::path::Path;

/// The values written to the version header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionHeader {
    /// `MAJOR.MINOR.PATCH`.
    pub short_version: String,
    /// Integer build number.
    pub build_version: u64,
    /// Short version joined with the prerelease or release label.
    pub version_string: String,
}

impl VersionHeader {
    /// Build the header values for a version.
    ///
    /// `release_label` stands in for the prerelease when the version is a
    /// final release.
    #[must_use]
    pub fn new(version: &Version, build_version: u64, release_label: &str) -> Self {
        let short_version = version.short();
        let label = version.prerelease.as_deref().unwrap_or(release_label);
        let version_string = if label.is_empty() {
            short_version.clone()
        } else {
            format!("{short_version}-{label}")
        };

        Self {
            short_version,
            build_version,
            version_string,
        }
    }

    /// Render the header file contents.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "// Version Header\n\
             #define SHORT_VERSION @\"{}\"\n\
             #define BUILD_VERSION {}\n\
             #define VERSION_STRING @\"{}\"\n",
            self.short_version, self.build_version, self.version_string
        )
    }

    /// Write the header to `path`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileWrite`] if the file or its parent directory
    /// cannot be written.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| Error::file_write(parent, e))?;
        }

        fs::write(path, self.render()).map_err(|e| Error::file_write(path, e))?;

        tracing::info!(
            path = %path.display(),
            version = %self.version_string,
            build = self.build_version,
            "Wrote version header"
        );
        Ok(())
    }
}
