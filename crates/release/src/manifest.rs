//! Package manifest reading and writing.
//!
//! The released version lives in the `version` field of a JSON package
//! record (`package.json`). Only that field is ever rewritten; key order and
//! every other field are kept as they were.

use crate::error::{Error, Result};
use crate::version::Version;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Handles reading and writing the version in a JSON package manifest.
pub struct PackageManifest {
    path: PathBuf,
}

impl PackageManifest {
    /// Create a new manifest handler for the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the manifest file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the manifest as a JSON object.
    fn read_document(&self) -> Result<Map<String, Value>> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            Error::manifest(
                format!("Failed to read {}: {e}", self.path.display()),
                Some(self.path.clone()),
            )
        })?;

        match serde_json::from_str(&content).map_err(|e| {
            Error::manifest(
                format!("Failed to parse {}: {e}", self.path.display()),
                Some(self.path.clone()),
            )
        })? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::manifest(
                "Manifest root must be a JSON object",
                Some(self.path.clone()),
            )),
        }
    }

    /// Read the version from the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the `version` field is
    /// missing or not a string, or the value is not a semantic version.
    pub fn read_version(&self) -> Result<Version> {
        let doc = self.read_document()?;

        let version_str = doc.get("version").and_then(Value::as_str).ok_or_else(|| {
            Error::manifest(
                "No string \"version\" field in manifest",
                Some(self.path.clone()),
            )
        })?;

        version_str.parse()
    }

    /// Replace the version in the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or written.
    pub fn write_version(&self, version: &Version) -> Result<()> {
        let mut doc = self.read_document()?;
        doc.insert("version".to_string(), Value::String(version.to_string()));

        let mut content = serde_json::to_string_pretty(&Value::Object(doc))?;
        content.push('\n');

        fs::write(&self.path, content).map_err(|e| Error::file_write(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), %version, "Updated manifest version");
        Ok(())
    }
}
