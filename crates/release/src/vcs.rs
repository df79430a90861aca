//! Collaborators the release pipeline calls into.
//!
//! This module defines the [`VersionControl`] and [`BumpTool`] traits. The
//! pipeline only ever talks to these traits; the CLI provides process-backed
//! implementations and tests use the recording doubles below.
//!
//! # Example
//!
//! ```rust,ignore
//! use bumpkin_release::vcs::{RecordingVcs, VcsCall, VersionControl};
//!
//! let vcs = RecordingVcs::default();
//! vcs.tag("1.2.0", "Release 1.2.0")?;
//! assert_eq!(vcs.calls()[0], VcsCall::Tag { name: "1.2.0".into(), message: "Release 1.2.0".into() });
//! ```

use crate::error::{Error, Result};
use crate::version::Version;
use std::cell::RefCell;
use std::path::PathBuf;

/// Version control operations requested by the pipeline.
pub trait VersionControl {
    /// Commit `files` with `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    fn commit(&self, files: &[PathBuf], message: &str) -> Result<()>;

    /// Create an annotated tag.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be created.
    fn tag(&self, name: &str, message: &str) -> Result<()>;

    /// Push the current branch and tags to `remote`.
    ///
    /// # Errors
    ///
    /// Returns an error if the push fails.
    fn push(&self, remote: &str) -> Result<()>;

    /// Commit messages since the most recent tag, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be read.
    fn log_since_last_tag(&self) -> Result<String>;
}

/// The external tool that bumps the pod spec.
pub trait BumpTool {
    /// Run the tool for `version`. Only success or failure is observed.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be run or exits unsuccessfully.
    fn bump(&self, version: &Version) -> Result<()>;
}

/// A call recorded by [`RecordingVcs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    /// A commit.
    Commit {
        /// Files committed.
        files: Vec<PathBuf>,
        /// Commit message.
        message: String,
    },
    /// A tag.
    Tag {
        /// Tag name.
        name: String,
        /// Tag message.
        message: String,
    },
    /// A push.
    Push {
        /// Remote name.
        remote: String,
    },
}

/// In-memory [`VersionControl`] that records every call.
#[derive(Debug, Default)]
pub struct RecordingVcs {
    log: String,
    fail_on: Option<&'static str>,
    calls: RefCell<Vec<VcsCall>>,
}

impl RecordingVcs {
    /// Create a recorder whose history returns `log`.
    #[must_use]
    pub fn with_log(log: impl Into<String>) -> Self {
        Self {
            log: log.into(),
            ..Self::default()
        }
    }

    /// Make the named operation (`commit`, `tag` or `push`) fail.
    #[must_use]
    pub const fn failing_on(mut self, operation: &'static str) -> Self {
        self.fail_on = Some(operation);
        self
    }

    /// Calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.borrow().clone()
    }

    fn record(&self, operation: &'static str, call: VcsCall) -> Result<()> {
        if self.fail_on == Some(operation) {
            return Err(Error::git(format!("{operation} rejected")));
        }
        self.calls.borrow_mut().push(call);
        Ok(())
    }
}

impl VersionControl for RecordingVcs {
    fn commit(&self, files: &[PathBuf], message: &str) -> Result<()> {
        self.record(
            "commit",
            VcsCall::Commit {
                files: files.to_vec(),
                message: message.to_string(),
            },
        )
    }

    fn tag(&self, name: &str, message: &str) -> Result<()> {
        self.record(
            "tag",
            VcsCall::Tag {
                name: name.to_string(),
                message: message.to_string(),
            },
        )
    }

    fn push(&self, remote: &str) -> Result<()> {
        self.record(
            "push",
            VcsCall::Push {
                remote: remote.to_string(),
            },
        )
    }

    fn log_since_last_tag(&self) -> Result<String> {
        Ok(self.log.clone())
    }
}

/// In-memory [`BumpTool`] that records the versions it was asked to bump.
#[derive(Debug, Default)]
pub struct RecordingBumpTool {
    fail: bool,
    versions: RefCell<Vec<String>>,
}

impl RecordingBumpTool {
    /// Create a tool that always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Versions passed to [`BumpTool::bump`] so far.
    #[must_use]
    pub fn versions(&self) -> Vec<String> {
        self.versions.borrow().clone()
    }
}

impl BumpTool for RecordingBumpTool {
    fn bump(&self, version: &Version) -> Result<()> {
        if self.fail {
            return Err(Error::bump_tool("exited with status 1"));
        }
        self.versions.borrow_mut().push(version.to_string());
        Ok(())
    }
}
