//! Release bookkeeping for bumpkin.
//!
//! This crate derives build identifiers from semantic versions, extracts
//! feature and fix entries from commit text, maintains a Markdown changelog
//! with linked issue references, and writes the generated version header a
//! library's build consumes.
//!
//! # Architecture
//!
//! - [`version`] - Version parsing, build numbers, release classification and bumps
//! - [`manifest`] - Reading and rewriting the version in `package.json`
//! - [`changelog`] - Entry extraction, section rendering and file updates
//! - [`linker`] - Idempotent issue reference linking
//! - [`header`] - The generated version header
//! - [`vcs`] - Version control and bump tool collaborator traits
//! - [`pipeline`] - The parameterized release pipeline tying it all together
//! - [`config`] - Release configuration types
//!
//! # Example
//!
//! ```rust,ignore
//! use bumpkin_release::{ReleaseConfig, ReleasePipeline, Version};
//!
//! let config = ReleaseConfig::load_or_default(Path::new("bumpkin.toml"))?;
//! let pipeline = ReleasePipeline::new(&config, ".");
//! let version: Version = "1.2.0-dev.3".parse()?;
//! pipeline.write_header(&version)?; // BUILD_VERSION 3
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod changelog;
pub mod config;
pub mod error;
pub mod header;
pub mod linker;
pub mod manifest;
pub mod pipeline;
pub mod vcs;
pub mod version;

// Re-export main types
pub use changelog::{
    ChangeKind, ChangelogEntry, ChangelogExtractor, ChangelogGenerator, ChangelogSection,
    ExtractedChanges,
};
pub use config::ReleaseConfig;
pub use error::{Error, Result};
pub use header::VersionHeader;
pub use linker::ReferenceLinker;
pub use manifest::PackageManifest;
pub use pipeline::{BumpReport, ReleasePipeline, ReleasePlan};
pub use vcs::{BumpTool, VersionControl};
pub use version::{BumpStrategy, FALLBACK_BUILD_NUMBER, ReleaseKind, Version, build_number};
