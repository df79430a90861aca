//! Command-line definition, error type and exit codes.

use crate::logging::LogLevel;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use miette::{Diagnostic, Report};
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application
pub const EXIT_OK: i32 = 0;
/// CLI or configuration error exit code
pub const EXIT_CLI: i32 = 2;
/// Release pipeline failure exit code
pub const EXIT_RELEASE: i32 = 3;

/// CLI-specific error types with proper exit code mapping
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// CLI or configuration error (exit code 2)
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(bumpkin::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Release pipeline failure (exit code 3)
    #[error("Release error: {message}")]
    #[diagnostic(code(bumpkin::cli::release))]
    Release {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Other unexpected error (exit code 3)
    #[error("Unexpected error: {message}")]
    #[diagnostic(code(bumpkin::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new configuration error with help text
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a new release error
    #[must_use]
    pub fn release(message: impl Into<String>) -> Self {
        Self::Release {
            message: message.into(),
            help: None,
        }
    }

    /// Create a new unexpected error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }
}

impl From<bumpkin_release::Error> for CliError {
    fn from(err: bumpkin_release::Error) -> Self {
        use bumpkin_release::Error as E;

        let help = err.help().map(|h| h.to_string());
        let message = match &err {
            // Carry the underlying cause, which the top-level message omits.
            E::FileRead { source, .. } | E::FileWrite { source, .. } => format!("{err}: {source}"),
            E::Pattern { source, .. } => format!("{err}: {source}"),
            _ => err.to_string(),
        };

        match err {
            E::Config { .. } | E::Pattern { .. } | E::TomlParse(_) => Self::Config { message, help },
            _ => Self::Release { message, help },
        }
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::other(format!("Failed to serialize output: {err}"))
    }
}

/// Map CLI error to appropriate exit code
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Release { .. } | CliError::Other { .. } => EXIT_RELEASE,
    }
}

/// Render an error to stderr with miette.
pub fn render_error(err: &CliError) {
    let report = Report::new(err.clone());
    eprintln!("{report:?}");
    let _ = io::stderr().flush();
}

/// Release bookkeeping for iOS SDK style projects.
///
/// Derives build numbers from semantic versions, maintains a linked Markdown
/// changelog and writes the generated version header.
#[derive(Parser, Debug)]
#[command(name = "bumpkin")]
#[command(about = "Release bookkeeping: build numbers, changelogs and version headers")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    /// Project root that relative paths in the configuration resolve against.
    #[arg(short = 'C', long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file (defaults to `bumpkin.toml` in the project root).
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the build number, release kind and header values for a version
    Info {
        /// Version to inspect (defaults to the manifest version)
        version: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show what the next bump would do
    Plan {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the version header
    Header {
        /// Version to write (defaults to the manifest version)
        version: Option<String>,
    },
    /// Prepend a changelog section built from commit text
    Changelog {
        /// Version the section is for (defaults to the manifest version)
        version: Option<String>,
        /// Read commit text from FILE, or `-` for stdin (defaults to git log since the last tag)
        #[arg(short = 'i', long, value_name = "FILE")]
        input: Option<PathBuf>,
        /// Release date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Link bare issue references in the existing changelog
    Link,
    /// Bump the version, update header and changelog, then commit, tag and push
    Bump {
        /// Compute and print the plan without touching anything
        #[arg(long)]
        dry_run: bool,
        /// Read commit text from FILE, or `-` for stdin (defaults to git log since the last tag)
        #[arg(short = 'i', long, value_name = "FILE")]
        input: Option<PathBuf>,
        /// Release date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

/// Parse the process arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
