//! Command implementations.
//!
//! Each `execute_*` function runs one subcommand against a loaded
//! [`Context`] and returns the text to print on stdout.

use crate::cli::CliError;
use crate::providers::{CommandBumpTool, SystemGit};
use bumpkin_release::config::CONFIG_FILE_NAME;
use bumpkin_release::{
    ReleaseConfig, ReleaseKind, ReleasePipeline, Version, VersionControl, VersionHeader,
};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::fmt::Write;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Project root and configuration shared by all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Project root.
    pub root: PathBuf,
    /// Loaded release configuration.
    pub config: ReleaseConfig,
}

impl Context {
    /// Load the configuration for `root`.
    ///
    /// An explicit `config` path must exist; otherwise `bumpkin.toml` in the
    /// root is used when present and defaults apply when it is not.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be loaded.
    pub fn load(root: &Path, config: Option<&Path>) -> Result<Self, CliError> {
        let config = match config {
            Some(path) if !path.exists() => {
                return Err(CliError::config_with_help(
                    format!("Configuration file {} does not exist", path.display()),
                    format!("Omit --config to use {CONFIG_FILE_NAME} in the project root"),
                ));
            }
            Some(path) => ReleaseConfig::load(path)?,
            None => ReleaseConfig::load_or_default(&root.join(CONFIG_FILE_NAME))?,
        };
        debug!(root = %root.display(), "Loaded configuration");

        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    fn pipeline(&self) -> ReleasePipeline<'_> {
        ReleasePipeline::new(&self.config, &self.root)
    }

    /// Parse `version`, or read it from the manifest when absent.
    fn resolve_version(&self, version: Option<&str>) -> Result<Version, CliError> {
        match version {
            Some(v) => Ok(v.parse()?),
            None => Ok(self.pipeline().manifest().read_version()?),
        }
    }
}

/// Read commit text from a file, or stdin for `-`.
fn read_input(input: &Path) -> Result<String, CliError> {
    if input == Path::new("-") {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }

    fs::read_to_string(input).map_err(|e| {
        CliError::config_with_help(
            format!("Failed to read {}: {e}", input.display()),
            "Pass an existing file, or `-` to read from stdin",
        )
    })
}

fn log_text(ctx: &Context, input: Option<&Path>) -> Result<String, CliError> {
    match input {
        Some(path) => read_input(path),
        None => Ok(SystemGit::new(&ctx.root).log_since_last_tag()?),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Version details printed by `info`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    /// The full version.
    pub version: Version,
    /// Release or prerelease.
    pub kind: ReleaseKind,
    /// `MAJOR.MINOR.PATCH`.
    pub short_version: String,
    /// Derived build number.
    pub build_number: u64,
    /// The header's `VERSION_STRING`.
    pub version_string: String,
}

/// Execute the `info` command.
///
/// # Errors
///
/// Returns an error if the version is invalid or has no valid build number.
pub fn execute_info(ctx: &Context, version: Option<&str>, json: bool) -> Result<String, CliError> {
    let version = ctx.resolve_version(version)?;
    let build_number = version.build_number()?;
    let header = VersionHeader::new(&version, build_number, &ctx.config.header.release_label);

    let info = VersionInfo {
        kind: version.release_kind(),
        short_version: header.short_version,
        build_number,
        version_string: header.version_string,
        version,
    };

    if json {
        return Ok(serde_json::to_string_pretty(&info)?);
    }

    let mut output = String::new();
    let _ = writeln!(output, "Version:        {}", info.version);
    let _ = writeln!(output, "Kind:           {}", info.kind);
    let _ = writeln!(output, "Short version:  {}", info.short_version);
    let _ = writeln!(output, "Build number:   {}", info.build_number);
    let _ = write!(output, "Version string: {}", info.version_string);
    Ok(output)
}

/// Execute the `plan` command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or the next version has
/// an invalid build number.
pub fn execute_plan(ctx: &Context, json: bool) -> Result<String, CliError> {
    let pipeline = ctx.pipeline();
    let current = pipeline.manifest().read_version()?;
    let plan = pipeline.plan(&current)?;

    if json {
        return Ok(serde_json::to_string_pretty(&plan)?);
    }

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{} ({}) -> {} via {} bump",
        plan.current, plan.kind, plan.next, plan.strategy
    );
    let _ = writeln!(output, "  Build number: {}", plan.build_number);
    let _ = writeln!(output, "  Commit:       {}", plan.commit_message);
    let _ = write!(
        output,
        "  Tag:          {} ({})",
        plan.tag_name, plan.tag_message
    );
    Ok(output)
}

/// Execute the `header` command.
///
/// # Errors
///
/// Returns an error if the version is invalid or the header cannot be written.
pub fn execute_header(ctx: &Context, version: Option<&str>) -> Result<String, CliError> {
    let version = ctx.resolve_version(version)?;
    let header = ctx.pipeline().write_header(&version)?;

    Ok(format!(
        "Wrote {} (SHORT_VERSION {}, BUILD_VERSION {}, VERSION_STRING {})",
        ctx.config.header.path.display(),
        header.short_version,
        header.build_version,
        header.version_string
    ))
}

/// Execute the `changelog` command.
///
/// # Errors
///
/// Returns an error if the input or history cannot be read or the changelog
/// cannot be written.
pub fn execute_changelog(
    ctx: &Context,
    version: Option<&str>,
    input: Option<&Path>,
    date: Option<NaiveDate>,
) -> Result<String, CliError> {
    let version = ctx.resolve_version(version)?;
    let text = log_text(ctx, input)?;
    let changes = ctx
        .pipeline()
        .update_changelog(&version, &text, date.unwrap_or_else(today))?;

    Ok(format!(
        "Added {} features and {} fixes for {} to {}",
        changes.features.len(),
        changes.fixes.len(),
        version,
        ctx.config.changelog.path.display()
    ))
}

/// Execute the `link` command.
///
/// # Errors
///
/// Returns an error if the changelog cannot be read or written.
pub fn execute_link(ctx: &Context) -> Result<String, CliError> {
    let path = ctx.config.changelog.path.display();
    if ctx.pipeline().relink_changelog()? {
        Ok(format!("Linked issue references in {path}"))
    } else {
        Ok(format!("Nothing to link in {path}"))
    }
}

/// Execute the `bump` command.
///
/// # Errors
///
/// Returns the first error raised by the release pipeline.
pub fn execute_bump(
    ctx: &Context,
    dry_run: bool,
    input: Option<&Path>,
    date: Option<NaiveDate>,
) -> Result<String, CliError> {
    let vcs = SystemGit::new(&ctx.root);
    let tool = CommandBumpTool::from_config(&ctx.config.bump_tool, &ctx.root);
    let text = log_text(ctx, input)?;

    let report =
        ctx.pipeline()
            .bump(&vcs, &tool, &text, date.unwrap_or_else(today), dry_run)?;
    let plan = &report.plan;

    let mut output = String::new();
    if report.dry_run {
        let _ = writeln!(output, "[dry-run] Would bump {} -> {}", plan.current, plan.next);
    } else {
        let _ = writeln!(output, "Bumped {} -> {}", plan.current, plan.next);
    }
    let _ = writeln!(output, "  Build number: {}", plan.build_number);
    let _ = writeln!(output, "  Tag:          {}", plan.tag_name);
    let _ = write!(
        output,
        "  Changelog:    {} features, {} fixes",
        report.changes.features.len(),
        report.changes.fixes.len()
    );
    Ok(output)
}
