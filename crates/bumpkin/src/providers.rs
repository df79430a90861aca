//! Process-backed collaborators for the release pipeline.
//!
//! [`SystemGit`] shells out to `git` and [`CommandBumpTool`] runs the
//! configured pod bump program. Both run in the project root.

use bumpkin_release::config::BumpToolConfig;
use bumpkin_release::{BumpTool, Error, Result, Version, VersionControl};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};

fn describe_failure(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        format!("exited with {}: {stderr}", output.status)
    }
}

/// [`VersionControl`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct SystemGit {
    root: PathBuf,
}

impl SystemGit {
    /// Create a git collaborator operating in `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        debug!(?args, root = %self.root.display(), "Running git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::git(format!("failed to run git {}: {e}", args.join(" "))))?;

        if !output.status.success() {
            return Err(Error::git(format!(
                "git {} {}",
                args.join(" "),
                describe_failure(&output)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VersionControl for SystemGit {
    fn commit(&self, files: &[PathBuf], message: &str) -> Result<()> {
        let paths: Vec<&str> = files.iter().filter_map(|p| p.to_str()).collect();

        let mut add = vec!["add", "--"];
        add.extend(&paths);
        self.run(&add)?;

        let mut commit = vec!["commit", "-m", message, "--"];
        commit.extend(&paths);
        self.run(&commit)?;

        info!(files = paths.len(), %message, "Committed");
        Ok(())
    }

    fn tag(&self, name: &str, message: &str) -> Result<()> {
        self.run(&["tag", "-a", name, "-m", message])?;
        info!(%name, "Tagged");
        Ok(())
    }

    fn push(&self, remote: &str) -> Result<()> {
        self.run(&["push", remote])?;
        self.run(&["push", remote, "--tags"])?;
        info!(%remote, "Pushed");
        Ok(())
    }

    fn log_since_last_tag(&self) -> Result<String> {
        // A repository without tags yields its whole history.
        let range = match self.run(&["describe", "--tags", "--abbrev=0"]) {
            Ok(tag) => format!("{}..HEAD", tag.trim()),
            Err(_) => "HEAD".to_string(),
        };
        self.run(&["log", "--reverse", "--format=%B", &range])
    }
}

/// [`BumpTool`] that runs an external program with the version appended.
#[derive(Debug, Clone)]
pub struct CommandBumpTool {
    program: String,
    args: Vec<String>,
    root: PathBuf,
}

impl CommandBumpTool {
    /// Create a bump tool from its configuration, running in `root`.
    #[must_use]
    pub fn from_config(config: &BumpToolConfig, root: &Path) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            root: root.to_path_buf(),
        }
    }
}

impl BumpTool for CommandBumpTool {
    fn bump(&self, version: &Version) -> Result<()> {
        let version = version.to_string();
        debug!(program = %self.program, args = ?self.args, %version, "Running bump tool");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&version)
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::bump_tool(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(Error::bump_tool(format!(
                "{} {}",
                self.program,
                describe_failure(&output)
            )));
        }

        info!(program = %self.program, %version, "Bump tool finished");
        Ok(())
    }
}
