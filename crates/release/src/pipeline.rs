//! Release pipeline.
//!
//! Runs the two release flows against one project root:
//! version derivation (manifest → plan → header) and changelog generation
//! (extract → render → link), then hands commit/tag/push requests to the
//! version control collaborator.

use crate::changelog::{ChangelogGenerator, ExtractedChanges};
use crate::config::ReleaseConfig;
use crate::error::{Error, Result};
use crate::header::VersionHeader;
use crate::linker::ReferenceLinker;
use crate::manifest::PackageManifest;
use crate::vcs::{BumpTool, VersionControl};
use crate::version::{BumpStrategy, ReleaseKind, Version};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything decided before a bump touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePlan {
    /// Version read from the manifest.
    pub current: Version,
    /// Classification of the current version.
    pub kind: ReleaseKind,
    /// Strategy used to compute the next version.
    pub strategy: BumpStrategy,
    /// Version after the bump.
    pub next: Version,
    /// Build number of the next version.
    pub build_number: u64,
    /// Commit message for the bump commit.
    pub commit_message: String,
    /// Tag name for the next version.
    pub tag_name: String,
    /// Tag message for the next version.
    pub tag_message: String,
}

/// Outcome of a full bump.
#[derive(Debug, Clone)]
pub struct BumpReport {
    /// The plan that was executed.
    pub plan: ReleasePlan,
    /// Entries added to the changelog.
    pub changes: ExtractedChanges,
    /// Whether this was a dry run that wrote nothing.
    pub dry_run: bool,
}

/// Release pipeline bound to a configuration and project root.
pub struct ReleasePipeline<'a> {
    config: &'a ReleaseConfig,
    root: PathBuf,
}

impl<'a> ReleasePipeline<'a> {
    /// Create a new pipeline.
    #[must_use]
    pub fn new(config: &'a ReleaseConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            root: root.into(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// The package manifest of this project.
    #[must_use]
    pub fn manifest(&self) -> PackageManifest {
        PackageManifest::new(self.resolve(&self.config.package.manifest))
    }

    /// Work out the next version and the git metadata for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be bumped or the next version
    /// has an invalid build number.
    pub fn plan(&self, current: &Version) -> Result<ReleasePlan> {
        let kind = current.release_kind();
        let strategy = kind.bump_strategy();
        let label = kind
            .prerelease_label(&self.config.git.prerelease_label)
            .unwrap_or_default();
        let next = current.bump(strategy, label)?;
        let build_number = next.build_number()?;
        let version = next.to_string();

        debug!(%current, %next, %kind, %strategy, build_number, "Planned release");

        Ok(ReleasePlan {
            current: current.clone(),
            kind,
            strategy,
            commit_message: self.config.git.format_commit_message(&version),
            tag_name: self.config.git.format_tag(&version),
            tag_message: self.config.git.format_tag_message(&version),
            next,
            build_number,
        })
    }

    /// Write the version header for `version`.
    ///
    /// # Errors
    ///
    /// Returns an error if the build number is invalid or the file cannot
    /// be written.
    pub fn write_header(&self, version: &Version) -> Result<VersionHeader> {
        let header = VersionHeader::new(
            version,
            version.build_number()?,
            &self.config.header.release_label,
        );
        header.write(&self.resolve(&self.config.header.path))?;
        Ok(header)
    }

    /// The reference linker for this project, if an issue tracker is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue pattern is invalid.
    pub fn linker(&self) -> Result<Option<ReferenceLinker>> {
        let linker = ReferenceLinker::from_config(&self.config.issue_tracker)?;
        if linker.is_none() {
            warn!("No issue tracker base URL configured, issue references stay unlinked");
        }
        Ok(linker)
    }

    /// Prepend a section for `version` built from `text` and relink the changelog.
    ///
    /// # Errors
    ///
    /// Returns an error if the patterns are invalid or the changelog cannot
    /// be read or written.
    pub fn update_changelog(
        &self,
        version: &Version,
        text: &str,
        date: NaiveDate,
    ) -> Result<ExtractedChanges> {
        let generator =
            ChangelogGenerator::from_config(&self.config.issue_tracker, &self.config.changelog)?;
        let linker = self.linker()?;
        let section = generator.section(version, date, text);
        let path = self.resolve(&self.config.changelog.path);

        generator.update_file(&path, &section, linker.as_ref())?;

        info!(
            path = %path.display(),
            %version,
            features = section.changes.features.len(),
            fixes = section.changes.fixes.len(),
            "Updated changelog"
        );
        Ok(section.changes)
    }

    /// Link bare issue references in the existing changelog.
    ///
    /// Returns `true` when the file was rewritten. A missing changelog or an
    /// unconfigured issue tracker leaves everything untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or the file cannot be read
    /// or written.
    pub fn relink_changelog(&self) -> Result<bool> {
        let path = self.resolve(&self.config.changelog.path);
        let Some(linker) = self.linker()? else {
            return Ok(false);
        };
        if !path.exists() {
            debug!(path = %path.display(), "No changelog to link");
            return Ok(false);
        }

        let content = fs::read_to_string(&path).map_err(|e| Error::file_read(&path, e))?;
        let linked = linker.link(&content);
        if linked == content {
            return Ok(false);
        }

        fs::write(&path, linked).map_err(|e| Error::file_write(&path, e))?;
        info!(path = %path.display(), "Linked issue references");
        Ok(true)
    }

    /// Run the full bump, using `log` as the text changelog entries are
    /// extracted from.
    ///
    /// Reads the manifest, plans the next version, then in order: writes the
    /// manifest, runs the bump tool, writes the header, updates the
    /// changelog, and commits, tags and pushes as configured. The first
    /// failure aborts the run.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any step.
    pub fn bump(
        &self,
        vcs: &dyn VersionControl,
        tool: &dyn BumpTool,
        log: &str,
        date: NaiveDate,
        dry_run: bool,
    ) -> Result<BumpReport> {
        let manifest = self.manifest();
        let current = manifest.read_version()?;
        let plan = self.plan(&current)?;

        info!(
            current = %plan.current,
            next = %plan.next,
            kind = %plan.kind,
            "Bumping version"
        );

        if dry_run {
            let generator = ChangelogGenerator::from_config(
                &self.config.issue_tracker,
                &self.config.changelog,
            )?;
            let section = generator.section(&plan.next, date, log);
            info!(
                tag = %plan.tag_name,
                features = section.changes.features.len(),
                fixes = section.changes.fixes.len(),
                "[dry-run] Would write manifest, header and changelog"
            );
            return Ok(BumpReport {
                plan,
                changes: section.changes,
                dry_run: true,
            });
        }

        manifest.write_version(&plan.next)?;

        if self.config.bump_tool.enabled {
            tool.bump(&plan.next)?;
        }

        self.write_header(&plan.next)?;
        let changes = self.update_changelog(&plan.next, log, date)?;

        let git = &self.config.git;
        if git.commit {
            let mut files = git.commit_files.clone();
            if !files.contains(&self.config.changelog.path) {
                files.push(self.config.changelog.path.clone());
            }
            vcs.commit(&files, &plan.commit_message)?;
        }
        if git.create_tag {
            vcs.tag(&plan.tag_name, &plan.tag_message)?;
        }
        if git.push_on_bump {
            vcs.push(&git.push_to)?;
        }

        Ok(BumpReport {
            plan,
            changes,
            dry_run: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::{RecordingBumpTool, RecordingVcs, VcsCall};
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn config() -> ReleaseConfig {
        let mut config = ReleaseConfig::default();
        config.issue_tracker.base_url = "https://jira.example.com/browse".to_string();
        config
    }

    fn project(version: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("package.json"),
            format!(r#"{{"name": "qwasi", "version": "{version}"}}"#),
        )
        .unwrap();
        temp
    }

    #[test]
    fn test_plan_release() {
        let config = config();
        let pipeline = ReleasePipeline::new(&config, ".");
        let plan = pipeline.plan(&Version::new(1, 2, 0)).unwrap();

        assert_eq!(plan.kind, ReleaseKind::Release);
        assert_eq!(plan.strategy, BumpStrategy::Patch);
        assert_eq!(plan.next, Version::new(1, 2, 1));
        assert_eq!(plan.build_number, 1000);
        assert_eq!(plan.commit_message, "#bump Release 1.2.1");
        assert_eq!(plan.tag_name, "1.2.1");
        assert_eq!(plan.tag_message, "Release 1.2.1");
    }

    #[test]
    fn test_plan_prerelease() {
        let config = config();
        let pipeline = ReleasePipeline::new(&config, ".");
        let plan = pipeline.plan(&"1.2.0-dev.3".parse().unwrap()).unwrap();

        assert_eq!(plan.kind, ReleaseKind::Prerelease);
        assert_eq!(plan.next.to_string(), "1.2.0-dev.4");
        assert_eq!(plan.build_number, 4);
    }

    #[test]
    fn test_plan_at_numeric_limit_fails() {
        let config = config();
        let pipeline = ReleasePipeline::new(&config, ".");

        for version in ["1.2.18446744073709551615", "1.2.0-dev.18446744073709551615"] {
            let err = pipeline.plan(&version.parse().unwrap()).unwrap_err();
            assert!(matches!(err, Error::VersionOutOfRange { .. }), "{version}");
        }
    }

    #[test]
    fn test_bump_failing_tag_skips_push() {
        let temp = project("1.2.0");
        let config = config();
        let pipeline = ReleasePipeline::new(&config, temp.path());
        let vcs = RecordingVcs::default().failing_on("tag");

        let err = pipeline
            .bump(&vcs, &RecordingBumpTool::default(), "", date(), false)
            .unwrap_err();

        assert!(matches!(err, Error::Git { .. }));
        let calls = vcs.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], VcsCall::Commit { .. }));
        assert!(!calls.iter().any(|c| matches!(c, VcsCall::Push { .. })));
    }

    #[test]
    fn test_bump_failing_commit_skips_tag_and_push() {
        let temp = project("1.2.0");
        let config = config();
        let pipeline = ReleasePipeline::new(&config, temp.path());
        let vcs = RecordingVcs::default().failing_on("commit");

        let err = pipeline
            .bump(&vcs, &RecordingBumpTool::default(), "", date(), false)
            .unwrap_err();

        assert!(matches!(err, Error::Git { .. }));
        assert!(vcs.calls().is_empty());
    }

    #[test]
    fn test_write_header_and_changelog_for_release() {
        let temp = TempDir::new().unwrap();
        let config = config();
        let pipeline = ReleasePipeline::new(&config, temp.path());
        let version: Version = "1.2.0".parse().unwrap();

        pipeline.write_header(&version).unwrap();
        pipeline
            .update_changelog(&version, "implements IOSSDK-12 foo\nfixes IOSSDK-13 bar", date())
            .unwrap();

        let header = fs::read_to_string(temp.path().join("Pod/Classes/Version.h")).unwrap();
        assert!(header.contains("SHORT_VERSION @\"1.2.0\""));
        assert!(header.contains("BUILD_VERSION 1000"));
        assert!(header.contains("VERSION_STRING @\"1.2.0-release\""));

        let changelog = fs::read_to_string(temp.path().join("CHANGELOG.md")).unwrap();
        assert!(changelog.starts_with("## SDK Version 1.2.0 / 2024-03-05\n"));
        assert!(changelog.find("[NEW]").unwrap() < changelog.find("[FIX]").unwrap());
        assert!(changelog.contains("[IOSSDK-12](https://jira.example.com/browse/IOSSDK-12)"));
    }

    #[test]
    fn test_repeated_changelog_runs_do_not_double_link() {
        let temp = TempDir::new().unwrap();
        let config = config();
        let pipeline = ReleasePipeline::new(&config, temp.path());

        pipeline
            .update_changelog(&Version::new(1, 0, 0), "fixes IOSSDK-1 a", date())
            .unwrap();
        pipeline
            .update_changelog(&Version::new(1, 0, 1), "fixes IOSSDK-2 b", date())
            .unwrap();

        let changelog = fs::read_to_string(temp.path().join("CHANGELOG.md")).unwrap();
        assert_eq!(changelog.matches("[IOSSDK-1](").count(), 1);
        assert!(!changelog.contains("[[IOSSDK-1]"));
    }

    #[test]
    fn test_relink_changelog() {
        let temp = TempDir::new().unwrap();
        let config = config();
        let pipeline = ReleasePipeline::new(&config, temp.path());
        assert!(!pipeline.relink_changelog().unwrap());

        fs::write(
            temp.path().join("CHANGELOG.md"),
            "## SDK Version 1.0.0 / 2024-03-05\n\n- [FIX] fixes IOSSDK-7 crash\n",
        )
        .unwrap();

        assert!(pipeline.relink_changelog().unwrap());
        assert!(!pipeline.relink_changelog().unwrap());
        let changelog = fs::read_to_string(temp.path().join("CHANGELOG.md")).unwrap();
        assert!(changelog.contains("fixes [IOSSDK-7](https://jira.example.com/browse/IOSSDK-7) crash"));
    }

    #[test]
    fn test_relink_without_tracker_is_noop() {
        let temp = TempDir::new().unwrap();
        let config = ReleaseConfig::default();
        let pipeline = ReleasePipeline::new(&config, temp.path());
        fs::write(temp.path().join("CHANGELOG.md"), "fixes IOSSDK-7\n").unwrap();

        assert!(!pipeline.relink_changelog().unwrap());
        assert_eq!(
            fs::read_to_string(temp.path().join("CHANGELOG.md")).unwrap(),
            "fixes IOSSDK-7\n"
        );
    }

    #[test]
    fn test_bump_full_run() {
        let temp = project("1.2.0-dev.3");
        let config = config();
        let pipeline = ReleasePipeline::new(&config, temp.path());
        let vcs = RecordingVcs::default();
        let tool = RecordingBumpTool::default();
        let log = "implements IOSSDK-20 beacons\nfixes IOSSDK-21 crash";

        let report = pipeline.bump(&vcs, &tool, log, date(), false).unwrap();

        assert_eq!(report.plan.next.to_string(), "1.2.0-dev.4");
        assert_eq!(report.changes.features.len(), 1);
        assert_eq!(tool.versions(), vec!["1.2.0-dev.4".to_string()]);
        assert_eq!(
            pipeline.manifest().read_version().unwrap().to_string(),
            "1.2.0-dev.4"
        );

        let header = fs::read_to_string(temp.path().join("Pod/Classes/Version.h")).unwrap();
        assert!(header.contains("BUILD_VERSION 4"));

        let calls = vcs.calls();
        assert_eq!(calls.len(), 3);
        match &calls[0] {
            VcsCall::Commit { files, message } => {
                assert_eq!(message, "#bump Release 1.2.0-dev.4");
                assert!(files.contains(&PathBuf::from("CHANGELOG.md")));
            }
            other => panic!("expected commit, got {other:?}"),
        }
        assert_eq!(
            calls[1],
            VcsCall::Tag {
                name: "1.2.0-dev.4".to_string(),
                message: "Release 1.2.0-dev.4".to_string()
            }
        );
        assert_eq!(
            calls[2],
            VcsCall::Push {
                remote: "origin".to_string()
            }
        );
    }

    #[test]
    fn test_bump_without_push() {
        let temp = project("1.2.0");
        let mut config = config();
        config.git.push_on_bump = false;
        let pipeline = ReleasePipeline::new(&config, temp.path());
        let vcs = RecordingVcs::default();

        pipeline
            .bump(&vcs, &RecordingBumpTool::default(), "", date(), false)
            .unwrap();

        assert!(
            !vcs.calls()
                .iter()
                .any(|c| matches!(c, VcsCall::Push { .. }))
        );
    }

    #[test]
    fn test_bump_dry_run_touches_nothing() {
        let temp = project("1.2.0");
        let config = config();
        let pipeline = ReleasePipeline::new(&config, temp.path());
        let vcs = RecordingVcs::default();
        let tool = RecordingBumpTool::default();

        let report = pipeline
            .bump(&vcs, &tool, "fixes IOSSDK-1 x", date(), true)
            .unwrap();

        assert!(report.dry_run);
        assert_eq!(report.plan.next, Version::new(1, 2, 1));
        assert_eq!(report.changes.fixes.len(), 1);
        assert!(vcs.calls().is_empty());
        assert!(tool.versions().is_empty());
        assert!(!temp.path().join("CHANGELOG.md").exists());
        assert!(!temp.path().join("Pod/Classes/Version.h").exists());
        assert_eq!(
            pipeline.manifest().read_version().unwrap(),
            Version::new(1, 2, 0)
        );
    }

    #[test]
    fn test_bump_invalid_manifest_version_writes_nothing() {
        let temp = project("1.2");
        let config = config();
        let pipeline = ReleasePipeline::new(&config, temp.path());

        let err = pipeline
            .bump(
                &RecordingVcs::default(),
                &RecordingBumpTool::default(),
                "",
                date(),
                false,
            )
            .unwrap_err();

        assert!(matches!(err, Error::InvalidVersion { .. }));
        assert!(!temp.path().join("Pod/Classes/Version.h").exists());
        assert!(!temp.path().join("CHANGELOG.md").exists());
    }

    #[test]
    fn test_write_header_invalid_build_number_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let config = config();
        let pipeline = ReleasePipeline::new(&config, temp.path());

        let err = pipeline
            .write_header(&"1.2.0-dev.x".parse().unwrap())
            .unwrap_err();

        assert!(matches!(err, Error::InvalidBuildNumber { .. }));
        assert!(!temp.path().join("Pod/Classes/Version.h").exists());
    }

    #[test]
    fn test_bump_tool_failure_aborts() {
        let temp = project("1.2.0");
        let config = config();
        let pipeline = ReleasePipeline::new(&config, temp.path());
        let vcs = RecordingVcs::default();

        let err = pipeline
            .bump(&vcs, &RecordingBumpTool::failing(), "", date(), false)
            .unwrap_err();

        assert!(matches!(err, Error::BumpTool { .. }));
        assert!(vcs.calls().is_empty());
        assert!(!temp.path().join("Pod/Classes/Version.h").exists());
    }
}
