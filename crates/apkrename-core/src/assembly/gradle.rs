//! Gradle-backed assembly step.
//!
//! Runs the Gradle wrapper in the Android project directory. Signing
//! credentials are passed to the child process explicitly from a
//! [`SigningConfig`]; the parent environment is never consulted.

use super::AssemblyStep;
use crate::config::SigningConfig;
use crate::types::{ArtifactKind, BuildVariant, RenameError};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Number of stderr lines kept in an assembly error.
const STDERR_TAIL_LINES: usize = 40;

/// Assembly step that runs `gradlew <task>` in an Android project.
pub struct GradleAssembler {
    /// Directory containing `gradlew` (usually `<flutter project>/android`).
    android_dir: PathBuf,
    /// Credentials exported to the Gradle process.
    signing: Option<SigningConfig>,
    /// Whether to pass `--info` and log Gradle's stdout.
    verbose: bool,
    /// Log the command instead of running it.
    dry_run: bool,
}

impl GradleAssembler {
    /// Creates an assembler for the Android project at `android_dir`.
    pub fn new(android_dir: impl Into<PathBuf>) -> Self {
        Self {
            android_dir: android_dir.into(),
            signing: None,
            verbose: false,
            dry_run: false,
        }
    }

    /// Exports `signing` to the Gradle process.
    pub fn signing(mut self, signing: SigningConfig) -> Self {
        self.signing = Some(signing);
        self
    }

    /// Enables verbose output
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Logs the Gradle invocation without running it.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn android_dir(&self) -> &Path {
        &self.android_dir
    }

    /// Path to the platform's Gradle wrapper script.
    pub fn wrapper_path(&self) -> PathBuf {
        let wrapper = if cfg!(windows) { "gradlew.bat" } else { "gradlew" };
        self.android_dir.join(wrapper)
    }

    /// Builds the Gradle command for `variant` without running it.
    pub fn command(&self, variant: BuildVariant, kind: ArtifactKind) -> Command {
        let mut cmd = Command::new(self.wrapper_path());
        cmd.arg(kind.task_name(variant))
            .current_dir(&self.android_dir);

        if self.verbose {
            cmd.arg("--info");
        }

        if let Some(signing) = &self.signing {
            for (key, value) in signing.gradle_env() {
                cmd.env(key, value);
            }
        }

        cmd
    }

    fn check_project(&self) -> Result<(), RenameError> {
        if !self.android_dir.is_dir() {
            return Err(RenameError::Assembly(format!(
                "Android project not found at {}\n\n\
                 Pass --project-dir or set android.project_dir in apkrename.toml.",
                self.android_dir.display()
            )));
        }

        let wrapper = self.wrapper_path();
        if !wrapper.is_file() {
            return Err(RenameError::Assembly(format!(
                "Gradle wrapper not found at {}\n\n\
                 Generate it with `gradle wrapper` or run `flutter build apk` once.",
                wrapper.display()
            )));
        }

        Ok(())
    }
}

impl AssemblyStep for GradleAssembler {
    fn task_name(&self, variant: BuildVariant, kind: ArtifactKind) -> String {
        kind.task_name(variant)
    }

    fn assemble(&self, variant: BuildVariant, kind: ArtifactKind) -> Result<(), RenameError> {
        let task = kind.task_name(variant);

        if variant == BuildVariant::Release
            && !self.signing.as_ref().is_some_and(SigningConfig::is_complete)
        {
            log::warn!(
                "release signing credentials are incomplete; {} may fall back to unsigned or debug signing",
                task
            );
        }

        if self.dry_run {
            log::info!(
                "[dry-run] would run {} {} in {}",
                self.wrapper_path().display(),
                task,
                self.android_dir.display()
            );
            return Ok(());
        }

        self.check_project()?;

        log::info!("running Gradle task {} in {}", task, self.android_dir.display());
        let output = self.command(variant, kind).output().map_err(|e| {
            RenameError::Assembly(format!(
                "Failed to run {}: {}",
                self.wrapper_path().display(),
                e
            ))
        })?;

        if self.verbose {
            log::debug!("{}", String::from_utf8_lossy(&output.stdout));
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenameError::Assembly(format!(
                "Gradle task {} failed ({}):\n{}",
                task,
                output.status,
                tail(&stderr, STDERR_TAIL_LINES)
            )));
        }

        Ok(())
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
