//! Copying an assembled artifact to its versioned name.
//!
//! [`rename_artifact`] is the single parameterized operation: it copies the
//! variant's default output to `{app}-{version}-{variant}.{ext}` next to it and
//! leaves the original in place. [`RenameTask`] adds the one-shot lifecycle
//! and the ordering edge onto the assembly step.
//!
//! ## Re-runs
//!
//! Running again with the same inputs overwrites the previous target. The
//! copy is written to a temporary file in the output directory and then
//! persisted over the target, so an interrupted run never leaves a partial
//! file behind.

use crate::assembly::AssemblyStep;
use crate::descriptor::ArtifactDescriptor;
use crate::types::{BuildVariant, RenameError, RenameOutcome};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Copies the descriptor's source artifact to its target path.
///
/// # Returns
///
/// * `Ok(RenameOutcome)` with the size and SHA-256 of the copied artifact
/// * `Err(RenameError::MissingArtifact)` if the source does not exist; no target is created
/// * `Err(RenameError::Io)` if reading or writing fails
/// * `Err(RenameError::ChecksumMismatch)` if the written copy differs from the source
pub fn rename_artifact(descriptor: &ArtifactDescriptor) -> Result<RenameOutcome, RenameError> {
    let source = descriptor.source_path();
    let target = descriptor.target_path();

    match fs::metadata(source) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Err(missing_artifact(descriptor)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(missing_artifact(descriptor));
        }
        Err(e) => return Err(RenameError::io(source, e)),
    }

    log::debug!("copying {} -> {}", source.display(), target.display());

    let output_dir = descriptor.output_dir();
    let mut staged =
        NamedTempFile::new_in(output_dir).map_err(|e| RenameError::io(output_dir, e))?;
    let mut reader = File::open(source).map_err(|e| RenameError::io(source, e))?;
    let (bytes, source_sha256) = copy_hashing(&mut reader, staged.as_file_mut())
        .map_err(|e| RenameError::io(staged.path(), e))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| RenameError::io(staged.path(), e))?;
    staged
        .persist(target)
        .map_err(|e| RenameError::io(target, e.error))?;

    let target_sha256 = sha256_file(target)?;
    if target_sha256 != source_sha256 {
        return Err(RenameError::ChecksumMismatch {
            target: target.to_path_buf(),
            source_sha256,
            target_sha256,
        });
    }

    log::info!(
        "renamed {} artifact to {} ({} bytes, sha256 {})",
        descriptor.variant(),
        target.display(),
        bytes,
        source_sha256
    );

    Ok(RenameOutcome {
        variant: descriptor.variant(),
        source: source.to_path_buf(),
        target: target.to_path_buf(),
        bytes,
        sha256: source_sha256,
    })
}

/// Hex-encoded SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String, RenameError> {
    let mut file = File::open(path).map_err(|e| RenameError::io(path, e))?;
    let (_, digest) = copy_hashing(&mut file, &mut io::sink()).map_err(|e| RenameError::io(path, e))?;
    Ok(digest)
}

fn copy_hashing<R: Read, W: io::Write>(reader: &mut R, writer: &mut W) -> io::Result<(u64, String)> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok((total, hex::encode(hasher.finalize())))
}

fn missing_artifact(descriptor: &ArtifactDescriptor) -> RenameError {
    RenameError::MissingArtifact {
        expected: descriptor.source_path().to_path_buf(),
        candidates: sibling_artifacts(descriptor),
    }
}

/// Other artifacts with the same extension in the output directory, excluding
/// a previously renamed copy.
fn sibling_artifacts(descriptor: &ArtifactDescriptor) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(descriptor.output_dir()) else {
        return Vec::new();
    };
    let ext = descriptor.kind().extension();
    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|e| e == ext))
        .filter(|path| path != descriptor.target_path())
        .collect();
    found.sort();
    found
}

/// Lifecycle state of a [`RenameTask`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Registered, not yet run.
    Pending,
    /// The copy succeeded.
    Completed(RenameOutcome),
    /// Assembly or copy failed; holds the error message.
    Failed(String),
}

/// One-shot rename registered for a single variant.
///
/// ```ignore
/// use apkrename_core::{RenameTask, assembly::GradleAssembler};
///
/// let mut task = RenameTask::new(descriptor);
/// let gradle = GradleAssembler::new("android");
/// let outcome = task.run_after(&gradle)?;
/// println!("{}", outcome.target.display());
/// ```
#[derive(Debug)]
pub struct RenameTask {
    descriptor: ArtifactDescriptor,
    state: TaskState,
}

impl RenameTask {
    pub fn new(descriptor: ArtifactDescriptor) -> Self {
        Self {
            descriptor,
            state: TaskState::Pending,
        }
    }

    pub fn descriptor(&self) -> &ArtifactDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub fn variant(&self) -> BuildVariant {
        self.descriptor.variant()
    }

    /// Runs the rename, assuming assembly already happened.
    pub fn run(&mut self) -> Result<RenameOutcome, RenameError> {
        self.ensure_pending()?;
        let result = rename_artifact(&self.descriptor);
        self.record(result)
    }

    /// Runs `step` for this task's variant, then the rename.
    ///
    /// If the assembly step fails the task is marked failed and nothing is copied.
    pub fn run_after(&mut self, step: &dyn AssemblyStep) -> Result<RenameOutcome, RenameError> {
        self.ensure_pending()?;
        log::info!(
            "running {} before renaming {} artifact",
            step.task_name(self.descriptor.variant(), self.descriptor.kind()),
            self.descriptor.variant()
        );
        let result = step
            .assemble(self.descriptor.variant(), self.descriptor.kind())
            .and_then(|()| rename_artifact(&self.descriptor));
        self.record(result)
    }

    fn ensure_pending(&self) -> Result<(), RenameError> {
        match self.state {
            TaskState::Pending => Ok(()),
            _ => Err(RenameError::TaskAlreadyRun(self.descriptor.variant())),
        }
    }

    fn record(
        &mut self,
        result: Result<RenameOutcome, RenameError>,
    ) -> Result<RenameOutcome, RenameError> {
        match &result {
            Ok(outcome) => self.state = TaskState::Completed(outcome.clone()),
            Err(e) => self.state = TaskState::Failed(e.to_string()),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArtifactKind;
    use crate::version::VersionName;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn descriptor(build_dir: &Path, variant: BuildVariant) -> ArtifactDescriptor {
        ArtifactDescriptor::new(
            "poke-discoverer",
            VersionName::parse("1.2.0").unwrap(),
            variant,
            ArtifactKind::Apk,
            build_dir,
        )
        .unwrap()
    }

    fn write_source(d: &ArtifactDescriptor, contents: &[u8]) {
        fs::create_dir_all(d.output_dir()).unwrap();
        fs::write(d.source_path(), contents).unwrap();
    }

    struct FakeAssembler {
        succeed: bool,
        calls: Cell<u32>,
    }

    impl AssemblyStep for FakeAssembler {
        fn task_name(&self, variant: BuildVariant, kind: ArtifactKind) -> String {
            kind.task_name(variant)
        }

        fn assemble(&self, _variant: BuildVariant, _kind: ArtifactKind) -> Result<(), RenameError> {
            self.calls.set(self.calls.get() + 1);
            if self.succeed {
                Ok(())
            } else {
                Err(RenameError::Assembly("gradle exited with status 1".to_string()))
            }
        }
    }

    #[test]
    fn test_release_copy_is_byte_identical() {
        let temp = TempDir::new().unwrap();
        let d = descriptor(temp.path(), BuildVariant::Release);
        let payload = b"PK\x03\x04 fake apk payload".repeat(5000);
        write_source(&d, &payload);

        let outcome = rename_artifact(&d).unwrap();

        assert_eq!(
            outcome.target.file_name().unwrap(),
            "poke-discoverer-1.2.0-release.apk"
        );
        assert_eq!(fs::read(&outcome.target).unwrap(), payload);
        assert_eq!(outcome.bytes, payload.len() as u64);
        assert_eq!(outcome.sha256, sha256_file(d.source_path()).unwrap());
    }

    #[test]
    fn test_source_left_untouched() {
        let temp = TempDir::new().unwrap();
        let d = descriptor(temp.path(), BuildVariant::Debug);
        write_source(&d, b"debug build");

        rename_artifact(&d).unwrap();

        assert_eq!(fs::read(d.source_path()).unwrap(), b"debug build");
        assert_eq!(
            d.target_path().file_name().unwrap(),
            "poke-discoverer-1.2.0-debug.apk"
        );
    }

    #[test]
    fn test_missing_source_creates_no_target() {
        let temp = TempDir::new().unwrap();
        let d = descriptor(temp.path(), BuildVariant::Release);

        let err = rename_artifact(&d).unwrap_err();

        assert!(matches!(err, RenameError::MissingArtifact { .. }));
        assert!(!d.target_path().exists());
    }

    #[test]
    fn test_missing_source_lists_other_artifacts() {
        let temp = TempDir::new().unwrap();
        let d = descriptor(temp.path(), BuildVariant::Release);
        fs::create_dir_all(d.output_dir()).unwrap();
        fs::write(d.output_dir().join("app-arm64-v8a-release.apk"), b"x").unwrap();
        fs::write(d.output_dir().join("output-metadata.json"), b"{}").unwrap();

        match rename_artifact(&d).unwrap_err() {
            RenameError::MissingArtifact { candidates, .. } => {
                assert_eq!(candidates.len(), 1);
                assert!(candidates[0].ends_with("app-arm64-v8a-release.apk"));
            }
            other => panic!("unexpected error: {other}"),
        }
        let leftovers: Vec<_> = fs::read_dir(d.output_dir()).unwrap().collect();
        assert_eq!(leftovers.len(), 2);
    }

    #[test]
    fn test_directory_at_source_path_is_missing_artifact() {
        let temp = TempDir::new().unwrap();
        let d = descriptor(temp.path(), BuildVariant::Release);
        fs::create_dir_all(d.source_path()).unwrap();

        let err = rename_artifact(&d).unwrap_err();
        assert!(matches!(err, RenameError::MissingArtifact { .. }));
    }

    #[test]
    fn test_rerun_overwrites_with_identical_content() {
        let temp = TempDir::new().unwrap();
        let d = descriptor(temp.path(), BuildVariant::Release);
        write_source(&d, b"release v1");

        let first = rename_artifact(&d).unwrap();
        let second = rename_artifact(&d).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read(d.target_path()).unwrap(), b"release v1");
    }

    #[test]
    fn test_rerun_replaces_stale_target() {
        let temp = TempDir::new().unwrap();
        let d = descriptor(temp.path(), BuildVariant::Release);
        write_source(&d, b"fresh build");
        fs::write(d.target_path(), b"stale build from yesterday").unwrap();

        rename_artifact(&d).unwrap();

        assert_eq!(fs::read(d.target_path()).unwrap(), b"fresh build");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let temp = TempDir::new().unwrap();
        let d = descriptor(temp.path(), BuildVariant::Debug);
        write_source(&d, b"apk");

        rename_artifact(&d).unwrap();

        let mut names: Vec<String> = fs::read_dir(d.output_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["app-debug.apk", "poke-discoverer-1.2.0-debug.apk"]);
    }

    #[test]
    fn test_task_transitions_to_completed() {
        let temp = TempDir::new().unwrap();
        let d = descriptor(temp.path(), BuildVariant::Release);
        write_source(&d, b"apk");

        let mut task = RenameTask::new(d);
        assert_eq!(task.state(), &TaskState::Pending);

        let outcome = task.run().unwrap();
        assert_eq!(task.state(), &TaskState::Completed(outcome));
    }

    #[test]
    fn test_task_is_one_shot() {
        let temp = TempDir::new().unwrap();
        let d = descriptor(temp.path(), BuildVariant::Release);
        write_source(&d, b"apk");

        let mut task = RenameTask::new(d);
        task.run().unwrap();
        let err = task.run().unwrap_err();
        assert!(matches!(err, RenameError::TaskAlreadyRun(BuildVariant::Release)));
    }

    #[test]
    fn test_task_fails_without_assembly_output() {
        let temp = TempDir::new().unwrap();
        let mut task = RenameTask::new(descriptor(temp.path(), BuildVariant::Debug));

        assert!(task.run().is_err());
        assert!(matches!(task.state(), TaskState::Failed(msg) if msg.contains("app-debug.apk")));
    }

    #[test]
    fn test_failed_assembly_skips_copy() {
        let temp = TempDir::new().unwrap();
        let d = descriptor(temp.path(), BuildVariant::Release);
        // A stale output from an earlier build must not be renamed.
        write_source(&d, b"stale");
        let target = d.target_path().to_path_buf();

        let assembler = FakeAssembler {
            succeed: false,
            calls: Cell::new(0),
        };
        let mut task = RenameTask::new(d);
        let err = task.run_after(&assembler).unwrap_err();

        assert!(matches!(err, RenameError::Assembly(_)));
        assert_eq!(assembler.calls.get(), 1);
        assert!(matches!(task.state(), TaskState::Failed(_)));
        assert!(!target.exists());
    }

    #[test]
    fn test_successful_assembly_then_copy() {
        let temp = TempDir::new().unwrap();
        let d = descriptor(temp.path(), BuildVariant::Release);
        write_source(&d, b"built");

        let assembler = FakeAssembler {
            succeed: true,
            calls: Cell::new(0),
        };
        let mut task = RenameTask::new(d);
        let outcome = task.run_after(&assembler).unwrap();

        assert_eq!(assembler.calls.get(), 1);
        assert_eq!(fs::read(outcome.target).unwrap(), b"built");
    }
}
