//! Deterministic source and target paths for a variant's artifact.

use crate::types::{ArtifactKind, BuildVariant, RenameError};
use crate::version::{VersionName, check_file_name_component};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Everything needed to rename one assembled artifact.
///
/// Built once when the rename is registered and consumed by a single run.
/// Paths are derived from the other fields and cannot be set directly.
///
/// # Example
///
/// ```
/// use apkrename_core::{ArtifactDescriptor, ArtifactKind, BuildVariant, VersionName};
/// use std::path::Path;
///
/// let descriptor = ArtifactDescriptor::new(
///     "poke-discoverer",
///     VersionName::parse("1.2.0").unwrap(),
///     BuildVariant::Release,
///     ArtifactKind::Apk,
///     "android/app/build",
/// )
/// .unwrap();
///
/// assert_eq!(
///     descriptor.target_path(),
///     Path::new("android/app/build/outputs/apk/release/poke-discoverer-1.2.0-release.apk")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    application_name: String,
    version_name: VersionName,
    variant: BuildVariant,
    kind: ArtifactKind,
    source_path: PathBuf,
    target_path: PathBuf,
}

impl ArtifactDescriptor {
    /// Computes the descriptor for `variant`.
    ///
    /// # Arguments
    ///
    /// * `application_name` - Name embedded in the target file name
    /// * `version_name` - Validated version string
    /// * `variant` - Build variant whose output is renamed
    /// * `kind` - APK or AAB
    /// * `build_dir` - The Android module's build directory (e.g. `android/app/build`)
    pub fn new(
        application_name: impl Into<String>,
        version_name: VersionName,
        variant: BuildVariant,
        kind: ArtifactKind,
        build_dir: impl AsRef<Path>,
    ) -> Result<Self, RenameError> {
        let application_name = application_name.into();
        if let Err(reason) = check_file_name_component(&application_name) {
            return Err(RenameError::InvalidAppName(application_name, reason));
        }

        let output_dir = output_dir(build_dir.as_ref(), variant, kind);
        let source_path = output_dir.join(default_file_name(variant, kind));
        let target_path = output_dir.join(target_file_name(
            &application_name,
            &version_name,
            variant,
            kind,
        ));

        Ok(Self {
            application_name,
            version_name,
            variant,
            kind,
            source_path,
            target_path,
        })
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    pub fn version_name(&self) -> &VersionName {
        &self.version_name
    }

    pub fn variant(&self) -> BuildVariant {
        self.variant
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Default assembly output, e.g. `.../outputs/apk/release/app-release.apk`.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Renamed copy, in the same directory as the source.
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Directory holding both the source and the target.
    pub fn output_dir(&self) -> &Path {
        // Both paths are built by joining a file name onto the output dir.
        self.source_path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Output directory for a variant: `{build_dir}/outputs/{apk|bundle}/{variant}`.
pub fn output_dir(build_dir: &Path, variant: BuildVariant, kind: ArtifactKind) -> PathBuf {
    build_dir
        .join("outputs")
        .join(kind.outputs_subdir())
        .join(variant.as_str())
}

/// File name produced by the assembly task, e.g. `app-debug.apk`.
pub fn default_file_name(variant: BuildVariant, kind: ArtifactKind) -> String {
    format!("app-{}.{}", variant, kind.extension())
}

/// Renamed file name: `{application_name}-{version_name}-{variant}.{ext}`.
pub fn target_file_name(
    application_name: &str,
    version_name: &VersionName,
    variant: BuildVariant,
    kind: ArtifactKind,
) -> String {
    format!(
        "{}-{}-{}.{}",
        application_name,
        version_name,
        variant,
        kind.extension()
    )
}
