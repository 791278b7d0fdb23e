//! Core types for apkrename-core.
//!
//! This module defines the fundamental types used throughout the crate:
//!
//! - [`RenameError`] - Error types for rename and assembly operations
//! - [`BuildVariant`] - Build variant selection (debug or release)
//! - [`ArtifactKind`] - Packaging format produced by the assembly step
//! - [`RenameOutcome`] - Output from a successful rename

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Error types for apkrename-core operations.
///
/// # Example
///
/// ```ignore
/// use apkrename_core::{rename_artifact, RenameError};
///
/// match rename_artifact(&descriptor) {
///     Ok(outcome) => println!("Wrote {}", outcome.target.display()),
///     Err(RenameError::MissingArtifact { expected, .. }) => {
///         eprintln!("Nothing to rename at {}", expected.display());
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RenameError {
    /// The assembly output was not found at its default location.
    ///
    /// `candidates` lists other artifacts of the same kind found in the
    /// output directory, which usually points at a renamed or flavored build.
    #[error("artifact not found at {}{}\n\nRun the assembly task for this variant first.", .expected.display(), format_candidates(.candidates))]
    MissingArtifact {
        expected: PathBuf,
        candidates: Vec<PathBuf>,
    },

    /// The version name is empty or cannot be embedded in a file name.
    #[error("invalid version name {0:?}: {1}")]
    InvalidVersion(String, String),

    /// The application name is empty or cannot be embedded in a file name.
    #[error("invalid application name {0:?}: {1}")]
    InvalidAppName(String, String),

    /// An I/O error occurred while reading the source or writing the target.
    #[error("I/O error on {}: {source}. Check file paths and permissions", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The written target does not hash to the same digest as the source.
    #[error("checksum mismatch after copy: source {source_sha256}, target {target_sha256} ({})", .target.display())]
    ChecksumMismatch {
        target: PathBuf,
        source_sha256: String,
        target_sha256: String,
    },

    /// The external assembly step failed.
    #[error("assembly error: {0}")]
    Assembly(String),

    /// A rename task was asked to run a second time.
    #[error("rename task for {0} has already run")]
    TaskAlreadyRun(BuildVariant),

    /// Invalid or missing build configuration.
    #[error("configuration error: {0}. Check apkrename.toml, pubspec.yaml or CLI flags")]
    Config(String),
}

impl RenameError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RenameError::Io {
            path: path.into(),
            source,
        }
    }
}

fn format_candidates(candidates: &[PathBuf]) -> String {
    if candidates.is_empty() {
        return String::new();
    }
    let names: Vec<String> = candidates
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect();
    format!("\n\nOther artifacts in that directory:\n{}", names.join("\n"))
}

/// A named build configuration producing a distinct installable artifact.
///
/// # Example
///
/// ```
/// use apkrename_core::BuildVariant;
///
/// let variant: BuildVariant = "release".parse().unwrap();
/// assert_eq!(variant.as_str(), "release");
/// assert_eq!(variant.capitalized(), "Release");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildVariant {
    /// Debug build, signed with the debug keystore.
    Debug,
    /// Release build, signed with the release signing config.
    Release,
}

impl BuildVariant {
    /// All supported variants.
    pub const ALL: [BuildVariant; 2] = [BuildVariant::Debug, BuildVariant::Release];

    /// Returns the lowercase name used in paths and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildVariant::Debug => "debug",
            BuildVariant::Release => "release",
        }
    }

    /// Returns the name with its first letter uppercased, as used in Gradle task names.
    pub fn capitalized(&self) -> &'static str {
        match self {
            BuildVariant::Debug => "Debug",
            BuildVariant::Release => "Release",
        }
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildVariant {
    type Err = RenameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(BuildVariant::Debug),
            "release" => Ok(BuildVariant::Release),
            other => Err(RenameError::Config(format!(
                "unknown build variant '{}', expected one of: debug, release",
                other
            ))),
        }
    }
}

/// Packaging format of the assembled artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Installable APK, produced by `assemble<Variant>` under `outputs/apk/`.
    #[default]
    Apk,
    /// Android App Bundle, produced by `bundle<Variant>` under `outputs/bundle/`.
    Aab,
}

impl ArtifactKind {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Apk => "apk",
            ArtifactKind::Aab => "aab",
        }
    }

    /// Directory under `build/outputs/` that holds this kind of artifact.
    pub fn outputs_subdir(&self) -> &'static str {
        match self {
            ArtifactKind::Apk => "apk",
            ArtifactKind::Aab => "bundle",
        }
    }

    /// Name of the Gradle task that produces this kind of artifact for `variant`.
    ///
    /// ```
    /// use apkrename_core::{ArtifactKind, BuildVariant};
    ///
    /// assert_eq!(ArtifactKind::Apk.task_name(BuildVariant::Release), "assembleRelease");
    /// assert_eq!(ArtifactKind::Aab.task_name(BuildVariant::Debug), "bundleDebug");
    /// ```
    pub fn task_name(&self, variant: BuildVariant) -> String {
        let verb = match self {
            ArtifactKind::Apk => "assemble",
            ArtifactKind::Aab => "bundle",
        };
        format!("{}{}", verb, variant.capitalized())
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Result of a successful rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOutcome {
    /// Variant that was renamed.
    pub variant: BuildVariant,
    /// Original assembly output, left in place.
    pub source: PathBuf,
    /// Newly written copy.
    pub target: PathBuf,
    /// Size of the artifact in bytes.
    pub bytes: u64,
    /// Hex-encoded SHA-256 shared by source and target.
    pub sha256: String,
}
