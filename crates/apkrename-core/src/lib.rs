//! Versioned artifact names for Android builds.
//!
//! `apkrename-core` copies the installable package produced by an Android
//! build variant to a deterministic, human-readable name:
//!
//! ```text
//! build/outputs/apk/release/app-release.apk
//!   -> build/outputs/apk/release/poke-discoverer-1.2.0-release.apk
//! ```
//!
//! The original stays in place so downstream packaging and signing steps are
//! unaffected, and the copy is byte-identical to it.
//!
//! # Architecture
//!
//! - **Descriptor**: computes source and target paths from app name, version and variant
//! - **Renamer**: performs the copy and tracks the one-shot task state
//! - **Assembly**: the step that must run first (Gradle, or prebuilt outputs)
//! - **Config**: build and signing values handed in by the caller
//!
//! # Example
//!
//! ```ignore
//! use apkrename_core::{
//!     ArtifactDescriptor, ArtifactKind, BuildVariant, RenameTask, VersionName,
//!     assembly::GradleAssembler,
//! };
//!
//! fn main() -> Result<(), apkrename_core::RenameError> {
//!     let descriptor = ArtifactDescriptor::new(
//!         "poke-discoverer",
//!         VersionName::parse("1.2.0")?,
//!         BuildVariant::Release,
//!         ArtifactKind::Apk,
//!         "android/app/build",
//!     )?;
//!
//!     let mut task = RenameTask::new(descriptor);
//!     let outcome = task.run_after(&GradleAssembler::new("android"))?;
//!     println!("{} ({})", outcome.target.display(), outcome.sha256);
//!     Ok(())
//! }
//! ```

pub mod assembly;
pub mod config;
pub mod descriptor;
pub mod renamer;
pub mod types;
pub mod version;

pub use assembly::{AssemblyStep, GradleAssembler, PrebuiltArtifacts};
pub use config::{AndroidBuildConfig, SigningConfig};
pub use descriptor::ArtifactDescriptor;
pub use renamer::{RenameTask, TaskState, rename_artifact, sha256_file};
pub use types::{ArtifactKind, BuildVariant, RenameError, RenameOutcome};
pub use version::{PubspecVersion, VersionName, read_pubspec};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
