//! The external step that produces a variant's artifact.
//!
//! A rename always runs after an [`AssemblyStep`] for the same variant. The
//! step is the explicit ordering edge: if it fails, nothing is copied.
//!
//! | Step | Behavior |
//! |------|----------|
//! | [`GradleAssembler`] | Runs `./gradlew assemble<Variant>` (or `bundle<Variant>`) |
//! | [`PrebuiltArtifacts`] | Does nothing; the outputs already exist |

pub mod gradle;

pub use gradle::GradleAssembler;

use crate::types::{ArtifactKind, BuildVariant, RenameError};

/// Produces the artifact for a variant.
pub trait AssemblyStep {
    /// Name of the task this step runs, for logs and dry runs.
    fn task_name(&self, variant: BuildVariant, kind: ArtifactKind) -> String;

    /// Runs the assembly. Returns only once the artifact is written or the step failed.
    fn assemble(&self, variant: BuildVariant, kind: ArtifactKind) -> Result<(), RenameError>;
}

/// Assembly step for outputs built earlier, e.g. by a separate CI job.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrebuiltArtifacts;

impl AssemblyStep for PrebuiltArtifacts {
    fn task_name(&self, variant: BuildVariant, kind: ArtifactKind) -> String {
        format!("{} (prebuilt)", kind.task_name(variant))
    }

    fn assemble(&self, variant: BuildVariant, kind: ArtifactKind) -> Result<(), RenameError> {
        log::debug!("skipping {}, using existing outputs", kind.task_name(variant));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prebuilt_is_noop() {
        let step = PrebuiltArtifacts;
        assert!(step.assemble(BuildVariant::Release, ArtifactKind::Apk).is_ok());
        assert_eq!(
            step.task_name(BuildVariant::Release, ArtifactKind::Apk),
            "assembleRelease (prebuilt)"
        );
    }
}
