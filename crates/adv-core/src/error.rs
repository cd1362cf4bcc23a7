use crate::document::{Label, StepId};

/// Alias for `Result<T, ValidationError>`.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Structural problems found when resolving a parsed document's graph.
///
/// These are raised at load time, before any session exists.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A choice points at a step that does not exist.
    #[error("{step} choice {label} targets missing step {target}")]
    DanglingTarget {
        /// Step holding the choice.
        step: StepId,
        /// Label of the offending choice.
        label: Label,
        /// The unresolved step.
        target: StepId,
    },

    /// The document has no `STEP_1`, so no session could start.
    #[error("no STEP_1 found: every adventure starts at step 1")]
    MissingStartStep,

    /// A random event redirects to a step that does not exist.
    #[error("random event outcome {outcome} is not a step")]
    DanglingRandomEvent {
        /// The unresolved step.
        outcome: StepId,
    },
}
