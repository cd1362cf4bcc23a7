//! Error types for the adventure engine.

use std::path::PathBuf;

use adv_core::{EndingKind, Label, StepId, ValidationError};
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type for engine operations that touch documents or storage.
pub type EngineResult<T> = Result<T, EngineError>;

/// A rejected session operation. The session is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// The session is at the main menu, so there are no choices.
    #[error("no step is active: start the adventure first")]
    NotStarted,

    /// The session is showing an ending; only going back is possible.
    #[error("the adventure has ended ({0}); go back or start again")]
    AtEnding(EndingKind),

    /// The current step has no choice with this label.
    #[error("{step} has no choice {label}")]
    UnknownChoice {
        /// Current step.
        step: StepId,
        /// Requested label.
        label: Label,
    },

    /// A condition on the choice does not hold.
    #[error("choice {label} is not available: requires {condition}")]
    ConditionNotMet {
        /// Requested label.
        label: Label,
        /// The first failing condition.
        condition: String,
    },

    /// Going back with nothing to go back to.
    #[error("nothing to go back to")]
    NoHistory,

    /// A choice points at a step that does not exist.
    #[error("{step} choice {label} targets missing step {target}")]
    DanglingTarget {
        /// Step holding the choice.
        step: StepId,
        /// The choice.
        label: Label,
        /// The missing step.
        target: StepId,
    },

    /// A save was made for a different adventure.
    #[error("save belongs to {found:?}, not {expected:?}")]
    GameMismatch {
        /// Name of the loaded adventure.
        expected: String,
        /// Name recorded in the save.
        found: String,
    },

    /// A save refers to a step the loaded adventure does not define.
    #[error("save refers to {0}, which this adventure does not define")]
    UnknownStep(StepId),
}

/// Save data that cannot be decoded.
#[derive(Debug, Error)]
pub enum CorruptSaveError {
    /// Not valid JSON, or a required field is missing or mistyped.
    #[error("save data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Written by an incompatible version.
    #[error("save format version {found} is not supported (expected {expected})")]
    UnsupportedVersion {
        /// Version in the save.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },
}

/// Any engine failure.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The document's step graph does not resolve.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A session operation was rejected.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Save data could not be decoded.
    #[error(transparent)]
    CorruptSave(#[from] CorruptSaveError),

    /// Session state could not be encoded.
    #[error("cannot encode session: {0}")]
    Encode(serde_json::Error),

    /// A slot name with characters outside `A-Z a-z 0-9 _ -`.
    #[error("invalid save slot {0:?}: use letters, digits, '_' or '-'")]
    InvalidSlot(String),

    /// No save exists for the slot.
    #[error("no save in slot {0:?}")]
    SlotNotFound(String),

    /// Reading or writing a save file failed.
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}
