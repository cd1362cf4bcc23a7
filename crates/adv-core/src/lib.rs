//! Core types for `.adv` adventures: the parsed document model and the
//! read-only step graph built over it.
//!
//! This crate is independent of the text format. The parser in `adv-dsl`
//! produces an [`AdventureDocument`]; the engine in `adv-engine` plays one.

/// Condition and consequence directives carried by choices.
pub mod directive;
/// Adventure document, steps, choices, and targets.
pub mod document;
/// Error types used throughout the crate.
pub mod error;
/// Read-only step graph and load-time target resolution.
pub mod graph;
/// Number-or-string values for inventory, stats, and variables.
pub mod value;

/// Re-export directive types.
pub use directive::{Condition, Consequence};
/// Re-export document types.
pub use document::{
    AdventureDocument, Choice, ConsequenceSet, EndingKind, Label, RandomEvent, Rule, Step,
    StepId, Target,
};
/// Re-export error types.
pub use error::{ValidationError, ValidationResult};
/// Re-export graph types.
pub use graph::StoryGraph;
/// Re-export value type.
pub use value::Value;
