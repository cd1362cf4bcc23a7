use std::ops::Range;
use std::path::PathBuf;

use adv_core::{EndingKind, Label, StepId, ValidationError};

use crate::choice::ChoiceSyntaxError;

/// Alias for `Result<T, LoadError>`.
pub type LoadResult<T> = Result<T, LoadError>;

/// A malformed document. Loading stops at the first one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}{kind}", location(.line, .section))]
pub struct FormatError {
    /// 1-based line number, or `None` for whole-document problems.
    pub line: Option<usize>,
    /// Byte range of the offending line in the source.
    pub span: Option<Range<usize>>,
    /// Section the scanner was in, e.g. `STEP_3/CHOICES`.
    pub section: Option<String>,
    /// What went wrong.
    pub kind: FormatErrorKind,
}

impl FormatError {
    /// An error not tied to any line.
    pub fn document(kind: FormatErrorKind) -> Self {
        Self {
            line: None,
            span: None,
            section: None,
            kind,
        }
    }
}

fn location(line: &Option<usize>, section: &Option<String>) -> String {
    match (line, section) {
        (Some(line), Some(section)) => format!("line {line} in [{section}]: "),
        (Some(line), None) => format!("line {line}: "),
        (None, Some(section)) => format!("in [{section}]: "),
        (None, None) => String::new(),
    }
}

/// The specific problem behind a [`FormatError`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormatErrorKind {
    /// No `[GAME_NAME]` or an empty one.
    #[error("missing game name: add a [GAME_NAME] section")]
    MissingGameName,

    /// No `[MAIN_MENU]` entries.
    #[error("main menu is empty: add entries to [MAIN_MENU]")]
    EmptyMainMenu,

    /// The document defines no steps.
    #[error("the adventure defines no steps")]
    NoSteps,

    /// `[STEP_x]` where `x` is not digits.
    #[error("invalid step tag [{0}]: step ids must be digits")]
    InvalidStepId(String),

    /// The same step is defined twice.
    #[error("{0} is defined more than once")]
    DuplicateStep(StepId),

    /// A section that may appear only once appears again.
    #[error("[{0}] appears more than once")]
    DuplicateSection(String),

    /// `NARRATIVE` or `CHOICES` given twice within one step.
    #[error("{step} has more than one [{subsection}] block")]
    DuplicateSubsection {
        /// Step holding the blocks.
        step: StepId,
        /// `NARRATIVE` or `CHOICES`.
        subsection: String,
    },

    /// `NARRATIVE` or `CHOICES` outside a step block.
    #[error("[{0}] is only allowed inside a [STEP_<n>] block")]
    SubsectionOutsideStep(String),

    /// A closing tag with no matching open block.
    #[error("[/{0}] does not close any open block")]
    UnmatchedClose(String),

    /// A tag that names no known section.
    #[error("unknown section [{tag}]{}", suggestion_hint(.suggestion))]
    UnknownTag {
        /// The tag as written.
        tag: String,
        /// Closest known tag, if one is similar.
        suggestion: Option<String>,
    },

    /// Non-blank text outside every section.
    #[error("text outside of any section")]
    StrayText,

    /// Non-blank text in a step but outside `NARRATIVE`/`CHOICES`.
    #[error("text in {0} outside [NARRATIVE] and [CHOICES]")]
    TextOutsideSubsection(StepId),

    /// A step without narrative text.
    #[error("{0} has no narrative")]
    MissingNarrative(StepId),

    /// An ending section with no text.
    #[error("[{}] is empty", .0.tag())]
    EmptyEnding(EndingKind),

    /// `[NAME]` content other than `true`/`false`.
    #[error("[NAME] must be true or false, found {0:?}")]
    InvalidBool(String),

    /// A key-value line without exactly one `:` or with an empty side.
    #[error("expected `key: value`, found {0:?}")]
    MalformedKeyValue(String),

    /// The same key twice in one key-value block.
    #[error("key {0:?} is defined more than once")]
    DuplicateKey(String),

    /// A `CONDITIONS` line not shaped `IF <cond> THEN <action>`.
    #[error("expected `IF <condition> THEN <action>`, found {0:?}")]
    MalformedRule(String),

    /// A `RANDOM_EVENT` line that cannot be read.
    #[error("invalid random event {line:?}: {reason}")]
    MalformedRandomEvent {
        /// The line as written.
        line: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `CONSEQUENCE` line with no valid `target: value` pair.
    #[error("no valid `target: value` pair in {0:?}")]
    EmptyConsequence(String),

    /// A `CHOICES` line rejected by the choice grammar.
    #[error(transparent)]
    Choice(#[from] ChoiceSyntaxError),

    /// Two choices in one step share a label.
    #[error("{step} has more than one choice labeled {label}")]
    DuplicateLabel {
        /// Step holding the choices.
        step: StepId,
        /// The repeated label.
        label: Label,
    },
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|s| format!(" (did you mean [{s}]?)"))
        .unwrap_or_default()
}

/// Anything that stops a document from loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The text is malformed.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The text parsed but its step graph does not resolve.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The file could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location() {
        let err = FormatError {
            line: Some(7),
            span: Some(40..52),
            section: Some("STEP_1/CHOICES".to_string()),
            kind: FormatErrorKind::DuplicateLabel {
                step: StepId::new("1").unwrap(),
                label: Label::A,
            },
        };
        assert_eq!(
            err.to_string(),
            "line 7 in [STEP_1/CHOICES]: STEP_1 has more than one choice labeled A"
        );
    }

    #[test]
    fn document_errors_have_no_location() {
        let err = FormatError::document(FormatErrorKind::NoSteps);
        assert_eq!(err.to_string(), "the adventure defines no steps");
    }

    #[test]
    fn unknown_tag_suggests() {
        let kind = FormatErrorKind::UnknownTag {
            tag: "INVENTROY".to_string(),
            suggestion: Some("INVENTORY".to_string()),
        };
        assert_eq!(
            kind.to_string(),
            "unknown section [INVENTROY] (did you mean [INVENTORY]?)"
        );
    }

    #[test]
    fn empty_ending_names_tag() {
        assert_eq!(
            FormatErrorKind::EmptyEnding(EndingKind::Neutral).to_string(),
            "[ENDING_NEUTRAL] is empty"
        );
    }
}
