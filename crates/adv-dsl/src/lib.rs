//! Reading and writing `.adv` adventure documents.
//!
//! [`load_document`] is the entry point: it parses the text and resolves the
//! step graph, so a document it returns can be played without hitting a
//! dangling target.

/// Grammar for single `CHOICES` lines.
pub mod choice;
/// Ariadne rendering for parse errors, validation errors, and lint warnings.
pub mod diagnostics;
/// Error types used throughout the crate.
pub mod error;
/// Non-fatal authoring checks.
pub mod lint;
/// The document scanner and its block mini-parsers.
pub mod parser;
/// Canonical `.adv` output.
pub mod writer;

use std::path::Path;

use adv_core::{AdventureDocument, StoryGraph};

pub use choice::{ChoiceSyntaxError, parse_choice};
pub use diagnostics::Diagnostic;
pub use error::{FormatError, FormatErrorKind, LoadError, LoadResult};
pub use lint::{LintWarning, lint};
pub use parser::parse_document;
pub use writer::write_document;

/// Parse a document and validate its step graph.
pub fn load_document(source: &str) -> LoadResult<AdventureDocument> {
    let doc = parse_document(source)?;
    StoryGraph::build(&doc)?;
    log::debug!(
        "loaded {:?}: {} steps, {} choices",
        doc.game_name,
        doc.steps.len(),
        doc.choice_count()
    );
    Ok(doc)
}

/// Read and load a `.adv` file.
pub fn load_file(path: &Path) -> LoadResult<AdventureDocument> {
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_document(&source)
}
