pub mod check;
pub mod fmt;
pub mod graph;
pub mod play;
pub mod saves;

use std::path::Path;

use adv_core::AdventureDocument;
use adv_dsl::diagnostics::render_diagnostics;
use adv_dsl::{Diagnostic, LoadError};

/// Read an adventure file as text.
fn read_source(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))
}

/// Load and validate an adventure, printing diagnostics on failure.
fn load_adventure(path: &Path) -> Result<AdventureDocument, String> {
    let source = read_source(path)?;
    adv_dsl::load_document(&source).map_err(|err| {
        print_load_error(&source, path, &err);
        format!("{} could not be loaded", path.display())
    })
}

/// Print a load error to stderr using ariadne.
fn print_load_error(source: &str, path: &Path, err: &LoadError) {
    let diagnostic = match err {
        LoadError::Format(err) => Diagnostic::from_format_error(err),
        LoadError::Validation(err) => Diagnostic::from_validation_error(source, err),
        LoadError::Io { .. } => {
            eprintln!("{err}");
            return;
        }
    };
    print_diagnostics(source, path, &[diagnostic]);
}

/// Print diagnostics to stderr using ariadne.
fn print_diagnostics(source: &str, path: &Path, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    let filename = path.display().to_string();
    eprint!("{}", render_diagnostics(source, &filename, diagnostics));
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
