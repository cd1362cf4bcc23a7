use std::path::Path;

use adv_core::StoryGraph;
use adv_dsl::Diagnostic;
use colored::Colorize;

use super::plural;

pub fn run(path: &Path, json: bool) -> Result<(), String> {
    let source = super::read_source(path)?;

    let doc = match adv_dsl::parse_document(&source) {
        Ok(doc) => doc,
        Err(err) => {
            if json {
                let summary = serde_json::json!({
                    "ok": false,
                    "errors": [err.to_string()],
                    "warnings": [],
                });
                println!("{}", to_json(&summary)?);
            } else {
                super::print_diagnostics(&source, path, &[Diagnostic::from_format_error(&err)]);
            }
            return Err(format!("{} has a format error", path.display()));
        }
    };

    let graph = StoryGraph::new(&doc);
    let errors = graph.validation_errors();
    let warnings = adv_dsl::lint(&doc);

    if json {
        let summary = serde_json::json!({
            "ok": errors.is_empty(),
            "game_name": doc.game_name,
            "steps": doc.steps.len(),
            "choices": doc.choice_count(),
            "endings": graph
                .ending_kinds_used()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            "checkpoints": doc.checkpoints.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "errors": errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "warnings": warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
        });
        println!("{}", to_json(&summary)?);
    } else {
        let diagnostics: Vec<Diagnostic> = errors
            .iter()
            .map(|e| Diagnostic::from_validation_error(&source, e))
            .chain(warnings.iter().map(|w| Diagnostic::from_lint(&source, w)))
            .collect();
        super::print_diagnostics(&source, path, &diagnostics);
    }

    if !errors.is_empty() {
        return Err(format!(
            "{} error{} in {}",
            errors.len(),
            plural(errors.len()),
            path.display()
        ));
    }

    if !json {
        println!("  {} '{}'", "Checked".bold(), doc.game_name);
        println!(
            "  {} steps, {} choices, {} warning{}",
            doc.steps.len(),
            doc.choice_count(),
            warnings.len(),
            plural(warnings.len())
        );
    }

    Ok(())
}

fn to_json(value: &serde_json::Value) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization error: {e}"))
}
