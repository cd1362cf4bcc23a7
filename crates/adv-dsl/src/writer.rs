//! Canonical `.adv` text for a document.
//!
//! Every block gets an explicit closing tag. Sections come in a fixed order
//! and steps in numeric order, so the output of [`write_document`] parses
//! back to an equal document.

use std::collections::BTreeMap;

use adv_core::{AdventureDocument, Choice, Value};

/// Render a document as `.adv` text.
pub fn write_document(doc: &AdventureDocument) -> String {
    let mut out = String::new();

    block(&mut out, "GAME_NAME", [doc.game_name.as_str()]);
    block(
        &mut out,
        "NAME",
        [if doc.ask_for_name { "true" } else { "false" }],
    );
    block(&mut out, "MAIN_MENU", doc.main_menu.iter().map(String::as_str));
    key_values(&mut out, "INVENTORY", &doc.inventory);
    key_values(&mut out, "STATS", &doc.stats);
    key_values(&mut out, "VARIABLES", &doc.variables);

    for step in doc.steps.values() {
        out.push_str(&format!("[{}]\n", step.id));
        out.push_str(&format!("[NARRATIVE]\n{}\n[/NARRATIVE]\n", step.narrative));
        out.push_str("[CHOICES]\n");
        for choice in &step.choices {
            out.push_str(&format_choice(choice));
            out.push('\n');
        }
        out.push_str("[/CHOICES]\n");
        out.push_str(&format!("[/{}]\n\n", step.id));
    }

    for (kind, text) in &doc.endings {
        block(&mut out, kind.tag(), [text.as_str()]);
    }

    if !doc.rules.is_empty() {
        let lines: Vec<String> = doc
            .rules
            .iter()
            .map(|r| format!("IF {} THEN {}", r.condition, r.action))
            .collect();
        block(&mut out, "CONDITIONS", lines.iter().map(String::as_str));
    }
    if !doc.checkpoints.is_empty() {
        let lines: Vec<String> = doc.checkpoints.iter().map(ToString::to_string).collect();
        block(&mut out, "CHECKPOINT", lines.iter().map(String::as_str));
    }
    if !doc.random_events.is_empty() {
        let lines: Vec<String> = doc
            .random_events
            .iter()
            .map(|e| format!("chance: {}, outcome: {}", e.chance, e.outcome))
            .collect();
        block(&mut out, "RANDOM_EVENT", lines.iter().map(String::as_str));
    }
    if !doc.consequence_sets.is_empty() {
        let lines: Vec<String> = doc
            .consequence_sets
            .iter()
            .map(|set| {
                set.entries
                    .iter()
                    .map(|(target, value)| format!("{target}: {value}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect();
        block(&mut out, "CONSEQUENCE", lines.iter().map(String::as_str));
    }

    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

/// `A) description -> TARGET {IF cond; USE item}`
pub fn format_choice(choice: &Choice) -> String {
    let mut line = format!("{}) {} -> {}", choice.label, choice.description, choice.target);
    let extras: Vec<String> = choice
        .conditions
        .iter()
        .map(|c| format!("IF {c}"))
        .chain(choice.consequences.iter().cloned())
        .collect();
    if !extras.is_empty() {
        line.push_str(&format!(" {{{}}}", extras.join("; ")));
    }
    line
}

fn block<'a>(out: &mut String, tag: &str, lines: impl IntoIterator<Item = &'a str>) {
    out.push_str(&format!("[{tag}]\n"));
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&format!("[/{tag}]\n\n"));
}

fn key_values(out: &mut String, tag: &str, map: &BTreeMap<String, Value>) {
    if map.is_empty() {
        return;
    }
    let lines: Vec<String> = map.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    block(out, tag, lines.iter().map(String::as_str));
}
