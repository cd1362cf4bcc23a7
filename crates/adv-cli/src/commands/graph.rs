use std::collections::BTreeSet;
use std::path::Path;

use adv_core::{AdventureDocument, StoryGraph, Target};

use crate::GraphFormat;

pub fn run(path: &Path, format: GraphFormat) -> Result<(), String> {
    let doc = super::load_adventure(path)?;
    let graph = StoryGraph::new(&doc);

    let out = match format {
        GraphFormat::Text => render_text(&doc, &graph),
        GraphFormat::Dot => render_dot(&doc, &graph),
        GraphFormat::Mermaid => render_mermaid(&doc, &graph),
    };
    print!("{out}");
    Ok(())
}

fn render_text(doc: &AdventureDocument, graph: &StoryGraph) -> String {
    let reachable = graph.reachable_from_start();
    let mut out = format!("  Step graph for '{}'\n\n", doc.game_name);

    for step in doc.steps.values() {
        let mut notes = Vec::new();
        if doc.is_checkpoint(&step.id) {
            notes.push("checkpoint");
        }
        if !reachable.contains(&step.id) {
            notes.push("unreachable");
        }
        if step.is_dead_end() {
            notes.push("dead end");
        }
        if notes.is_empty() {
            out.push_str(&format!("  [{}]\n", step.id));
        } else {
            out.push_str(&format!("  [{}] ({})\n", step.id, notes.join(", ")));
        }

        let edges = graph.edges_from(&step.id);
        for (i, edge) in edges.iter().enumerate() {
            let branch = if i + 1 == edges.len() { "└──" } else { "├──" };
            out.push_str(&format!("    {branch} {} -> {}\n", edge.label, edge.target));
        }
    }

    if !doc.random_events.is_empty() {
        out.push_str("\n  Random events\n");
        for event in &doc.random_events {
            out.push_str(&format!("    {:.0}% -> {}\n", event.chance * 100.0, event.outcome));
        }
    }

    out
}

fn render_dot(doc: &AdventureDocument, graph: &StoryGraph) -> String {
    let mut out = String::from("digraph adventure {\n");
    out.push_str(&format!("  label={};\n", quote(&doc.game_name)));
    out.push_str("  node [shape=box];\n");

    for step in doc.steps.values() {
        let style = if doc.is_checkpoint(&step.id) {
            ", style=bold"
        } else {
            ""
        };
        out.push_str(&format!(
            "  {} [label={}{style}];\n",
            quote(&step.id.to_string()),
            quote(&first_line(&step.narrative, &step.id.to_string()))
        ));
    }
    for kind in graph.ending_kinds_used() {
        out.push_str(&format!(
            "  {} [shape=doublecircle, label={}];\n",
            quote(kind.tag()),
            quote(&kind.to_string())
        ));
    }
    for edge in graph.edges() {
        out.push_str(&format!(
            "  {} -> {} [label={}];\n",
            quote(&edge.from.to_string()),
            quote(&edge.target.to_string()),
            quote(&edge.label.to_string())
        ));
    }
    for event in &doc.random_events {
        out.push_str(&format!(
            "  random -> {} [style=dashed, label={}];\n",
            quote(&event.outcome.to_string()),
            quote(&format!("{}", event.chance))
        ));
    }

    out.push_str("}\n");
    out
}

fn render_mermaid(doc: &AdventureDocument, graph: &StoryGraph) -> String {
    let mut out = String::from("flowchart TD\n");
    let endings: BTreeSet<_> = graph.ending_kinds_used();

    for step in doc.steps.values() {
        out.push_str(&format!(
            "  {}[\"{}\"]\n",
            step.id,
            first_line(&step.narrative, &step.id.to_string()).replace('"', "#quot;")
        ));
    }
    for kind in &endings {
        out.push_str(&format!("  {}([{kind}])\n", kind.tag()));
    }
    for edge in graph.edges() {
        let target = match &edge.target {
            Target::Step(id) => id.to_string(),
            Target::Ending(kind) => kind.tag().to_string(),
        };
        out.push_str(&format!("  {} -->|{}| {target}\n", edge.from, edge.label));
    }
    out
}

/// First line of a narrative, shortened for node labels.
fn first_line(narrative: &str, fallback: &str) -> String {
    let line = narrative.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return fallback.to_string();
    }
    if line.chars().count() > 40 {
        let short: String = line.chars().take(37).collect();
        format!("{short}...")
    } else {
        line.to_string()
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
