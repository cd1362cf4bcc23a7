use std::path::Path;

use adv_engine::SaveStore;
use comfy_table::{ContentArrangement, Table};

pub fn run(dir: &Path, remove: Option<&str>) -> Result<(), String> {
    let store = SaveStore::new(dir);

    if let Some(slot) = remove {
        if !store.remove(slot).map_err(|e| e.to_string())? {
            return Err(format!("no save in slot \"{slot}\""));
        }
        println!("  Removed slot '{slot}'.");
        return Ok(());
    }

    let summaries = store.summaries().map_err(|e| e.to_string())?;
    if summaries.is_empty() {
        println!("  No saves in {}.", dir.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Slot", "Adventure", "Position", "Saved"]);
    for summary in &summaries {
        table.add_row(vec![
            summary.slot.clone(),
            summary.game_name.clone(),
            summary.position.clone(),
            summary.saved_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} save{}", summaries.len(), super::plural(summaries.len()));
    Ok(())
}
