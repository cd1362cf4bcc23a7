//! Interactive play over stdin.

use std::io::{self, BufRead, Write};
use std::path::Path;

use adv_core::{EndingKind, Label};
use adv_engine::{EngineConfig, Outcome, Position, SaveStore, Session, deserialize_session};
use colored::Colorize;

const AUTOSAVE_SLOT: &str = "autosave";
const QUICK_SLOT: &str = "quick";

const HELP: &str = "  A-D          take a choice
  back         return to the previous step
  inv          show inventory, stats and variables
  save [slot]  save the game (default slot: quick)
  load [slot]  load a saved game (default slot: quick)
  restart      start over from the first step
  quit         leave the game";

pub fn run(
    path: &Path,
    config: EngineConfig,
    save_dir: &Path,
    load: Option<&str>,
) -> Result<(), String> {
    let doc = super::load_adventure(path)?;
    let saves = SaveStore::new(save_dir);
    let mut session =
        Session::new(doc, config).map_err(|e| format!("failed to start session: {e}"))?;

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    println!("  {}", session.document().game_name.bold());
    for entry in &session.document().main_menu {
        println!("  - {entry}");
    }
    println!("  Type 'help' for commands, 'quit' to exit.\n");

    match load {
        Some(slot) => load_slot(&mut session, &saves, slot)?,
        None => {
            let name = if session.document().ask_for_name {
                prompt(&mut reader, &mut line, "What is your name? ")?
            } else {
                None
            };
            session.start(name.as_deref());
            if let Some(name) = session.user_name() {
                println!("  Welcome, {name}.\n");
            }
        }
    }
    show(&session);

    loop {
        let Some(input) = prompt(&mut reader, &mut line, "> ")? else {
            break;
        };
        if input.is_empty() {
            continue;
        }

        let (command, arg) = match input.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, Some(arg.trim())),
            None => (input.as_str(), None),
        };

        match command.to_ascii_lowercase().as_str() {
            "quit" | "q" | "exit" => break,
            "help" | "h" | "?" => println!("{HELP}\n"),
            "back" => match session.go_back() {
                Ok(_) => show(&session),
                Err(e) => println!("{}\n", e.to_string().yellow()),
            },
            "inv" | "inventory" => show_store(&session),
            "save" => {
                let slot = arg.unwrap_or(QUICK_SLOT);
                match save_slot(&session, &saves, slot) {
                    Ok(()) => println!("  Saved to slot '{slot}'.\n"),
                    Err(e) => println!("{}\n", e.yellow()),
                }
            }
            "load" => match load_slot(&mut session, &saves, arg.unwrap_or(QUICK_SLOT)) {
                Ok(()) => show(&session),
                Err(e) => println!("{}\n", e.yellow()),
            },
            "restart" => {
                let name = session.user_name().map(str::to_string);
                session.start(name.as_deref());
                show(&session);
            }
            _ => match Label::parse(&command.to_ascii_uppercase()) {
                Some(label) => take_choice(&mut session, &saves, label),
                None => println!(
                    "{}\n",
                    format!("unknown command '{input}'; type 'help'").yellow()
                ),
            },
        }
    }

    Ok(())
}

/// Print `text`, then read one trimmed line. `None` at end of input.
fn prompt(reader: &mut impl BufRead, line: &mut String, text: &str) -> Result<Option<String>, String> {
    print!("{text}");
    io::stdout().flush().map_err(|e| e.to_string())?;

    line.clear();
    match reader.read_line(line) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(line.trim().to_string())),
        Err(e) => Err(e.to_string()),
    }
}

fn take_choice(session: &mut Session, saves: &SaveStore, label: Label) {
    match session.select_choice(label) {
        Ok(outcome) => {
            if let Outcome::Continue {
                random_event: true, ..
            } = outcome
            {
                println!("  {}\n", "Something unexpected happens...".magenta());
            }
            show(session);
            if outcome.is_checkpoint() {
                match save_slot(session, saves, AUTOSAVE_SLOT) {
                    Ok(()) => println!("  {}\n", "Checkpoint reached, game saved.".dimmed()),
                    Err(e) => println!("{}\n", format!("autosave failed: {e}").yellow()),
                }
            }
        }
        Err(e) => println!("{}\n", e.to_string().yellow()),
    }
}

fn save_slot(session: &Session, saves: &SaveStore, slot: &str) -> Result<(), String> {
    let blob = session.save(slot).map_err(|e| e.to_string())?;
    saves.write(slot, &blob).map_err(|e| e.to_string())?;
    Ok(())
}

fn load_slot(session: &mut Session, saves: &SaveStore, slot: &str) -> Result<(), String> {
    let blob = saves.read(slot).map_err(|e| e.to_string())?;
    let save = deserialize_session(&blob).map_err(|e| e.to_string())?;
    session.restore(save).map_err(|e| e.to_string())?;
    println!("  Loaded slot '{slot}'.\n");
    Ok(())
}

fn show(session: &Session) {
    match session.position() {
        Position::MainMenu => println!("  Type 'restart' to begin.\n"),
        Position::Ending(kind) => {
            let text = session.document().ending_text(*kind);
            let heading = format!("The End ({kind})");
            let heading = match kind {
                EndingKind::Success => heading.green(),
                EndingKind::Failure => heading.red(),
                EndingKind::Neutral => heading.cyan(),
            };
            println!("  {}", heading.bold());
            println!("  {text}");
            println!("  Type 'back', 'restart' or 'quit'.\n");
        }
        Position::Step(id) => {
            let Some(step) = session.current_step() else {
                return;
            };
            println!("  {}", id.to_string().dimmed());
            for line in step.narrative.lines() {
                println!("  {line}");
            }
            println!();

            let choices = session.available_choices();
            if choices.is_empty() {
                println!("  {}\n", "There is nothing you can do here. Type 'back'.".yellow());
                return;
            }
            for choice in choices {
                println!("  {} {}", format!("{})", choice.label).bold(), choice.description);
            }
            println!();
        }
    }
}

fn show_store(session: &Session) {
    let store = session.store();
    if store.inventory.is_empty() && store.stats.is_empty() && store.variables.is_empty() {
        println!("  You carry nothing.\n");
        return;
    }
    for (item, qty) in &store.inventory {
        println!("  {item} x{qty}");
    }
    for (name, value) in &store.stats {
        println!("  {} {name}: {value}", "stat".dimmed());
    }
    for (name, value) in &store.variables {
        println!("  {} {name}: {value}", "var".dimmed());
    }
    println!();
}
