//! CLI frontend for the `.adv` adventure engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "adv",
    about = "Play and check .adv text adventures",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate an adventure, then report lint warnings
    Check {
        /// The .adv file
        file: PathBuf,

        /// Print a JSON summary instead of text
        #[arg(long)]
        json: bool,
    },

    /// Play an adventure in the terminal
    Play {
        /// The .adv file
        file: PathBuf,

        /// RNG seed for random events
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Treat unrecognized conditions as unmet
        #[arg(long)]
        strict_conditions: bool,

        /// Roll [RANDOM_EVENT] entries after each move
        #[arg(long)]
        random_events: bool,

        /// Resume from this save slot instead of starting fresh
        #[arg(short, long)]
        load: Option<String>,

        /// Directory holding save slots
        #[arg(long, default_value = ".adv-saves")]
        save_dir: PathBuf,
    },

    /// Print the step graph
    Graph {
        /// The .adv file
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = GraphFormat::Text)]
        format: GraphFormat,
    },

    /// Rewrite an adventure in canonical form
    Fmt {
        /// The .adv file
        file: PathBuf,

        /// Overwrite the file instead of printing
        #[arg(short, long)]
        write: bool,
    },

    /// List or delete save slots
    Saves {
        /// Delete this slot
        #[arg(long)]
        remove: Option<String>,

        /// Directory holding save slots
        #[arg(long, default_value = ".adv-saves")]
        save_dir: PathBuf,
    },
}

/// Output formats for `adv graph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    /// Indented step listing
    Text,
    /// Graphviz
    Dot,
    /// Mermaid flowchart
    Mermaid,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { file, json } => commands::check::run(&file, json),
        Commands::Play {
            file,
            seed,
            strict_conditions,
            random_events,
            load,
            save_dir,
        } => {
            let config = adv_engine::EngineConfig::default()
                .with_seed(seed)
                .with_strict_conditions(strict_conditions)
                .with_random_events(random_events);
            commands::play::run(&file, config, &save_dir, load.as_deref())
        }
        Commands::Graph { file, format } => commands::graph::run(&file, format),
        Commands::Fmt { file, write } => commands::fmt::run(&file, write),
        Commands::Saves { remove, save_dir } => commands::saves::run(&save_dir, remove.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
