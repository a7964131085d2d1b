use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use starfall_core::gender::Gender;
use starfall_core::slots::{SlotManager, SlotStatus};
use starfall_core::state::GameStateStore;
use starfall_core::{codec, verify};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum GenderArg {
    Female,
    Male,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Female => Gender::Female,
            GenderArg::Male => Gender::Male,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Directory holding the slot files.
    #[arg(long, value_name = "DIR", default_value = "saves", global = true)]
    saves_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the status of all five slots.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Start a new game and write it to a slot.
    New {
        #[arg(value_name = "SLOT")]
        slot: u8,
        #[arg(long, value_enum, default_value = "female")]
        gender: GenderArg,
        /// Override the protagonist's canonical name.
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },
    /// Load a slot, running recovery and version upgrades as needed.
    Load {
        #[arg(value_name = "SLOT")]
        slot: u8,
    },
    /// Print a slot's contents without modifying it.
    Show {
        #[arg(value_name = "SLOT")]
        slot: u8,
        #[arg(long)]
        json: bool,
    },
    /// Delete a slot file.
    Delete {
        #[arg(value_name = "SLOT")]
        slot: u8,
    },
    /// Back up a slot and fix any damaged fields in place.
    Repair {
        #[arg(value_name = "SLOT")]
        slot: u8,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    log::debug!("using saves directory {}", cli.saves_dir.display());
    let slots = SlotManager::new(&cli.saves_dir);

    match cli.command {
        Command::List { json } => cmd_list(&slots, json),
        Command::New { slot, gender, name } => cmd_new(&slots, slot, gender.into(), name),
        Command::Load { slot } => cmd_load(&slots, slot),
        Command::Show { slot, json } => cmd_show(&slots, slot, json),
        Command::Delete { slot } => {
            slots.delete(slot).unwrap_or_else(|e| fail(&e));
            println!("Deleted slot {slot}.");
        }
        Command::Repair { slot } => cmd_repair(&slots, slot),
    }
}

fn fail(e: &dyn std::fmt::Display) -> ! {
    eprintln!("Error: {e}");
    process::exit(1);
}

fn cmd_list(slots: &SlotManager, json: bool) {
    let listing = slots.list_slots();
    if json {
        let doc: serde_json::Map<String, serde_json::Value> = listing
            .iter()
            .map(|(slot, status)| {
                let value = match status {
                    SlotStatus::Empty => json!({"status": "empty"}),
                    SlotStatus::Corrupted => json!({"status": "corrupted"}),
                    SlotStatus::Populated(s) => json!({
                        "status": "populated",
                        "name": s.name,
                        "gender": s.gender.to_string(),
                        "level": s.level,
                        "chapter": s.chapter,
                        "timestamp": s.timestamp,
                    }),
                };
                (slot.to_string(), value)
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::Value::Object(doc))
                .unwrap_or_else(|e| fail(&e))
        );
        return;
    }

    for (slot, status) in listing {
        match status {
            SlotStatus::Empty => println!("slot {slot}: empty"),
            SlotStatus::Corrupted => println!("slot {slot}: corrupted (load will attempt recovery)"),
            SlotStatus::Populated(s) => {
                let when = s.timestamp.as_deref().unwrap_or("unknown time");
                println!(
                    "slot {slot}: {} - level {}, {} (saved {when})",
                    s.name, s.level, s.chapter
                );
            }
        }
    }
}

fn cmd_new(slots: &SlotManager, slot: u8, gender: Gender, name: Option<String>) {
    let mut store = GameStateStore::init_new(gender);
    if let Some(name) = name {
        if let Some(p) = store.game_state_mut().protagonist.as_mut() {
            p.name = Some(name);
        }
    }
    slots.save(slot, &mut store).unwrap_or_else(|e| fail(&e));

    let state = store.game_state();
    println!(
        "Started a new game in slot {slot}: {} ({gender}).",
        state
            .protagonist
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .unwrap_or("Unknown")
    );
}

fn cmd_load(slots: &SlotManager, slot: u8) {
    let mut store = GameStateStore::default();
    let report = slots.load(slot, &mut store).unwrap_or_else(|e| fail(&e));

    for message in &report.messages {
        println!("note: {message}");
    }
    if report.recovered {
        println!("Slot {slot} was recovered from a damaged file.");
    }
    if report.upgraded {
        println!("Slot {slot} was upgraded to the current save format.");
    }

    let state = store.game_state();
    println!(
        "Loaded slot {slot}: {} - level {}, {}",
        state
            .protagonist
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .unwrap_or("Unknown"),
        state.level(),
        state.chapter(),
    );
}

fn cmd_show(slots: &SlotManager, slot: u8, json: bool) {
    let path = slots.slot_path(slot);
    let bytes = std::fs::read(&path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        process::exit(1);
    });
    let raw = codec::decode(&bytes).unwrap_or_else(|e| fail(&e));

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&raw.document).unwrap_or_else(|e| fail(&e))
        );
        return;
    }

    let record = verify::check_document(&raw.document).unwrap_or_else(|e| fail(&e));
    let state = &record.game_state;
    println!("name:       {}", record.character_info.name);
    println!("gender:     {}", record.character_info.gender);
    println!("level:      {}", state.level());
    println!("experience: {}", state.player_experience.unwrap_or(0));
    println!("health:     {}/{}",
        state.player_health.unwrap_or(0),
        state.player_max_health.unwrap_or(0)
    );
    println!("credits:    {}", state.player_credits.unwrap_or(0));
    println!("chapter:    {}", state.chapter());
    println!("saved:      {}", record.timestamp.as_deref().unwrap_or("unknown"));
    println!(
        "format:     {} (save #{})",
        record.technical_info.save_version, record.technical_info.save_count
    );
    if record.technical_info.recovered {
        println!("flags:      recovered");
    }
    if record.technical_info.repaired {
        println!("flags:      repaired");
    }
}

fn cmd_repair(slots: &SlotManager, slot: u8) {
    let report = slots.repair(slot).unwrap_or_else(|e| fail(&e));
    if report.rebuilt {
        println!("Slot {slot} was unreadable and has been replaced with a fresh save.");
    } else if report.fixes.is_empty() {
        println!("Slot {slot} is intact; nothing to repair.");
    } else {
        println!("Repaired slot {slot}:");
    }
    for fix in &report.fixes {
        println!("  - {fix}");
    }
}
