//! Hierarchical agent colony controller.
//!
//! Keeps a simulated world (`.colony/state/world.json`) and a durable store
//! (`.colony/state/store.json`) side by side. Every tick rebuilds the colony
//! from the store, runs each agent once, resolves creation requests and
//! advances the world.

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};

use colony::exit_codes;
use colony::io::init::{InitOptions, init_colony};
use colony::looping::run_loop;
use colony::tick::run_tick;
use colony::validate::validate_colony;

#[derive(Parser)]
#[command(
    name = "colony",
    version,
    about = "Hierarchical agent colony controller"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.colony/` with a starter world, empty store and default config.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Run one colony cycle and advance the world by one tick.
    Tick,
    /// Run several cycles back to back.
    Run {
        /// Number of ticks to run.
        #[arg(short, long, default_value_t = 1)]
        ticks: u64,
    },
    /// Check layout, config, world and store against schemas and invariants.
    Validate {
        /// Fail with a distinct exit code when requests are underserved.
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    colony::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = Path::new(".");
    match cli.command {
        Command::Init { force } => cmd_init(root, force),
        Command::Tick => cmd_tick(root),
        Command::Run { ticks } => cmd_run(root, ticks),
        Command::Validate { strict } => cmd_validate(root, strict),
    }
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let paths = init_colony(root, &InitOptions { force })?;
    println!("initialized {}", paths.colony_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_tick(root: &Path) -> Result<i32> {
    let outcome = run_tick(root)?;
    let summary = &outcome.summary;
    println!(
        "tick {}: {} agents run, {} goals achieved, {} spawned, {} requests pending",
        summary.tick,
        summary.agents_run,
        summary.goals_achieved,
        summary.spawned.len(),
        summary.requests_pending
    );
    Ok(exit_codes::OK)
}

fn cmd_run(root: &Path, ticks: u64) -> Result<i32> {
    let outcome = run_loop(root, ticks, |tick| {
        let summary = &tick.summary;
        println!(
            "tick {}: {} agents run, {} spawned, {} requests pending",
            summary.tick,
            summary.agents_run,
            summary.spawned.len(),
            summary.requests_pending
        );
    })?;
    match outcome.last_tick {
        Some(tick) => println!(
            "ran {} ticks; world at tick {}; {} spawned",
            outcome.ticks_run, tick, outcome.spawned
        ),
        None => println!("ran 0 ticks"),
    }
    Ok(exit_codes::OK)
}

fn cmd_validate(root: &Path, strict: bool) -> Result<i32> {
    let outcome = validate_colony(root)?;
    for item in &outcome.underserved {
        println!(
            "underserved: {} in {} waited {} ticks",
            item.issuer, item.partition, item.waited
        );
    }
    println!(
        "ok: tick {}, {} agents, {} requests pending",
        outcome.tick, outcome.agents, outcome.pending
    );
    if strict && !outcome.underserved.is_empty() {
        return Ok(exit_codes::UNDERSERVED);
    }
    Ok(exit_codes::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["colony", "init"]);
        assert!(matches!(cli.command, Command::Init { force: false }));
    }

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["colony", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
    }

    #[test]
    fn parse_run_ticks() {
        let cli = Cli::parse_from(["colony", "run", "--ticks", "25"]);
        assert!(matches!(cli.command, Command::Run { ticks: 25 }));
    }

    #[test]
    fn parse_validate_strict() {
        let cli = Cli::parse_from(["colony", "validate", "--strict"]);
        assert!(matches!(cli.command, Command::Validate { strict: true }));
    }
}
