//! Validation helpers for `.colony/` layout and persisted state.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::core::invariants::validate_records;
use crate::io::config::load_config;
use crate::io::init::ColonyPaths;
use crate::io::store::{FileStore, load_agents, load_meta, load_queue, queued_partitions};
use crate::io::world_store::load_world;

/// A pending request that has waited past the configured horizon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Underserved {
    pub partition: String,
    pub issuer: String,
    pub waited: u64,
}

/// High-level validation outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOutcome {
    pub tick: u64,
    pub agents: usize,
    pub pending: usize,
    pub underserved: Vec<Underserved>,
}

/// Validate `.colony/` layout, config, world and store.
///
/// Schema or invariant violations are errors. Underserved requests are
/// reported in the outcome; callers decide whether they fail.
pub fn validate_colony(root: &Path) -> Result<ValidateOutcome> {
    let paths = ColonyPaths::new(root);

    ensure_dir(&paths.colony_dir)?;
    ensure_dir(&paths.state_dir)?;
    ensure_dir(&paths.ticks_dir)?;

    ensure_file(&paths.gitignore_path)?;
    ensure_file(&paths.world_path)?;
    ensure_file(&paths.store_path)?;
    ensure_file(&paths.config_path)?;

    ensure_gitignore(&paths.gitignore_path)?;

    let config = load_config(&paths.config_path).with_context(|| "load config.toml")?;
    let world = load_world(&paths.world_path).with_context(|| "load world.json")?;
    let store = FileStore::open(&paths.store_path).with_context(|| "load store.json")?;

    let agents = load_agents(&store)?;
    let meta = load_meta(&store)?;
    let mut queues = BTreeMap::new();
    for partition in queued_partitions(&store) {
        let queue = load_queue(&store, &partition)?;
        queues.insert(partition, queue);
    }

    let errors = validate_records(&agents, &queues, meta.next_submission);
    if !errors.is_empty() {
        return Err(anyhow!("store invariants failed: {}", errors.join("; ")));
    }

    let mut underserved = Vec::new();
    for (partition, queue) in &queues {
        for request in queue.underserved(world.tick, config.underserved_warn_ticks) {
            underserved.push(Underserved {
                partition: partition.clone(),
                issuer: request.issuer.clone(),
                waited: world.tick.saturating_sub(request.submitted_at),
            });
        }
    }

    Ok(ValidateOutcome {
        tick: world.tick,
        agents: agents.len(),
        pending: queues.values().map(|q| q.len()).sum(),
        underserved,
    })
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(anyhow!("missing directory {}", path.display()));
    }
    if !path.is_dir() {
        return Err(anyhow!("expected directory {}", path.display()));
    }
    Ok(())
}

fn ensure_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(anyhow!("missing file {}", path.display()));
    }
    if !path.is_file() {
        return Err(anyhow!("expected file {}", path.display()));
    }
    Ok(())
}

fn ensure_gitignore(path: &Path) -> Result<()> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    if !contents.lines().any(|line| line.trim() == "ticks/") {
        return Err(anyhow!("missing 'ticks/' in {}", path.display()));
    }
    Ok(())
}
