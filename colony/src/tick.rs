//! Orchestration for `colony tick`: one full cycle against the simulated world.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::coordinator::{TickSummary, run_cycle};
use crate::core::world::Snapshot;
use crate::io::config::{ColonyConfig, load_config};
use crate::io::init::ColonyPaths;
use crate::io::store::FileStore;
use crate::io::tick_log::write_tick_report;
use crate::io::world_store::{load_world, write_world};
use crate::sim::SimWorld;

/// Outcome of one tick.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub summary: TickSummary,
    /// Tick number of the world after the simulation advanced.
    pub world_tick: u64,
}

/// Run one colony cycle and advance the world.
///
/// State is written only after the cycle completes: the store, then the new
/// world, then the tick report. A failure during the cycle leaves disk
/// untouched. If the world write fails after the store commit, the next tick
/// reruns the same world tick and prunes records whose units never appeared.
pub fn run_tick(root: &Path) -> Result<TickOutcome> {
    let paths = ColonyPaths::new(root);
    let config = load_config(&paths.config_path)
        .with_context(|| format!("load {}", paths.config_path.display()))?;
    let world = load_world(&paths.world_path)
        .with_context(|| format!("load {}", paths.world_path.display()))?;
    let mut store = FileStore::open(&paths.store_path)
        .with_context(|| format!("load {}", paths.store_path.display()))?;

    let (summary, next) = tick_world(world, &mut store, &config)?;

    store.commit()?;
    write_world(&paths.world_path, &next)?;
    write_tick_report(&paths.ticks_dir, &summary)?;

    Ok(TickOutcome {
        summary,
        world_tick: next.tick,
    })
}

/// Run one cycle on `world` and return the advanced world.
pub fn tick_world(
    world: Snapshot,
    store: &mut FileStore,
    config: &ColonyConfig,
) -> Result<(TickSummary, Snapshot)> {
    let mut sim = SimWorld::new(world, config.spawn_ticks_per_part);
    let mut recorder = sim.recorder();
    let summary = run_cycle(sim.snapshot(), store, config, &mut recorder)?;
    let intents = recorder.finish();
    debug!(
        tick = summary.tick,
        work = intents.work.len(),
        moves = intents.moves.len(),
        spawns = intents.spawns.len(),
        "intents recorded"
    );
    sim.advance(intents);
    Ok((summary, sim.into_snapshot()))
}
