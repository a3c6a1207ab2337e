//! Simulated world load/save with schema + invariant validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use tracing::debug;

use crate::core::invariants::validate_world;
use crate::core::world::Snapshot;
use crate::io::{validate_schema, write_atomic};

pub const WORLD_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/world.schema.json"
));

/// Load and validate the world from disk (schema + invariants).
pub fn load_world(path: &Path) -> Result<Snapshot> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read world {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse world {}", path.display()))?;
    validate_schema(WORLD_SCHEMA, &value, "world")?;
    let world: Snapshot = serde_json::from_value(value)
        .with_context(|| format!("deserialize world {}", path.display()))?;
    validate_world_invariants(&world)?;
    debug!(path = %path.display(), tick = world.tick, units = world.units.len(), "world loaded");
    Ok(world)
}

/// Atomically write the world to disk.
pub fn write_world(path: &Path, world: &Snapshot) -> Result<()> {
    validate_world_invariants(world)?;
    let mut buf = serde_json::to_string_pretty(world)?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn validate_world_invariants(world: &Snapshot) -> Result<()> {
    let errors = validate_world(world);
    if errors.is_empty() {
        return Ok(());
    }
    Err(anyhow!("world invariants failed: {}", errors.join("; ")))
}
