//! Colony configuration stored under `.colony/state/config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::roster::RosterLimit;
use crate::core::types::{BodyPart, MAX_BODY_PARTS};
use crate::io::write_atomic;

/// Colony configuration (TOML).
///
/// Edited by humans; missing fields fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ColonyConfig {
    pub roster: RosterConfig,

    /// Body requested by every role.
    pub worker_body: Vec<BodyPart>,

    /// Pending age (in ticks) after which a creation request is reported as underserved.
    pub underserved_warn_ticks: u64,

    /// Skip resource nodes with a hostile within range 1.
    pub avoid_guarded_nodes: bool,

    /// Simulated production time per body part.
    pub spawn_ticks_per_part: u32,
}

/// Roster limit per role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RosterConfig {
    pub mine: RosterLimit,
    pub controller: RosterLimit,
    pub base: RosterLimit,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            mine: RosterLimit::Fixed(1),
            controller: RosterLimit::Fixed(1),
            base: RosterLimit::Fixed(3),
        }
    }
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            roster: RosterConfig::default(),
            worker_body: vec![BodyPart::Work, BodyPart::Carry, BodyPart::Move],
            underserved_warn_ticks: 50,
            avoid_guarded_nodes: true,
            spawn_ticks_per_part: 3,
        }
    }
}

impl ColonyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.worker_body.is_empty() {
            return Err(anyhow!("worker_body must be a non-empty array"));
        }
        if self.worker_body.len() > MAX_BODY_PARTS {
            return Err(anyhow!(
                "worker_body has {} parts; at most {} allowed",
                self.worker_body.len(),
                MAX_BODY_PARTS
            ));
        }
        if !self.worker_body.contains(&BodyPart::Work) {
            return Err(anyhow!("worker_body must include at least one work part"));
        }
        if self.underserved_warn_ticks == 0 {
            return Err(anyhow!("underserved_warn_ticks must be > 0"));
        }
        if self.spawn_ticks_per_part == 0 {
            return Err(anyhow!("spawn_ticks_per_part must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ColonyConfig::default()`.
pub fn load_config(path: &Path) -> Result<ColonyConfig> {
    if !path.exists() {
        let cfg = ColonyConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ColonyConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ColonyConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}
