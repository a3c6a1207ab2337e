//! Initialization helpers for `.colony/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::config::{ColonyConfig, write_config};
use super::store::{FileStore, Meta, put_meta};
use super::world_store::write_world;
use crate::sim::default_world;

/// All canonical paths within `.colony/` for a project root.
#[derive(Debug, Clone)]
pub struct ColonyPaths {
    pub root: PathBuf,
    pub colony_dir: PathBuf,
    pub state_dir: PathBuf,
    pub ticks_dir: PathBuf,
    pub gitignore_path: PathBuf,
    pub world_path: PathBuf,
    pub store_path: PathBuf,
    pub config_path: PathBuf,
}

impl ColonyPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let colony_dir = root.join(".colony");
        let state_dir = colony_dir.join("state");
        Self {
            root: root.clone(),
            colony_dir: colony_dir.clone(),
            state_dir: state_dir.clone(),
            ticks_dir: colony_dir.join("ticks"),
            gitignore_path: colony_dir.join(".gitignore"),
            world_path: state_dir.join("world.json"),
            store_path: state_dir.join("store.json"),
            config_path: state_dir.join("config.toml"),
        }
    }
}

/// Options for `init_colony`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing colony-owned files.
    pub force: bool,
}

/// Create `.colony/` scaffolding in `root`: the starter world, an empty
/// store and the default config.
///
/// Fails if `.colony/` already exists unless `options.force` is set.
pub fn init_colony(root: &Path, options: &InitOptions) -> Result<ColonyPaths> {
    let paths = ColonyPaths::new(root);
    if paths.colony_dir.exists() && !options.force {
        return Err(anyhow!(
            "colony init: .colony already exists (use --force to overwrite)"
        ));
    }
    if paths.colony_dir.exists() && !paths.colony_dir.is_dir() {
        return Err(anyhow!("colony init: .colony exists but is not a directory"));
    }

    create_dir(&paths.colony_dir)?;
    create_dir(&paths.state_dir)?;
    create_dir(&paths.ticks_dir)?;

    fs::write(&paths.gitignore_path, COLONY_GITIGNORE)
        .with_context(|| format!("write file {}", paths.gitignore_path.display()))?;
    write_world(&paths.world_path, &default_world())?;
    write_config(&paths.config_path, &ColonyConfig::default())?;

    if paths.store_path.exists() {
        fs::remove_file(&paths.store_path)
            .with_context(|| format!("remove {}", paths.store_path.display()))?;
    }
    let mut store = FileStore::open(&paths.store_path)?;
    put_meta(&mut store, &Meta::default())?;
    store.commit()?;

    Ok(paths)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}

const COLONY_GITIGNORE: &str = "ticks/\n";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::load_config;
    use crate::io::store::{Store, load_agents, load_meta};
    use crate::io::world_store::load_world;
    use crate::test_support::TestColony;

    /// Verifies init_colony creates the directory layout and loadable state.
    #[test]
    fn init_creates_expected_layout() {
        let colony = TestColony::new();
        let paths = init_colony(colony.root(), &InitOptions { force: false }).expect("init");

        assert!(paths.colony_dir.is_dir());
        assert!(paths.state_dir.is_dir());
        assert!(paths.ticks_dir.is_dir());
        assert_eq!(
            fs::read_to_string(&paths.gitignore_path).expect("gitignore"),
            COLONY_GITIGNORE
        );

        assert_eq!(load_world(&paths.world_path).expect("world"), default_world());
        assert_eq!(load_config(&paths.config_path).expect("config"), ColonyConfig::default());
        let store = FileStore::open(&paths.store_path).expect("store");
        assert!(load_agents(&store).expect("agents").is_empty());
        assert_eq!(load_meta(&store).expect("meta"), Meta::default());
    }

    #[test]
    fn init_without_force_refuses_existing_colony_dir() {
        let colony = TestColony::new();
        init_colony(colony.root(), &InitOptions { force: false }).expect("init");
        let err = init_colony(colony.root(), &InitOptions { force: false }).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    /// Verifies --force resets the store and world to their starting state.
    #[test]
    fn init_with_force_resets_state() {
        let colony = TestColony::new();
        let paths = init_colony(colony.root(), &InitOptions { force: false }).expect("init");

        let mut store = FileStore::open(&paths.store_path).expect("store");
        store.put("agents/x", serde_json::json!({"id": "x", "home": "W1N1", "goal": {"kind": "null", "achieved": true}}));
        store.commit().expect("commit");

        init_colony(colony.root(), &InitOptions { force: true }).expect("re-init");
        let store = FileStore::open(&paths.store_path).expect("reopen");
        assert!(store.keys_with_prefix("agents/").is_empty());
    }
}
