//! Test-only helpers for constructing snapshots and scripting actions.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::core::types::{BodyPart, CARRY_CAPACITY, Position, Resource, Status};
use crate::core::world::{
    NodeView, PartitionView, SiteView, Snapshot, StructureKind, StructureView, UnitView,
};
use crate::env::Actions;
use crate::io::init::ColonyPaths;

/// Create a partition with no walls and no hostiles.
pub fn partition(name: &str) -> PartitionView {
    PartitionView {
        name: name.to_string(),
        ..PartitionView::default()
    }
}

/// Create an idle worker with the standard `work, carry, move` body.
pub fn worker(id: &str, pos: Position) -> UnitView {
    worker_with(id, pos, &[BodyPart::Work, BodyPart::Carry, BodyPart::Move])
}

/// Create an idle worker with an explicit body. Capacity follows the carry parts.
pub fn worker_with(id: &str, pos: Position, body: &[BodyPart]) -> UnitView {
    let carry = body.iter().filter(|p| **p == BodyPart::Carry).count() as u32;
    UnitView {
        id: id.to_string(),
        pos,
        body: body.to_vec(),
        cargo: Default::default(),
        capacity: carry * CARRY_CAPACITY,
        spawning: false,
        ticks_to_live: Some(1_500),
    }
}

/// Create an energy node with `remaining` units and a 3000 capacity.
pub fn node(id: &str, pos: Position, remaining: u32) -> NodeView {
    NodeView {
        id: id.to_string(),
        pos,
        resource: Resource::Energy,
        remaining,
        capacity: 3_000,
        ticks_to_regeneration: None,
    }
}

pub fn site(id: &str, pos: Position, progress: u32, progress_total: u32) -> SiteView {
    SiteView {
        id: id.to_string(),
        kind: StructureKind::Extension,
        pos,
        progress,
        progress_total,
    }
}

/// Create an owned, undamaged, empty structure with the kind's defaults.
pub fn structure(id: &str, kind: StructureKind, pos: Position) -> StructureView {
    StructureView {
        id: id.to_string(),
        kind,
        pos,
        hits: kind.default_hits_max(),
        hits_max: kind.default_hits_max(),
        store: Default::default(),
        store_capacity: kind.default_store_capacity(),
        mine: true,
        spawning: None,
        progress: 0,
    }
}

/// Create an owned, idle production facility holding `energy`.
pub fn spawn(id: &str, pos: Position, energy: u32) -> StructureView {
    let mut facility = structure(id, StructureKind::Spawn, pos);
    facility.store.insert(Resource::Energy, energy);
    facility
}

pub fn controller(id: &str, pos: Position) -> StructureView {
    structure(id, StructureKind::Controller, pos)
}

/// Create a container holding `energy`.
pub fn container(id: &str, pos: Position, energy: u32) -> StructureView {
    let mut store = structure(id, StructureKind::Container, pos);
    store.store.insert(Resource::Energy, energy);
    store
}

/// A one-partition world: a facility with 300 energy, a controller and one
/// energy node. Callers add units and extra objects as needed.
pub fn home_world(name: &str) -> Snapshot {
    let mut world = Snapshot {
        tick: 1,
        ..Snapshot::default()
    };
    world.partitions.insert(name.to_string(), partition(name));
    world.structures.insert(
        "spawn-1".into(),
        spawn("spawn-1", Position::new(name, 25, 25), 300),
    );
    world.structures.insert(
        "ctrl-1".into(),
        controller("ctrl-1", Position::new(name, 40, 40)),
    );
    world
        .nodes
        .insert("node-1".into(), node("node-1", Position::new(name, 10, 10), 3_000));
    world
}

/// One recorded call to [`ScriptedActions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Extract {
        agent: String,
        target: String,
    },
    Deposit {
        agent: String,
        target: String,
        resource: Resource,
        amount: Option<u32>,
    },
    Retrieve {
        agent: String,
        target: String,
        resource: Resource,
        amount: Option<u32>,
    },
    Build {
        agent: String,
        target: String,
    },
    Repair {
        agent: String,
        target: String,
    },
    UpgradeController {
        agent: String,
        target: String,
    },
    MoveToward {
        agent: String,
        target: Position,
    },
    Spawn {
        facility: String,
        body: Vec<BodyPart>,
        name: String,
    },
}

/// [`Actions`] that returns scripted statuses and records every call.
///
/// Queued statuses are consumed in order; once the script runs out the
/// fallback status is returned. Moves always succeed unless scripted.
#[derive(Debug, Clone)]
pub struct ScriptedActions {
    pub script: VecDeque<Status>,
    pub fallback: Status,
    pub calls: Vec<Call>,
}

impl ScriptedActions {
    pub fn always(status: Status) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: status,
            calls: Vec::new(),
        }
    }

    pub fn scripted(statuses: &[Status], fallback: Status) -> Self {
        Self {
            script: statuses.iter().copied().collect(),
            fallback,
            calls: Vec::new(),
        }
    }

    pub fn spawns(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Spawn { .. }))
            .collect()
    }

    fn next(&mut self, call: Call) -> Status {
        self.calls.push(call);
        self.script.pop_front().unwrap_or(self.fallback)
    }
}

impl Actions for ScriptedActions {
    fn extract(&mut self, agent: &str, node: &str) -> Status {
        self.next(Call::Extract {
            agent: agent.to_string(),
            target: node.to_string(),
        })
    }

    fn deposit(
        &mut self,
        agent: &str,
        target: &str,
        resource: Resource,
        amount: Option<u32>,
    ) -> Status {
        self.next(Call::Deposit {
            agent: agent.to_string(),
            target: target.to_string(),
            resource,
            amount,
        })
    }

    fn retrieve(
        &mut self,
        agent: &str,
        target: &str,
        resource: Resource,
        amount: Option<u32>,
    ) -> Status {
        self.next(Call::Retrieve {
            agent: agent.to_string(),
            target: target.to_string(),
            resource,
            amount,
        })
    }

    fn build(&mut self, agent: &str, site: &str) -> Status {
        self.next(Call::Build {
            agent: agent.to_string(),
            target: site.to_string(),
        })
    }

    fn repair(&mut self, agent: &str, structure: &str) -> Status {
        self.next(Call::Repair {
            agent: agent.to_string(),
            target: structure.to_string(),
        })
    }

    fn upgrade_controller(&mut self, agent: &str, controller: &str) -> Status {
        self.next(Call::UpgradeController {
            agent: agent.to_string(),
            target: controller.to_string(),
        })
    }

    fn move_toward(&mut self, agent: &str, target: &Position) -> Status {
        self.calls.push(Call::MoveToward {
            agent: agent.to_string(),
            target: target.clone(),
        });
        Status::Ok
    }

    fn spawn(&mut self, facility: &str, body: &[BodyPart], name: &str) -> Status {
        self.next(Call::Spawn {
            facility: facility.to_string(),
            body: body.to_vec(),
            name: name.to_string(),
        })
    }
}

/// Temporary colony directory for filesystem-backed tests.
pub struct TestColony {
    _dir: tempfile::TempDir,
    pub root: PathBuf,
    pub paths: ColonyPaths,
}

impl TestColony {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().to_path_buf();
        let paths = ColonyPaths::new(&root);
        Self {
            _dir: dir,
            root,
            paths,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for TestColony {
    fn default() -> Self {
        Self::new()
    }
}
