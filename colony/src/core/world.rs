//! Per-cycle environment snapshot.
//!
//! A [`Snapshot`] is the read-only view of the environment at the start of a
//! cycle. Actions issued during the cycle are not reflected here; every
//! decision that depends on an action's effect has to project it (see
//! [`crate::core::projection`]).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::types::{BodyPart, PARTITION_SIZE, Position, Resource};

/// A live mobile worker as reported by the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitView {
    pub id: String,
    pub pos: Position,
    pub body: Vec<BodyPart>,
    #[serde(default)]
    pub cargo: BTreeMap<Resource, u32>,
    pub capacity: u32,
    /// Still being produced by a facility; every action reports `Busy`.
    #[serde(default)]
    pub spawning: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticks_to_live: Option<u32>,
}

impl UnitView {
    pub fn active_parts(&self, part: BodyPart) -> u32 {
        self.body.iter().filter(|p| **p == part).count() as u32
    }

    pub fn amount(&self, resource: Resource) -> u32 {
        self.cargo.get(&resource).copied().unwrap_or(0)
    }

    pub fn energy(&self) -> u32 {
        self.amount(Resource::Energy)
    }

    pub fn cargo_total(&self) -> u32 {
        self.cargo.values().sum()
    }

    pub fn free_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.cargo_total())
    }

    pub fn is_full(&self) -> bool {
        self.free_capacity() == 0
    }

    /// The resource the unit holds most of (ties go to the lowest kind).
    pub fn dominant_resource(&self) -> Option<Resource> {
        self.cargo
            .iter()
            .filter(|(_, amount)| **amount > 0)
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(resource, _)| *resource)
    }
}

/// An extractable resource node (energy source or mineral deposit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: String,
    pub pos: Position,
    pub resource: Resource,
    pub remaining: u32,
    pub capacity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticks_to_regeneration: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    Spawn,
    Extension,
    Controller,
    Container,
    Storage,
    Tower,
    Road,
    Wall,
    Rampart,
}

impl StructureKind {
    pub fn default_hits_max(self) -> u32 {
        match self {
            StructureKind::Spawn => 5_000,
            StructureKind::Extension => 1_000,
            StructureKind::Controller => 0,
            StructureKind::Container => 250_000,
            StructureKind::Storage => 10_000,
            StructureKind::Tower => 3_000,
            StructureKind::Road => 5_000,
            StructureKind::Wall => 300_000_000,
            StructureKind::Rampart => 300_000,
        }
    }

    pub fn default_store_capacity(self) -> u32 {
        match self {
            StructureKind::Spawn => 300,
            StructureKind::Extension => 50,
            StructureKind::Container => 2_000,
            StructureKind::Storage => 1_000_000,
            StructureKind::Tower => 1_000,
            StructureKind::Controller
            | StructureKind::Road
            | StructureKind::Wall
            | StructureKind::Rampart => 0,
        }
    }

    /// Structures that only hold energy.
    fn energy_only(self) -> bool {
        matches!(
            self,
            StructureKind::Spawn | StructureKind::Extension | StructureKind::Tower
        )
    }
}

/// Production in progress at a facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawningView {
    pub name: String,
    pub remaining: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureView {
    pub id: String,
    pub kind: StructureKind,
    pub pos: Position,
    #[serde(default)]
    pub hits: u32,
    #[serde(default)]
    pub hits_max: u32,
    #[serde(default)]
    pub store: BTreeMap<Resource, u32>,
    #[serde(default)]
    pub store_capacity: u32,
    #[serde(default = "default_mine")]
    pub mine: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spawning: Option<SpawningView>,
    /// Controller upgrade progress; zero for every other kind.
    #[serde(default)]
    pub progress: u32,
}

fn default_mine() -> bool {
    true
}

impl StructureView {
    pub fn amount(&self, resource: Resource) -> u32 {
        self.store.get(&resource).copied().unwrap_or(0)
    }

    pub fn energy(&self) -> u32 {
        self.amount(Resource::Energy)
    }

    pub fn free_capacity(&self) -> u32 {
        self.store_capacity
            .saturating_sub(self.store.values().sum::<u32>())
    }

    /// True if `resource` can be deposited here at all (ignoring free space).
    pub fn accepts(&self, resource: Resource) -> bool {
        if self.store_capacity == 0 {
            return false;
        }
        resource == Resource::Energy || !self.kind.energy_only()
    }

    pub fn is_facility(&self) -> bool {
        self.kind == StructureKind::Spawn && self.mine
    }

    pub fn is_damaged(&self) -> bool {
        self.hits_max > 0 && self.hits < self.hits_max
    }
}

/// A construction site awaiting build progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteView {
    pub id: String,
    pub kind: StructureKind,
    pub pos: Position,
    pub progress: u32,
    pub progress_total: u32,
}

/// An administratively distinct spatial region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionView {
    pub name: String,
    #[serde(default)]
    pub walls: BTreeSet<(u32, u32)>,
    #[serde(default)]
    pub hostiles: Vec<(u32, u32)>,
}

/// Everything the environment reports for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(default)]
    pub partitions: BTreeMap<String, PartitionView>,
    #[serde(default)]
    pub units: BTreeMap<String, UnitView>,
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeView>,
    #[serde(default)]
    pub structures: BTreeMap<String, StructureView>,
    #[serde(default)]
    pub sites: BTreeMap<String, SiteView>,
}

/// A resolved reference to any addressable object in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Object<'w> {
    Unit(&'w UnitView),
    Node(&'w NodeView),
    Structure(&'w StructureView),
    Site(&'w SiteView),
}

impl<'w> Object<'w> {
    pub fn id(&self) -> &'w str {
        match self {
            Object::Unit(unit) => &unit.id,
            Object::Node(node) => &node.id,
            Object::Structure(structure) => &structure.id,
            Object::Site(site) => &site.id,
        }
    }

    pub fn pos(&self) -> &'w Position {
        match self {
            Object::Unit(unit) => &unit.pos,
            Object::Node(node) => &node.pos,
            Object::Structure(structure) => &structure.pos,
            Object::Site(site) => &site.pos,
        }
    }
}

impl Snapshot {
    /// Resolve an id to a live object. Ids are unique across all maps.
    pub fn resolve(&self, id: &str) -> Option<Object<'_>> {
        if let Some(unit) = self.units.get(id) {
            return Some(Object::Unit(unit));
        }
        if let Some(node) = self.nodes.get(id) {
            return Some(Object::Node(node));
        }
        if let Some(structure) = self.structures.get(id) {
            return Some(Object::Structure(structure));
        }
        self.sites.get(id).map(Object::Site)
    }

    pub fn unit(&self, id: &str) -> Option<&UnitView> {
        self.units.get(id)
    }

    pub fn has_partition(&self, name: &str) -> bool {
        self.partitions.contains_key(name)
    }

    pub fn structures_in<'a, 'p>(
        &'a self,
        partition: &'p str,
    ) -> impl Iterator<Item = &'a StructureView> {
        self.structures
            .values()
            .filter(move |s| s.pos.partition == partition)
    }

    pub fn nodes_in<'a, 'p>(&'a self, partition: &'p str) -> impl Iterator<Item = &'a NodeView> {
        self.nodes
            .values()
            .filter(move |n| n.pos.partition == partition)
    }

    pub fn sites_in<'a, 'p>(&'a self, partition: &'p str) -> impl Iterator<Item = &'a SiteView> {
        self.sites
            .values()
            .filter(move |s| s.pos.partition == partition)
    }

    /// Owned production facilities in `partition`, ordered by id.
    pub fn facilities_in<'a, 'p>(
        &'a self,
        partition: &'p str,
    ) -> impl Iterator<Item = &'a StructureView> {
        self.structures_in(partition).filter(|s| s.is_facility())
    }

    pub fn controller_in(&self, partition: &str) -> Option<&StructureView> {
        self.structures_in(partition)
            .find(|s| s.kind == StructureKind::Controller && s.mine)
    }

    /// Energy available for production in `partition` (spawns + extensions).
    pub fn production_energy(&self, partition: &str) -> u32 {
        self.structures_in(partition)
            .filter(|s| {
                s.mine && matches!(s.kind, StructureKind::Spawn | StructureKind::Extension)
            })
            .map(|s| s.energy())
            .sum()
    }

    /// Count of in-bounds, non-wall tiles adjacent to `pos`.
    pub fn walkable_around(&self, pos: &Position) -> u32 {
        let walls = self.partitions.get(&pos.partition).map(|p| &p.walls);
        let mut count = 0;
        for dx in -1i64..=1 {
            for dy in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let x = pos.x as i64 + dx;
                let y = pos.y as i64 + dy;
                if x < 0 || y < 0 || x >= PARTITION_SIZE as i64 || y >= PARTITION_SIZE as i64 {
                    continue;
                }
                let tile = (x as u32, y as u32);
                if walls.is_some_and(|w| w.contains(&tile)) {
                    continue;
                }
                count += 1;
            }
        }
        count
    }

    /// True if a hostile stands within range 1 of `pos`.
    pub fn is_guarded(&self, pos: &Position) -> bool {
        let Some(partition) = self.partitions.get(&pos.partition) else {
            return false;
        };
        partition
            .hostiles
            .iter()
            .any(|(x, y)| x.abs_diff(pos.x) <= 1 && y.abs_diff(pos.y) <= 1)
    }
}
