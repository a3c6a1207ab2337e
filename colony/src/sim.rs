//! Deterministic in-process environment.
//!
//! [`SimWorld`] holds the authoritative world between cycles. During a cycle
//! the colony reads an immutable [`Snapshot`] and talks to an
//! [`IntentRecorder`], which validates each primitive action against that
//! snapshot and records it. [`SimWorld::advance`] then applies the recorded
//! intents, so every effect becomes visible only in the next snapshot.
//!
//! Application order within one advance:
//!
//! 1. work intents, in agent id order;
//! 2. moves, in agent id order (one tile per cycle);
//! 3. production countdowns, then new production orders;
//! 4. facility energy trickle, node regeneration, unit ageing.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::projection;
use crate::core::types::{
    BodyPart, CARRY_CAPACITY, INTERACT_RANGE, MAX_BODY_PARTS, PARTITION_SIZE, Position,
    REPAIR_COST_PER_PART, REPAIR_POWER, Resource, Status, WORK_RANGE, body_cost,
};
use crate::core::world::{
    NodeView, Object, PartitionView, SiteView, Snapshot, SpawningView, StructureKind,
    StructureView, UnitView,
};
use crate::env::Actions;

/// Lifetime of a freshly produced unit.
pub const UNIT_LIFETIME: u32 = 1_500;
/// Ticks a drained node waits before refilling.
pub const NODE_REGENERATION_TICKS: u32 = 300;
/// Facility energy that trickles back each cycle, up to its capacity.
pub const FACILITY_TRICKLE: u32 = 1;

/// One economic action, resolved to concrete amounts at record time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Work {
    Extract { node: String },
    Deposit { target: String, resource: Resource, amount: u32 },
    Retrieve { target: String, resource: Resource, amount: u32 },
    Build { site: String, energy: u32 },
    Repair { structure: String, energy: u32 },
    Upgrade { controller: String, energy: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnOrder {
    pub body: Vec<BodyPart>,
    pub name: String,
}

/// Everything recorded during one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intents {
    pub work: BTreeMap<String, Work>,
    pub moves: BTreeMap<String, Position>,
    pub spawns: BTreeMap<String, SpawnOrder>,
}

impl Intents {
    pub fn is_empty(&self) -> bool {
        self.work.is_empty() && self.moves.is_empty() && self.spawns.is_empty()
    }
}

/// Validates actions against a snapshot and records them as intents.
pub struct IntentRecorder<'w> {
    world: &'w Snapshot,
    intents: Intents,
    /// Production energy already committed this cycle, by partition.
    committed: BTreeMap<String, u32>,
}

impl<'w> IntentRecorder<'w> {
    pub fn new(world: &'w Snapshot) -> Self {
        Self {
            world,
            intents: Intents::default(),
            committed: BTreeMap::new(),
        }
    }

    pub fn finish(self) -> Intents {
        self.intents
    }

    /// The acting unit, if it may act at all this cycle.
    fn actor(&self, agent: &str) -> Result<&'w UnitView, Status> {
        let unit = self.world.unit(agent).ok_or(Status::InvalidTarget)?;
        if unit.spawning || self.intents.work.contains_key(agent) {
            return Err(Status::Busy);
        }
        Ok(unit)
    }

    fn worker(&self, agent: &str) -> Result<&'w UnitView, Status> {
        let unit = self.actor(agent)?;
        if unit.active_parts(BodyPart::Work) == 0 {
            return Err(Status::NoCapability);
        }
        Ok(unit)
    }

    fn record(&mut self, agent: &str, work: Work) -> Status {
        debug!(agent, ?work, "intent recorded");
        self.intents.work.insert(agent.to_string(), work);
        Status::Ok
    }

    fn try_extract(&self, agent: &str, node: &str) -> Result<Work, Status> {
        let unit = self.actor(agent)?;
        let node = self.world.nodes.get(node).ok_or(Status::InvalidTarget)?;
        if node.remaining == 0 {
            return Err(Status::InsufficientResource);
        }
        if unit.is_full() {
            return Err(Status::Full);
        }
        if !unit.pos.in_range(&node.pos, INTERACT_RANGE) {
            return Err(Status::NotInRange);
        }
        if unit.active_parts(BodyPart::Work) == 0 {
            return Err(Status::NoCapability);
        }
        Ok(Work::Extract {
            node: node.id.clone(),
        })
    }

    fn try_deposit(
        &self,
        agent: &str,
        target: &str,
        resource: Resource,
        amount: Option<u32>,
    ) -> Result<Work, Status> {
        let unit = self.actor(agent)?;
        let held = unit.amount(resource);
        if held == 0 || amount.is_some_and(|a| a > held) {
            return Err(Status::InsufficientResource);
        }
        let (pos, free) = match self.world.resolve(target) {
            Some(Object::Structure(s)) if s.accepts(resource) => (&s.pos, s.free_capacity()),
            Some(Object::Unit(other)) if other.id != unit.id => (&other.pos, other.free_capacity()),
            _ => return Err(Status::InvalidTarget),
        };
        if free == 0 {
            return Err(Status::Full);
        }
        if !unit.pos.in_range(pos, INTERACT_RANGE) {
            return Err(Status::NotInRange);
        }
        Ok(Work::Deposit {
            target: target.to_string(),
            resource,
            amount: amount.unwrap_or(held).min(free),
        })
    }

    fn try_retrieve(
        &self,
        agent: &str,
        target: &str,
        resource: Resource,
        amount: Option<u32>,
    ) -> Result<Work, Status> {
        let unit = self.actor(agent)?;
        let Some(Object::Structure(store)) = self.world.resolve(target) else {
            return Err(Status::InvalidTarget);
        };
        if store.store_capacity == 0 {
            return Err(Status::InvalidTarget);
        }
        if !store.mine && store.kind != StructureKind::Container {
            return Err(Status::NotOwner);
        }
        let free = unit.free_capacity();
        if free == 0 || amount.is_some_and(|a| a > free) {
            return Err(Status::Full);
        }
        let available = store.amount(resource);
        if available == 0 || amount.is_some_and(|a| a > available) {
            return Err(Status::InsufficientResource);
        }
        if !unit.pos.in_range(&store.pos, INTERACT_RANGE) {
            return Err(Status::NotInRange);
        }
        Ok(Work::Retrieve {
            target: target.to_string(),
            resource,
            amount: amount.unwrap_or(free).min(available),
        })
    }

    fn try_build(&self, agent: &str, site: &str) -> Result<Work, Status> {
        let unit = self.worker(agent)?;
        let site = self.world.sites.get(site).ok_or(Status::InvalidTarget)?;
        if unit.energy() == 0 {
            return Err(Status::InsufficientResource);
        }
        if !unit.pos.in_range(&site.pos, WORK_RANGE) {
            return Err(Status::NotInRange);
        }
        Ok(Work::Build {
            site: site.id.clone(),
            energy: projection::build(unit, site).energy_spent,
        })
    }

    fn try_repair(&self, agent: &str, structure: &str) -> Result<Work, Status> {
        let unit = self.worker(agent)?;
        let structure = self
            .world
            .structures
            .get(structure)
            .filter(|s| s.is_damaged())
            .ok_or(Status::InvalidTarget)?;
        if unit.energy() == 0 {
            return Err(Status::InsufficientResource);
        }
        if !unit.pos.in_range(&structure.pos, WORK_RANGE) {
            return Err(Status::NotInRange);
        }
        Ok(Work::Repair {
            structure: structure.id.clone(),
            energy: projection::repair(unit, structure).energy_spent,
        })
    }

    fn try_upgrade(&self, agent: &str, controller: &str) -> Result<Work, Status> {
        let unit = self.worker(agent)?;
        let controller = self
            .world
            .structures
            .get(controller)
            .filter(|s| s.kind == StructureKind::Controller)
            .ok_or(Status::InvalidTarget)?;
        if !controller.mine {
            return Err(Status::NotOwner);
        }
        if unit.energy() == 0 {
            return Err(Status::InsufficientResource);
        }
        if !unit.pos.in_range(&controller.pos, WORK_RANGE) {
            return Err(Status::NotInRange);
        }
        Ok(Work::Upgrade {
            controller: controller.id.clone(),
            energy: projection::upgrade(unit).energy_spent,
        })
    }

    fn try_spawn(&self, facility: &str, body: &[BodyPart], name: &str) -> Result<u32, Status> {
        let spawn = self
            .world
            .structures
            .get(facility)
            .filter(|s| s.kind == StructureKind::Spawn)
            .ok_or(Status::InvalidTarget)?;
        if !spawn.mine {
            return Err(Status::NotOwner);
        }
        if spawn.spawning.is_some() || self.intents.spawns.contains_key(facility) {
            return Err(Status::Busy);
        }
        let name_taken = self.world.units.contains_key(name)
            || self.intents.spawns.values().any(|order| order.name == name);
        if body.is_empty() || body.len() > MAX_BODY_PARTS || name_taken {
            return Err(Status::InvalidArgs);
        }
        let partition = &spawn.pos.partition;
        let committed = self.committed.get(partition).copied().unwrap_or(0);
        let available = self.world.production_energy(partition).saturating_sub(committed);
        let cost = body_cost(body);
        if cost > available {
            return Err(Status::InsufficientResource);
        }
        Ok(cost)
    }
}

fn settle<T>(result: Result<T, Status>) -> Result<T, Status> {
    if let Err(status) = &result {
        debug!(%status, "intent rejected");
    }
    result
}

impl Actions for IntentRecorder<'_> {
    fn extract(&mut self, agent: &str, node: &str) -> Status {
        match settle(self.try_extract(agent, node)) {
            Ok(work) => self.record(agent, work),
            Err(status) => status,
        }
    }

    fn deposit(
        &mut self,
        agent: &str,
        target: &str,
        resource: Resource,
        amount: Option<u32>,
    ) -> Status {
        match settle(self.try_deposit(agent, target, resource, amount)) {
            Ok(work) => self.record(agent, work),
            Err(status) => status,
        }
    }

    fn retrieve(
        &mut self,
        agent: &str,
        target: &str,
        resource: Resource,
        amount: Option<u32>,
    ) -> Status {
        match settle(self.try_retrieve(agent, target, resource, amount)) {
            Ok(work) => self.record(agent, work),
            Err(status) => status,
        }
    }

    fn build(&mut self, agent: &str, site: &str) -> Status {
        match settle(self.try_build(agent, site)) {
            Ok(work) => self.record(agent, work),
            Err(status) => status,
        }
    }

    fn repair(&mut self, agent: &str, structure: &str) -> Status {
        match settle(self.try_repair(agent, structure)) {
            Ok(work) => self.record(agent, work),
            Err(status) => status,
        }
    }

    fn upgrade_controller(&mut self, agent: &str, controller: &str) -> Status {
        match settle(self.try_upgrade(agent, controller)) {
            Ok(work) => self.record(agent, work),
            Err(status) => status,
        }
    }

    fn move_toward(&mut self, agent: &str, target: &Position) -> Status {
        let Some(unit) = self.world.unit(agent) else {
            return Status::InvalidTarget;
        };
        if unit.spawning {
            return Status::Busy;
        }
        if unit.active_parts(BodyPart::Move) == 0 {
            return Status::NoCapability;
        }
        self.intents.moves.insert(agent.to_string(), target.clone());
        Status::Ok
    }

    fn spawn(&mut self, facility: &str, body: &[BodyPart], name: &str) -> Status {
        match settle(self.try_spawn(facility, body, name)) {
            Ok(cost) => {
                let spawn_partition = self
                    .world
                    .structures
                    .get(facility)
                    .map(|s| s.pos.partition.clone())
                    .unwrap_or_default();
                *self.committed.entry(spawn_partition).or_default() += cost;
                self.intents.spawns.insert(
                    facility.to_string(),
                    SpawnOrder {
                        body: body.to_vec(),
                        name: name.to_string(),
                    },
                );
                Status::Ok
            }
            Err(status) => status,
        }
    }
}

/// The authoritative simulated environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimWorld {
    world: Snapshot,
    spawn_ticks_per_part: u32,
}

impl SimWorld {
    pub fn new(world: Snapshot, spawn_ticks_per_part: u32) -> Self {
        Self {
            world,
            spawn_ticks_per_part,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.world
    }

    /// Mutable access for scenario setup between cycles.
    pub fn snapshot_mut(&mut self) -> &mut Snapshot {
        &mut self.world
    }

    pub fn into_snapshot(self) -> Snapshot {
        self.world
    }

    pub fn recorder(&self) -> IntentRecorder<'_> {
        IntentRecorder::new(&self.world)
    }

    /// Apply one cycle's intents and move to the next tick.
    pub fn advance(&mut self, intents: Intents) {
        self.world.tick += 1;
        for (agent, work) in &intents.work {
            self.apply_work(agent, work);
        }
        for (agent, target) in &intents.moves {
            self.apply_move(agent, target);
        }
        self.count_down_production();
        for (facility, order) in &intents.spawns {
            self.start_production(facility, order);
        }
        self.trickle_facilities();
        self.regenerate_nodes();
        self.age_units();
    }

    fn apply_work(&mut self, agent: &str, work: &Work) {
        let world = &mut self.world;
        let Some(unit) = world.units.get_mut(agent) else {
            return;
        };
        match work {
            Work::Extract { node } => {
                let Some(node) = world.nodes.get_mut(node) else {
                    return;
                };
                let power = unit.active_parts(BodyPart::Work) * node.resource.harvest_power();
                let gained = power.min(node.remaining).min(unit.free_capacity());
                node.remaining -= gained;
                if node.ticks_to_regeneration.is_none() {
                    node.ticks_to_regeneration = Some(NODE_REGENERATION_TICKS);
                }
                *unit.cargo.entry(node.resource).or_default() += gained;
            }
            Work::Deposit {
                target,
                resource,
                amount,
            } => {
                let held = unit.amount(*resource);
                let free = match world.structures.get(target) {
                    Some(structure) => structure.free_capacity(),
                    None => world
                        .units
                        .get(target)
                        .map(UnitView::free_capacity)
                        .unwrap_or(0),
                };
                let moved = (*amount).min(held).min(free);
                if let Some(structure) = world.structures.get_mut(target) {
                    *structure.store.entry(*resource).or_default() += moved;
                } else if let Some(other) = world.units.get_mut(target) {
                    *other.cargo.entry(*resource).or_default() += moved;
                }
                if let Some(unit) = world.units.get_mut(agent) {
                    take(&mut unit.cargo, *resource, moved);
                }
            }
            Work::Retrieve {
                target,
                resource,
                amount,
            } => {
                let Some(structure) = world.structures.get_mut(target) else {
                    return;
                };
                let moved = (*amount)
                    .min(structure.amount(*resource))
                    .min(unit.free_capacity());
                take(&mut structure.store, *resource, moved);
                *unit.cargo.entry(*resource).or_default() += moved;
            }
            Work::Build { site, energy } => {
                let Some(entry) = world.sites.get_mut(site) else {
                    return;
                };
                let spent = (*energy).min(unit.energy());
                take(&mut unit.cargo, Resource::Energy, spent);
                entry.progress = (entry.progress + spent).min(entry.progress_total);
                if entry.progress >= entry.progress_total {
                    let finished = entry.clone();
                    world.sites.remove(site);
                    debug!(site = %finished.id, kind = ?finished.kind, "construction complete");
                    world
                        .structures
                        .insert(finished.id.clone(), completed_structure(&finished));
                }
            }
            Work::Repair { structure, energy } => {
                let Some(structure) = world.structures.get_mut(structure) else {
                    return;
                };
                let spent = (*energy).min(unit.energy());
                take(&mut unit.cargo, Resource::Energy, spent);
                structure.hits = structure
                    .hits
                    .saturating_add(spent / REPAIR_COST_PER_PART * REPAIR_POWER)
                    .min(structure.hits_max);
            }
            Work::Upgrade { controller, energy } => {
                let Some(controller) = world.structures.get_mut(controller) else {
                    return;
                };
                let spent = (*energy).min(unit.energy());
                take(&mut unit.cargo, Resource::Energy, spent);
                controller.progress += spent;
            }
        }
    }

    fn apply_move(&mut self, agent: &str, target: &Position) {
        let Some(walls) = self
            .world
            .partitions
            .get(&target.partition)
            .map(|p| p.walls.clone())
        else {
            return;
        };
        let Some(unit) = self.world.units.get_mut(agent) else {
            return;
        };
        if unit.pos.partition != target.partition {
            unit.pos = Position::new(
                target.partition.clone(),
                unit.pos.x.min(PARTITION_SIZE - 1),
                unit.pos.y.min(PARTITION_SIZE - 1),
            );
            return;
        }
        if unit.pos.range_to(target).is_some_and(|r| r <= 1) {
            return;
        }
        let next = (step(unit.pos.x, target.x), step(unit.pos.y, target.y));
        if walls.contains(&next) {
            return;
        }
        unit.pos.x = next.0;
        unit.pos.y = next.1;
    }

    fn count_down_production(&mut self) {
        for structure in self.world.structures.values_mut() {
            let Some(spawning) = structure.spawning.as_mut() else {
                continue;
            };
            spawning.remaining = spawning.remaining.saturating_sub(1);
            if spawning.remaining == 0 {
                if let Some(unit) = self.world.units.get_mut(&spawning.name) {
                    unit.spawning = false;
                }
                structure.spawning = None;
            }
        }
    }

    fn start_production(&mut self, facility: &str, order: &SpawnOrder) {
        let Some(pos) = self.world.structures.get(facility).map(|s| s.pos.clone()) else {
            return;
        };
        if !self.debit_production_energy(&pos.partition, body_cost(&order.body)) {
            return;
        }
        let carry = order.body.iter().filter(|p| **p == BodyPart::Carry).count() as u32;
        self.world.units.insert(
            order.name.clone(),
            UnitView {
                id: order.name.clone(),
                pos,
                body: order.body.clone(),
                cargo: BTreeMap::new(),
                capacity: carry * CARRY_CAPACITY,
                spawning: true,
                ticks_to_live: Some(UNIT_LIFETIME),
            },
        );
        if let Some(structure) = self.world.structures.get_mut(facility) {
            structure.spawning = Some(SpawningView {
                name: order.name.clone(),
                remaining: self.spawn_ticks_per_part * order.body.len() as u32,
            });
        }
        debug!(facility, agent = %order.name, "production started");
    }

    /// Take `cost` energy from spawns, then extensions, in id order.
    fn debit_production_energy(&mut self, partition: &str, cost: u32) -> bool {
        if self.world.production_energy(partition) < cost {
            return false;
        }
        let mut owed = cost;
        for kind in [StructureKind::Spawn, StructureKind::Extension] {
            for structure in self.world.structures.values_mut() {
                if owed == 0 {
                    return true;
                }
                if structure.kind != kind || !structure.mine || structure.pos.partition != partition {
                    continue;
                }
                let paid = owed.min(structure.energy());
                take(&mut structure.store, Resource::Energy, paid);
                owed -= paid;
            }
        }
        owed == 0
    }

    fn trickle_facilities(&mut self) {
        for structure in self.world.structures.values_mut() {
            if structure.kind == StructureKind::Spawn
                && structure.mine
                && structure.free_capacity() > 0
            {
                *structure.store.entry(Resource::Energy).or_default() += FACILITY_TRICKLE;
            }
        }
    }

    fn regenerate_nodes(&mut self) {
        for node in self.world.nodes.values_mut() {
            let Some(ticks) = node.ticks_to_regeneration else {
                continue;
            };
            if ticks <= 1 {
                node.remaining = node.capacity;
                node.ticks_to_regeneration = None;
            } else {
                node.ticks_to_regeneration = Some(ticks - 1);
            }
        }
    }

    fn age_units(&mut self) {
        let mut expired = Vec::new();
        for unit in self.world.units.values_mut() {
            if unit.spawning {
                continue;
            }
            if let Some(ttl) = unit.ticks_to_live.as_mut() {
                *ttl = ttl.saturating_sub(1);
                if *ttl == 0 {
                    expired.push(unit.id.clone());
                }
            }
        }
        for id in expired {
            debug!(agent = %id, "unit expired");
            self.world.units.remove(&id);
        }
    }
}

fn take(store: &mut BTreeMap<Resource, u32>, resource: Resource, amount: u32) {
    if let Some(held) = store.get_mut(&resource) {
        *held = held.saturating_sub(amount);
        if *held == 0 {
            store.remove(&resource);
        }
    }
}

fn step(from: u32, to: u32) -> u32 {
    match from.cmp(&to) {
        std::cmp::Ordering::Less => from + 1,
        std::cmp::Ordering::Greater => from - 1,
        std::cmp::Ordering::Equal => from,
    }
}

fn completed_structure(site: &SiteView) -> StructureView {
    StructureView {
        id: site.id.clone(),
        kind: site.kind,
        pos: site.pos.clone(),
        hits: site.kind.default_hits_max(),
        hits_max: site.kind.default_hits_max(),
        store: BTreeMap::new(),
        store_capacity: site.kind.default_store_capacity(),
        mine: true,
        spawning: None,
        progress: 0,
    }
}

/// Starting world for `colony init`: one partition with a facility, a
/// controller, two energy nodes and one construction site.
pub fn default_world() -> Snapshot {
    const HOME: &str = "W1N1";
    let mut world = Snapshot::default();

    let mut partition = PartitionView {
        name: HOME.to_string(),
        ..PartitionView::default()
    };
    for x in 0..PARTITION_SIZE {
        partition.walls.insert((x, 0));
        partition.walls.insert((x, PARTITION_SIZE - 1));
    }
    world.partitions.insert(HOME.to_string(), partition);

    let mut spawn = StructureView {
        id: "spawn-1".to_string(),
        kind: StructureKind::Spawn,
        pos: Position::new(HOME, 25, 25),
        hits: StructureKind::Spawn.default_hits_max(),
        hits_max: StructureKind::Spawn.default_hits_max(),
        store: BTreeMap::new(),
        store_capacity: StructureKind::Spawn.default_store_capacity(),
        mine: true,
        spawning: None,
        progress: 0,
    };
    spawn.store.insert(Resource::Energy, 300);
    world.structures.insert(spawn.id.clone(), spawn);

    let controller = StructureView {
        id: "ctrl-1".to_string(),
        kind: StructureKind::Controller,
        pos: Position::new(HOME, 40, 40),
        hits: 0,
        hits_max: 0,
        store: BTreeMap::new(),
        store_capacity: 0,
        mine: true,
        spawning: None,
        progress: 0,
    };
    world.structures.insert(controller.id.clone(), controller);

    for (id, x, y) in [("node-a", 10, 12), ("node-b", 38, 8)] {
        world.nodes.insert(
            id.to_string(),
            NodeView {
                id: id.to_string(),
                pos: Position::new(HOME, x, y),
                resource: Resource::Energy,
                remaining: 3_000,
                capacity: 3_000,
                ticks_to_regeneration: None,
            },
        );
    }

    world.sites.insert(
        "site-1".to_string(),
        SiteView {
            id: "site-1".to_string(),
            kind: StructureKind::Extension,
            pos: Position::new(HOME, 27, 25),
            progress: 0,
            progress_total: 3_000,
        },
    );
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{container, home_world, worker};

    fn sim_with(unit: UnitView) -> SimWorld {
        let mut world = home_world("W1N1");
        world.units.insert(unit.id.clone(), unit);
        SimWorld::new(world, 3)
    }

    #[test]
    fn effects_appear_only_after_advance() {
        let mut sim = sim_with(worker("u1", Position::new("W1N1", 11, 11)));
        let mut recorder = sim.recorder();
        assert_eq!(recorder.extract("u1", "node-1"), Status::Ok);
        let intents = recorder.finish();
        assert_eq!(sim.snapshot().units["u1"].energy(), 0);

        sim.advance(intents);
        assert_eq!(sim.snapshot().units["u1"].energy(), 2);
        assert_eq!(sim.snapshot().nodes["node-1"].remaining, 2_998);
        assert_eq!(sim.snapshot().tick, 2);
    }

    #[test]
    fn second_work_action_in_a_cycle_is_busy() {
        let sim = sim_with(worker("u1", Position::new("W1N1", 11, 11)));
        let mut recorder = sim.recorder();
        assert_eq!(recorder.extract("u1", "node-1"), Status::Ok);
        assert_eq!(recorder.extract("u1", "node-1"), Status::Busy);
    }

    #[test]
    fn out_of_range_actions_report_not_in_range() {
        let mut unit = worker("u1", Position::new("W1N1", 1, 1));
        unit.cargo.insert(Resource::Energy, 10);
        let sim = sim_with(unit);
        let mut recorder = sim.recorder();
        assert_eq!(recorder.extract("u1", "node-1"), Status::NotInRange);
        assert_eq!(recorder.upgrade_controller("u1", "ctrl-1"), Status::NotInRange);
    }

    #[test]
    fn deposit_into_full_structure_reports_full() {
        let mut unit = worker("u1", Position::new("W1N1", 24, 24));
        unit.cargo.insert(Resource::Energy, 50);
        let sim = sim_with(unit);
        let mut recorder = sim.recorder();
        assert_eq!(
            recorder.deposit("u1", "spawn-1", Resource::Energy, None),
            Status::Full
        );
    }

    #[test]
    fn moves_step_one_tile_toward_target() {
        let mut sim = sim_with(worker("u1", Position::new("W1N1", 5, 5)));
        let mut recorder = sim.recorder();
        assert_eq!(recorder.move_toward("u1", &Position::new("W1N1", 10, 7)), Status::Ok);
        let intents = recorder.finish();
        sim.advance(intents);
        assert_eq!(sim.snapshot().units["u1"].pos, Position::new("W1N1", 6, 6));
    }

    #[test]
    fn production_debits_energy_and_finishes_after_countdown() {
        let mut sim = SimWorld::new(home_world("W1N1"), 1);
        let body = [BodyPart::Work, BodyPart::Carry, BodyPart::Move];
        let mut recorder = sim.recorder();
        assert_eq!(recorder.spawn("spawn-1", &body, "W1N1-1-1"), Status::Ok);
        assert_eq!(recorder.spawn("spawn-1", &body, "W1N1-1-2"), Status::Busy);
        let intents = recorder.finish();
        sim.advance(intents);

        let world = sim.snapshot();
        assert!(world.units["W1N1-1-1"].spawning);
        // 300 - 200 cost + 1 trickle
        assert_eq!(world.structures["spawn-1"].energy(), 101);

        for _ in 0..3 {
            sim.advance(Intents::default());
        }
        assert!(!sim.snapshot().units["W1N1-1-1"].spawning);
        assert!(sim.snapshot().structures["spawn-1"].spawning.is_none());
    }

    #[test]
    fn unaffordable_body_is_rejected() {
        let mut world = home_world("W1N1");
        world
            .structures
            .get_mut("spawn-1")
            .expect("spawn")
            .store
            .insert(Resource::Energy, 100);
        let sim = SimWorld::new(world, 3);
        let mut recorder = sim.recorder();
        assert_eq!(
            recorder.spawn("spawn-1", &[BodyPart::Work, BodyPart::Carry, BodyPart::Move], "x"),
            Status::InsufficientResource
        );
    }

    #[test]
    fn withdraw_moves_energy_from_store() {
        let mut world = home_world("W1N1");
        world.structures.insert(
            "box".into(),
            container("box", Position::new("W1N1", 6, 6), 500),
        );
        world
            .units
            .insert("u1".into(), worker("u1", Position::new("W1N1", 5, 5)));
        let mut sim = SimWorld::new(world, 3);
        let mut recorder = sim.recorder();
        assert_eq!(
            recorder.retrieve("u1", "box", Resource::Energy, None),
            Status::Ok
        );
        let intents = recorder.finish();
        sim.advance(intents);
        assert_eq!(sim.snapshot().units["u1"].energy(), 50);
        assert_eq!(sim.snapshot().structures["box"].energy(), 450);
    }

    #[test]
    fn default_world_passes_invariants() {
        assert!(crate::core::invariants::validate_world(&default_world()).is_empty());
    }
}
