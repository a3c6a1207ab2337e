//! Multi-cycle colony scenarios against the simulated world.
//!
//! Each test drives `run_cycle` with an `IntentRecorder`, then advances the
//! `SimWorld` with the recorded intents, exactly as `colony tick` does.

use colony::agent::AgentRecord;
use colony::coordinator::{TickSummary, run_cycle};
use colony::core::goal::{GoalKind, GoalParams, GoalRecord};
use colony::core::roster::RosterLimit;
use colony::core::types::{Position, Resource, Status};
use colony::core::world::Snapshot;
use colony::io::config::ColonyConfig;
use colony::io::store::{MemoryStore, load_agents, load_queue, put_agent};
use colony::sim::SimWorld;
use colony::test_support::{container, home_world, worker};

fn step(sim: &mut SimWorld, store: &mut MemoryStore, config: &ColonyConfig) -> TickSummary {
    let mut recorder = sim.recorder();
    let summary = run_cycle(sim.snapshot(), store, config, &mut recorder).expect("cycle");
    let intents = recorder.finish();
    sim.advance(intents);
    summary
}

fn agent(store: &MemoryStore, id: &str) -> AgentRecord {
    load_agents(store)
        .expect("agents")
        .into_iter()
        .find(|a| a.id == id)
        .expect("agent record")
}

/// Only the mine is staffed; nothing else requests agents.
fn mine_only() -> ColonyConfig {
    let mut config = ColonyConfig::default();
    config.roster.controller = RosterLimit::Fixed(0);
    config.roster.base = RosterLimit::Fixed(0);
    config
}

fn with_harvester(mut world: Snapshot, pos: Position) -> (Snapshot, MemoryStore) {
    world.units.insert("h".into(), worker("h", pos));
    let mut store = MemoryStore::new();
    put_agent(&mut store, &AgentRecord::spawned("h", "W1N1", "node-1")).expect("put");
    (world, store)
}

/// One work part extracts 2 per cycle into 50 capacity: the harvest goal is
/// achieved on exactly the 25th cycle and the unit is full afterwards.
#[test]
fn harvest_completes_on_the_filling_cycle() {
    let (world, mut store) = with_harvester(home_world("W1N1"), Position::new("W1N1", 11, 10));
    let mut sim = SimWorld::new(world, 3);
    let config = mine_only();

    for cycle in 1..=24 {
        let summary = step(&mut sim, &mut store, &config);
        assert_eq!(summary.goals_achieved, 0, "cycle {}", cycle);
        let record = agent(&store, "h");
        assert_eq!(record.goal.kind, GoalKind::Harvest);
        assert!(!record.goal.achieved);
    }

    let summary = step(&mut sim, &mut store, &config);
    assert_eq!(summary.goals_achieved, 1);
    assert!(agent(&store, "h").goal.achieved);
    assert_eq!(sim.snapshot().units["h"].amount(Resource::Energy), 50);
    assert_eq!(sim.snapshot().nodes["node-1"].remaining, 3_000 - 50);
}

/// A node holding exactly one load: cargo fills and the node runs dry on the
/// same cycle, the 25th. The harvest never runs a 26th cycle.
#[test]
fn harvest_of_a_single_load_node_ends_on_cycle_25() {
    let mut world = home_world("W1N1");
    let node = world.nodes.get_mut("node-1").expect("node");
    node.remaining = 50;
    node.capacity = 50;
    let (world, mut store) = with_harvester(world, Position::new("W1N1", 11, 10));
    let mut sim = SimWorld::new(world, 3);
    let config = mine_only();

    for cycle in 1..=24 {
        let summary = step(&mut sim, &mut store, &config);
        assert_eq!(summary.goals_achieved, 0, "cycle {}", cycle);
        assert!(!agent(&store, "h").goal.achieved, "cycle {}", cycle);
    }

    let summary = step(&mut sim, &mut store, &config);
    assert_eq!(summary.goals_achieved, 1);
    let record = agent(&store, "h");
    assert_eq!(record.goal.kind, GoalKind::Harvest);
    assert!(record.goal.achieved);
    assert_eq!(sim.snapshot().units["h"].amount(Resource::Energy), 50);
    assert_eq!(sim.snapshot().nodes["node-1"].remaining, 0);

    step(&mut sim, &mut store, &config);
    assert_ne!(agent(&store, "h").goal.kind, GoalKind::Harvest);
    assert_eq!(sim.snapshot().units["h"].amount(Resource::Energy), 50);
    assert_eq!(sim.snapshot().nodes["node-1"].remaining, 0);
}

/// A full harvester hauls to the facility, then goes back to harvesting.
#[test]
fn full_harvester_transfers_then_returns_to_node() {
    let mut world = home_world("W1N1");
    world
        .structures
        .get_mut("spawn-1")
        .expect("spawn")
        .store
        .insert(Resource::Energy, 250);
    let (mut world, mut store) = with_harvester(world, Position::new("W1N1", 24, 25));
    world
        .units
        .get_mut("h")
        .expect("unit")
        .cargo
        .insert(Resource::Energy, 50);
    let mut sim = SimWorld::new(world, 3);
    let config = mine_only();

    let first = step(&mut sim, &mut store, &config);
    assert_eq!(first.goals_achieved, 1);
    let record = agent(&store, "h");
    assert_eq!(record.goal.kind, GoalKind::Transfer);
    assert_eq!(record.goal.params.target.as_deref(), Some("spawn-1"));
    assert_eq!(sim.snapshot().structures["spawn-1"].energy(), 300);
    assert_eq!(sim.snapshot().units["h"].energy(), 0);

    step(&mut sim, &mut store, &config);
    let record = agent(&store, "h");
    assert_eq!(record.goal.kind, GoalKind::Harvest);
    assert_eq!(sim.snapshot().units["h"].pos, Position::new("W1N1", 23, 24));
}

/// A transfer rejected as full completes at once; the next cycle the Official
/// hands out a fresh goal instead of retrying the same deposit.
#[test]
fn transfer_rejected_as_full_is_reassigned() {
    let (mut world, mut store) = with_harvester(home_world("W1N1"), Position::new("W1N1", 24, 25));
    world
        .units
        .get_mut("h")
        .expect("unit")
        .cargo
        .insert(Resource::Energy, 50);
    world
        .structures
        .insert("box".into(), container("box", Position::new("W1N1", 20, 25), 0));
    let mut record = AgentRecord::spawned("h", "W1N1", "node-1");
    record.goal = GoalRecord {
        kind: GoalKind::Transfer,
        achieved: false,
        params: GoalParams {
            target: Some("spawn-1".into()),
            resource: Some(Resource::Energy),
            amount: None,
        },
    };
    put_agent(&mut store, &record).expect("put");
    let mut sim = SimWorld::new(world, 3);
    let config = mine_only();

    let first = step(&mut sim, &mut store, &config);
    assert_eq!(first.goals_achieved, 1);
    assert_eq!(first.goals_assigned, 0);
    assert!(agent(&store, "h").goal.achieved);
    assert_eq!(sim.snapshot().units["h"].energy(), 50);

    let second = step(&mut sim, &mut store, &config);
    assert_eq!(second.goals_assigned, 1);
    let record = agent(&store, "h");
    assert_eq!(record.goal.kind, GoalKind::Transfer);
    assert_eq!(record.goal.params.target.as_deref(), Some("box"));
}

/// A harvester with nowhere to haul idles rather than failing the cycle.
#[test]
fn full_harvester_idles_when_every_receptacle_is_full() {
    let (mut world, mut store) = with_harvester(home_world("W1N1"), Position::new("W1N1", 11, 10));
    world
        .units
        .get_mut("h")
        .expect("unit")
        .cargo
        .insert(Resource::Energy, 50);
    let mut sim = SimWorld::new(world, 3);

    let summary = step(&mut sim, &mut store, &mine_only());
    assert_eq!(summary.idle, 1);
    assert_eq!(agent(&store, "h").goal.kind, GoalKind::Null);
}

/// A request the facility cannot afford stays queued, is retried every
/// cycle and is eventually reported as underserved.
#[test]
fn unaffordable_request_stays_queued_until_underserved() {
    let mut world = home_world("W1N1");
    world
        .structures
        .get_mut("spawn-1")
        .expect("spawn")
        .store
        .clear();
    let mut sim = SimWorld::new(world, 3);
    let mut store = MemoryStore::new();
    let mut config = mine_only();
    config.underserved_warn_ticks = 3;

    let first = step(&mut sim, &mut store, &config);
    assert_eq!(first.requests_submitted, 1);
    assert_eq!(first.rejected.len(), 1);
    assert_eq!(first.rejected[0].status, Status::InsufficientResource);
    assert!(first.underserved.is_empty());

    let mut last = first;
    for _ in 0..3 {
        last = step(&mut sim, &mut store, &config);
        assert_eq!(last.requests_submitted, 0);
        assert_eq!(last.requests_pending, 1);
        assert!(last.spawned.is_empty());
    }
    assert_eq!(last.underserved, vec!["node-1".to_string()]);

    let queue = load_queue(&store, "W1N1").expect("queue");
    let pending: Vec<_> = queue.iter().collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].submitted_at, 1);
    assert_eq!(pending[0].submission, 1);
}

/// An accepted request produces a unit that is bound to its issuer while it
/// is still being produced, and starts working once production ends.
#[test]
fn produced_agent_joins_its_issuer_and_goes_to_work() {
    let mut sim = SimWorld::new(home_world("W1N1"), 3);
    let mut store = MemoryStore::new();
    let config = mine_only();

    let first = step(&mut sim, &mut store, &config);
    assert_eq!(first.spawned, vec!["W1N1-1-1".to_string()]);
    assert_eq!(first.requests_pending, 0);
    assert!(sim.snapshot().units["W1N1-1-1"].spawning);

    let second = step(&mut sim, &mut store, &config);
    assert_eq!(second.requests_submitted, 0);
    let record = agent(&store, "W1N1-1-1");
    assert_eq!(record.owner.as_deref(), Some("node-1"));
    assert_eq!(record.goal.kind, GoalKind::Harvest);

    for _ in 0..15 {
        step(&mut sim, &mut store, &config);
    }
    let unit = &sim.snapshot().units["W1N1-1-1"];
    assert!(!unit.spawning);
    let node = &sim.snapshot().nodes["node-1"].pos;
    let range = unit.pos.range_to(node).expect("same partition");
    assert!(range < 15, "unit still {} away", range);
}

/// Dead agents are pruned; culled agents become unowned and are adopted by
/// another Official with room.
#[test]
fn culled_agents_are_adopted_elsewhere() {
    let mut world = home_world("W1N1");
    // no energy: the controller's request cannot be served by production
    world
        .structures
        .get_mut("spawn-1")
        .expect("spawn")
        .store
        .clear();
    for id in ["m1", "m2"] {
        world
            .units
            .insert(id.into(), worker(id, Position::new("W1N1", 11, 11)));
    }
    let mut store = MemoryStore::new();
    for id in ["m1", "m2", "ghost"] {
        put_agent(&mut store, &AgentRecord::spawned(id, "W1N1", "node-1")).expect("put");
    }
    let mut sim = SimWorld::new(world, 3);
    let mut config = mine_only();
    config.roster.controller = RosterLimit::Fixed(1);

    let first = step(&mut sim, &mut store, &config);
    assert_eq!(first.pruned, vec!["ghost".to_string()]);
    assert_eq!(first.culled, vec!["m2".to_string()]);
    assert_eq!(agent(&store, "m2").owner, None);

    let second = step(&mut sim, &mut store, &config);
    assert_eq!(second.adopted, vec!["m2".to_string()]);
    assert_eq!(agent(&store, "m2").owner.as_deref(), Some("ctrl-1"));
    assert!(second.culled.is_empty());
    assert_eq!(second.requests_purged, 1);
    assert_eq!(second.requests_pending, 0);
}
