//! One colony cycle over a world snapshot.
//!
//! The [`Coordinator`] rebuilds every agent from the store, binds each one to
//! the Official named by its owner, runs the controlled partitions in name
//! order and writes agents, queues and counters back. Nothing survives
//! between cycles except what is written to the store.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::agent::{Agent, AgentRecord};
use crate::core::arbitration::Rejected;
use crate::core::types::BodyPart;
use crate::core::world::Snapshot;
use crate::env::Actions;
use crate::io::config::ColonyConfig;
use crate::io::store::{
    Meta, Store, delete_agent, load_agents, load_meta, load_queue, put_agent, put_meta, put_queue,
};
use crate::partition::{Cycle, PartitionController, PartitionReport};

/// What one cycle did, in aggregate and per partition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TickSummary {
    pub tick: u64,
    pub agents_run: usize,
    pub goals_assigned: usize,
    pub goals_achieved: usize,
    pub idle: usize,
    /// Records dropped because their unit no longer exists.
    pub pruned: Vec<String>,
    /// Live units that had no record and were recorded as unowned.
    pub recovered: Vec<String>,
    pub adopted: Vec<String>,
    pub culled: Vec<String>,
    /// Agents left without an owner at the end of the cycle.
    pub unowned: Vec<String>,
    pub requests_submitted: usize,
    pub requests_purged: usize,
    pub requests_pending: usize,
    pub spawned: Vec<String>,
    pub rejected: Vec<Rejected>,
    pub underserved: Vec<String>,
    pub partitions: Vec<PartitionReport>,
}

impl TickSummary {
    fn absorb(&mut self, report: PartitionReport) {
        for official in &report.officials {
            self.agents_run += official.ran;
            self.goals_assigned += official.assigned;
            self.goals_achieved += official.achieved;
            self.idle += official.idle;
            self.culled.extend(official.culled.iter().cloned());
        }
        self.requests_submitted += report.submitted;
        self.requests_purged += report.purged;
        self.requests_pending += report.pending;
        self.spawned.extend(report.spawned.iter().cloned());
        self.rejected.extend(report.rejected.iter().cloned());
        self.underserved.extend(report.underserved.iter().cloned());
        self.partitions.push(report);
    }
}

/// Colony state rebuilt for one cycle.
pub struct Coordinator<'w> {
    world: &'w Snapshot,
    partitions: Vec<PartitionController<'w>>,
    unowned: Vec<Agent<'w>>,
    meta: Meta,
    body: Vec<BodyPart>,
    underserved_horizon: u64,
    pruned: Vec<String>,
    recovered: Vec<String>,
    adopted: Vec<String>,
}

impl<'w> Coordinator<'w> {
    /// Load every record, drop the dead, and bind the living to their Officials.
    ///
    /// A live unit with no record gets an idle, unowned one homed in its
    /// current partition. Agents whose owner no longer names an Official are
    /// released. Unowned agents are then offered, in id order, to Officials
    /// of their home partition that have vacancies.
    pub fn rebuild(world: &'w Snapshot, store: &mut dyn Store, config: &ColonyConfig) -> Result<Self> {
        let meta = load_meta(store)?;

        let mut pruned = Vec::new();
        let mut live = Vec::new();
        for record in load_agents(store)? {
            if world.unit(&record.id).is_none() {
                info!(agent = %record.id, "unit gone; record pruned");
                delete_agent(store, &record.id);
                pruned.push(record.id);
            } else {
                live.push(record);
            }
        }

        let mut recovered = Vec::new();
        for unit in world.units.values() {
            if live.iter().any(|record| record.id == unit.id) {
                continue;
            }
            info!(
                agent = %unit.id,
                partition = %unit.pos.partition,
                "live unit without record; recorded unowned"
            );
            live.push(AgentRecord::unowned(unit.id.clone(), unit.pos.partition.clone()));
            recovered.push(unit.id.clone());
        }
        live.sort_by(|a, b| a.id.cmp(&b.id));

        let mut partitions = Vec::new();
        for name in world.partitions.keys() {
            if !PartitionController::is_controlled(world, name) {
                continue;
            }
            let queue = load_queue(store, name)?;
            partitions.push(PartitionController::build(world, name, config, queue));
        }

        let mut unowned = Vec::new();
        for record in live {
            let Some(mut agent) = Agent::bind(record, world) else {
                continue;
            };
            let owner = agent.owner().map(str::to_string);
            let office = owner
                .as_deref()
                .and_then(|owner| partitions.iter_mut().find_map(|pc| pc.office_mut(owner)));
            match office {
                Some(office) => office.roster.push(agent),
                None => {
                    if let Some(owner) = owner {
                        debug!(agent = %agent.id(), %owner, "owner gone; agent released");
                        agent.release();
                    }
                    unowned.push(agent);
                }
            }
        }

        let mut adopted = Vec::new();
        for pc in &mut partitions {
            let (taken, rest) = pc.adopt(std::mem::take(&mut unowned));
            adopted.extend(taken);
            unowned = rest;
        }

        Ok(Self {
            world,
            partitions,
            unowned,
            meta,
            body: config.worker_body.clone(),
            underserved_horizon: config.underserved_warn_ticks,
            pruned,
            recovered,
            adopted,
        })
    }

    /// Run every partition once, then write all state through to `store`.
    pub fn run(mut self, actions: &mut dyn Actions, store: &mut dyn Store) -> Result<TickSummary> {
        let mut cycle = Cycle {
            tick: self.world.tick,
            next_submission: self.meta.next_submission,
            body: self.body.clone(),
            underserved_horizon: self.underserved_horizon,
        };
        let mut summary = TickSummary {
            tick: self.world.tick,
            pruned: std::mem::take(&mut self.pruned),
            recovered: std::mem::take(&mut self.recovered),
            adopted: std::mem::take(&mut self.adopted),
            ..TickSummary::default()
        };

        for pc in &mut self.partitions {
            let report = pc.run(actions, &mut cycle);
            summary.absorb(report);
        }

        for pc in self.partitions {
            let name = pc.name();
            let (records, queue) = pc.into_parts();
            for record in &records {
                put_agent(store, record)?;
            }
            put_queue(store, name, &queue)?;
        }
        for agent in self.unowned {
            summary.unowned.push(agent.id().to_string());
            put_agent(store, agent.record())?;
        }
        put_meta(
            store,
            &Meta {
                next_submission: cycle.next_submission,
            },
        )?;

        info!(
            tick = summary.tick,
            agents = summary.agents_run,
            achieved = summary.goals_achieved,
            spawned = summary.spawned.len(),
            pending = summary.requests_pending,
            "cycle complete"
        );
        Ok(summary)
    }
}

/// Rebuild and run one cycle.
pub fn run_cycle(
    world: &Snapshot,
    store: &mut dyn Store,
    config: &ColonyConfig,
    actions: &mut dyn Actions,
) -> Result<TickSummary> {
    let coordinator = Coordinator::rebuild(world, store, config)?;
    coordinator.run(actions, store)
}
