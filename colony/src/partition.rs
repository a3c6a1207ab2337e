//! Composition of Officials and arbitration for one partition.

use serde::Serialize;
use tracing::{debug, info};

use crate::agent::{Agent, AgentRecord};
use crate::core::arbitration::{Arbitrator, CreationRequest, Facility, Rejected, RequestQueue};
use crate::core::roster::Demand;
use crate::core::types::BodyPart;
use crate::core::world::Snapshot;
use crate::env::Actions;
use crate::io::config::ColonyConfig;
use crate::official::{Base, Controller, Mine, Office, OfficialReport};

/// Cycle-wide values shared by every partition.
#[derive(Debug, Clone)]
pub struct Cycle {
    pub tick: u64,
    /// Next submission number; advanced for every queued request.
    pub next_submission: u64,
    pub body: Vec<BodyPart>,
    pub underserved_horizon: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PartitionReport {
    pub partition: String,
    pub officials: Vec<OfficialReport>,
    pub submitted: usize,
    pub purged: usize,
    pub pending: usize,
    pub spawned: Vec<String>,
    pub rejected: Vec<Rejected>,
    pub underserved: Vec<String>,
}

/// Drives one partition's Officials, then resolves its creation requests.
pub struct PartitionController<'w> {
    name: &'w str,
    world: &'w Snapshot,
    offices: Vec<Office<'w>>,
    arbitrator: Arbitrator,
    spawned: Vec<AgentRecord>,
}

impl<'w> PartitionController<'w> {
    /// True if the colony controls `partition` (owns its controller or a facility).
    pub fn is_controlled(world: &Snapshot, partition: &str) -> bool {
        world.controller_in(partition).is_some() || world.facilities_in(partition).next().is_some()
    }

    /// Build the Officials for `name` in run order: controller, mines by node
    /// id, base.
    pub fn build(
        world: &'w Snapshot,
        name: &'w str,
        config: &ColonyConfig,
        queue: RequestQueue,
    ) -> Self {
        let mut offices = Vec::new();
        if let Some(controller) = world.controller_in(name) {
            offices.push(Office::new(Box::new(Controller::new(
                world,
                controller,
                config.roster.controller,
            ))));
        }
        for node in world.nodes_in(name) {
            if config.avoid_guarded_nodes && world.is_guarded(&node.pos) {
                debug!(partition = name, node = %node.id, "node guarded; no mine this cycle");
                continue;
            }
            offices.push(Office::new(Box::new(Mine::new(world, node, config.roster.mine))));
        }
        let anchor = world.facilities_in(name).next().map(|s| &s.pos);
        offices.push(Office::new(Box::new(Base::new(
            world,
            name,
            anchor,
            config.roster.base,
        ))));

        Self {
            name,
            world,
            offices,
            arbitrator: Arbitrator::new(name, queue),
            spawned: Vec::new(),
        }
    }

    pub fn name(&self) -> &'w str {
        self.name
    }

    pub fn offices(&self) -> &[Office<'w>] {
        &self.offices
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.arbitrator.queue
    }

    /// The office managing `managed`, if this partition has one.
    pub fn office_mut(&mut self, managed: &str) -> Option<&mut Office<'w>> {
        self.offices.iter_mut().find(|o| o.managed() == managed)
    }

    /// Give unowned agents homed here to offices with vacancies, in run order.
    /// Returns the ids adopted; the rest are handed back.
    pub fn adopt(&mut self, unowned: Vec<Agent<'w>>) -> (Vec<String>, Vec<Agent<'w>>) {
        let mut adopted = Vec::new();
        let mut remaining = Vec::new();
        let mut candidates = unowned.into_iter();
        for office in &mut self.offices {
            while office.vacancies() > 0 {
                let Some(agent) = candidates.by_ref().find_map(|agent| {
                    if agent.home() == self.name {
                        Some(agent)
                    } else {
                        remaining.push(agent);
                        None
                    }
                }) else {
                    break;
                };
                adopted.push(agent.id().to_string());
                office.adopt(agent);
            }
        }
        remaining.extend(candidates);
        (adopted, remaining)
    }

    /// Run every office once, then offer the queue to idle facilities.
    pub fn run(&mut self, actions: &mut dyn Actions, cycle: &mut Cycle) -> PartitionReport {
        let mut report = PartitionReport {
            partition: self.name.to_string(),
            ..PartitionReport::default()
        };

        for office in &mut self.offices {
            let official = office.run(actions);
            let issuer = official.managed.clone();
            match official.demand {
                Demand::Request => {
                    let request = CreationRequest {
                        body: cycle.body.clone(),
                        target: office.official.request_target().map(str::to_string),
                        issuer: issuer.clone(),
                        priority: office.official.priority(),
                        submission: cycle.next_submission,
                        submitted_at: cycle.tick,
                    };
                    if self.arbitrator.queue.submit(request) {
                        info!(partition = self.name, issuer = %issuer, submission = cycle.next_submission, "creation request submitted");
                        cycle.next_submission += 1;
                        report.submitted += 1;
                    }
                }
                Demand::Satisfied | Demand::Excess(_) => {
                    if self.arbitrator.queue.purge(&issuer).is_some() {
                        debug!(partition = self.name, issuer = %issuer, "creation request purged");
                        report.purged += 1;
                    }
                }
            }
            report.officials.push(official);
        }

        let facilities = Facility::in_partition(self.world, self.name);
        let resolution = self.arbitrator.resolve(&facilities, self.world, actions);
        for accepted in resolution.accepted {
            report.spawned.push(accepted.name.clone());
            self.spawned.push(AgentRecord::spawned(
                accepted.name,
                self.name,
                accepted.request.issuer,
            ));
        }
        report.rejected = resolution.rejected;
        report.underserved = self
            .arbitrator
            .underserved(cycle.tick, cycle.underserved_horizon);
        report.pending = self.arbitrator.queue.len();
        report
    }

    /// Records to persist: every bound agent, then newly produced ones.
    pub fn into_parts(self) -> (Vec<AgentRecord>, RequestQueue) {
        let mut records: Vec<AgentRecord> = self
            .offices
            .into_iter()
            .flat_map(|office| office.roster.into_iter().map(Agent::into_record))
            .collect();
        records.extend(self.spawned);
        (records, self.arbitrator.queue)
    }
}
