//! Role-specific managers of agent rosters.
//!
//! An [`Official`] decides what its agents do next; an [`Office`] pairs one
//! Official with the agents bound to it this cycle and drives them:
//!
//! 1. every agent whose goal is achieved gets a replacement from
//!    [`Official::next_goal`];
//! 2. every agent runs exactly one goal step;
//! 3. the roster is compared with its limit: excess agents are released,
//!    a short roster yields one creation request.

mod base;
mod controller;
mod mine;

pub use base::Base;
pub use controller::Controller;
pub use mine::Mine;

use serde::Serialize;
use tracing::{debug, info};

use crate::agent::Agent;
use crate::core::goal::{Goal, GoalKind, Step};
use crate::core::roster::{self, Demand};
use crate::core::types::Priority;
use crate::env::Actions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Controller,
    Mine,
    Base,
}

pub trait Official<'w> {
    fn role(&self) -> Role;

    /// Id of the structure, node or partition this Official manages. Agents
    /// store it as their owner.
    fn managed(&self) -> &str;

    fn priority(&self) -> Priority;

    /// Target of this Official's creation requests; `None` ranks last.
    fn request_target(&self) -> Option<&str>;

    fn max_roster(&self) -> u32;

    /// Replacement goal for an idle agent, in role-specific priority order.
    /// Returns `Goal::Null` when nothing useful is available.
    fn next_goal(&self, agent: &Agent<'w>) -> Goal<'w>;
}

/// What one Official did this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfficialReport {
    pub role: Role,
    pub managed: String,
    pub ran: usize,
    pub assigned: usize,
    pub achieved: usize,
    /// Agents that fell back to the idle goal for lack of work.
    pub idle: usize,
    pub culled: Vec<String>,
    pub demand: Demand,
}

/// An Official with the agents it owns this cycle.
pub struct Office<'w> {
    pub official: Box<dyn Official<'w> + 'w>,
    pub roster: Vec<Agent<'w>>,
}

impl<'w> Office<'w> {
    pub fn new(official: Box<dyn Official<'w> + 'w>) -> Self {
        Self {
            official,
            roster: Vec::new(),
        }
    }

    pub fn managed(&self) -> &str {
        self.official.managed()
    }

    pub fn vacancies(&self) -> usize {
        (self.official.max_roster() as usize).saturating_sub(self.roster.len())
    }

    pub fn adopt(&mut self, mut agent: Agent<'w>) {
        debug!(agent = %agent.id(), owner = %self.official.managed(), "agent adopted");
        agent.adopt_by(self.official.managed());
        self.roster.push(agent);
    }

    /// Assign, run and cull. Each agent runs exactly once.
    pub fn run(&mut self, actions: &mut dyn Actions) -> OfficialReport {
        let mut report = OfficialReport {
            role: self.official.role(),
            managed: self.official.managed().to_string(),
            ran: 0,
            assigned: 0,
            achieved: 0,
            idle: 0,
            culled: Vec::new(),
            demand: Demand::Satisfied,
        };

        for agent in &mut self.roster {
            if agent.is_done() {
                let goal = self.official.next_goal(agent);
                if goal.is_null() {
                    info!(
                        agent = %agent.id(),
                        role = ?report.role,
                        managed = %report.managed,
                        "no goal available; agent idles this cycle"
                    );
                    report.idle += 1;
                } else {
                    debug!(agent = %agent.id(), kind = ?goal.kind(), target = ?goal.target_id(), "goal assigned");
                    report.assigned += 1;
                }
                agent.set_goal(goal);
            }
            let kind = agent.goal().kind();
            let step = agent.run(actions);
            report.ran += 1;
            if step == Step::Achieved && kind != GoalKind::Null {
                report.achieved += 1;
            }
        }

        report.demand = roster::demand(self.roster.len(), self.official.max_roster());
        for index in roster::culled(self.roster.len(), self.official.max_roster()) {
            let agent = &mut self.roster[index];
            info!(agent = %agent.id(), managed = %report.managed, "agent released");
            agent.release();
            report.culled.push(agent.id().to_string());
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRecord;
    use crate::core::types::{Position, Status};
    use crate::core::world::Snapshot;
    use crate::test_support::{ScriptedActions, home_world, worker};

    /// Always hands out an upgrade of the home controller.
    struct Upgrader<'w> {
        world: &'w Snapshot,
        max: u32,
    }

    impl<'w> Official<'w> for Upgrader<'w> {
        fn role(&self) -> Role {
            Role::Controller
        }
        fn managed(&self) -> &str {
            "ctrl-1"
        }
        fn priority(&self) -> Priority {
            Priority::Normal
        }
        fn request_target(&self) -> Option<&str> {
            Some("ctrl-1")
        }
        fn max_roster(&self) -> u32 {
            self.max
        }
        fn next_goal(&self, _agent: &Agent<'w>) -> Goal<'w> {
            match self.world.controller_in("W1N1") {
                Some(controller) => Goal::Upgrade { controller },
                None => Goal::Null,
            }
        }
    }

    fn world(units: usize) -> Snapshot {
        let mut world = home_world("W1N1");
        for i in 0..units {
            let id = format!("a{}", i);
            world
                .units
                .insert(id.clone(), worker(&id, Position::new("W1N1", 40, 38)));
        }
        world
    }

    fn office<'w>(world: &'w Snapshot, max: u32) -> Office<'w> {
        let mut office = Office::new(Box::new(Upgrader { world, max }));
        for unit in world.units.values() {
            let record = AgentRecord::spawned(unit.id.clone(), "W1N1", "ctrl-1");
            office.roster.push(Agent::bind(record, world).expect("bind"));
        }
        office
    }

    #[test]
    fn idle_agents_are_assigned_and_run_in_same_pass() {
        let world = world(2);
        let mut office = office(&world, 2);
        let mut actions = ScriptedActions::always(Status::NotInRange);
        let report = office.run(&mut actions);

        assert_eq!(report.assigned, 2);
        assert_eq!(report.ran, 2);
        assert_eq!(report.demand, Demand::Satisfied);
        assert!(office.roster.iter().all(|a| a.goal().kind() == GoalKind::Upgrade));
    }

    #[test]
    fn short_roster_requests_once() {
        let world = world(1);
        let mut office = office(&world, 3);
        let report = office.run(&mut ScriptedActions::always(Status::Ok));
        assert_eq!(report.demand, Demand::Request);
        assert_eq!(office.vacancies(), 2);
    }

    #[test]
    fn excess_agents_run_then_release_in_enumeration_order() {
        let world = world(3);
        let mut office = office(&world, 1);
        let report = office.run(&mut ScriptedActions::always(Status::NotInRange));

        assert_eq!(report.ran, 3);
        assert_eq!(report.demand, Demand::Excess(2));
        assert_eq!(report.culled, vec!["a1".to_string(), "a2".to_string()]);
        let owned = office.roster.iter().filter(|a| a.owner().is_some()).count();
        assert_eq!(owned, 1);
    }
}
