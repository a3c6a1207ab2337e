//! Persisted agent records and the per-cycle agent facade.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::goal::{Goal, GoalRecord, Step};
use crate::core::world::{Snapshot, UnitView};
use crate::env::Actions;

/// Durable state of one agent, keyed by id in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub home: String,
    /// Managed entity id of the owning Official. Absent or stale means unowned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub goal: GoalRecord,
}

impl AgentRecord {
    /// Record for a freshly produced agent: idle, owned by `owner`.
    pub fn spawned(id: impl Into<String>, home: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            home: home.into(),
            owner: Some(owner.into()),
            goal: GoalRecord::null(),
        }
    }

    /// Idle record with no owner, for a live unit the store has no entry for.
    pub fn unowned(id: impl Into<String>, home: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            home: home.into(),
            owner: None,
            goal: GoalRecord::null(),
        }
    }
}

/// An agent bound to its live unit for one cycle.
///
/// The goal is rebuilt from the record on bind; [`Agent::set_goal`] replaces
/// both together, and [`Agent::run`] writes back only the `achieved` flag.
#[derive(Debug, Clone)]
pub struct Agent<'w> {
    record: AgentRecord,
    unit: &'w UnitView,
    goal: Goal<'w>,
}

impl<'w> Agent<'w> {
    /// Bind `record` to its live unit. Returns `None` if the unit is gone.
    ///
    /// A home partition that is no longer visible is replaced with the unit's
    /// current partition. A goal whose target no longer resolves is reset to
    /// the idle record so its Official reassigns it this cycle.
    pub fn bind(mut record: AgentRecord, world: &'w Snapshot) -> Option<Agent<'w>> {
        let unit = world.unit(&record.id)?;
        if !world.has_partition(&record.home) && record.home != unit.pos.partition {
            debug!(agent = %record.id, from = %record.home, to = %unit.pos.partition, "agent rehomed");
            record.home = unit.pos.partition.clone();
        }
        let goal = Goal::from_record(&record.goal, world);
        if goal.is_null() && record.goal != GoalRecord::null() {
            debug!(agent = %record.id, kind = ?record.goal.kind, "goal target stale");
            record.goal = GoalRecord::null();
        }
        Some(Agent { record, unit, goal })
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn home(&self) -> &str {
        &self.record.home
    }

    pub fn owner(&self) -> Option<&str> {
        self.record.owner.as_deref()
    }

    pub fn unit(&self) -> &'w UnitView {
        self.unit
    }

    pub fn goal(&self) -> &Goal<'w> {
        &self.goal
    }

    /// Replace the goal wholesale.
    pub fn set_goal(&mut self, goal: Goal<'w>) {
        self.record.goal = goal.to_record();
        self.goal = goal;
    }

    pub fn is_done(&self) -> bool {
        self.record.goal.achieved
    }

    /// Clear the owner; the agent is unowned from the next cycle.
    pub fn release(&mut self) {
        self.record.owner = None;
    }

    pub fn adopt_by(&mut self, owner: &str) {
        self.record.owner = Some(owner.to_string());
    }

    /// Run one goal step and record completion.
    pub fn run(&mut self, actions: &mut dyn Actions) -> Step {
        let step = self.goal.run(self.unit, actions);
        if step == Step::Achieved {
            self.record.goal.achieved = true;
        }
        step
    }

    pub fn record(&self) -> &AgentRecord {
        &self.record
    }

    pub fn into_record(self) -> AgentRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::goal::{GoalKind, GoalParams};
    use crate::core::types::{Position, Status};
    use crate::test_support::{ScriptedActions, home_world, worker};

    fn harvesting(id: &str) -> AgentRecord {
        AgentRecord {
            id: id.to_string(),
            home: "W1N1".into(),
            owner: Some("node-1".into()),
            goal: GoalRecord {
                kind: GoalKind::Harvest,
                achieved: false,
                params: GoalParams {
                    target: Some("node-1".into()),
                    ..GoalParams::default()
                },
            },
        }
    }

    fn world_with_unit() -> Snapshot {
        let mut world = home_world("W1N1");
        world
            .units
            .insert("a1".into(), worker("a1", Position::new("W1N1", 1, 1)));
        world
    }

    #[test]
    fn bind_requires_live_unit() {
        let world = home_world("W1N1");
        assert!(Agent::bind(harvesting("a1"), &world).is_none());
    }

    #[test]
    fn bind_rehomes_when_home_not_visible() {
        let world = world_with_unit();
        let mut record = harvesting("a1");
        record.home = "E5S5".into();
        let agent = Agent::bind(record, &world).expect("bind");
        assert_eq!(agent.home(), "W1N1");
    }

    #[test]
    fn bind_resets_stale_goal_to_idle() {
        let mut world = world_with_unit();
        world.nodes.clear();
        let agent = Agent::bind(harvesting("a1"), &world).expect("bind");
        assert!(agent.goal().is_null());
        assert!(agent.is_done());
        assert_eq!(agent.record().goal, GoalRecord::null());
    }

    #[test]
    fn not_in_range_leaves_achieved_untouched() {
        let world = world_with_unit();
        let mut agent = Agent::bind(harvesting("a1"), &world).expect("bind");
        let mut actions = ScriptedActions::always(Status::NotInRange);
        assert_eq!(agent.run(&mut actions), Step::Approaching);
        assert!(!agent.is_done());
    }

    #[test]
    fn terminal_step_sets_achieved() {
        let world = world_with_unit();
        let mut agent = Agent::bind(harvesting("a1"), &world).expect("bind");
        let mut actions = ScriptedActions::always(Status::InvalidTarget);
        assert_eq!(agent.run(&mut actions), Step::Achieved);
        assert!(agent.is_done());
    }

    #[test]
    fn set_goal_replaces_record_wholesale() {
        let world = world_with_unit();
        let mut agent = Agent::bind(AgentRecord::spawned("a1", "W1N1", "W1N1"), &world).expect("bind");
        assert!(agent.is_done());
        let controller = world.controller_in("W1N1").expect("controller");
        agent.set_goal(Goal::Upgrade { controller });
        assert!(!agent.is_done());
        assert_eq!(agent.record().goal.kind, GoalKind::Upgrade);
        assert_eq!(agent.record().goal.params.target.as_deref(), Some("ctrl-1"));
    }
}
