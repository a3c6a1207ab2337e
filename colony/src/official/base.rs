use crate::agent::Agent;
use crate::core::goal::{BuildTarget, Goal};
use crate::core::roster::RosterLimit;
use crate::core::selector;
use crate::core::types::{Position, Priority, Resource};
use crate::core::world::Snapshot;
use crate::official::{Official, Role};

/// General upkeep of one partition: construction, repair, then controller.
///
/// Base requests are untargeted, so they rank behind every targeted request
/// of the same tier.
pub struct Base<'w> {
    world: &'w Snapshot,
    partition: &'w str,
    max_roster: u32,
}

impl<'w> Base<'w> {
    /// `anchor` is where a walkable limit is measured, usually the first
    /// facility. Without one a walkable limit resolves to zero.
    pub fn new(
        world: &'w Snapshot,
        partition: &'w str,
        anchor: Option<&Position>,
        limit: RosterLimit,
    ) -> Self {
        let max_roster = match (limit, anchor) {
            (RosterLimit::Fixed(n), _) => n,
            (RosterLimit::Walkable, Some(pos)) => limit.resolve(world, pos),
            (RosterLimit::Walkable, None) => 0,
        };
        Self {
            world,
            partition,
            max_roster,
        }
    }
}

impl<'w> Official<'w> for Base<'w> {
    fn role(&self) -> Role {
        Role::Base
    }

    fn managed(&self) -> &str {
        self.partition
    }

    fn priority(&self) -> Priority {
        Priority::Low
    }

    fn request_target(&self) -> Option<&str> {
        None
    }

    fn max_roster(&self) -> u32 {
        self.max_roster
    }

    fn next_goal(&self, agent: &Agent<'w>) -> Goal<'w> {
        let unit = agent.unit();
        let home = agent.home();
        if unit.energy() == 0 {
            return match selector::fullest_store(self.world, home, &unit.pos, Resource::Energy) {
                Some(store) => Goal::Withdraw {
                    target: store,
                    resource: Resource::Energy,
                    amount: None,
                },
                None => Goal::Null,
            };
        }
        if let Some(site) = selector::nearest_site(self.world, home, &unit.pos) {
            return Goal::Build {
                target: BuildTarget::Site(site),
            };
        }
        if let Some(structure) = selector::most_damaged(self.world, home, &unit.pos) {
            return Goal::Build {
                target: BuildTarget::Structure(structure),
            };
        }
        if let Some(controller) = self.world.controller_in(home) {
            return Goal::Build {
                target: BuildTarget::Controller(controller),
            };
        }
        Goal::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRecord;
    use crate::core::goal::GoalKind;
    use crate::core::world::StructureKind;
    use crate::test_support::{home_world, site, structure, worker};

    fn with_worker(energy: u32) -> Snapshot {
        let mut world = home_world("W1N1");
        let mut unit = worker("a1", Position::new("W1N1", 20, 20));
        unit.cargo.insert(Resource::Energy, energy);
        world.units.insert("a1".into(), unit);
        world
    }

    fn next<'w>(world: &'w Snapshot) -> Goal<'w> {
        let base = Base::new(world, "W1N1", None, RosterLimit::Fixed(3));
        let agent = Agent::bind(AgentRecord::spawned("a1", "W1N1", "W1N1"), world).expect("bind");
        base.next_goal(&agent)
    }

    #[test]
    fn empty_agent_withdraws() {
        let world = with_worker(0);
        let goal = next(&world);
        assert_eq!(goal.kind(), GoalKind::Withdraw);
        assert_eq!(goal.target_id(), Some("spawn-1"));
    }

    #[test]
    fn site_beats_repair_beats_controller() {
        let mut world = with_worker(50);
        assert_eq!(next(&world).target_id(), Some("ctrl-1"));

        let mut road = structure("road-1", StructureKind::Road, Position::new("W1N1", 21, 21));
        road.hits = 100;
        world.structures.insert("road-1".into(), road);
        assert_eq!(next(&world).target_id(), Some("road-1"));

        world
            .sites
            .insert("site-1".into(), site("site-1", Position::new("W1N1", 30, 30), 0, 300));
        let goal = next(&world);
        assert_eq!(goal.kind(), GoalKind::Build);
        assert_eq!(goal.target_id(), Some("site-1"));
    }

    #[test]
    fn walkable_limit_without_anchor_is_zero() {
        let world = home_world("W1N1");
        assert_eq!(Base::new(&world, "W1N1", None, RosterLimit::Walkable).max_roster(), 0);
    }
}
