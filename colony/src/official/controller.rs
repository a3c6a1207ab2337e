use crate::agent::Agent;
use crate::core::goal::Goal;
use crate::core::roster::RosterLimit;
use crate::core::selector;
use crate::core::types::{Priority, Resource};
use crate::core::world::{Snapshot, StructureView};
use crate::official::{Official, Role};

/// Keeps a partition's controller upgraded.
///
/// Full agents upgrade; otherwise they top up from the fullest energy store,
/// spend what they carry when no store has energy, and idle when empty.
pub struct Controller<'w> {
    world: &'w Snapshot,
    controller: &'w StructureView,
    max_roster: u32,
}

impl<'w> Controller<'w> {
    pub fn new(world: &'w Snapshot, controller: &'w StructureView, limit: RosterLimit) -> Self {
        Self {
            world,
            controller,
            max_roster: limit.resolve(world, &controller.pos),
        }
    }
}

impl<'w> Official<'w> for Controller<'w> {
    fn role(&self) -> Role {
        Role::Controller
    }

    fn managed(&self) -> &str {
        &self.controller.id
    }

    fn priority(&self) -> Priority {
        Priority::Normal
    }

    fn request_target(&self) -> Option<&str> {
        Some(&self.controller.id)
    }

    fn max_roster(&self) -> u32 {
        self.max_roster
    }

    fn next_goal(&self, agent: &Agent<'w>) -> Goal<'w> {
        let unit = agent.unit();
        if unit.is_full() {
            return Goal::Upgrade {
                controller: self.controller,
            };
        }
        if let Some(store) =
            selector::fullest_store(self.world, agent.home(), &unit.pos, Resource::Energy)
        {
            return Goal::Withdraw {
                target: store,
                resource: Resource::Energy,
                amount: None,
            };
        }
        if unit.energy() > 0 {
            return Goal::Upgrade {
                controller: self.controller,
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
    use crate::core::types::Position;
    use crate::test_support::{home_world, worker};

    fn next_for(world: &Snapshot) -> GoalKind {
        let official = Controller::new(world, &world.structures["ctrl-1"], RosterLimit::Fixed(1));
        let agent = Agent::bind(AgentRecord::spawned("a1", "W1N1", "ctrl-1"), world).expect("bind");
        official.next_goal(&agent).kind()
    }

    fn world(cargo: u32, spawn_energy: u32) -> Snapshot {
        let mut world = home_world("W1N1");
        let mut unit = worker("a1", Position::new("W1N1", 30, 30));
        unit.cargo.insert(Resource::Energy, cargo);
        world.units.insert("a1".into(), unit);
        world
            .structures
            .get_mut("spawn-1")
            .expect("spawn")
            .store
            .insert(Resource::Energy, spawn_energy);
        world
    }

    #[test]
    fn full_agent_upgrades() {
        assert_eq!(next_for(&world(50, 300)), GoalKind::Upgrade);
    }

    #[test]
    fn partial_agent_withdraws_when_store_has_energy() {
        assert_eq!(next_for(&world(10, 300)), GoalKind::Withdraw);
    }

    #[test]
    fn partial_agent_spends_when_stores_empty() {
        assert_eq!(next_for(&world(10, 0)), GoalKind::Upgrade);
    }

    #[test]
    fn empty_agent_idles_without_energy_anywhere() {
        assert_eq!(next_for(&world(0, 0)), GoalKind::Null);
    }
}
