use crate::agent::Agent;
use crate::core::goal::Goal;
use crate::core::roster::RosterLimit;
use crate::core::selector;
use crate::core::types::Priority;
use crate::core::world::{NodeView, Object, Snapshot};
use crate::official::{Official, Role};

/// Harvests one resource node and hauls the yield home.
///
/// Idle agents harvest until full (or the node runs dry with cargo aboard),
/// then deliver to the nearest receptacle in their home partition. With no
/// receptacle they idle.
pub struct Mine<'w> {
    world: &'w Snapshot,
    node: &'w NodeView,
    max_roster: u32,
}

impl<'w> Mine<'w> {
    pub fn new(world: &'w Snapshot, node: &'w NodeView, limit: RosterLimit) -> Self {
        Self {
            world,
            node,
            max_roster: limit.resolve(world, &node.pos),
        }
    }
}

impl<'w> Official<'w> for Mine<'w> {
    fn role(&self) -> Role {
        Role::Mine
    }

    fn managed(&self) -> &str {
        &self.node.id
    }

    fn priority(&self) -> Priority {
        Priority::High
    }

    fn request_target(&self) -> Option<&str> {
        Some(&self.node.id)
    }

    fn max_roster(&self) -> u32 {
        self.max_roster
    }

    fn next_goal(&self, agent: &Agent<'w>) -> Goal<'w> {
        let unit = agent.unit();
        let haul = unit.is_full() || (unit.cargo_total() > 0 && self.node.remaining == 0);
        if haul {
            let Some(resource) = unit.dominant_resource() else {
                return Goal::Null;
            };
            return match selector::nearest_receptacle(self.world, agent.home(), &unit.pos, resource) {
                Some(receptacle) => Goal::Transfer {
                    target: Object::Structure(receptacle),
                    resource,
                    amount: None,
                },
                None => Goal::Null,
            };
        }
        if self.node.remaining == 0 {
            return Goal::Null;
        }
        Goal::Harvest { node: self.node }
    }
}
