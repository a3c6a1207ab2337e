//! Population control for an Official's roster.

use serde::{Deserialize, Serialize};

use crate::core::types::Position;
use crate::core::world::Snapshot;

/// How an Official's `maxRoster` is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterLimit {
    /// A static count.
    Fixed(u32),
    /// Walkable tiles around the managed entity.
    Walkable,
}

impl RosterLimit {
    pub fn resolve(self, world: &Snapshot, managed: &Position) -> u32 {
        match self {
            RosterLimit::Fixed(n) => n,
            RosterLimit::Walkable => world.walkable_around(managed),
        }
    }
}

/// What an Official must do about its population this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "count")]
pub enum Demand {
    /// Below the limit: submit exactly one creation request.
    Request,
    /// At the limit: purge any pending request.
    Satisfied,
    /// Above the limit by this many agents: release them.
    Excess(usize),
}

pub fn demand(size: usize, max: u32) -> Demand {
    let max = max as usize;
    match size.cmp(&max) {
        std::cmp::Ordering::Less => Demand::Request,
        std::cmp::Ordering::Equal => Demand::Satisfied,
        std::cmp::Ordering::Greater => Demand::Excess(size - max),
    }
}

/// Roster positions to release, in enumeration order: everything past `max`.
pub fn culled(size: usize, max: u32) -> std::ops::Range<usize> {
    (max as usize).min(size)..size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::partition;

    #[test]
    fn demand_matches_roster_size() {
        assert_eq!(demand(0, 1), Demand::Request);
        assert_eq!(demand(1, 1), Demand::Satisfied);
        assert_eq!(demand(4, 1), Demand::Excess(3));
        assert_eq!(demand(0, 0), Demand::Satisfied);
    }

    #[test]
    fn culled_releases_tail_only() {
        assert_eq!(culled(5, 2), 2..5);
        assert_eq!(culled(2, 2), 2..2);
        assert_eq!(culled(1, 3), 1..1);
    }

    #[test]
    fn walkable_limit_counts_open_tiles() {
        let mut world = Snapshot::default();
        let mut room = partition("W1N1");
        room.walls.insert((4, 4));
        room.walls.insert((5, 4));
        world.partitions.insert("W1N1".into(), room);

        let pos = Position::new("W1N1", 5, 5);
        assert_eq!(RosterLimit::Walkable.resolve(&world, &pos), 6);
        assert_eq!(RosterLimit::Fixed(2).resolve(&world, &pos), 2);
    }

    #[test]
    fn limit_parses_from_toml_shapes() {
        #[derive(Deserialize)]
        struct Wrapper {
            a: RosterLimit,
            b: RosterLimit,
        }
        let parsed: Wrapper = toml::from_str("a = \"walkable\"\nb = { fixed = 2 }\n").expect("parse");
        assert_eq!(parsed.a, RosterLimit::Walkable);
        assert_eq!(parsed.b, RosterLimit::Fixed(2));
    }
}
