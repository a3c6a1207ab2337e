//! Shared deterministic types for colony core logic.
//!
//! These types define stable contracts between core components and the
//! environment. They serialize to stable snake_case names so persisted records
//! and world files stay readable across versions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Side length of a partition's square tile grid.
pub const PARTITION_SIZE: u32 = 50;
/// Units extracted per `Work` part per cycle from an energy node.
pub const HARVEST_POWER: u32 = 2;
/// Units extracted per `Work` part per cycle from a mineral node.
pub const HARVEST_MINERAL_POWER: u32 = 1;
/// Construction progress (and energy) per `Work` part per cycle.
pub const BUILD_POWER: u32 = 5;
/// Hit points restored per `Work` part per cycle.
pub const REPAIR_POWER: u32 = 100;
/// Energy consumed per `Work` part per repair.
pub const REPAIR_COST_PER_PART: u32 = 1;
/// Energy consumed per `Work` part per controller upgrade.
pub const UPGRADE_CONTROLLER_POWER: u32 = 1;
/// Cargo capacity contributed by each `Carry` part.
pub const CARRY_CAPACITY: u32 = 50;
/// Range for adjacent interactions (extract, deposit, retrieve).
pub const INTERACT_RANGE: u32 = 1;
/// Range for work at a distance (build, repair, upgrade-controller).
pub const WORK_RANGE: u32 = 3;
/// Maximum number of body parts on one agent.
pub const MAX_BODY_PARTS: usize = 50;

/// A tile inside a named partition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub partition: String,
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(partition: impl Into<String>, x: u32, y: u32) -> Self {
        Self {
            partition: partition.into(),
            x,
            y,
        }
    }

    /// Chebyshev distance to `other`, or `None` across partitions.
    pub fn range_to(&self, other: &Position) -> Option<u32> {
        if self.partition != other.partition {
            return None;
        }
        Some(self.x.abs_diff(other.x).max(self.y.abs_diff(other.y)))
    }

    pub fn in_range(&self, other: &Position, range: u32) -> bool {
        matches!(self.range_to(other), Some(r) if r <= range)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{},{}", self.partition, self.x, self.y)
    }
}

/// Resource kinds that agents carry and structures store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Energy,
    Hydrogen,
    Oxygen,
    Utrium,
    Keanium,
    Lemergium,
    Zynthium,
    Catalyst,
}

impl Resource {
    /// Units one `Work` part extracts per cycle from a node of this resource.
    pub fn harvest_power(self) -> u32 {
        match self {
            Resource::Energy => HARVEST_POWER,
            _ => HARVEST_MINERAL_POWER,
        }
    }
}

/// Agent body part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Work,
    Carry,
    Move,
    Attack,
    RangedAttack,
    Heal,
    Tough,
    Claim,
}

impl BodyPart {
    /// Energy cost to produce this part.
    pub fn cost(self) -> u32 {
        match self {
            BodyPart::Work => 100,
            BodyPart::Carry | BodyPart::Move => 50,
            BodyPart::Attack => 80,
            BodyPart::RangedAttack => 150,
            BodyPart::Heal => 250,
            BodyPart::Tough => 10,
            BodyPart::Claim => 600,
        }
    }
}

/// Total energy cost of a body.
pub fn body_cost(body: &[BodyPart]) -> u32 {
    body.iter().map(|part| part.cost()).sum()
}

/// Status code returned by every primitive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    NotInRange,
    InsufficientResource,
    InvalidTarget,
    NoCapability,
    Busy,
    NotOwner,
    Full,
    InvalidArgs,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "ok",
            Status::NotInRange => "not_in_range",
            Status::InsufficientResource => "insufficient_resource",
            Status::InvalidTarget => "invalid_target",
            Status::NoCapability => "no_capability",
            Status::Busy => "busy",
            Status::NotOwner => "not_owner",
            Status::Full => "full",
            Status::InvalidArgs => "invalid_args",
        };
        f.write_str(name)
    }
}

/// Creation request priority tier. Declaration order is service order:
/// `Critical` is serviced before `High`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Normal,
    Low,
}
