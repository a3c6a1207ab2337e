//! Projected outcomes of primitive actions.
//!
//! The environment applies an action only after the cycle ends, so the
//! snapshot still shows pre-action cargo, progress and hit points when a goal
//! decides whether it is finished. Each function here computes the state the
//! next snapshot will show if the action succeeds.

use crate::core::types::{
    BUILD_POWER, BodyPart, REPAIR_COST_PER_PART, REPAIR_POWER, UPGRADE_CONTROLLER_POWER,
};
use crate::core::world::{NodeView, SiteView, StructureView, UnitView};

/// Projected state after a successful extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestProjection {
    pub cargo: u32,
    pub capacity: u32,
    pub remaining: u32,
}

impl HarvestProjection {
    pub fn is_terminal(&self) -> bool {
        self.cargo >= self.capacity || self.remaining == 0
    }
}

pub fn harvest(unit: &UnitView, node: &NodeView) -> HarvestProjection {
    let power = unit.active_parts(BodyPart::Work) * node.resource.harvest_power();
    let gained = power.min(node.remaining);
    HarvestProjection {
        cargo: unit.cargo_total() + gained,
        capacity: unit.capacity,
        remaining: node.remaining - gained,
    }
}

/// Projected state after a successful energy-spending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkProjection {
    pub energy_before: u32,
    pub energy_spent: u32,
    /// `(done, total)` after the action, for targets with a completion bar.
    pub completion: Option<(u32, u32)>,
}

impl WorkProjection {
    pub fn exhausts_energy(&self) -> bool {
        self.energy_spent >= self.energy_before
    }

    pub fn completes_target(&self) -> bool {
        matches!(self.completion, Some((done, total)) if done >= total)
    }

    pub fn is_terminal(&self) -> bool {
        self.exhausts_energy() || self.completes_target()
    }
}

pub fn upgrade(unit: &UnitView) -> WorkProjection {
    let energy = unit.energy();
    WorkProjection {
        energy_before: energy,
        energy_spent: (unit.active_parts(BodyPart::Work) * UPGRADE_CONTROLLER_POWER).min(energy),
        completion: None,
    }
}

pub fn build(unit: &UnitView, site: &SiteView) -> WorkProjection {
    let energy = unit.energy();
    let left = site.progress_total.saturating_sub(site.progress);
    let spent = (unit.active_parts(BodyPart::Work) * BUILD_POWER)
        .min(energy)
        .min(left);
    WorkProjection {
        energy_before: energy,
        energy_spent: spent,
        completion: Some((site.progress + spent, site.progress_total)),
    }
}

pub fn repair(unit: &UnitView, structure: &StructureView) -> WorkProjection {
    let energy = unit.energy();
    let spent = (unit.active_parts(BodyPart::Work) * REPAIR_COST_PER_PART).min(energy);
    let hits = structure
        .hits
        .saturating_add(spent / REPAIR_COST_PER_PART * REPAIR_POWER)
        .min(structure.hits_max);
    WorkProjection {
        energy_before: energy,
        energy_spent: spent,
        completion: Some((hits, structure.hits_max)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Position, Resource};
    use crate::core::world::StructureKind;
    use crate::test_support::{node, site, structure, worker_with};

    fn pos() -> Position {
        Position::new("W1N1", 10, 10)
    }

    #[test]
    fn harvest_terminal_when_projected_cargo_reaches_capacity() {
        let mut unit = worker_with("u1", pos(), &[BodyPart::Work, BodyPart::Carry]);
        unit.cargo.insert(Resource::Energy, 48);
        let projected = harvest(&unit, &node("n1", pos(), 1_000));
        assert_eq!(projected.cargo, 50);
        assert!(projected.is_terminal());

        unit.cargo.insert(Resource::Energy, 46);
        assert!(!harvest(&unit, &node("n1", pos(), 1_000)).is_terminal());
    }

    #[test]
    fn harvest_terminal_when_node_runs_dry() {
        let unit = worker_with("u1", pos(), &[BodyPart::Work, BodyPart::Work, BodyPart::Carry]);
        let projected = harvest(&unit, &node("n1", pos(), 3));
        assert_eq!(projected.remaining, 0);
        assert_eq!(projected.cargo, 3);
        assert!(projected.is_terminal());
    }

    #[test]
    fn build_spends_at_most_remaining_progress() {
        let mut unit = worker_with("u1", pos(), &[BodyPart::Work, BodyPart::Work, BodyPart::Carry]);
        unit.cargo.insert(Resource::Energy, 50);
        let projected = build(&unit, &site("s1", pos(), 295, 300));
        assert_eq!(projected.energy_spent, 5);
        assert!(projected.completes_target());
        assert!(!projected.exhausts_energy());
    }

    #[test]
    fn upgrade_terminal_when_energy_spent() {
        let mut unit = worker_with("u1", pos(), &[BodyPart::Work, BodyPart::Carry]);
        unit.cargo.insert(Resource::Energy, 1);
        assert!(upgrade(&unit).is_terminal());
        unit.cargo.insert(Resource::Energy, 2);
        assert!(!upgrade(&unit).is_terminal());
    }

    #[test]
    fn repair_caps_hits_at_max() {
        let mut unit = worker_with("u1", pos(), &[BodyPart::Work, BodyPart::Carry]);
        unit.cargo.insert(Resource::Energy, 10);
        let mut wall = structure("c1", StructureKind::Container, pos());
        wall.hits = wall.hits_max - 50;
        let projected = repair(&unit, &wall);
        assert_eq!(projected.completion, Some((wall.hits_max, wall.hits_max)));
        assert!(projected.is_terminal());
    }
}
