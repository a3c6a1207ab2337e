//! Deterministic target selection for Officials.
//!
//! Every helper breaks ties by range from the agent, then by id, so identical
//! snapshots always yield identical choices.

use std::cmp::Ordering;

use crate::core::types::{Position, Resource};
use crate::core::world::{SiteView, Snapshot, StructureKind, StructureView};

/// Range used for ordering; objects in another partition sort last.
fn distance(from: &Position, to: &Position) -> u32 {
    from.range_to(to).unwrap_or(u32::MAX)
}

fn by_range_then_id(from: &Position, a: (&Position, &str), b: (&Position, &str)) -> Ordering {
    distance(from, a.0)
        .cmp(&distance(from, b.0))
        .then_with(|| a.1.cmp(b.1))
}

/// Nearest owned structure in `partition` that accepts `resource` and has room.
pub fn nearest_receptacle<'w>(
    world: &'w Snapshot,
    partition: &str,
    from: &Position,
    resource: Resource,
) -> Option<&'w StructureView> {
    world
        .structures_in(partition)
        .filter(|s| s.mine && s.accepts(resource) && s.free_capacity() > 0)
        .min_by(|a, b| by_range_then_id(from, (&a.pos, &a.id), (&b.pos, &b.id)))
}

/// Owned store in `partition` holding the most `resource`.
pub fn fullest_store<'w>(
    world: &'w Snapshot,
    partition: &str,
    from: &Position,
    resource: Resource,
) -> Option<&'w StructureView> {
    world
        .structures_in(partition)
        .filter(|s| s.mine && is_store(s.kind) && s.amount(resource) > 0)
        .min_by(|a, b| {
            b.amount(resource)
                .cmp(&a.amount(resource))
                .then_with(|| by_range_then_id(from, (&a.pos, &a.id), (&b.pos, &b.id)))
        })
}

fn is_store(kind: StructureKind) -> bool {
    matches!(
        kind,
        StructureKind::Spawn
            | StructureKind::Extension
            | StructureKind::Container
            | StructureKind::Storage
    )
}

pub fn nearest_site<'w>(
    world: &'w Snapshot,
    partition: &str,
    from: &Position,
) -> Option<&'w SiteView> {
    world
        .sites_in(partition)
        .min_by(|a, b| by_range_then_id(from, (&a.pos, &a.id), (&b.pos, &b.id)))
}

/// Damaged structure in `partition` with the lowest hits ratio.
///
/// Unowned roads and containers count; walls and ramparts only when owned.
pub fn most_damaged<'w>(
    world: &'w Snapshot,
    partition: &str,
    from: &Position,
) -> Option<&'w StructureView> {
    world
        .structures_in(partition)
        .filter(|s| s.is_damaged())
        .filter(|s| s.mine || matches!(s.kind, StructureKind::Road | StructureKind::Container))
        .min_by(|a, b| {
            // hits/max compared without floats: a.hits * b.max vs b.hits * a.max
            let left = u64::from(a.hits) * u64::from(b.hits_max);
            let right = u64::from(b.hits) * u64::from(a.hits_max);
            left.cmp(&right)
                .then_with(|| by_range_then_id(from, (&a.pos, &a.id), (&b.pos, &b.id)))
        })
}
