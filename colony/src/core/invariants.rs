//! Semantic invariants not expressible via JSON Schema.

use std::collections::{BTreeMap, BTreeSet};

use crate::agent::AgentRecord;
use crate::core::arbitration::RequestQueue;
use crate::core::goal::GoalKind;
use crate::core::types::{PARTITION_SIZE, Position};
use crate::core::world::Snapshot;

/// Check world invariants:
/// - map keys equal the ids they index, and ids are unique across maps
/// - every position lies inside a listed partition's grid
/// - amounts never exceed their capacities
pub fn validate_world(world: &Snapshot) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = BTreeSet::new();

    for (key, partition) in &world.partitions {
        if key != &partition.name {
            errors.push(format!("partition key '{}' names '{}'", key, partition.name));
        }
    }

    let mut check = |kind: &str, key: &str, id: &str, pos: &Position, errors: &mut Vec<String>| {
        if key != id {
            errors.push(format!("{} key '{}' holds id '{}'", kind, key, id));
        }
        if !seen.insert(id.to_string()) {
            errors.push(format!("duplicate id '{}'", id));
        }
        if !world.partitions.contains_key(&pos.partition) {
            errors.push(format!("{} '{}': unknown partition '{}'", kind, id, pos.partition));
        }
        if pos.x >= PARTITION_SIZE || pos.y >= PARTITION_SIZE {
            errors.push(format!("{} '{}': position {} out of bounds", kind, id, pos));
        }
    };

    for (key, unit) in &world.units {
        check("unit", key, &unit.id, &unit.pos, &mut errors);
        if unit.cargo_total() > unit.capacity {
            errors.push(format!(
                "unit '{}': cargo {} exceeds capacity {}",
                unit.id,
                unit.cargo_total(),
                unit.capacity
            ));
        }
    }
    for (key, node) in &world.nodes {
        check("node", key, &node.id, &node.pos, &mut errors);
        if node.remaining > node.capacity {
            errors.push(format!(
                "node '{}': remaining {} exceeds capacity {}",
                node.id, node.remaining, node.capacity
            ));
        }
    }
    for (key, structure) in &world.structures {
        check("structure", key, &structure.id, &structure.pos, &mut errors);
        if structure.hits > structure.hits_max {
            errors.push(format!(
                "structure '{}': hits {} exceed max {}",
                structure.id, structure.hits, structure.hits_max
            ));
        }
        let stored: u32 = structure.store.values().sum();
        if stored > structure.store_capacity {
            errors.push(format!(
                "structure '{}': store {} exceeds capacity {}",
                structure.id, stored, structure.store_capacity
            ));
        }
    }
    for (key, site) in &world.sites {
        check("site", key, &site.id, &site.pos, &mut errors);
        if site.progress_total == 0 {
            errors.push(format!("site '{}': progress_total must be > 0", site.id));
        }
        if site.progress > site.progress_total {
            errors.push(format!(
                "site '{}': progress {} exceeds total {}",
                site.id, site.progress, site.progress_total
            ));
        }
    }

    errors
}

/// Check persisted record invariants:
/// - a null goal is always achieved; any other goal names a target
/// - transfer and withdraw goals name a resource
/// - an issuer has at most one pending request per queue
/// - submission numbers are unique and below `next_submission`
pub fn validate_records(
    agents: &[AgentRecord],
    queues: &BTreeMap<String, RequestQueue>,
    next_submission: u64,
) -> Vec<String> {
    let mut errors = Vec::new();

    for agent in agents {
        let goal = &agent.goal;
        match goal.kind {
            GoalKind::Null if !goal.achieved => {
                errors.push(format!("agent '{}': null goal must be achieved", agent.id));
            }
            GoalKind::Null => {}
            kind => {
                if goal.params.target.is_none() {
                    errors.push(format!("agent '{}': {:?} goal missing target", agent.id, kind));
                }
                if matches!(kind, GoalKind::Transfer | GoalKind::Withdraw)
                    && goal.params.resource.is_none()
                {
                    errors.push(format!("agent '{}': {:?} goal missing resource", agent.id, kind));
                }
            }
        }
    }

    let mut submissions = BTreeSet::new();
    for (partition, queue) in queues {
        let mut issuers = BTreeSet::new();
        for request in queue.iter() {
            if !issuers.insert(request.issuer.as_str()) {
                errors.push(format!(
                    "requests/{}: issuer '{}' has more than one pending request",
                    partition, request.issuer
                ));
            }
            if !submissions.insert(request.submission) {
                errors.push(format!(
                    "requests/{}: duplicate submission {}",
                    partition, request.submission
                ));
            }
            if request.submission >= next_submission {
                errors.push(format!(
                    "requests/{}: submission {} not below next_submission {}",
                    partition, request.submission, next_submission
                ));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arbitration::CreationRequest;
    use crate::core::goal::{GoalParams, GoalRecord};
    use crate::core::types::{BodyPart, Priority};
    use crate::test_support::{home_world, worker};

    #[test]
    fn default_world_is_valid() {
        assert!(validate_world(&home_world("W1N1")).is_empty());
    }

    #[test]
    fn world_reports_duplicates_and_bounds() {
        let mut world = home_world("W1N1");
        world
            .units
            .insert("node-1".into(), worker("node-1", Position::new("W1N1", 60, 1)));
        let errors = validate_world(&world);
        assert!(errors.iter().any(|e| e.contains("duplicate id 'node-1'")));
        assert!(errors.iter().any(|e| e.contains("out of bounds")));
    }

    #[test]
    fn world_reports_unknown_partition() {
        let mut world = home_world("W1N1");
        world
            .units
            .insert("u".into(), worker("u", Position::new("E9S9", 1, 1)));
        let errors = validate_world(&world);
        assert_eq!(errors, vec!["unit 'u': unknown partition 'E9S9'".to_string()]);
    }

    #[test]
    fn records_report_goal_and_queue_problems() {
        let mut agent = AgentRecord::spawned("a", "W1N1", "W1N1");
        agent.goal = GoalRecord {
            kind: GoalKind::Transfer,
            achieved: false,
            params: GoalParams {
                target: Some("spawn-1".into()),
                ..GoalParams::default()
            },
        };
        let request = |issuer: &str, submission| CreationRequest {
            body: vec![BodyPart::Work],
            target: None,
            issuer: issuer.to_string(),
            priority: Priority::Low,
            submission,
            submitted_at: 0,
        };
        let mut queue = RequestQueue::default();
        queue.submit(request("x", 4));
        let mut queues = BTreeMap::new();
        queues.insert("W1N1".to_string(), queue);

        let errors = validate_records(&[agent], &queues, 3);
        assert_eq!(errors.len(), 2, "{:?}", errors);
        assert!(errors[0].contains("missing resource"));
        assert!(errors[1].contains("not below next_submission"));
    }
}
