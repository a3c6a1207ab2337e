//! Per-agent goal state machine.
//!
//! A [`GoalRecord`] is the persisted form of an agent's current work. Each
//! cycle it is rebuilt into a [`Goal`] against the current [`Snapshot`];
//! reconstruction is total and falls back to [`Goal::Null`] whenever the stored
//! target no longer resolves to a live object of the right category.
//!
//! [`Goal::run`] issues exactly one primitive action and classifies the status:
//!
//! - terminal (success that projects completion, or an unrecoverable
//!   rejection) reports [`Step::Achieved`] and issues nothing else;
//! - not-in-range issues a single move-toward intent;
//! - busy issues nothing and retries next cycle.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::projection;
use crate::core::types::{Position, Resource, Status};
use crate::core::world::{NodeView, Object, SiteView, Snapshot, StructureKind, StructureView, UnitView};
use crate::env::Actions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalKind {
    Null,
    Harvest,
    Build,
    Transfer,
    Withdraw,
    Upgrade,
}

/// Immutable parameters captured when a goal is assigned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Resource>,
    /// Amount to move; everything available when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
}

/// Persisted goal state. `achieved` is the only field that changes after
/// assignment; a new assignment replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRecord {
    pub kind: GoalKind,
    pub achieved: bool,
    #[serde(default)]
    pub params: GoalParams,
}

impl GoalRecord {
    /// The idle record: nothing to do, already achieved.
    pub fn null() -> Self {
        Self {
            kind: GoalKind::Null,
            achieved: true,
            params: GoalParams::default(),
        }
    }
}

/// Outcome of one goal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Terminal: complete, or rejected in a way retrying cannot fix.
    Achieved,
    /// The action succeeded and the projection leaves work remaining.
    Progressed,
    /// Out of range; a move-toward intent was issued instead.
    Approaching,
    /// Busy; nothing was issued.
    Waiting,
}

/// What a build goal does to its target, chosen by target category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTarget<'w> {
    Controller(&'w StructureView),
    Site(&'w SiteView),
    Structure(&'w StructureView),
}

impl<'w> BuildTarget<'w> {
    pub fn from_object(object: Object<'w>) -> Option<Self> {
        match object {
            Object::Structure(s) if s.kind == StructureKind::Controller => {
                Some(BuildTarget::Controller(s))
            }
            Object::Structure(s) if s.hits_max > 0 => Some(BuildTarget::Structure(s)),
            Object::Site(site) => Some(BuildTarget::Site(site)),
            _ => None,
        }
    }

    pub fn id(&self) -> &'w str {
        match self {
            BuildTarget::Controller(s) | BuildTarget::Structure(s) => &s.id,
            BuildTarget::Site(site) => &site.id,
        }
    }

    pub fn pos(&self) -> &'w Position {
        match self {
            BuildTarget::Controller(s) | BuildTarget::Structure(s) => &s.pos,
            BuildTarget::Site(site) => &site.pos,
        }
    }
}

/// A goal rebuilt for this cycle. Each variant carries the live objects its
/// parameters resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal<'w> {
    Null,
    Harvest {
        node: &'w NodeView,
    },
    Build {
        target: BuildTarget<'w>,
    },
    Transfer {
        target: Object<'w>,
        resource: Resource,
        amount: Option<u32>,
    },
    Withdraw {
        target: &'w StructureView,
        resource: Resource,
        amount: Option<u32>,
    },
    Upgrade {
        controller: &'w StructureView,
    },
}

impl<'w> Goal<'w> {
    /// Rebuild a goal from its record. Never fails.
    pub fn from_record(record: &GoalRecord, world: &'w Snapshot) -> Goal<'w> {
        let Some(target) = record
            .params
            .target
            .as_deref()
            .and_then(|id| world.resolve(id))
        else {
            return Goal::Null;
        };
        let params = &record.params;
        match record.kind {
            GoalKind::Null => Goal::Null,
            GoalKind::Harvest => match target {
                Object::Node(node) => Goal::Harvest { node },
                _ => Goal::Null,
            },
            GoalKind::Build => BuildTarget::from_object(target)
                .map(|target| Goal::Build { target })
                .unwrap_or(Goal::Null),
            GoalKind::Transfer => match (target, params.resource) {
                (Object::Structure(_) | Object::Unit(_), Some(resource)) => Goal::Transfer {
                    target,
                    resource,
                    amount: params.amount,
                },
                _ => Goal::Null,
            },
            GoalKind::Withdraw => match (target, params.resource) {
                (Object::Structure(structure), Some(resource)) => Goal::Withdraw {
                    target: structure,
                    resource,
                    amount: params.amount,
                },
                _ => Goal::Null,
            },
            GoalKind::Upgrade => match target {
                Object::Structure(s) if s.kind == StructureKind::Controller => {
                    Goal::Upgrade { controller: s }
                }
                _ => Goal::Null,
            },
        }
    }

    pub fn kind(&self) -> GoalKind {
        match self {
            Goal::Null => GoalKind::Null,
            Goal::Harvest { .. } => GoalKind::Harvest,
            Goal::Build { .. } => GoalKind::Build,
            Goal::Transfer { .. } => GoalKind::Transfer,
            Goal::Withdraw { .. } => GoalKind::Withdraw,
            Goal::Upgrade { .. } => GoalKind::Upgrade,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Goal::Null)
    }

    pub fn target_id(&self) -> Option<&'w str> {
        match self {
            Goal::Null => None,
            Goal::Harvest { node } => Some(&node.id),
            Goal::Build { target } => Some(target.id()),
            Goal::Transfer { target, .. } => Some(target.id()),
            Goal::Withdraw { target, .. } => Some(&target.id),
            Goal::Upgrade { controller } => Some(&controller.id),
        }
    }

    pub fn target_pos(&self) -> Option<&'w Position> {
        match self {
            Goal::Null => None,
            Goal::Harvest { node } => Some(&node.pos),
            Goal::Build { target } => Some(target.pos()),
            Goal::Transfer { target, .. } => Some(target.pos()),
            Goal::Withdraw { target, .. } => Some(&target.pos),
            Goal::Upgrade { controller } => Some(&controller.pos),
        }
    }

    /// The record to persist for a freshly assigned goal.
    pub fn to_record(&self) -> GoalRecord {
        let (resource, amount) = match self {
            Goal::Transfer {
                resource, amount, ..
            }
            | Goal::Withdraw {
                resource, amount, ..
            } => (Some(*resource), *amount),
            _ => (None, None),
        };
        GoalRecord {
            kind: self.kind(),
            achieved: self.is_null(),
            params: GoalParams {
                target: self.target_id().map(str::to_string),
                resource,
                amount,
            },
        }
    }

    /// Execute one step for `unit`. Call at most once per agent per cycle.
    pub fn run(&self, unit: &UnitView, actions: &mut dyn Actions) -> Step {
        match self {
            Goal::Null => Step::Achieved,
            Goal::Harvest { node } => run_harvest(unit, node, actions),
            Goal::Build { target } => run_build(unit, target, actions),
            Goal::Transfer {
                target,
                resource,
                amount,
            } => {
                let status = actions.deposit(&unit.id, target.id(), *resource, *amount);
                settle_exchange(unit, target.pos(), status, actions)
            }
            Goal::Withdraw {
                target,
                resource,
                amount,
            } => {
                let status = actions.retrieve(&unit.id, &target.id, *resource, *amount);
                settle_exchange(unit, &target.pos, status, actions)
            }
            Goal::Upgrade { controller } => run_upgrade(unit, controller, actions),
        }
    }
}

fn run_harvest(unit: &UnitView, node: &NodeView, actions: &mut dyn Actions) -> Step {
    match actions.extract(&unit.id, &node.id) {
        Status::Ok => {
            let projected = projection::harvest(unit, node);
            if projected.is_terminal() {
                debug!(agent = %unit.id, node = %node.id, cargo = projected.cargo, remaining = projected.remaining, "harvest complete");
                Step::Achieved
            } else {
                Step::Progressed
            }
        }
        Status::NotInRange => approach(unit, &node.pos, actions),
        Status::Busy => Step::Waiting,
        status => abandon(unit, &node.id, status),
    }
}

fn run_build(unit: &UnitView, target: &BuildTarget<'_>, actions: &mut dyn Actions) -> Step {
    let status = match target {
        BuildTarget::Controller(controller) => actions.upgrade_controller(&unit.id, &controller.id),
        BuildTarget::Site(site) => actions.build(&unit.id, &site.id),
        BuildTarget::Structure(structure) => actions.repair(&unit.id, &structure.id),
    };
    match status {
        Status::Ok => {
            let projected = match target {
                BuildTarget::Controller(_) => projection::upgrade(unit),
                BuildTarget::Site(site) => projection::build(unit, site),
                BuildTarget::Structure(structure) => projection::repair(unit, structure),
            };
            if projected.is_terminal() {
                Step::Achieved
            } else {
                Step::Progressed
            }
        }
        Status::NotInRange => approach(unit, target.pos(), actions),
        Status::Busy => Step::Waiting,
        status => abandon(unit, target.id(), status),
    }
}

fn run_upgrade(unit: &UnitView, controller: &StructureView, actions: &mut dyn Actions) -> Step {
    match actions.upgrade_controller(&unit.id, &controller.id) {
        Status::Ok => {
            if projection::upgrade(unit).is_terminal() {
                Step::Achieved
            } else {
                Step::Progressed
            }
        }
        Status::NotInRange => approach(unit, &controller.pos, actions),
        Status::Busy => Step::Waiting,
        status => abandon(unit, &controller.id, status),
    }
}

/// Deposit and retrieve finish on anything but range or busy: a rejection is
/// never retried with the same parameters.
fn settle_exchange(
    unit: &UnitView,
    target: &Position,
    status: Status,
    actions: &mut dyn Actions,
) -> Step {
    match status {
        Status::NotInRange => approach(unit, target, actions),
        Status::Busy => Step::Waiting,
        Status::Ok => Step::Achieved,
        status => {
            debug!(agent = %unit.id, %status, "exchange rejected");
            Step::Achieved
        }
    }
}

fn approach(unit: &UnitView, target: &Position, actions: &mut dyn Actions) -> Step {
    let status = actions.move_toward(&unit.id, target);
    if status != Status::Ok {
        debug!(agent = %unit.id, %target, %status, "move rejected");
    }
    Step::Approaching
}

fn abandon(unit: &UnitView, target: &str, status: Status) -> Step {
    debug!(agent = %unit.id, target, %status, "goal abandoned");
    Step::Achieved
}
