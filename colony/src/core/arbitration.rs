//! Prioritized creation-request arbitration.
//!
//! Each partition keeps one [`RequestQueue`] of pending [`CreationRequest`]s,
//! grouped by [`Priority`] tier. Every cycle the [`Arbitrator`] walks the
//! partition's idle facilities in id order and, for each, picks from the
//! highest non-empty tier the request whose target is nearest that facility.
//!
//! The pass is greedy per facility: a request taken by an earlier facility is
//! gone for later ones, even if a later facility is nearer its target.
//!
//! A request leaves the queue only when a facility accepts it or its issuer
//! purges it. Rejections leave it where it is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::types::{BodyPart, Position, Priority, Status};
use crate::core::world::Snapshot;
use crate::env::Actions;

/// Rank of a request without a resolvable target: serviced last in its tier.
pub const UNTARGETED_RANK: u64 = u64::MAX;
/// Rank of a request whose target lies in another partition.
pub const ELSEWHERE_RANK: u64 = u64::MAX - 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationRequest {
    pub body: Vec<BodyPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Managed entity id of the Official that submitted the request.
    pub issuer: String,
    pub priority: Priority,
    /// Global submission counter; ties within a tier go to the older request.
    pub submission: u64,
    /// Tick the request was first submitted.
    pub submitted_at: u64,
}

/// Pending requests for one partition, by tier.
///
/// Tiers are pruned as soon as they empty, so the first tier is always the
/// highest-priority non-empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QueueRecord", into = "QueueRecord")]
pub struct RequestQueue {
    tiers: BTreeMap<Priority, Vec<CreationRequest>>,
}

/// Persisted form: a flat list in service order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct QueueRecord {
    #[serde(default)]
    requests: Vec<CreationRequest>,
}

impl From<QueueRecord> for RequestQueue {
    fn from(record: QueueRecord) -> Self {
        let mut queue = RequestQueue::default();
        for request in record.requests {
            queue.tiers.entry(request.priority).or_default().push(request);
        }
        queue
    }
}

impl From<RequestQueue> for QueueRecord {
    fn from(queue: RequestQueue) -> Self {
        QueueRecord {
            requests: queue.tiers.into_values().flatten().collect(),
        }
    }
}

impl RequestQueue {
    /// Queue `request` unless its issuer already has one pending.
    ///
    /// Returns `true` if the request was added. A repeated submission keeps
    /// the original request and its place in line.
    pub fn submit(&mut self, request: CreationRequest) -> bool {
        if self.pending_for(&request.issuer).is_some() {
            return false;
        }
        self.tiers.entry(request.priority).or_default().push(request);
        true
    }

    /// Remove the pending request of `issuer`, if any.
    pub fn purge(&mut self, issuer: &str) -> Option<CreationRequest> {
        let (priority, index) = self.iter_indexed().find_map(|(priority, index, request)| {
            (request.issuer == issuer).then_some((priority, index))
        })?;
        self.take(priority, index)
    }

    /// Remove and return the request at `index` of tier `priority`.
    fn take(&mut self, priority: Priority, index: usize) -> Option<CreationRequest> {
        let tier = self.tiers.get_mut(&priority)?;
        if index >= tier.len() {
            return None;
        }
        let request = tier.remove(index);
        if tier.is_empty() {
            self.tiers.remove(&priority);
        }
        Some(request)
    }

    pub fn pending_for(&self, issuer: &str) -> Option<&CreationRequest> {
        self.iter().find(|r| r.issuer == issuer)
    }

    /// Requests in service order: tier first, then submission order.
    pub fn iter(&self) -> impl Iterator<Item = &CreationRequest> {
        self.tiers.values().flatten()
    }

    fn iter_indexed(&self) -> impl Iterator<Item = (Priority, usize, &CreationRequest)> {
        self.tiers.iter().flat_map(|(priority, tier)| {
            tier.iter()
                .enumerate()
                .map(move |(index, request)| (*priority, index, request))
        })
    }

    pub fn len(&self) -> usize {
        self.tiers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Requests pending for at least `horizon` ticks as of `tick`.
    pub fn underserved(&self, tick: u64, horizon: u64) -> Vec<&CreationRequest> {
        self.iter()
            .filter(|r| tick.saturating_sub(r.submitted_at) >= horizon)
            .collect()
    }
}

/// Pick the next request: first non-empty tier, then lowest `(rank, submission)`.
pub fn select_request(
    queue: &RequestQueue,
    rank: impl Fn(&CreationRequest) -> u64,
) -> Option<(Priority, usize)> {
    let (priority, tier) = queue.tiers.iter().next()?;
    tier.iter()
        .enumerate()
        .min_by_key(|(_, request)| (rank(request), request.submission))
        .map(|(index, _)| (*priority, index))
}

/// Distance rank of `request` from a facility at `from`.
pub fn rank_from(world: &Snapshot, from: &Position, request: &CreationRequest) -> u64 {
    let Some(target) = request.target.as_deref().and_then(|id| world.resolve(id)) else {
        return UNTARGETED_RANK;
    };
    match from.range_to(target.pos()) {
        Some(range) => u64::from(range),
        None => ELSEWHERE_RANK,
    }
}

/// A production facility as seen by the arbitrator this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facility {
    pub id: String,
    pub pos: Position,
    pub busy: bool,
}

impl Facility {
    /// Owned facilities in `partition`, ordered by id.
    pub fn in_partition(world: &Snapshot, partition: &str) -> Vec<Facility> {
        world
            .facilities_in(partition)
            .map(|s| Facility {
                id: s.id.clone(),
                pos: s.pos.clone(),
                busy: s.spawning.is_some(),
            })
            .collect()
    }
}

/// A request a facility accepted this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Accepted {
    pub facility: String,
    pub name: String,
    pub request: CreationRequest,
}

/// A facility that rejected the request it was offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejected {
    pub facility: String,
    pub issuer: String,
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub accepted: Vec<Accepted>,
    pub rejected: Vec<Rejected>,
}

/// Resolves one partition's queue against its facilities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arbitrator {
    pub partition: String,
    pub queue: RequestQueue,
}

impl Arbitrator {
    pub fn new(partition: impl Into<String>, queue: RequestQueue) -> Self {
        Self {
            partition: partition.into(),
            queue,
        }
    }

    /// Agent name for a request accepted at `tick`.
    pub fn agent_name(&self, tick: u64, request: &CreationRequest) -> String {
        format!("{}-{}-{}", self.partition, tick, request.submission)
    }

    /// Offer at most one request to each idle facility, in id order.
    pub fn resolve(
        &mut self,
        facilities: &[Facility],
        world: &Snapshot,
        actions: &mut dyn Actions,
    ) -> Resolution {
        let mut ordered: Vec<&Facility> = facilities.iter().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));

        let mut resolution = Resolution::default();
        for facility in ordered {
            if facility.busy {
                continue;
            }
            let Some((priority, index)) =
                select_request(&self.queue, |r| rank_from(world, &facility.pos, r))
            else {
                break;
            };
            let Some(request) = self.queue.tiers.get(&priority).and_then(|t| t.get(index)) else {
                break;
            };
            let name = self.agent_name(world.tick, request);
            let status = actions.spawn(&facility.id, &request.body, &name);
            if status == Status::Ok {
                let Some(request) = self.queue.take(priority, index) else {
                    break;
                };
                info!(
                    partition = %self.partition,
                    facility = %facility.id,
                    agent = %name,
                    issuer = %request.issuer,
                    ?priority,
                    "creation request accepted"
                );
                resolution.accepted.push(Accepted {
                    facility: facility.id.clone(),
                    name,
                    request,
                });
            } else {
                debug!(
                    partition = %self.partition,
                    facility = %facility.id,
                    issuer = %request.issuer,
                    %status,
                    "creation request rejected"
                );
                resolution.rejected.push(Rejected {
                    facility: facility.id.clone(),
                    issuer: request.issuer.clone(),
                    status,
                });
            }
        }
        resolution
    }

    /// Issuers whose requests have waited at least `horizon` ticks. Logs a
    /// warning for each.
    pub fn underserved(&self, tick: u64, horizon: u64) -> Vec<String> {
        self.queue
            .underserved(tick, horizon)
            .into_iter()
            .map(|request| {
                warn!(
                    partition = %self.partition,
                    issuer = %request.issuer,
                    waited = tick.saturating_sub(request.submitted_at),
                    "creation request underserved"
                );
                request.issuer.clone()
            })
            .collect()
    }
}
