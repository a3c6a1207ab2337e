//! Primitive action capabilities offered by the environment.
//!
//! The [`Actions`] trait decouples goal execution and arbitration from the
//! concrete environment. [`crate::sim::IntentRecorder`] implements it against
//! the simulated world; tests use [`crate::test_support::ScriptedActions`] to
//! return predetermined status codes without a world.
//!
//! Every call is an intent: its effect becomes observable only in the next
//! cycle's snapshot.

use crate::core::types::{BodyPart, Position, Resource, Status};

pub trait Actions {
    /// Extract from a resource node into the agent's cargo.
    fn extract(&mut self, agent: &str, node: &str) -> Status;

    /// Deposit `amount` (or everything held) of `resource` into a structure or unit.
    fn deposit(
        &mut self,
        agent: &str,
        target: &str,
        resource: Resource,
        amount: Option<u32>,
    ) -> Status;

    /// Retrieve `amount` (or as much as fits) of `resource` from a structure.
    fn retrieve(
        &mut self,
        agent: &str,
        target: &str,
        resource: Resource,
        amount: Option<u32>,
    ) -> Status;

    fn build(&mut self, agent: &str, site: &str) -> Status;

    fn repair(&mut self, agent: &str, structure: &str) -> Status;

    fn upgrade_controller(&mut self, agent: &str, controller: &str) -> Status;

    /// Step toward `target`. Pathfinding is the environment's concern.
    fn move_toward(&mut self, agent: &str, target: &Position) -> Status;

    /// Start producing a new agent named `name` at `facility`.
    fn spawn(&mut self, facility: &str, body: &[BodyPart], name: &str) -> Status;
}
