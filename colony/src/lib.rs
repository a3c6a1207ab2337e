//! Hierarchical agent colony controller.
//!
//! Each cycle the colony rebuilds its agents from a durable store, lets
//! role-specific Officials assign goals and run every agent once, then
//! arbitrates the Officials' creation requests against the production
//! facilities of each partition. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (goals, selectors, rosters,
//!   arbitration, invariants). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (filesystem, schemas, config).
//! - **[`env`]**: The seam to the environment; [`sim`] implements it with a
//!   small deterministic simulation.
//!
//! Orchestration modules ([`coordinator`], [`partition`], [`tick`],
//! [`looping`], [`validate`]) coordinate core logic with I/O to implement
//! CLI commands.

pub mod agent;
pub mod coordinator;
pub mod core;
pub mod env;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod official;
pub mod partition;
pub mod sim;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tick;
pub mod validate;
