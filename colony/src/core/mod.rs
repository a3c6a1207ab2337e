//! Deterministic, pure logic shared by the colony.
//!
//! Core modules must be free of I/O side effects. They operate on a world
//! [`world::Snapshot`] and in-memory records and return deterministic outputs
//! suitable for tests.

pub mod arbitration;
pub mod goal;
pub mod invariants;
pub mod projection;
pub mod roster;
pub mod selector;
pub mod types;
pub mod world;
