//! Multi-tick helper for `colony run`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::tick::{TickOutcome, run_tick};

/// Summary of a run invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub ticks_run: u64,
    /// World tick after the last cycle, if any ran.
    pub last_tick: Option<u64>,
    pub spawned: usize,
    /// Issuers underserved on the last cycle.
    pub underserved: Vec<String>,
}

/// Run `ticks` cycles back to back, calling `on_tick` after each.
///
/// Stops on the first error; every completed cycle is already on disk.
pub fn run_loop<F: FnMut(&TickOutcome)>(root: &Path, ticks: u64, mut on_tick: F) -> Result<LoopOutcome> {
    let mut outcome = LoopOutcome {
        ticks_run: 0,
        last_tick: None,
        spawned: 0,
        underserved: Vec::new(),
    };
    for n in 0..ticks {
        let tick = run_tick(root).with_context(|| format!("cycle {} of {}", n + 1, ticks))?;
        outcome.ticks_run += 1;
        outcome.last_tick = Some(tick.world_tick);
        outcome.spawned += tick.summary.spawned.len();
        outcome.underserved = tick.summary.underserved.clone();
        on_tick(&tick);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::init::{InitOptions, init_colony};
    use crate::io::world_store::load_world;
    use crate::test_support::TestColony;

    #[test]
    fn run_loop_advances_requested_ticks() {
        let colony = TestColony::new();
        let paths = init_colony(colony.root(), &InitOptions { force: false }).expect("init");

        let mut seen = Vec::new();
        let outcome = run_loop(colony.root(), 3, |t| seen.push(t.summary.tick)).expect("loop");

        assert_eq!(outcome.ticks_run, 3);
        assert_eq!(outcome.last_tick, Some(3));
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(load_world(&paths.world_path).expect("world").tick, 3);
    }

    #[test]
    fn zero_ticks_is_a_no_op() {
        let colony = TestColony::new();
        init_colony(colony.root(), &InitOptions { force: false }).expect("init");
        let outcome = run_loop(colony.root(), 0, |_| {}).expect("loop");
        assert_eq!(outcome.ticks_run, 0);
        assert_eq!(outcome.last_tick, None);
    }
}
