//! Per-tick reports under `.colony/ticks/`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::write_atomic;
use crate::coordinator::TickSummary;

/// Report path for `tick`; zero-padded so directory listings sort by tick.
pub fn tick_report_path(ticks_dir: &Path, tick: u64) -> PathBuf {
    ticks_dir.join(format!("{:08}.json", tick))
}

/// Write `summary` to `<ticks_dir>/<tick>.json`, replacing any earlier report.
pub fn write_tick_report(ticks_dir: &Path, summary: &TickSummary) -> Result<PathBuf> {
    let path = tick_report_path(ticks_dir, summary.tick);
    let mut buf = serde_json::to_string_pretty(summary)
        .with_context(|| format!("encode tick report {}", summary.tick))?;
    buf.push('\n');
    write_atomic(&path, &buf)?;
    Ok(path)
}
