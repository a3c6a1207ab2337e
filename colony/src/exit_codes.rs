//! Stable exit codes for colony CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Command failed due to invalid layout/config/world/store or other errors.
pub const INVALID: i32 = 1;
/// `colony validate --strict` found underserved creation requests.
pub const UNDERSERVED: i32 = 2;
