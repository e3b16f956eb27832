//! Filesystem and diff helpers shared across typeshift crates.

mod atomic_write;
mod diff;

pub use atomic_write::atomic_write;
pub use diff::{compute_diff_stats, format_stats};
