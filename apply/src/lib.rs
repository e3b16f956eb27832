//! Deterministic application of position-addressed text edits.
//!
//! Pure and synchronous — the operation layer owns all file I/O. The
//! engine's one job is to apply a batch of edits addressed against a
//! single file's original content without any edit invalidating the
//! coordinates of another.

mod applicator;
mod indent;

pub use applicator::{AppliedFile, apply_edits};
