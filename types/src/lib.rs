//! Shared data model for typeshift refactoring operations.
//!
//! These types define the interface between the protocol layer
//! (`typeshift-tsserver`), the edit engine (`typeshift-apply`), and the
//! operation layer (`typeshift-ops`). Pure data — no I/O.

mod edit;
mod outcome;
mod report;

pub use edit::{Position, TextEdit};
pub use outcome::{DiscoveryStatus, PreviewInfo, RefactorOutcome};
pub use report::{EditRecord, FileChangeReport};
