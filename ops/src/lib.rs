//! Refactoring operations composed over the compiler session.
//!
//! Every operation takes the injected [`ServerSession`] handle, follows
//! the same shape — readiness gate, best-effort discovery, protocol
//! round-trips, edit application, write or preview-buffer — and resolves
//! to a [`RefactorOutcome`] value. Failures are outcomes with actionable
//! text, not errors.
//!
//! Concurrent operations targeting the same file race read-modify-write;
//! the last writer wins. This layer does not arbitrate file access.
//!
//! [`ServerSession`]: typeshift_tsserver::ServerSession
//! [`RefactorOutcome`]: typeshift_types::RefactorOutcome

mod extract;
mod io;
mod move_file;
mod organize;
mod references;
mod rename;
mod result;
mod util;

pub use extract::{ExtractKind, ExtractRequest, extract};
pub use move_file::{move_file, move_files};
pub use organize::organize_imports;
pub use references::find_references;
pub use rename::{RenameRequest, rename};
