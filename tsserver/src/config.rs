//! Session configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for a compiler-server session.
///
/// The two readiness waits are deliberately separate knobs: the project
/// load gate defaults to 30 s (indexing a large workspace is slow), the
/// related-file scan to 5 s (it is best-effort and only improves
/// cross-file coverage).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Executable to spawn (resolved on PATH).
    pub command: String,
    /// Extra arguments passed to the server.
    pub args: Vec<String>,
    /// Bound on each protocol round-trip, applied by the operation layer.
    pub request_timeout_ms: u64,
    /// Bound on waiting for the project-indexing-finished event.
    pub project_load_timeout_ms: u64,
    /// Bound on the related-file discovery scan.
    pub discovery_timeout_ms: u64,
    /// Grace period between a polite shutdown request and a kill.
    pub shutdown_grace_ms: u64,
    /// Cap on files pre-opened by a discovery pass.
    pub max_preopen_files: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command: "tsserver".to_string(),
            args: Vec::new(),
            request_timeout_ms: 30_000,
            project_load_timeout_ms: 30_000,
            discovery_timeout_ms: 5_000,
            shutdown_grace_ms: 2_000,
            max_preopen_files: 50,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub fn project_load_timeout(&self) -> Duration {
        Duration::from_millis(self.project_load_timeout_ms)
    }

    #[must_use]
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
