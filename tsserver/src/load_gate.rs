//! Project-load synchronization gate.
//!
//! The server announces the end of workspace indexing with a single
//! asynchronous event. Operations that need cross-file knowledge wait on
//! that signal through this gate: a watch channel whose flag flips
//! permanently true when the event arrives (and resets only with a new
//! session). All concurrent waiters observe the same flag, so N callers
//! arriving together collectively wait roughly one timeout window — never
//! N stacked windows.

use std::time::Duration;

use tokio::sync::watch;

#[derive(Clone)]
pub struct ProjectLoadGate {
    rx: watch::Receiver<bool>,
}

impl ProjectLoadGate {
    pub(crate) fn new(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// Whether indexing has finished.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the project is loaded, bounded by `timeout`.
    ///
    /// Returns `true` when indexing finished (possibly long ago — the
    /// already-loaded path returns without suspending). Returns `false`
    /// on timeout or when the session stopped while waiting; both are
    /// advisory, and the calling operation proceeds with a warning rather
    /// than failing.
    pub async fn ensure_ready(&self, timeout: Duration) -> bool {
        if *self.rx.borrow() {
            return true;
        }

        let mut rx = self.rx.clone();
        match tokio::time::timeout(timeout, rx.wait_for(|loaded| *loaded)).await {
            Ok(Ok(_)) => true,
            Ok(Err(_)) => {
                tracing::debug!("session stopped while waiting for project load");
                false
            }
            Err(_) => {
                tracing::debug!(?timeout, "project load wait timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    fn gate_pair() -> (watch::Sender<bool>, ProjectLoadGate) {
        let (tx, rx) = watch::channel(false);
        (tx, ProjectLoadGate::new(rx))
    }

    #[tokio::test]
    async fn test_returns_immediately_when_already_loaded() {
        let (tx, gate) = gate_pair();
        tx.send(true).unwrap();
        assert!(gate.ensure_ready(Duration::from_secs(30)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wakes_on_load_event() {
        let (tx, gate) = gate_pair();

        let waiter = tokio::spawn({
            let gate = gate.clone();
            async move { gate.ensure_ready(Duration::from_secs(30)).await }
        });

        tokio::time::sleep(Duration::from_secs(2)).await;
        tx.send(true).unwrap();

        assert!(waiter.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_advisory_false() {
        let (_tx, gate) = gate_pair();
        let started = Instant::now();
        assert!(!gate.ensure_ready(Duration::from_secs(30)).await);
        assert_eq!(started.elapsed().as_secs(), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_share_one_timeout_window() {
        // Five callers issued together must collectively finish in one
        // 30 s window, not five stacked windows.
        let (_tx, gate) = gate_pair();
        let started = Instant::now();

        let waiters: Vec<_> = (0..5)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.ensure_ready(Duration::from_secs(30)).await })
            })
            .collect();

        for waiter in waiters {
            assert!(!waiter.await.unwrap());
        }

        let elapsed = started.elapsed();
        assert!(
            elapsed < Duration::from_secs(35),
            "fan-in broken: {elapsed:?} for 5 waiters"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_all_wake_on_event() {
        let (tx, gate) = gate_pair();

        let waiters: Vec<_> = (0..5)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.ensure_ready(Duration::from_secs(30)).await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();

        for waiter in waiters {
            assert!(waiter.await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_sender_dropped_yields_false() {
        let (tx, gate) = gate_pair();
        drop(tx);
        assert!(!gate.ensure_ready(Duration::from_secs(1)).await);
    }
}
