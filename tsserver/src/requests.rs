//! Sequence-id request correlation over the session transport.
//!
//! A [`RequestChannel`] is a cheap clone handle: many operations can hold
//! one concurrently, and responses are matched to callers purely by
//! `request_seq` — never by arrival order. No per-request timeout is
//! enforced here; bounding the wait is each caller's responsibility.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, bail};
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::protocol::{Request, ServerResponse};

pub(crate) const WRITER_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
pub(crate) enum WriterCommand {
    Send(serde_json::Value),
    Shutdown,
}

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<ServerResponse>>>>;

#[derive(Clone)]
pub struct RequestChannel {
    writer_tx: mpsc::Sender<WriterCommand>,
    pending: PendingMap,
    next_seq: Arc<AtomicU64>,
}

impl RequestChannel {
    pub(crate) fn new(writer_tx: mpsc::Sender<WriterCommand>) -> Self {
        Self {
            writer_tx,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Send a command and await the response that carries its sequence id.
    ///
    /// Responses for other requests may arrive first; they resolve their
    /// own callers. The returned response may still have `success: false`
    /// — protocol-level failure is the caller's to interpret.
    pub async fn request(
        &self,
        command: &'static str,
        arguments: serde_json::Value,
    ) -> Result<ServerResponse> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(seq, tx);

        if let Err(e) = self.write(Request::new(seq, command, Some(arguments))).await {
            // Failed to enqueue: don't leak the pending entry.
            self.pending.lock().await.remove(&seq);
            return Err(e);
        }

        match rx.await {
            Ok(response) => Ok(response),
            // Sender dropped: session stopped (or transport died) with the
            // request still in flight.
            Err(_) => bail!("session stopped before a response to '{command}' arrived"),
        }
    }

    /// Send a command that the server never answers (e.g. `open`, `exit`).
    pub async fn send_no_response(
        &self,
        command: &'static str,
        arguments: Option<serde_json::Value>,
    ) -> Result<()> {
        self.write(Request::new(
            self.next_seq.fetch_add(1, Ordering::Relaxed),
            command,
            arguments,
        ))
        .await
    }

    async fn write(&self, request: Request) -> Result<()> {
        let frame = serde_json::to_value(&request)?;
        if self
            .writer_tx
            .send(WriterCommand::Send(frame))
            .await
            .is_err()
        {
            bail!("writer channel closed");
        }
        Ok(())
    }

    /// Route one response frame to its waiting caller, if any.
    pub(crate) async fn resolve(&self, response: ServerResponse) {
        let sender = self.pending.lock().await.remove(&response.request_seq);
        match sender {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => {
                tracing::trace!(
                    request_seq = response.request_seq,
                    "response for unknown or already-resolved request"
                );
            }
        }
    }

    /// Reject every in-flight request. Dropping the senders wakes all
    /// waiting callers with a "session stopped" failure.
    pub(crate) async fn reject_all(&self) {
        let count = {
            let mut pending = self.pending.lock().await;
            let count = pending.len();
            pending.clear();
            count
        };
        if count > 0 {
            tracing::debug!(count, "rejected pending requests on session stop");
        }
    }

    /// Ask the writer task to exit after draining queued frames.
    pub(crate) async fn shutdown_writer(&self) {
        let _ = self.writer_tx.send(WriterCommand::Shutdown).await;
    }

    #[cfg(test)]
    pub(crate) async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }
}
