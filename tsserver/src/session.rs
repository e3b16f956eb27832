//! Session handle — owns the compiler server process and its transport.
//!
//! One task owns the raw stdout stream and decodes frames; one task owns
//! stdin and drains outgoing requests. Every other component talks to the
//! server through a [`RequestChannel`] clone or the [`ProjectLoadGate`] —
//! never through the streams directly.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};

use crate::codec::{FrameReader, RequestWriter};
use crate::config::SessionConfig;
use crate::load_gate::ProjectLoadGate;
use crate::protocol::{self, IncomingFrame};
use crate::requests::{RequestChannel, WRITER_CHANNEL_CAPACITY, WriterCommand};

/// Lifecycle of a session. One live session per workspace root; the host
/// constructs it once and injects it into every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Starting,
    Running,
    Stopping,
    Stopped,
}

#[derive(Debug, thiserror::Error)]
#[error("compiler session is not running")]
pub struct SessionNotRunning;

struct Transport {
    child: Option<Child>,
    channel: RequestChannel,
    loaded_rx: watch::Receiver<bool>,
    open_files: Arc<Mutex<HashSet<PathBuf>>>,
    #[allow(dead_code)]
    reader_handle: tokio::task::JoinHandle<()>,
    #[allow(dead_code)]
    writer_handle: tokio::task::JoinHandle<()>,
}

pub struct ServerSession {
    config: SessionConfig,
    state: SessionState,
    transport: Option<Transport>,
}

impl ServerSession {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::NotStarted,
            transport: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Spawn the server for `root` and wire up the transport tasks.
    ///
    /// Idempotent: a second call while Running is a no-op. A spawn
    /// failure fails the call and leaves the session Stopped.
    pub async fn start(&mut self, root: &Path) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        self.state = SessionState::Starting;

        let resolved = which::which(&self.config.command)
            .with_context(|| format!("{} not found in PATH", self.config.command))
            .inspect_err(|_| self.state = SessionState::Stopped)?;

        let mut cmd = Command::new(&resolved);
        cmd.args(&self.config.args)
            .current_dir(root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.state = SessionState::Stopped;
                return Err(e).with_context(|| format!("spawning {}", self.config.command));
            }
        };

        let stdout = child.stdout.take().context("no stdout from server")?;
        let stdin = child.stdin.take().context("no stdin from server")?;

        self.transport = Some(Self::wire(Some(child), stdout, stdin));
        self.state = SessionState::Running;
        tracing::info!(root = %root.display(), command = %resolved.display(), "compiler session started");
        Ok(())
    }

    /// Attach to a transport owned elsewhere (a socket, or a scripted
    /// server in tests) instead of spawning a process. The session starts
    /// out Running.
    #[must_use]
    pub fn connected(
        config: SessionConfig,
        reader: impl AsyncRead + Unpin + Send + 'static,
        writer: impl AsyncWrite + Unpin + Send + 'static,
    ) -> Self {
        Self {
            config,
            state: SessionState::Running,
            transport: Some(Self::wire(None, reader, writer)),
        }
    }

    fn wire(
        child: Option<Child>,
        reader: impl AsyncRead + Unpin + Send + 'static,
        writer: impl AsyncWrite + Unpin + Send + 'static,
    ) -> Transport {
        let (writer_tx, mut writer_rx) = mpsc::channel::<WriterCommand>(WRITER_CHANNEL_CAPACITY);
        let channel = RequestChannel::new(writer_tx);
        let (loaded_tx, loaded_rx) = watch::channel(false);

        let writer_handle = tokio::spawn(async move {
            let mut writer = RequestWriter::new(writer);
            while let Some(cmd) = writer_rx.recv().await {
                match cmd {
                    WriterCommand::Send(frame) => {
                        if let Err(e) = writer.write_request(&frame).await {
                            tracing::warn!("request write error: {e}");
                            break;
                        }
                    }
                    WriterCommand::Shutdown => break,
                }
            }
        });

        let reader_channel = channel.clone();
        let reader_handle = tokio::spawn(async move {
            let mut reader = FrameReader::new(reader);
            loop {
                match reader.read_frame().await {
                    Ok(Some(frame)) => {
                        Self::dispatch_frame(&frame, &reader_channel, &loaded_tx).await;
                    }
                    Ok(None) => {
                        tracing::info!("compiler server closed its output stream");
                        reader_channel.reject_all().await;
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("transport error: {e}");
                        reader_channel.reject_all().await;
                        break;
                    }
                }
            }
        });

        Transport {
            child,
            channel,
            loaded_rx,
            open_files: Arc::new(Mutex::new(HashSet::new())),
            reader_handle,
            writer_handle,
        }
    }

    /// Route one decoded frame: responses to their pending caller, events
    /// to subscribers. Events never touch the pending map.
    async fn dispatch_frame(
        frame: &serde_json::Value,
        channel: &RequestChannel,
        loaded_tx: &watch::Sender<bool>,
    ) {
        let Some(incoming) = protocol::parse_incoming(frame) else {
            tracing::trace!("ignoring malformed frame from server");
            return;
        };

        match incoming {
            IncomingFrame::Response(response) => {
                channel.resolve(response).await;
            }
            IncomingFrame::Event { name, .. } => {
                if name == protocol::PROJECT_LOADING_FINISH {
                    tracing::debug!("project indexing finished");
                    loaded_tx.send_replace(true);
                } else {
                    tracing::trace!(event = %name, "ignoring server event");
                }
            }
        }
    }

    /// A clone handle for issuing requests. Fails when not Running.
    pub fn channel(&self) -> Result<RequestChannel> {
        match (&self.transport, self.is_running()) {
            (Some(t), true) => Ok(t.channel.clone()),
            _ => Err(SessionNotRunning.into()),
        }
    }

    /// The gate over the project-indexing-finished signal.
    pub fn load_gate(&self) -> Result<ProjectLoadGate> {
        match (&self.transport, self.is_running()) {
            (Some(t), true) => Ok(ProjectLoadGate::new(t.loaded_rx.clone())),
            _ => Err(SessionNotRunning.into()),
        }
    }

    /// Tell the server about a file.
    ///
    /// Plain opens are idempotent: a file already announced is skipped
    /// and `Ok(false)` returned. Passing `content` re-announces the file
    /// with an explicit text override (used after local edits, and for
    /// preview buffers that never reach disk) and always sends.
    pub async fn open_file(&self, path: &Path, content: Option<&str>) -> Result<bool> {
        let Some(transport) = &self.transport else {
            bail!(SessionNotRunning);
        };

        if content.is_none() {
            let already_open = {
                let open_files = transport
                    .open_files
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                open_files.contains(path)
            };
            if already_open {
                return Ok(false);
            }
        }

        transport
            .channel
            .send_no_response("open", Some(protocol::open_args(path, content)))
            .await?;

        transport
            .open_files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(path.to_path_buf());
        Ok(true)
    }

    /// Gracefully stop the server.
    ///
    /// Sends `exit`, gives the process a grace period, kills it on
    /// overrun, rejects every pending request, and clears the open-file
    /// and load state. Restarting is explicit — nothing auto-heals.
    pub async fn stop(&mut self) {
        let Some(mut transport) = self.transport.take() else {
            self.state = SessionState::Stopped;
            return;
        };
        self.state = SessionState::Stopping;

        let _ = transport.channel.send_no_response("exit", None).await;
        transport.channel.shutdown_writer().await;

        if let Some(child) = transport.child.as_mut() {
            let wait = tokio::time::timeout(self.config.shutdown_grace(), child.wait()).await;
            if wait.is_err() {
                tracing::debug!("compiler server didn't exit in time, killing");
                let _ = child.kill().await;
            }
        }

        transport.channel.reject_all().await;
        transport
            .open_files
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clear();

        self.state = SessionState::Stopped;
        tracing::info!("compiler session stopped");
    }
}
