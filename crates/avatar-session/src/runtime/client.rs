//! Public handle for the avatar session and the task that drives it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::channel::channel_task;
use crate::connection::ChannelId;
use crate::session::{Effect, Session, SessionError, SessionEvent, SessionTimings, Snapshot};

/// How long a closing channel task may take before it is aborted.
const CHANNEL_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub url: String,
    pub timings: SessionTimings,
    pub connect_timeout: Duration,
    /// Whether credentials for the video stream are configured.
    pub stream_credentials: bool,
}

impl ClientOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timings: SessionTimings::default(),
            connect_timeout: Duration::from_secs(15),
            stream_credentials: false,
        }
    }
}

pub(crate) enum Command {
    SwitchMode {
        mode: String,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    SetPublishing(bool),
    Shutdown,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable, non-owning handle to a running [`AvatarClient`].
#[derive(Clone)]
pub struct ClientHandle {
    command_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl ClientHandle {
    /// Ask the backend to switch modes. Resolves once the request is sent
    /// (or refused), not when the backend acknowledges it.
    pub async fn switch_mode(&self, mode: &str) -> Result<(), SessionError> {
        let (reply, verdict) = oneshot::channel();
        self.command_tx
            .send(Command::SwitchMode {
                mode: mode.to_string(),
                reply,
            })
            .await
            .map_err(|_| SessionError::ClientStopped)?;
        verdict.await.map_err(|_| SessionError::ClientStopped)?
    }

    /// Report whether the video stream is being published. Fails with
    /// [`SessionError::ClientStopped`] once the session task has ended.
    pub async fn set_publishing(&self, publishing: bool) -> Result<(), SessionError> {
        self.command_tx
            .send(Command::SetPublishing(publishing))
            .await
            .map_err(|_| {
                debug!(publishing, "Publish status dropped, avatar client stopped");
                SessionError::ClientStopped
            })
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Owner of the background session task.
pub struct AvatarClient {
    handle: ClientHandle,
    task: JoinHandle<()>,
}

impl AvatarClient {
    /// Start the session task. Returns the client and a receiver that sees
    /// every snapshot change.
    pub fn start(options: ClientOptions) -> (Self, watch::Receiver<Snapshot>) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (event_tx, event_rx) = mpsc::channel(256);

        let session =
            Session::new(options.timings.clone()).with_stream_credentials(options.stream_credentials);
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

        let driver = Driver {
            session,
            url: options.url,
            connect_timeout: options.connect_timeout,
            event_tx,
            channels: HashMap::new(),
            snapshot_tx,
        };
        let task = tokio::spawn(session_loop(driver, event_rx, command_rx));

        let client = Self {
            handle: ClientHandle {
                command_tx,
                snapshot_rx: snapshot_rx.clone(),
            },
            task,
        };
        (client, snapshot_rx)
    }

    /// A lightweight handle that talks to the same session.
    pub fn handle(&self) -> ClientHandle {
        self.handle.clone()
    }

    pub async fn switch_mode(&self, mode: &str) -> Result<(), SessionError> {
        self.handle.switch_mode(mode).await
    }

    pub async fn set_publishing(&self, publishing: bool) -> Result<(), SessionError> {
        self.handle.set_publishing(publishing).await
    }

    pub fn snapshot(&self) -> Snapshot {
        self.handle.snapshot()
    }

    /// Tear the session down and wait for its task to finish.
    pub async fn shutdown(self) {
        let _ = self.handle.command_tx.send(Command::Shutdown).await;
        if let Err(e) = self.task.await {
            error!(error = %e, "Avatar session task failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Session loop
// ---------------------------------------------------------------------------

struct ChannelSlot {
    outbound_tx: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

struct Driver {
    session: Session,
    url: String,
    connect_timeout: Duration,
    event_tx: mpsc::Sender<SessionEvent>,
    channels: HashMap<ChannelId, ChannelSlot>,
    snapshot_tx: watch::Sender<Snapshot>,
}

async fn session_loop(
    mut driver: Driver,
    mut event_rx: mpsc::Receiver<SessionEvent>,
    mut command_rx: mpsc::Receiver<Command>,
) {
    let effects = driver.session.start();
    driver.apply_logged(effects).await;
    driver.publish();

    loop {
        let deadline = driver.session.next_deadline();

        tokio::select! {
            _ = sleep_until(deadline) => {
                let effects = driver.session.advance(Instant::now());
                driver.apply_logged(effects).await;
            }
            Some(event) = event_rx.recv() => {
                driver.forget_finished(&event);
                let effects = driver.session.handle(Instant::now(), event);
                driver.apply_logged(effects).await;
            }
            command = command_rx.recv() => match command {
                Some(Command::SwitchMode { mode, reply }) => {
                    let result = match driver.session.request_mode_switch(Instant::now(), &mode) {
                        Ok(effects) => driver.apply(effects).await,
                        Err(e) => Err(e),
                    };
                    let _ = reply.send(result);
                }
                Some(Command::SetPublishing(publishing)) => {
                    driver.session.set_publishing(publishing);
                }
                Some(Command::Shutdown) | None => {
                    let effects = driver.session.teardown();
                    driver.apply_logged(effects).await;
                    driver.drain_channels();
                    driver.publish();
                    break;
                }
            },
        }

        driver.publish();
    }

    info!("Avatar session stopped");
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

impl Driver {
    async fn apply(&mut self, effects: Vec<Effect>) -> Result<(), SessionError> {
        let mut result = Ok(());
        for effect in effects {
            match effect {
                Effect::Connect(channel) => self.spawn_channel(channel),
                Effect::Send(channel, message) => {
                    let json = match message.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            result = Err(SessionError::Encode(e.to_string()));
                            continue;
                        }
                    };
                    let Some(slot) = self.channels.get(&channel) else {
                        debug!(channel = %channel, "Dropping message for closed channel");
                        continue;
                    };
                    // Must not block: the channel task may be waiting on the event queue.
                    if slot.outbound_tx.send(json).is_err() {
                        debug!(channel = %channel, "Channel task already gone");
                    }
                }
                Effect::Close(channel) => {
                    // Dropping the sender makes the task close the socket.
                    if let Some(slot) = self.channels.remove(&channel) {
                        drop(slot.outbound_tx);
                        self.closing(slot.task).await;
                    }
                }
            }
        }
        result
    }

    async fn apply_logged(&mut self, effects: Vec<Effect>) {
        if let Err(e) = self.apply(effects).await {
            error!(error = %e, "Failed to apply session effects");
        }
    }

    fn spawn_channel(&mut self, channel: ChannelId) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(channel_task(
            channel,
            self.url.clone(),
            self.connect_timeout,
            outbound_rx,
            self.event_tx.clone(),
        ));
        self.channels.insert(channel, ChannelSlot { outbound_tx, task });
    }

    /// Drop bookkeeping for a channel whose task has reported its end.
    fn forget_finished(&mut self, event: &SessionEvent) {
        if let SessionEvent::ChannelClosed { channel, .. }
        | SessionEvent::ConnectFailed { channel, .. } = event
        {
            self.channels.remove(channel);
        }
    }

    /// Abort channel tasks still running after teardown.
    fn drain_channels(&mut self) {
        for (_, slot) in self.channels.drain() {
            slot.task.abort();
        }
    }

    async fn closing(&self, mut task: JoinHandle<()>) {
        if tokio::time::timeout(CHANNEL_DRAIN_TIMEOUT, &mut task)
            .await
            .is_err()
        {
            warn!("Avatar channel did not close in time, aborting");
            task.abort();
        }
    }

    fn publish(&self) {
        let snapshot = self.session.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
