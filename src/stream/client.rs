use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{StreamTransport, SubscribeRequest};
use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::graph::{GraphStore, ReasonGraph, StreamEnvelope};

/// Connection lifecycle.
///
/// ```text
/// Idle -> Connecting -> Streaming -> Completed          (terminal)
///                               \-> Failed             (producer rejection, terminal)
///                               \-> Reconnecting -> Connecting   (after a fixed delay)
/// ```
///
/// `stop()` is legal in every phase and always lands in `Idle`, cancelling
/// any pending reconnect. `Completed` and `Failed` never transition on their
/// own; only an explicit `start()`/`reconnect()` leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No subscription requested.
    Idle,
    /// Opening the connection.
    Connecting,
    /// Live; envelopes are being applied.
    Streaming,
    /// Transport failed; a reconnect is pending.
    Reconnecting,
    /// The producer emitted its final snapshot. Terminal.
    Completed,
    /// The producer rejected the run. Terminal.
    Failed,
}

/// Observable client state, published on every change.
#[derive(Debug, Clone)]
pub struct StreamStatus {
    /// Current lifecycle phase.
    pub phase: ConnectionPhase,
    /// True only while envelopes may still arrive on a live connection.
    pub streaming: bool,
    /// Latest accepted snapshot; `None` before the first event and after stop.
    pub snapshot: Option<Arc<ReasonGraph>>,
    /// Single current-error slot; the latest error overwrites any prior one.
    pub error: Option<StreamError>,
}

impl StreamStatus {
    fn idle() -> Self {
        Self {
            phase: ConnectionPhase::Idle,
            streaming: false,
            snapshot: None,
            error: None,
        }
    }
}

struct ClientInner {
    transport: Arc<dyn StreamTransport>,
    request: SubscribeRequest,
    reconnect_delay: Duration,
    status: watch::Sender<StreamStatus>,
    /// Bumped on every start/stop; a task whose generation is stale must not
    /// publish state. Belt to the task-abort suspenders.
    generation: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ClientInner {
    fn publish(&self, my_gen: u64, apply: impl FnOnce(&mut StreamStatus)) {
        if self.generation.load(Ordering::SeqCst) == my_gen {
            self.status.send_modify(apply);
        }
    }

    fn is_current(&self, my_gen: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == my_gen
    }
}

/// Owner of one subscription to the reasoning engine.
///
/// At most one network connection exists per client at any time: `start()`
/// while active is a no-op, `stop()` synchronously releases the connection
/// and cancels any pending reconnect timer, and dropping the client behaves
/// like `stop()`.
pub struct StreamClient {
    inner: Arc<ClientInner>,
}

impl StreamClient {
    /// Create a client for `request` over the given transport.
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        request: SubscribeRequest,
        config: &StreamConfig,
    ) -> Self {
        let (status, _) = watch::channel(StreamStatus::idle());
        Self {
            inner: Arc::new(ClientInner {
                transport,
                request,
                reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
                status,
                generation: AtomicU64::new(0),
                task: Mutex::new(None),
            }),
        }
    }

    /// Open the subscription. No-op if one is already active.
    pub fn start(&self) {
        let mut slot = self.inner.task.lock().expect("client task lock");
        if slot.as_ref().is_some_and(|t| !t.is_finished()) {
            warn!("start() while a subscription is active; ignoring");
            return;
        }
        spawn_run(&self.inner, &mut slot);
    }

    /// Close the connection, cancel pending timers, discard the snapshot.
    /// Idempotent; legal in every phase.
    pub fn stop(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        let handle = self.inner.task.lock().expect("client task lock").take();
        if let Some(handle) = handle {
            handle.abort();
        }
        self.inner.status.send_replace(StreamStatus::idle());
        debug!("Subscription stopped");
    }

    /// `stop()`, then `start()` after the configured delay.
    ///
    /// The delay task occupies the client's single task slot, so a `stop()`
    /// during the delay cancels the restart and a `start()` during the delay
    /// is rejected by the reentry guard.
    pub fn reconnect(&self) {
        self.stop();
        let inner = Arc::clone(&self.inner);
        let my_gen = self.inner.generation.load(Ordering::SeqCst);
        let delay = self.inner.reconnect_delay;
        let mut slot = self.inner.task.lock().expect("client task lock");
        self.inner
            .status
            .send_modify(|s| s.phase = ConnectionPhase::Reconnecting);
        *slot = Some(tokio::spawn(async move {
            sleep(delay).await;
            let mut slot = inner.task.lock().expect("client task lock");
            if inner.generation.load(Ordering::SeqCst) != my_gen {
                // stop() or start() won the race during the delay.
                return;
            }
            // This task is the slot's occupant; clear it before respawning.
            *slot = None;
            spawn_run(&inner, &mut slot);
        }));
    }

    /// Watch channel for status changes.
    pub fn subscribe(&self) -> watch::Receiver<StreamStatus> {
        self.inner.status.subscribe()
    }

    /// Current status snapshot.
    pub fn status(&self) -> StreamStatus {
        self.inner.status.borrow().clone()
    }

    /// Latest graph snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<ReasonGraph>> {
        self.inner.status.borrow().snapshot.clone()
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Bump the generation, reset status, and spawn the connection loop into the
/// (held) task slot.
fn spawn_run(inner: &Arc<ClientInner>, slot: &mut Option<JoinHandle<()>>) {
    let my_gen = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
    inner.status.send_replace(StreamStatus {
        phase: ConnectionPhase::Connecting,
        streaming: false,
        snapshot: None,
        error: None,
    });
    let inner_for_task = Arc::clone(inner);
    *slot = Some(tokio::spawn(async move {
        run_loop(inner_for_task, my_gen).await;
    }));
}

/// Connection loop: connect, consume envelopes, reconnect on transport
/// failure until a terminal event or a stale generation ends it.
async fn run_loop(inner: Arc<ClientInner>, my_gen: u64) {
    let mut store = GraphStore::new();

    loop {
        inner.publish(my_gen, |s| {
            s.phase = ConnectionPhase::Connecting;
            s.streaming = false;
        });

        let lines = match inner.transport.open(&inner.request).await {
            Ok(lines) => lines,
            Err(err) => {
                warn!(error = %err, "Failed to open subscription");
                if !err.is_recoverable() {
                    inner.publish(my_gen, |s| {
                        s.phase = ConnectionPhase::Failed;
                        s.streaming = false;
                        s.snapshot = None;
                        s.error = Some(err.clone());
                    });
                    return;
                }
                inner.publish(my_gen, |s| {
                    s.phase = ConnectionPhase::Reconnecting;
                    s.streaming = false;
                    s.error = Some(err.clone());
                });
                sleep(inner.reconnect_delay).await;
                if !inner.is_current(my_gen) {
                    return;
                }
                continue;
            }
        };

        info!(query = %inner.request.query, "Subscription stream open");
        inner.publish(my_gen, |s| {
            s.phase = ConnectionPhase::Streaming;
            s.streaming = true;
            s.error = None;
        });

        match consume(&inner, my_gen, &mut store, lines).await {
            StreamOutcome::Terminal => return,
            StreamOutcome::ConnectionLost(err) => {
                inner.publish(my_gen, |s| {
                    s.phase = ConnectionPhase::Reconnecting;
                    s.streaming = false;
                    s.error = Some(err);
                });
                sleep(inner.reconnect_delay).await;
                if !inner.is_current(my_gen) {
                    return;
                }
            }
        }
    }
}

enum StreamOutcome {
    /// `Completed` or `Failed`; the loop must not reconnect.
    Terminal,
    /// The connection dropped mid-stream; reconnect after the delay.
    ConnectionLost(StreamError),
}

/// Apply envelopes from one live connection until it ends.
///
/// Malformed lines are a recovered parse error: logged and skipped, the
/// stream continues. A clean end-of-stream without a `complete` envelope is
/// a dropped connection and is handled like any other transport failure.
async fn consume(
    inner: &Arc<ClientInner>,
    my_gen: u64,
    store: &mut GraphStore,
    mut lines: crate::stream::LineStream,
) -> StreamOutcome {
    while let Some(item) = lines.next().await {
        if !inner.is_current(my_gen) {
            return StreamOutcome::Terminal;
        }
        let line = match item {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "Subscription connection lost");
                return StreamOutcome::ConnectionLost(err);
            }
        };

        let envelope = match StreamEnvelope::parse_line(&line) {
            Ok(Some(envelope)) => envelope,
            Ok(None) => continue,
            Err(err) => {
                warn!(error = %err, "Skipping malformed stream message");
                continue;
            }
        };

        match envelope {
            StreamEnvelope::Init { data } | StreamEnvelope::Update { data } => {
                let snapshot = store.apply(data);
                debug!(
                    nodes = snapshot.nodes.len(),
                    edges = snapshot.edges.len(),
                    "Applied snapshot"
                );
                inner.publish(my_gen, |s| s.snapshot = Some(snapshot));
            }
            StreamEnvelope::Complete { data } => {
                let snapshot = store.apply(data);
                info!(nodes = snapshot.nodes.len(), "Run complete");
                inner.publish(my_gen, |s| {
                    s.phase = ConnectionPhase::Completed;
                    s.streaming = false;
                    s.snapshot = Some(snapshot);
                    s.error = None;
                });
                return StreamOutcome::Terminal;
            }
            StreamEnvelope::Error { message } => {
                warn!(message = %message, "Run rejected by producer");
                store.clear();
                inner.publish(my_gen, |s| {
                    s.phase = ConnectionPhase::Failed;
                    s.streaming = false;
                    s.snapshot = None;
                    s.error = Some(StreamError::Application { message });
                });
                return StreamOutcome::Terminal;
            }
        }
    }

    StreamOutcome::ConnectionLost(StreamError::Transport {
        message: "stream ended without a complete event".to_string(),
    })
}
