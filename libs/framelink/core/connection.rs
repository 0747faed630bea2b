//! Per-stream connection task
//!
//! Each registry entry owns exactly one of these: a tokio task that opens
//! the socket for its stream key, sends the auth handshake, pumps inbound
//! payloads through the codec into the fan-out, and decides after every
//! drop whether to back off and reconnect or go terminal.

use crate::core::codec::{self, Inbound};
use crate::core::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
use crate::core::key::StreamKey;
use crate::core::multiplexer::FrameMultiplexer;
use crate::traits::{ReconnectPolicy, TokenProvider};
use crossbeam_channel::Sender;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

/// Lifecycle mode of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Reconnect forever; torn down only by an explicit stop
    Monitor,
    /// Bounded retry budget; torn down automatically on exhaustion
    Subscribe,
}

/// Notifications surfaced to the dashboard, one per lifecycle event
///
/// Exactly one event is emitted per transport drop and one per retry
/// exhaustion; remote-reported errors produce one event per control
/// message. Delivered on the registry's event channel.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Socket opened and handshake sent
    Connected { key: StreamKey },
    /// Socket dropped (transport error or remote close)
    Disconnected { key: StreamKey },
    /// Monitoring stream scheduling reconnect attempt `attempt`
    Retrying { key: StreamKey, attempt: u32 },
    /// Remote-reported error decoded from the stream
    StreamError { key: StreamKey, message: String },
    /// Subscribe-mode retry budget exhausted; the stream is gone
    Exhausted { key: StreamKey },
}

/// Everything the connection task needs to (re)open its socket
pub(crate) struct ConnectSettings {
    pub url: String,
    pub policy: Box<dyn ReconnectPolicy>,
    pub tokens: Arc<dyn TokenProvider>,
}

/// State shared between the registry and the connection task
pub(crate) struct ConnectionShared {
    pub key: StreamKey,
    pub mode: ConnectionMode,
    /// Registry generation; guards self-removal against a recreated key
    pub epoch: u64,
    pub state: AtomicConnectionState,
    pub metrics: AtomicMetrics,
    pub sinks: FrameMultiplexer,
    active: AtomicBool,
    stop_tx: watch::Sender<bool>,
}

impl ConnectionShared {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Request teardown: close the socket (or abort the in-flight connect)
    /// and cancel any pending backoff sleep. Idempotent.
    pub fn halt(&self) {
        self.active.store(false, Ordering::Release);
        self.state.set(ConnectionState::Closing);
        let _ = self.stop_tx.send(true);
    }
}

/// One live stream connection: shared state plus its driver task
pub(crate) struct Connection {
    pub shared: Arc<ConnectionShared>,
    _task: tokio::task::JoinHandle<()>,
}

impl Connection {
    /// Spawn the driver task for `key`
    ///
    /// `on_terminal` runs if (and only if) the retry budget exhausts while
    /// the connection is still active; the registry uses it to drop its
    /// entry for this epoch.
    pub fn spawn(
        key: StreamKey,
        mode: ConnectionMode,
        epoch: u64,
        settings: ConnectSettings,
        events: Sender<StreamEvent>,
        on_terminal: impl FnOnce() + Send + 'static,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let shared = Arc::new(ConnectionShared {
            key,
            mode,
            epoch,
            state: AtomicConnectionState::new(ConnectionState::Connecting),
            metrics: AtomicMetrics::new(),
            sinks: FrameMultiplexer::new(),
            active: AtomicBool::new(true),
            stop_tx,
        });

        let task = {
            let shared = Arc::clone(&shared);
            tokio::spawn(async move {
                run(shared, settings, events, stop_rx, on_terminal).await;
            })
        };

        Self {
            shared,
            _task: task,
        }
    }
}

/// Main connection loop: connect, drive, back off, repeat
async fn run(
    shared: Arc<ConnectionShared>,
    settings: ConnectSettings,
    events: Sender<StreamEvent>,
    mut stop_rx: watch::Receiver<bool>,
    on_terminal: impl FnOnce() + Send + 'static,
) {
    let key = shared.key;
    let mut failures: u32 = 0;
    let mut exhausted = false;

    loop {
        if !shared.is_active() {
            break;
        }

        shared.state.set(if failures == 0 {
            ConnectionState::Connecting
        } else {
            ConnectionState::Reconnecting
        });

        debug!("Connecting to {}", settings.url);
        let connected = tokio::select! {
            result = connect_async(&settings.url) => match result {
                Ok((ws_stream, _)) => Some(ws_stream),
                Err(e) => {
                    warn!("Failed to connect {}: {}", key, e);
                    None
                }
            },
            _ = stop_rx.changed() => break,
        };

        if let Some(ws_stream) = connected {
            info!("Connected {}", key);
            shared.state.set(ConnectionState::Open);
            let _ = events.send(StreamEvent::Connected { key });
            failures = 0;

            let stopped = drive_session(ws_stream, &shared, &settings, &events, &mut stop_rx).await;
            if stopped || !shared.is_active() {
                break;
            }

            let _ = events.send(StreamEvent::Disconnected { key });
        }

        if !shared.is_active() {
            break;
        }

        failures += 1;
        match settings.policy.next_delay(failures) {
            Some(delay) => {
                if shared.mode == ConnectionMode::Monitor {
                    let _ = events.send(StreamEvent::Retrying {
                        key,
                        attempt: failures,
                    });
                }
                shared.metrics.increment_reconnects();
                debug!(
                    "Reconnecting {} in {:?} (failure {})",
                    key, delay, failures
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = stop_rx.changed() => break,
                }
            }
            None => {
                warn!("Retry budget exhausted for {}", key);
                exhausted = true;
                break;
            }
        }
    }

    shared.state.set(ConnectionState::Closed);
    if exhausted && shared.is_active() {
        let _ = events.send(StreamEvent::Exhausted { key });
        on_terminal();
    }
    debug!("Connection task for {} exiting", key);
}

/// Drive one open socket until it drops or a stop is requested
///
/// Returns `true` when the session ended because of an explicit stop.
async fn drive_session(
    ws_stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    shared: &Arc<ConnectionShared>,
    settings: &ConnectSettings,
    events: &Sender<StreamEvent>,
    stop_rx: &mut watch::Receiver<bool>,
) -> bool {
    let key = shared.key;
    let (mut write, mut read) = ws_stream.split();

    // Auth handshake is the first client frame after every (re)open.
    let token = settings.tokens.token().await;
    let auth = serde_json::json!({ "token": token }).to_string();
    if let Err(e) = write.send(Message::Text(auth)).await {
        warn!("Failed to send auth handshake for {}: {}", key, e);
        return false;
    }
    shared.metrics.increment_sent();
    debug!("Sent auth handshake for {}", key);

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        let payload = match msg {
                            Message::Text(text) => text.into_bytes(),
                            Message::Binary(data) => data,
                            Message::Close(_) => {
                                debug!("Remote closed {}", key);
                                return false;
                            }
                            // Pings/pongs are handled by the transport
                            _ => continue,
                        };

                        match codec::classify(payload) {
                            Inbound::ControlError(message) => {
                                shared.metrics.increment_control_errors();
                                warn!("Stream error on {}: {}", key, message);
                                let _ = events.send(StreamEvent::StreamError { key, message });
                            }
                            Inbound::Frame(frame) => {
                                shared.metrics.increment_frames();
                                shared.sinks.dispatch(&frame);
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Transport error on {}: {}", key, e);
                        return false;
                    }
                    None => {
                        debug!("Stream ended for {}", key);
                        return false;
                    }
                }
            }
            _ = stop_rx.changed() => {
                let _ = write.close().await;
                return true;
            }
        }
    }
}
