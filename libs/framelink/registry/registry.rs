use crate::core::connection::{
    ConnectSettings, Connection, ConnectionMode, StreamEvent,
};
use crate::core::connection_state::{ConnectionState, StreamMetrics};
use crate::core::key::StreamKey;
use crate::core::multiplexer::SinkId;
use crate::core::config::StreamConfig;
use crate::traits::{ExponentialBackoff, FrameSink, NoToken, TokenProvider};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info};

/// Opaque detach token returned by [`StreamRegistry::start_monitoring`] and
/// [`StreamRegistry::subscribe`]
///
/// Releasing a handle detaches exactly one sink and never closes the
/// underlying socket. Handles remember the connection generation they were
/// issued against, so releasing a stale handle after the key was torn down
/// and recreated is a no-op.
#[derive(Debug, Clone)]
pub struct StreamHandle {
    key: StreamKey,
    sink: SinkId,
    epoch: u64,
}

impl StreamHandle {
    pub fn key(&self) -> StreamKey {
        self.key
    }
}

struct RegistryInner {
    config: StreamConfig,
    tokens: Arc<dyn TokenProvider>,
    connections: RwLock<HashMap<StreamKey, Connection>>,
    epochs: AtomicU64,
    event_tx: Sender<StreamEvent>,
}

/// Process map from stream key to live connection
///
/// Owns every socket the dashboard has open and guarantees at most one per
/// key: a second caller asking for a stream another viewer already opened
/// only registers an additional sink on the existing connection.
///
/// All operations are synchronous and non-blocking, and none of them
/// returns an error — runtime failures surface as [`StreamEvent`]s on the
/// registry's event channel. Construct one registry per UI (there is no
/// global instance); it must live inside a tokio runtime, which drives the
/// connection tasks.
pub struct StreamRegistry {
    inner: Arc<RegistryInner>,
    event_rx: Receiver<StreamEvent>,
}

impl StreamRegistry {
    /// Create a registry for unauthenticated streams
    pub fn new(config: StreamConfig) -> Self {
        Self::with_token_provider(config, Arc::new(NoToken))
    }

    /// Create a registry whose connections handshake with `tokens`
    pub fn with_token_provider(config: StreamConfig, tokens: Arc<dyn TokenProvider>) -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            inner: Arc::new(RegistryInner {
                config,
                tokens,
                connections: RwLock::new(HashMap::new()),
                epochs: AtomicU64::new(0),
                event_tx,
            }),
            event_rx,
        }
    }

    /// Attach `sink` to the live output of monitor task `monitor_id`
    ///
    /// Opens the socket on first use; later callers share it. Monitoring
    /// connections reconnect indefinitely until [`stop_monitoring`] — the
    /// returned handle only ever detaches this one sink.
    ///
    /// The caller is expected to have started the remote task
    /// (`POST /monitor-tasks/{id}/start`) before asking for its stream.
    ///
    /// [`stop_monitoring`]: StreamRegistry::stop_monitoring
    pub fn start_monitoring(
        &self,
        monitor_id: i64,
        sink: impl FrameSink + 'static,
    ) -> StreamHandle {
        self.attach(
            StreamKey::monitor_task(monitor_id),
            ConnectionMode::Monitor,
            Arc::new(sink),
        )
    }

    /// Tear down the monitoring stream for `monitor_id`
    ///
    /// Cancels any pending reconnect, closes the socket (or aborts an
    /// in-flight connect) and removes the registry entry. Idempotent: a
    /// second call, or a call for an id that was never started, is a no-op.
    pub fn stop_monitoring(&self, monitor_id: i64) {
        self.close(StreamKey::monitor_task(monitor_id));
    }

    /// Attach `sink` to an arbitrary stream key in bounded-retry mode
    ///
    /// The connection persists even with zero sinks; it is removed only
    /// after exhausting its retry budget or via [`close`].
    ///
    /// [`close`]: StreamRegistry::close
    pub fn subscribe(&self, key: StreamKey, sink: impl FrameSink + 'static) -> StreamHandle {
        self.attach(key, ConnectionMode::Subscribe, Arc::new(sink))
    }

    /// Detach the sink behind `handle`
    ///
    /// Never closes the socket, even for the last sink of a monitoring
    /// stream. Idempotent and safe after the connection is gone.
    pub fn release(&self, handle: &StreamHandle) {
        let connections = self.inner.connections.read();
        if let Some(conn) = connections.get(&handle.key) {
            if conn.shared.epoch == handle.epoch {
                conn.shared.sinks.remove(handle.sink);
            }
        }
    }

    /// Tear down the connection for `key`, whatever its mode
    ///
    /// The explicit close path for subscribe-mode streams whose callers
    /// released every sink. Idempotent.
    pub fn close(&self, key: StreamKey) {
        let removed = self.inner.connections.write().remove(&key);
        if let Some(conn) = removed {
            conn.shared.halt();
            info!("Closed stream {}", key);
        }
    }

    /// Tear down every connection
    pub fn shutdown(&self) {
        let connections = {
            let mut map = self.inner.connections.write();
            std::mem::take(&mut *map)
        };
        for (key, conn) in connections {
            debug!("Shutting down stream {}", key);
            conn.shared.halt();
        }
    }

    /// Try to receive a stream event (non-blocking)
    pub fn try_recv_event(&self) -> Option<StreamEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive a stream event (blocking; do not call from async code)
    pub fn recv_event(&self) -> Result<StreamEvent, crossbeam_channel::RecvError> {
        self.event_rx.recv()
    }

    /// Receive a stream event, waiting up to `timeout`
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<StreamEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Drain all currently queued stream events
    pub fn collect_events(&self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv_event() {
            events.push(event);
        }
        events
    }

    /// Check whether a connection exists for `key`
    pub fn has_stream(&self, key: StreamKey) -> bool {
        self.inner.connections.read().contains_key(&key)
    }

    /// Number of live connections
    pub fn stream_count(&self) -> usize {
        self.inner.connections.read().len()
    }

    /// Keys of all live connections
    pub fn stream_keys(&self) -> Vec<StreamKey> {
        self.inner.connections.read().keys().copied().collect()
    }

    /// Current lifecycle state of the connection for `key`
    pub fn stream_state(&self, key: StreamKey) -> Option<ConnectionState> {
        self.inner
            .connections
            .read()
            .get(&key)
            .map(|conn| conn.shared.state.get())
    }

    /// Number of sinks attached to the connection for `key`
    pub fn sink_count(&self, key: StreamKey) -> Option<usize> {
        self.inner
            .connections
            .read()
            .get(&key)
            .map(|conn| conn.shared.sinks.len())
    }

    /// Counter snapshot for the connection for `key`
    pub fn metrics(&self, key: StreamKey) -> Option<StreamMetrics> {
        self.inner.connections.read().get(&key).map(|conn| {
            let shared = &conn.shared;
            StreamMetrics {
                messages_sent: shared.metrics.messages_sent(),
                frames_received: shared.metrics.frames_received(),
                control_errors: shared.metrics.control_errors(),
                reconnects: shared.metrics.reconnects(),
                state: shared.state.get(),
            }
        })
    }

    /// Attach a sink, creating the connection if the key is new
    ///
    /// Exists-check and insert happen under one write section, so two
    /// concurrent callers for the same key observe a single socket.
    fn attach(
        &self,
        key: StreamKey,
        mode: ConnectionMode,
        sink: Arc<dyn FrameSink>,
    ) -> StreamHandle {
        let mut connections = self.inner.connections.write();

        if let Some(conn) = connections.get(&key) {
            let sink_id = conn.shared.sinks.add(sink);
            debug!("Attached sink to existing stream {}", key);
            return StreamHandle {
                key,
                sink: sink_id,
                epoch: conn.shared.epoch,
            };
        }

        let epoch = self.inner.epochs.fetch_add(1, Ordering::Relaxed);
        let conn = self.spawn_connection(key, mode, epoch);
        let sink_id = conn.shared.sinks.add(sink);
        connections.insert(key, conn);
        info!("Opened stream {} ({:?} mode)", key, mode);

        StreamHandle {
            key,
            sink: sink_id,
            epoch,
        }
    }

    fn spawn_connection(&self, key: StreamKey, mode: ConnectionMode, epoch: u64) -> Connection {
        let config = &self.inner.config;
        let max_attempts = match mode {
            ConnectionMode::Monitor => None,
            ConnectionMode::Subscribe => Some(config.max_retries),
        };
        let settings = ConnectSettings {
            url: key.url(&config.ws_base),
            policy: Box::new(ExponentialBackoff::new(
                config.backoff_base,
                config.backoff_cap,
                max_attempts,
            )),
            tokens: Arc::clone(&self.inner.tokens),
        };

        let on_terminal = {
            let inner: Weak<RegistryInner> = Arc::downgrade(&self.inner);
            move || {
                if let Some(inner) = inner.upgrade() {
                    let mut connections = inner.connections.write();
                    // Only drop the entry this task belongs to; the key may
                    // have been recreated under a newer epoch.
                    let is_current = connections
                        .get(&key)
                        .map(|conn| conn.shared.epoch == epoch)
                        .unwrap_or(false);
                    if is_current {
                        connections.remove(&key);
                        debug!("Removed exhausted stream {}", key);
                    }
                }
            }
        };

        Connection::spawn(
            key,
            mode,
            epoch,
            settings,
            self.inner.event_tx.clone(),
            on_terminal,
        )
    }
}
