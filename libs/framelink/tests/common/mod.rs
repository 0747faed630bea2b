//! Common test utilities for framelink integration tests
//!
//! Provides a mock frame server: a real websocket endpoint that records
//! connections and handshakes, pushes frames and control messages, and can
//! drop its clients on demand.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::sync::Notify;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

enum ServerCmd {
    Send(Message),
    Drop,
}

#[derive(Default)]
struct ServerState {
    accepted: AtomicUsize,
    active: AtomicUsize,
    auth_frames: Mutex<Vec<String>>,
    clients: Mutex<Vec<UnboundedSender<ServerCmd>>>,
}

/// A mock frame server for testing
pub struct FrameServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    state: Arc<ServerState>,
}

impl FrameServer {
    /// Create and start a new mock frame server
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let state = Arc::new(ServerState::default());

        let shutdown_accept = Arc::clone(&shutdown);
        let state_accept = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let state = Arc::clone(&state_accept);
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, state).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_accept.notified() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown,
            state,
        }
    }

    async fn handle_connection(stream: TcpStream, state: Arc<ServerState>) {
        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        state.accepted.fetch_add(1, Ordering::SeqCst);
        state.active.fetch_add(1, Ordering::SeqCst);

        let (cmd_tx, mut cmd_rx) = unbounded_channel();
        state.clients.lock().push(cmd_tx);

        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            // The only text the client sends is its auth frame
                            state.auth_frames.lock().push(text);
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(ServerCmd::Send(msg)) => {
                            if write.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Some(ServerCmd::Drop) | None => break,
                    }
                }
            }
        }

        state.active.fetch_sub(1, Ordering::SeqCst);
    }

    /// Base websocket URL for this server
    pub fn ws_base(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Total connections accepted since start
    pub fn accepted(&self) -> usize {
        self.state.accepted.load(Ordering::SeqCst)
    }

    /// Connections currently open
    pub fn active(&self) -> usize {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Auth frames received, in arrival order
    pub fn auth_frames(&self) -> Vec<String> {
        self.state.auth_frames.lock().clone()
    }

    /// Push one binary frame to every connected client
    pub fn broadcast_binary(&self, frame: Vec<u8>) -> usize {
        self.broadcast(Message::Binary(frame))
    }

    /// Push one text message to every connected client
    pub fn broadcast_text(&self, text: &str) -> usize {
        self.broadcast(Message::Text(text.to_string()))
    }

    fn broadcast(&self, msg: Message) -> usize {
        let mut clients = self.state.clients.lock();
        clients.retain(|tx| tx.send(ServerCmd::Send(msg.clone())).is_ok());
        clients.len()
    }

    /// Drop every connected client without a close handshake
    pub fn drop_all(&self) {
        let mut clients = self.state.clients.lock();
        for tx in clients.drain(..) {
            let _ = tx.send(ServerCmd::Drop);
        }
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for FrameServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A ws base that refuses every connection (bound, then released)
pub async fn unreachable_ws_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{}", addr)
}

/// A tiny JPEG-looking payload
pub fn jpeg_frame(seed: u8) -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, seed, 0x10, 0x4A, 0x46]
}

/// Poll `cond` every 10 ms until it holds or `timeout` elapses
pub async fn wait_for<F>(cond: F, timeout: Duration) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
