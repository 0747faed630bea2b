//! Lock-free connection state and counters
//!
//! Socket-event tasks and caller threads both observe connection state, so
//! it lives in atomics rather than behind a lock.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

/// Lifecycle state of one stream connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// First connection attempt in flight
    Connecting = 0,
    /// Socket open, auth sent, frames flowing
    Open = 1,
    /// Dropped; a retry is scheduled or in flight
    Reconnecting = 2,
    /// Explicit stop requested, socket closing
    Closing = 3,
    /// Terminal; the task has exited
    Closed = 4,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Open,
            2 => ConnectionState::Reconnecting,
            3 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

/// Atomic wrapper around [`ConnectionState`]
pub struct AtomicConnectionState(AtomicU8);

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Connecting or reconnecting
    #[inline]
    pub fn is_connecting(&self) -> bool {
        matches!(
            self.get(),
            ConnectionState::Connecting | ConnectionState::Reconnecting
        )
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.get() == ConnectionState::Open
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.get() == ConnectionState::Closed
    }
}

/// Atomic per-connection counters
#[derive(Default)]
pub struct AtomicMetrics {
    messages_sent: AtomicU64,
    frames_received: AtomicU64,
    control_errors: AtomicU64,
    reconnects: AtomicU64,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_frames(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_control_errors(&self) {
        self.control_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_reconnects(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    pub fn control_errors(&self) -> u64 {
        self.control_errors.load(Ordering::Relaxed)
    }

    pub fn reconnects(&self) -> u64 {
        self.reconnects.load(Ordering::Relaxed)
    }
}

/// Point-in-time snapshot of one connection's counters and state
#[derive(Debug, Clone)]
pub struct StreamMetrics {
    pub messages_sent: u64,
    pub frames_received: u64,
    pub control_errors: u64,
    pub reconnects: u64,
    pub state: ConnectionState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_round_trips() {
        let state = AtomicConnectionState::new(ConnectionState::Connecting);
        assert!(state.is_connecting());

        state.set(ConnectionState::Open);
        assert!(state.is_open());
        assert!(!state.is_connecting());

        state.set(ConnectionState::Reconnecting);
        assert!(state.is_connecting());

        state.set(ConnectionState::Closed);
        assert!(state.is_closed());
    }

    #[test]
    fn metrics_count_independently() {
        let metrics = AtomicMetrics::new();
        metrics.increment_frames();
        metrics.increment_frames();
        metrics.increment_control_errors();
        metrics.increment_reconnects();

        assert_eq!(metrics.frames_received(), 2);
        assert_eq!(metrics.control_errors(), 1);
        assert_eq!(metrics.reconnects(), 1);
        assert_eq!(metrics.messages_sent(), 0);
    }
}
