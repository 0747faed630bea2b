//! # Framelink
//!
//! Live-stream layer for the vision dashboard: shared WebSocket connections
//! carrying binary video frames, multiplexed to any number of on-screen
//! viewers.
//!
//! ## Features
//!
//! - **Per-key connection registry**: at most one live socket per stream key,
//!   no matter how many consumers ask for it
//! - **Two lifecycle modes**: monitoring streams reconnect forever until an
//!   explicit stop; plain subscriptions give up after a bounded retry budget
//! - **Exponential-backoff reconnection**: pluggable policies, capped delays
//! - **Synchronous fan-out**: every inbound frame reaches every registered
//!   sink, in registration order, without copying the socket
//! - **Control/data demux**: one wire channel carries both JPEG frames and
//!   structured error signals

pub mod traits;
pub mod core;
pub mod registry;
pub mod control;

// Re-export all traits
pub use traits::*;

// Re-export core stream machinery
pub use core::{
    codec, config, connection, connection_state, key, multiplexer,
    codec::Inbound,
    config::{ConfigError, StreamConfig},
    connection::{ConnectionMode, StreamEvent},
    connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState, StreamMetrics},
    key::{StreamKey, StreamKind},
    multiplexer::{FrameMultiplexer, SinkId},
};

// Re-export registry
pub use registry::{StreamHandle, StreamRegistry};

// Re-export the monitor-task control client
pub use control::{ControlClient, ControlError, MonitorTask};

/// Type alias for Result with FramelinkError
pub type Result<T> = std::result::Result<T, traits::FramelinkError>;
