//! Core stream machinery: keys, codec, per-connection state machine
//! and frame fan-out.

pub mod codec;
pub mod config;
pub mod connection;
pub mod connection_state;
pub mod key;
pub mod multiplexer;

// Re-export main types
pub use codec::Inbound;
pub use config::{ConfigError, StreamConfig};
pub use connection::{ConnectionMode, StreamEvent};
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState, StreamMetrics};
pub use key::{StreamKey, StreamKind};
pub use multiplexer::{FrameMultiplexer, SinkId};
