//! # Framelink Traits
//!
//! Core traits and types for the framelink stream layer.
//!
//! These are the seams the dashboard plugs into:
//!
//! - **FrameSink**: consume decoded video frames
//! - **TokenProvider**: supply the bearer token for the socket handshake
//! - **ReconnectPolicy**: control reconnection spacing and budgets

pub mod auth;
pub mod backoff;
pub mod error;
pub mod sink;

// Re-export commonly used types
pub use auth::{NoToken, StaticToken, TokenProvider};
pub use backoff::{ExponentialBackoff, FixedDelay, NeverReconnect, ReconnectPolicy};
pub use error::{FramelinkError, Result};
pub use sink::FrameSink;
