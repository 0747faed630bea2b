//! Monitor-task control plane
//!
//! The stream layer only manages sockets; the remote task producing the
//! frames is started and stopped over REST, and that ordering matters:
//! `start_task` must succeed before opening the monitoring stream, and
//! `stop_task` before treating [`stop_monitoring`] as the terminal
//! teardown.
//!
//! [`stop_monitoring`]: crate::registry::StreamRegistry::stop_monitoring

pub mod client;
pub mod types;

pub use client::{ControlClient, ControlError};
pub use types::MonitorTask;
