//! Per-key stream connection registry

pub mod registry;

pub use registry::{StreamHandle, StreamRegistry};
