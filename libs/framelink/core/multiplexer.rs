//! Frame fan-out
//!
//! One multiplexer per connection holds the set of interested consumers and
//! hands every inbound frame to all of them. Sinks are invoked in
//! registration order with no lock held, so a sink is free to call back into
//! the registry (release, subscribe, stop) mid-fan-out; such mutations only
//! affect subsequent frames.

use crate::traits::FrameSink;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque handle identifying one registered sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(u64);

/// Ordered set of frame sinks for one connection
pub struct FrameMultiplexer {
    sinks: RwLock<Vec<(SinkId, Arc<dyn FrameSink>)>>,
    next_id: AtomicU64,
}

impl FrameMultiplexer {
    pub fn new() -> Self {
        Self {
            sinks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a sink; later frames reach it after all earlier sinks
    pub fn add(&self, sink: Arc<dyn FrameSink>) -> SinkId {
        let id = SinkId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sinks.write().push((id, sink));
        id
    }

    /// Detach a sink; idempotent, returns whether anything was removed
    pub fn remove(&self, id: SinkId) -> bool {
        let mut sinks = self.sinks.write();
        let before = sinks.len();
        sinks.retain(|(sink_id, _)| *sink_id != id);
        sinks.len() != before
    }

    /// Fan one frame out to every currently-registered sink
    ///
    /// An empty set simply discards the frame; nothing is buffered.
    pub fn dispatch(&self, frame: &[u8]) {
        // Snapshot under the lock, invoke without it.
        let snapshot: Vec<Arc<dyn FrameSink>> = self
            .sinks
            .read()
            .iter()
            .map(|(_, sink)| Arc::clone(sink))
            .collect();

        for sink in snapshot {
            sink.on_frame(frame);
        }
    }

    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }
}

impl Default for FrameMultiplexer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recording_sink(log: Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> Arc<dyn FrameSink> {
        Arc::new(move |_frame: &[u8]| log.lock().push(tag))
    }

    #[test]
    fn dispatch_runs_in_registration_order() {
        let mux = FrameMultiplexer::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        mux.add(recording_sink(Arc::clone(&log), "first"));
        mux.add(recording_sink(Arc::clone(&log), "second"));
        mux.add(recording_sink(Arc::clone(&log), "third"));

        mux.dispatch(&[0xFF, 0xD8]);
        assert_eq!(*log.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn remove_is_idempotent() {
        let mux = FrameMultiplexer::new();
        let id = mux.add(Arc::new(|_: &[u8]| {}));

        assert!(mux.remove(id));
        assert!(!mux.remove(id));
        assert!(mux.is_empty());
    }

    #[test]
    fn empty_set_discards_frames() {
        let mux = FrameMultiplexer::new();
        mux.dispatch(&[1, 2, 3]);
        assert_eq!(mux.len(), 0);
    }

    #[test]
    fn removed_sink_stops_receiving() {
        let mux = FrameMultiplexer::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let keep = recording_sink(Arc::clone(&log), "keep");
        let drop = recording_sink(Arc::clone(&log), "drop");
        mux.add(keep);
        let id = mux.add(drop);

        mux.dispatch(&[0]);
        mux.remove(id);
        mux.dispatch(&[0]);

        assert_eq!(*log.lock(), vec!["keep", "drop", "keep"]);
    }

    #[test]
    fn sink_may_mutate_mid_dispatch() {
        let mux = Arc::new(FrameMultiplexer::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let mux_inner = Arc::clone(&mux);
        let log_inner = Arc::clone(&log);
        mux.add(Arc::new(move |_: &[u8]| {
            log_inner.lock().push("adder");
            let log_late = Arc::clone(&log_inner);
            mux_inner.add(Arc::new(move |_: &[u8]| log_late.lock().push("late")));
        }));

        // The sink added mid-dispatch only sees the next frame.
        mux.dispatch(&[0]);
        assert_eq!(*log.lock(), vec!["adder"]);

        log.lock().clear();
        mux.dispatch(&[0]);
        assert_eq!(*log.lock(), vec!["adder", "late"]);
    }
}
