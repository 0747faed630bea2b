/// Trait for consuming decoded video frames
///
/// Each registered sink receives every frame delivered on its stream,
/// synchronously and in registration order. Implementations must not block
/// for long — they run on the connection's own task, between socket reads.
pub trait FrameSink: Send + Sync {
    /// Handle one opaque binary frame (a JPEG-encoded image)
    fn on_frame(&self, frame: &[u8]);
}

/// Closures are sinks, so UI code can pass `|frame| ...` directly
impl<F> FrameSink for F
where
    F: Fn(&[u8]) + Send + Sync,
{
    fn on_frame(&self, frame: &[u8]) {
        self(frame)
    }
}
