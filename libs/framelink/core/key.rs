use std::fmt;

/// The kind of live stream a key refers to
///
/// Each kind maps to one URL path segment on the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Frames produced by a running monitor task
    MonitorTask,
    /// Raw preview frames straight from a device's camera
    DevicePreview,
}

impl StreamKind {
    fn segment(self) -> &'static str {
        match self {
            StreamKind::MonitorTask => "monitor-tasks",
            StreamKind::DevicePreview => "device-preview",
        }
    }
}

/// Unique identity of one logical live stream
///
/// Derived from a stream kind and a numeric resource id; stable for the
/// lifetime of the referenced resource. The registry deduplicates sockets
/// on this identity alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamKey {
    kind: StreamKind,
    id: i64,
}

impl StreamKey {
    /// Key for the live output of monitor task `id`
    pub fn monitor_task(id: i64) -> Self {
        Self {
            kind: StreamKind::MonitorTask,
            id,
        }
    }

    /// Key for the camera preview of device `id`
    pub fn device_preview(id: i64) -> Self {
        Self {
            kind: StreamKind::DevicePreview,
            id,
        }
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Wire path for this stream, e.g. `/ws/monitor-tasks/7`
    pub fn path(&self) -> String {
        format!("/ws/{}/{}", self.kind.segment(), self.id)
    }

    /// Full socket URL under `ws_base` (trailing slash tolerated)
    pub fn url(&self, ws_base: &str) -> String {
        format!("{}{}", ws_base.trim_end_matches('/'), self.path())
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
