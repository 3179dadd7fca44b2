//! Capture configuration

use std::time::Duration;

/// Decoded output resolution requested from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const HD: Resolution = Resolution {
        width: 1280,
        height: 720,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::HD
    }
}

/// Frame source configuration options
#[derive(Debug, Clone)]
pub struct FrameSourceConfig {
    /// Video source address (RTSP/RTSPS URL, file path, anything ffmpeg opens)
    pub url: String,

    /// Delay between a failed open/read and the next connection attempt
    pub reconnect_delay: Duration,

    /// Output resolution of decoded frames
    pub resolution: Resolution,

    /// Transport read timeout passed to the decoder
    ///
    /// A source that stalls without closing its connection fails after this
    /// long and is reopened. `None` waits forever.
    pub read_timeout: Option<Duration>,

    /// ffmpeg executable
    pub ffmpeg_path: String,

    /// Name of the worker thread
    pub thread_name: String,
}

impl Default for FrameSourceConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            reconnect_delay: Duration::from_secs(1),
            resolution: Resolution::default(),
            read_timeout: Some(Duration::from_secs(30)),
            ffmpeg_path: "ffmpeg".to_string(),
            thread_name: "frame-source".to_string(),
        }
    }
}

impl FrameSourceConfig {
    /// Create a config for the given source URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the reconnect backoff
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the decoded output resolution
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = Resolution::new(width, height);
        self
    }

    /// Set the stalled-source read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Never time out reads from the source
    pub fn disable_read_timeout(mut self) -> Self {
        self.read_timeout = None;
        self
    }

    /// Use a specific ffmpeg binary
    pub fn ffmpeg_path(mut self, path: impl Into<String>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }
}
