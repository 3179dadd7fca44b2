//! Frame source and capture worker

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::config::FrameSourceConfig;
use super::error::CaptureError;
use super::ffmpeg::FfmpegOpener;
use super::frame::Frame;
use super::slot::LatestFrameSlot;
use crate::stats::{CaptureStats, CaptureStatsSnapshot};

/// An open video stream that yields decoded frames
pub trait FrameReader: Send {
    /// Block until the next frame is decoded
    fn read_frame(&mut self) -> Result<Frame, CaptureError>;
}

/// Opens video streams for the capture worker
///
/// The worker calls `open` again after every failure, so implementations
/// must be reusable.
pub trait StreamOpener: Send + 'static {
    type Reader: FrameReader;

    fn open(&mut self, url: &str) -> Result<Self::Reader, CaptureError>;
}

/// Continuously reconnecting video source with a latest-frame buffer
///
/// # Example
/// ```no_run
/// use mazecast::capture::{FrameSource, FrameSourceConfig};
///
/// # fn example() -> Result<(), mazecast::capture::CaptureError> {
/// let mut source = FrameSource::new(FrameSourceConfig::new("rtsp://10.1.0.1:7447/cam"));
/// source.start()?;
///
/// loop {
///     let frame = source.pop_frame();
///     println!("Frame: {:?}", frame.shape());
/// }
/// # }
/// ```
pub struct FrameSource<O: StreamOpener = FfmpegOpener> {
    config: FrameSourceConfig,
    slot: Arc<LatestFrameSlot>,
    stats: Arc<CaptureStats>,
    stop_signal: Arc<AtomicBool>,
    opener: Option<O>,
    worker: Option<JoinHandle<()>>,
}

impl FrameSource<FfmpegOpener> {
    /// Create a source that decodes through ffmpeg
    pub fn new(config: FrameSourceConfig) -> Self {
        let opener = FfmpegOpener::new(&config);
        Self::with_opener(config, opener)
    }
}

impl<O: StreamOpener> FrameSource<O> {
    /// Create a source with a custom stream opener
    pub fn with_opener(config: FrameSourceConfig, opener: O) -> Self {
        Self {
            config,
            slot: Arc::new(LatestFrameSlot::new()),
            stats: Arc::new(CaptureStats::new()),
            stop_signal: Arc::new(AtomicBool::new(false)),
            opener: Some(opener),
            worker: None,
        }
    }

    /// Spawn the capture worker
    ///
    /// The worker runs until `stop()` is called, reconnecting after every
    /// open or read failure.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        let opener = self.opener.take().ok_or(CaptureError::AlreadyStarted)?;

        let worker = CaptureWorker {
            url: self.config.url.clone(),
            reconnect_delay: self.config.reconnect_delay,
            opener,
            slot: Arc::clone(&self.slot),
            stats: Arc::clone(&self.stats),
            stop_signal: Arc::clone(&self.stop_signal),
        };

        let handle = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || worker.run())
            .map_err(CaptureError::SpawnFailed)?;

        self.worker = Some(handle);
        Ok(())
    }

    /// Wait for the freshest frame and take it
    ///
    /// Blocks for as long as the source is down. Frames pushed since the
    /// previous call, other than the newest, are never seen.
    pub fn pop_frame(&self) -> Frame {
        self.slot.pop()
    }

    /// Like `pop_frame`, giving up after `timeout`
    pub fn pop_frame_timeout(&self, timeout: Duration) -> Option<Frame> {
        self.slot.pop_timeout(timeout)
    }

    /// Ask the worker to exit at its next frame or backoff boundary
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if the worker thread is alive
    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Capture counters
    pub fn stats(&self) -> CaptureStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &FrameSourceConfig {
        &self.config
    }
}

impl<O: StreamOpener> Drop for FrameSource<O> {
    fn drop(&mut self) {
        // A blocked read can't be interrupted, so don't join here.
        self.stop();
    }
}

struct CaptureWorker<O: StreamOpener> {
    url: String,
    reconnect_delay: Duration,
    opener: O,
    slot: Arc<LatestFrameSlot>,
    stats: Arc<CaptureStats>,
    stop_signal: Arc<AtomicBool>,
}

impl<O: StreamOpener> CaptureWorker<O> {
    fn run(mut self) {
        tracing::info!(url = %self.url, "Frame grabber started");

        while !self.stopped() {
            if let Err(e) = self.capture() {
                tracing::warn!(
                    url = %self.url,
                    error = %e,
                    retry_in = ?self.reconnect_delay,
                    "Frame capture failed"
                );
                self.stats.record_reconnect();
                thread::sleep(self.reconnect_delay);
            }
        }

        tracing::info!(url = %self.url, "Frame grabber stopped");
    }

    /// Read frames into the slot until the stream fails or a stop is requested
    fn capture(&mut self) -> Result<(), CaptureError> {
        let mut reader = self.opener.open(&self.url)?;
        tracing::info!(url = %self.url, "Stream opened");

        while !self.stopped() {
            let frame = reader.read_frame()?;
            let evicted = self.slot.push(frame);
            self.stats.record_frame(evicted);
        }

        Ok(())
    }

    fn stopped(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::time::Instant;

    use bytes::Bytes;

    use super::*;

    /// Fails the first `failures` opens, then yields readers that produce
    /// `frames_per_open` frames before erroring (or forever if `None`)
    struct ScriptedOpener {
        failures: u32,
        frames_per_open: Option<u32>,
        opens: Arc<AtomicU32>,
    }

    impl ScriptedOpener {
        fn new(failures: u32, frames_per_open: Option<u32>) -> (Self, Arc<AtomicU32>) {
            let opens = Arc::new(AtomicU32::new(0));
            let opener = Self {
                failures,
                frames_per_open,
                opens: Arc::clone(&opens),
            };
            (opener, opens)
        }
    }

    impl StreamOpener for ScriptedOpener {
        type Reader = CountingReader;

        fn open(&mut self, url: &str) -> Result<CountingReader, CaptureError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if self.failures > 0 {
                self.failures -= 1;
                return Err(CaptureError::OpenFailed {
                    url: url.to_string(),
                    reason: "connection refused".into(),
                });
            }
            Ok(CountingReader {
                produced: 0,
                limit: self.frames_per_open,
            })
        }
    }

    struct CountingReader {
        produced: u32,
        limit: Option<u32>,
    }

    impl FrameReader for CountingReader {
        fn read_frame(&mut self) -> Result<Frame, CaptureError> {
            if self.limit.is_some_and(|limit| self.produced >= limit) {
                return Err(CaptureError::StreamEnded);
            }
            thread::sleep(Duration::from_millis(2));
            self.produced += 1;
            Ok(Frame::bgr(Bytes::from(vec![self.produced as u8; 3]), 1, 1))
        }
    }

    fn config(delay: Duration) -> FrameSourceConfig {
        FrameSourceConfig::new("rtsp://camera.test/stream").reconnect_delay(delay)
    }

    #[test]
    fn test_open_failure_retried_after_backoff() {
        let (opener, opens) = ScriptedOpener::new(1, None);
        let mut source = FrameSource::with_opener(config(Duration::from_secs(1)), opener);

        let started = Instant::now();
        source.start().unwrap();

        let frame = source.pop_frame_timeout(Duration::from_secs(5));
        assert!(frame.is_some());
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(opens.load(Ordering::SeqCst), 2);
        assert!(source.is_running());
        assert_eq!(source.stats().reconnects, 1);

        source.stop();
    }

    #[test]
    fn test_worker_survives_repeated_failures() {
        let (opener, opens) = ScriptedOpener::new(5, None);
        let mut source = FrameSource::with_opener(config(Duration::from_millis(10)), opener);
        source.start().unwrap();

        assert!(source.pop_frame_timeout(Duration::from_secs(5)).is_some());
        assert_eq!(opens.load(Ordering::SeqCst), 6);
        assert!(source.is_running());

        source.stop();
    }

    #[test]
    fn test_read_failure_reopens_stream() {
        let (opener, opens) = ScriptedOpener::new(0, Some(3));
        let mut source = FrameSource::with_opener(config(Duration::from_millis(10)), opener);
        source.start().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while opens.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            source.pop_frame_timeout(Duration::from_millis(50));
        }

        assert!(opens.load(Ordering::SeqCst) >= 3);
        assert!(source.stats().reconnects >= 2);
        assert!(source.is_running());

        source.stop();
    }

    #[test]
    fn test_no_frame_during_outage() {
        let (opener, _opens) = ScriptedOpener::new(u32::MAX, None);
        let mut source = FrameSource::with_opener(config(Duration::from_millis(10)), opener);
        source.start().unwrap();

        assert!(source.pop_frame_timeout(Duration::from_millis(200)).is_none());
        assert_eq!(source.stats().frames_captured, 0);

        source.stop();
    }

    #[test]
    fn test_slow_consumer_skips_frames() {
        let (opener, _opens) = ScriptedOpener::new(0, None);
        let mut source = FrameSource::with_opener(config(Duration::from_millis(10)), opener);
        source.start().unwrap();

        let first = source.pop_frame_timeout(Duration::from_secs(5)).unwrap();
        thread::sleep(Duration::from_millis(50));
        let second = source.pop_frame_timeout(Duration::from_secs(5)).unwrap();

        assert!(second.data[0] > first.data[0] + 1);
        assert!(source.stats().frames_skipped > 0);

        source.stop();
    }

    #[test]
    fn test_pop_frame_timeout_max_waits_for_frame() {
        let (opener, _opens) = ScriptedOpener::new(0, None);
        let mut source = FrameSource::with_opener(config(Duration::from_millis(10)), opener);
        source.start().unwrap();

        assert!(source.pop_frame_timeout(Duration::MAX).is_some());

        source.stop();
    }

    #[test]
    fn test_start_twice() {
        let (opener, _opens) = ScriptedOpener::new(0, None);
        let mut source = FrameSource::with_opener(config(Duration::from_millis(10)), opener);

        source.start().unwrap();
        assert!(matches!(source.start(), Err(CaptureError::AlreadyStarted)));

        source.stop();
    }

    #[test]
    fn test_stop_ends_worker() {
        let (opener, _opens) = ScriptedOpener::new(0, None);
        let mut source = FrameSource::with_opener(config(Duration::from_millis(10)), opener);
        source.start().unwrap();
        source.pop_frame_timeout(Duration::from_secs(5)).unwrap();

        source.stop();

        let deadline = Instant::now() + Duration::from_secs(5);
        while source.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!source.is_running());
    }
}
