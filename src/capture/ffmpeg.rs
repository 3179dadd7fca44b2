//! ffmpeg-backed stream opener
//!
//! Spawns one ffmpeg process per connection attempt and reads packed BGR
//! frames off its stdout. Low-latency flags are passed so neither the
//! demuxer nor the decoder queues stale frames.

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread;
use std::time::Duration;

use bytes::{Bytes, BytesMut};

use super::config::{FrameSourceConfig, Resolution};
use super::error::CaptureError;
use super::frame::Frame;
use super::source::{FrameReader, StreamOpener};

const BGR_CHANNELS: u8 = 3;

/// Opens video sources through an ffmpeg subprocess
#[derive(Debug, Clone)]
pub struct FfmpegOpener {
    ffmpeg_path: String,
    resolution: Resolution,
    read_timeout: Option<Duration>,
}

impl FfmpegOpener {
    pub fn new(config: &FrameSourceConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            resolution: config.resolution,
            read_timeout: config.read_timeout,
        }
    }

    /// Command-line arguments for decoding `url` to raw BGR on stdout
    pub fn args(&self, url: &str) -> Vec<String> {
        let size = format!("{}x{}", self.resolution.width, self.resolution.height);
        let timeout_us = self
            .read_timeout
            .map(|t| u64::try_from(t.as_micros()).unwrap_or(u64::MAX).to_string());
        let is_rtsp = url.starts_with("rtsp://") || url.starts_with("rtsps://");
        let mut args = vec!["-hide_banner", "-nostdin", "-loglevel", "error"];

        if is_rtsp {
            // UDP transport corrupts frames on lossy links
            args.extend(["-rtsp_transport", "tcp"]);
        }

        // Stalled sources must fail the read, otherwise the worker never reconnects
        if let Some(timeout_us) = timeout_us.as_deref() {
            let flag = if is_rtsp { "-timeout" } else { "-rw_timeout" };
            args.extend([flag, timeout_us]);
        }

        args.extend(["-fflags", "nobuffer", "-flags", "low_delay", "-i", url]);
        args.extend(["-an", "-f", "rawvideo", "-pix_fmt", "bgr24", "-s", &size, "pipe:1"]);

        args.into_iter().map(String::from).collect()
    }
}

impl StreamOpener for FfmpegOpener {
    type Reader = FfmpegReader;

    fn open(&mut self, url: &str) -> Result<FfmpegReader, CaptureError> {
        let mut child = Command::new(&self.ffmpeg_path)
            .args(self.args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    CaptureError::FfmpegNotFound
                } else {
                    CaptureError::SpawnFailed(e)
                }
            })?;

        if let Some(stderr) = child.stderr.take() {
            // Exits on EOF once the child is gone
            let spawned = thread::Builder::new()
                .name("ffmpeg-stderr".into())
                .spawn(move || {
                    for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                        tracing::debug!(target: "ffmpeg", "{}", line);
                    }
                });
            if let Err(e) = spawned {
                tracing::warn!(url = %url, error = %e, "Failed to spawn ffmpeg stderr reader");
            }
        }

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CaptureError::OpenFailed {
                    url: url.to_string(),
                    reason: "decoder stdout unavailable".into(),
                });
            }
        };

        Ok(FfmpegReader {
            url: url.to_string(),
            child,
            stdout,
            resolution: self.resolution,
            frames_read: 0,
        })
    }
}

/// Reads frames from a running ffmpeg process
///
/// The process is killed when the reader is dropped.
pub struct FfmpegReader {
    url: String,
    child: Child,
    stdout: ChildStdout,
    resolution: Resolution,
    frames_read: u64,
}

impl FrameReader for FfmpegReader {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let Resolution { width, height } = self.resolution;

        match read_raw_frame(&mut self.stdout, width, height) {
            Ok(data) => {
                self.frames_read += 1;
                Ok(Frame::bgr(data, width, height))
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                if self.frames_read == 0 {
                    // ffmpeg exits without output when the source can't be opened
                    let status = self.child.wait().map_err(CaptureError::ReadFailed)?;
                    Err(CaptureError::OpenFailed {
                        url: self.url.clone(),
                        reason: format!("ffmpeg exited with {}", status),
                    })
                } else {
                    Err(CaptureError::StreamEnded)
                }
            }
            Err(e) => Err(CaptureError::ReadFailed(e)),
        }
    }
}

impl Drop for FfmpegReader {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Read exactly one packed BGR frame
fn read_raw_frame<R: Read>(reader: &mut R, width: u32, height: u32) -> io::Result<Bytes> {
    let mut buf = BytesMut::zeroed(Frame::expected_len(width, height, BGR_CHANNELS));
    reader.read_exact(&mut buf)?;
    Ok(buf.freeze())
}
