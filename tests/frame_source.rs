//! Frame source behaviour through the public opener seam

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;

use mazecast::capture::{
    CaptureError, Frame, FrameReader, FrameSource, FrameSourceConfig, LatestFrameSlot,
    StreamOpener,
};

/// A camera that can be unplugged and plugged back in
#[derive(Clone)]
struct Camera {
    online: Arc<AtomicBool>,
}

struct CameraFeed {
    online: Arc<AtomicBool>,
    sequence: u32,
}

impl StreamOpener for Camera {
    type Reader = CameraFeed;

    fn open(&mut self, url: &str) -> Result<CameraFeed, CaptureError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(CaptureError::OpenFailed {
                url: url.to_string(),
                reason: "no route to host".into(),
            });
        }
        Ok(CameraFeed {
            online: Arc::clone(&self.online),
            sequence: 0,
        })
    }
}

impl FrameReader for CameraFeed {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        thread::sleep(Duration::from_millis(5));
        if !self.online.load(Ordering::SeqCst) {
            return Err(CaptureError::StreamEnded);
        }
        self.sequence += 1;
        Ok(Frame::bgr(Bytes::from(self.sequence.to_le_bytes().to_vec()), 1, 1))
    }
}

#[test]
fn newest_of_many_pushes_wins() {
    let slot = LatestFrameSlot::new();

    for n in 0u8..10 {
        slot.push(Frame::bgr(Bytes::from(vec![n; 3]), 1, 1));
    }

    assert_eq!(slot.pop().data[0], 9);
}

#[test]
fn pop_blocks_until_first_push() {
    let slot = Arc::new(LatestFrameSlot::new());
    let started = Instant::now();

    let consumer = {
        let slot = Arc::clone(&slot);
        thread::spawn(move || slot.pop())
    };

    thread::sleep(Duration::from_millis(200));
    assert!(!consumer.is_finished());

    slot.push(Frame::bgr(Bytes::from_static(&[1, 2, 3]), 1, 1));
    let frame = consumer.join().unwrap();

    assert_eq!(&frame.data[..], &[1, 2, 3]);
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[test]
fn source_recovers_after_outage() {
    let online = Arc::new(AtomicBool::new(true));
    let camera = Camera {
        online: Arc::clone(&online),
    };
    let config = FrameSourceConfig::new("rtsp://camera.test/live")
        .reconnect_delay(Duration::from_millis(100));
    let mut source = FrameSource::with_opener(config, camera);
    source.start().unwrap();

    assert!(source.pop_frame_timeout(Duration::from_secs(5)).is_some());

    online.store(false, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(50));
    // Drain whatever was captured before the outage
    source.pop_frame_timeout(Duration::from_millis(10));
    assert!(source.pop_frame_timeout(Duration::from_millis(300)).is_none());

    online.store(true, Ordering::SeqCst);
    assert!(source.pop_frame_timeout(Duration::from_secs(5)).is_some());
    assert!(source.is_running());
    assert!(source.stats().reconnects >= 1);

    source.stop();
}
