//! Latest-wins single-slot frame buffer

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::frame::Frame;

/// Holds at most one unconsumed frame
///
/// `push` never waits: it evicts whatever is still in the slot and stores the
/// new frame. `pop` waits until a frame exists and takes it, so a consumer
/// slower than the producer skips intermediate frames.
#[derive(Debug, Default)]
pub struct LatestFrameSlot {
    frame: Mutex<Option<Frame>>,
    ready: Condvar,
}

impl LatestFrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a frame, discarding any unconsumed one
    ///
    /// Returns `true` if an unconsumed frame was evicted.
    pub fn push(&self, frame: Frame) -> bool {
        let evicted = {
            let mut slot = self.frame.lock();
            slot.replace(frame).is_some()
        };
        self.ready.notify_one();
        evicted
    }

    /// Wait for a frame and take it
    pub fn pop(&self) -> Frame {
        let mut slot = self.frame.lock();
        loop {
            if let Some(frame) = slot.take() {
                return frame;
            }
            self.ready.wait(&mut slot);
        }
    }

    /// Wait up to `timeout` for a frame and take it
    ///
    /// A timeout too large to express as a deadline waits like `pop`.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<Frame> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Some(self.pop());
        };
        let mut slot = self.frame.lock();
        loop {
            if let Some(frame) = slot.take() {
                return Some(frame);
            }
            if self.ready.wait_until(&mut slot, deadline).timed_out() {
                return slot.take();
            }
        }
    }

    /// Take the frame if one is waiting
    pub fn try_pop(&self) -> Option<Frame> {
        self.frame.lock().take()
    }

    /// Whether an unconsumed frame is waiting
    pub fn is_filled(&self) -> bool {
        self.frame.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use bytes::Bytes;

    use super::*;

    fn frame(tag: u8) -> Frame {
        Frame::bgr(Bytes::from(vec![tag; 3]), 1, 1)
    }

    #[test]
    fn test_pop_returns_most_recent_push() {
        let slot = LatestFrameSlot::new();

        for tag in 1..=5 {
            slot.push(frame(tag));
        }

        assert_eq!(slot.pop().data[0], 5);
        assert!(!slot.is_filled());
    }

    #[test]
    fn test_push_reports_eviction() {
        let slot = LatestFrameSlot::new();

        assert!(!slot.push(frame(1)));
        assert!(slot.push(frame(2)));
        slot.pop();
        assert!(!slot.push(frame(3)));
    }

    #[test]
    fn test_pop_waits_without_push() {
        let slot = LatestFrameSlot::new();
        let started = Instant::now();

        assert!(slot.pop_timeout(Duration::from_millis(100)).is_none());
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_pop_timeout_unbounded_duration() {
        let slot = LatestFrameSlot::new();
        slot.push(frame(4));

        assert_eq!(slot.pop_timeout(Duration::MAX).map(|f| f.data[0]), Some(4));
    }

    #[test]
    fn test_pop_takes_the_frame() {
        let slot = LatestFrameSlot::new();
        slot.push(frame(7));

        assert_eq!(slot.try_pop().map(|f| f.data[0]), Some(7));
        assert!(slot.try_pop().is_none());
    }

    #[test]
    fn test_pop_wakes_on_push_from_other_thread() {
        let slot = Arc::new(LatestFrameSlot::new());

        let producer = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                slot.push(frame(9));
            })
        };

        let popped = slot.pop_timeout(Duration::from_secs(5));
        producer.join().unwrap();

        assert_eq!(popped.map(|f| f.data[0]), Some(9));
    }
}
