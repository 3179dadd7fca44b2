//! Captured frame type

use std::time::Instant;

use bytes::Bytes;

/// One decoded image pulled from the video source
///
/// Cheap to clone: the pixel buffer is reference counted.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Packed pixel rows, `width * height * channels` bytes
    pub data: Bytes,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per pixel (3 for BGR)
    pub channels: u8,
    /// When the frame was read off the source
    pub captured_at: Instant,
}

impl Frame {
    /// Create a frame stamped with the current time
    pub fn new(data: Bytes, width: u32, height: u32, channels: u8) -> Self {
        Self {
            data,
            width,
            height,
            channels,
            captured_at: Instant::now(),
        }
    }

    /// Create a packed BGR frame
    pub fn bgr(data: Bytes, width: u32, height: u32) -> Self {
        Self::new(data, width, height, 3)
    }

    /// Expected buffer length for the given geometry
    pub fn expected_len(width: u32, height: u32, channels: u8) -> usize {
        width as usize * height as usize * channels as usize
    }

    /// Length of one pixel row in bytes
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// (height, width, channels), the usual image shape ordering
    pub fn shape(&self) -> (u32, u32, u8) {
        (self.height, self.width, self.channels)
    }

    /// Time elapsed since capture
    pub fn age(&self) -> std::time::Duration {
        self.captured_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry() {
        let frame = Frame::bgr(Bytes::from(vec![0u8; 4 * 2 * 3]), 4, 2);

        assert_eq!(frame.stride(), 12);
        assert_eq!(frame.shape(), (2, 4, 3));
        assert_eq!(Frame::expected_len(4, 2, 3), frame.data.len());
    }
}
