//! In-memory RGB frames and person-crop extraction.

use storesight_models::BoundingBox;

use crate::error::{VisionError, VisionResult};

/// One decoded camera frame, tightly packed RGB8.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB bytes, `width * height * 3` long
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap an RGB8 buffer, validating its length.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> VisionResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(VisionError::InvalidFrameBuffer {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// A uniformly colored frame, used by tests and synthetic sources.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgb);
        }
        Self { width, height, data }
    }

    /// Extract the person crop for a bounding box.
    ///
    /// The box is clamped to the frame; an empty intersection is an error so
    /// callers can skip the track rather than embed a zero-sized crop.
    pub fn crop(&self, bbox: &BoundingBox) -> VisionResult<Frame> {
        let x1 = bbox.x.max(0.0).floor() as u32;
        let y1 = bbox.y.max(0.0).floor() as u32;
        let x2 = (bbox.x2().ceil() as i64).clamp(0, self.width as i64) as u32;
        let y2 = (bbox.y2().ceil() as i64).clamp(0, self.height as i64) as u32;

        if x1 >= x2 || y1 >= y2 || x1 >= self.width || y1 >= self.height {
            return Err(VisionError::EmptyCrop);
        }

        let crop_w = x2 - x1;
        let crop_h = y2 - y1;
        let mut data = Vec::with_capacity(crop_w as usize * crop_h as usize * 3);
        let stride = self.width as usize * 3;
        for row in y1..y2 {
            let start = row as usize * stride + x1 as usize * 3;
            let end = start + crop_w as usize * 3;
            data.extend_from_slice(&self.data[start..end]);
        }

        Ok(Frame {
            width: crop_w,
            height: crop_h,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_buffer_length() {
        assert!(Frame::new(4, 4, vec![0; 48]).is_ok());
        let err = Frame::new(4, 4, vec![0; 47]).unwrap_err();
        assert!(matches!(err, VisionError::InvalidFrameBuffer { .. }));
    }

    #[test]
    fn test_crop_interior() {
        let frame = Frame::filled(10, 10, [7, 8, 9]);
        let crop = frame
            .crop(&BoundingBox::new(2.0, 3.0, 4.0, 5.0))
            .unwrap();
        assert_eq!(crop.width, 4);
        assert_eq!(crop.height, 5);
        assert_eq!(crop.data.len(), 4 * 5 * 3);
        assert_eq!(&crop.data[..3], &[7, 8, 9]);
    }

    #[test]
    fn test_crop_clamps_to_frame() {
        let frame = Frame::filled(10, 10, [0, 0, 0]);
        let crop = frame
            .crop(&BoundingBox::new(-5.0, -5.0, 8.0, 8.0))
            .unwrap();
        assert_eq!(crop.width, 3);
        assert_eq!(crop.height, 3);
    }

    #[test]
    fn test_crop_outside_frame_is_error() {
        let frame = Frame::filled(10, 10, [0, 0, 0]);
        let err = frame
            .crop(&BoundingBox::new(20.0, 20.0, 5.0, 5.0))
            .unwrap_err();
        assert!(matches!(err, VisionError::EmptyCrop));
    }

    #[test]
    fn test_crop_preserves_pixels() {
        // 2x2 frame with distinct pixels
        let data = vec![
            1, 1, 1, 2, 2, 2, //
            3, 3, 3, 4, 4, 4,
        ];
        let frame = Frame::new(2, 2, data).unwrap();
        let crop = frame
            .crop(&BoundingBox::new(1.0, 0.0, 1.0, 2.0))
            .unwrap();
        assert_eq!(crop.data, vec![2, 2, 2, 4, 4, 4]);
    }
}
