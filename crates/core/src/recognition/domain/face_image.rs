use std::sync::Arc;

use crate::shared::error::FaceError;
use crate::shared::frame::Frame;

/// A normalized grayscale face: canonical size, contrast-equalized.
///
/// Immutable once built. Pixel storage is shared, so cloning a gallery
/// does not copy image data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceImage {
    pixels: Arc<[u8]>,
    width: u32,
    height: u32,
}

impl FaceImage {
    /// Wraps already-normalized gray pixels.
    ///
    /// Fails with `InvalidImage` on zero area or when the buffer length
    /// does not match `width * height`.
    pub fn from_gray(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, FaceError> {
        if width == 0 || height == 0 {
            return Err(FaceError::InvalidImage(format!(
                "face image has zero area ({width}x{height})"
            )));
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(FaceError::InvalidImage(format!(
                "expected {expected} gray pixels for {width}x{height}, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            pixels: pixels.into(),
            width,
            height,
        })
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn to_frame(&self) -> Frame {
        Frame::new(self.pixels.to_vec(), self.width, self.height, 1, 0)
    }
}
