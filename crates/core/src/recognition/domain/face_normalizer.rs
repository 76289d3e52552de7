use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};

use crate::recognition::domain::face_image::FaceImage;
use crate::shared::constants::{CANONICAL_FACE_SIZE, MIN_SOURCE_SIDE};
use crate::shared::error::FaceError;
use crate::shared::frame::Frame;

/// Interpolation used for every resize. Pinned so the same crop always
/// normalizes to the same pixels.
pub const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Turns raw face crops into comparable [`FaceImage`]s.
///
/// gray → resize to the canonical size → histogram equalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceNormalizer {
    width: u32,
    height: u32,
}

impl FaceNormalizer {
    /// Fails with `InvalidImage` when either canonical side is zero.
    pub fn new(width: u32, height: u32) -> Result<Self, FaceError> {
        if width == 0 || height == 0 {
            return Err(FaceError::InvalidImage(format!(
                "canonical size {width}x{height} has zero area"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn canonical_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn normalize(&self, raw: &Frame) -> Result<FaceImage, FaceError> {
        let (w, h) = (raw.width(), raw.height());
        if raw.is_empty() {
            return Err(FaceError::InvalidImage(format!(
                "input has zero area ({w}x{h})"
            )));
        }
        if w < MIN_SOURCE_SIDE || h < MIN_SOURCE_SIDE {
            return Err(FaceError::InvalidImage(format!(
                "input {w}x{h} is below the {MIN_SOURCE_SIDE}px minimum side"
            )));
        }
        let expected = w as usize * h as usize * raw.channels() as usize;
        if raw.channels() == 0 || raw.data().len() != expected {
            return Err(FaceError::InvalidImage(format!(
                "pixel buffer of {} bytes does not match {w}x{h}x{}",
                raw.data().len(),
                raw.channels()
            )));
        }

        let gray = GrayImage::from_raw(w, h, raw.to_gray().into_data())
            .ok_or_else(|| FaceError::InvalidImage("gray buffer size mismatch".into()))?;

        let resized = if (w, h) == (self.width, self.height) {
            gray
        } else {
            image::imageops::resize(&gray, self.width, self.height, RESIZE_FILTER)
        };

        FaceImage::from_gray(
            self.width,
            self.height,
            equalize_histogram(resized.as_raw()),
        )
    }

    /// Decodes an encoded image (PNG, JPEG, ...) and normalizes it.
    pub fn normalize_encoded(&self, bytes: &[u8]) -> Result<FaceImage, FaceError> {
        let rgb = decode(bytes)?.to_rgb8();
        let (w, h) = rgb.dimensions();
        self.normalize(&Frame::new(rgb.into_raw(), w, h, 3, 0))
    }

    /// Decodes a stored face. A gray image already at the canonical size is
    /// taken as-is, because equalization is not idempotent; anything else
    /// goes through [`normalize_encoded`](Self::normalize_encoded).
    pub fn restore_encoded(&self, bytes: &[u8]) -> Result<FaceImage, FaceError> {
        match decode(bytes)? {
            DynamicImage::ImageLuma8(gray) if gray.dimensions() == self.canonical_size() => {
                FaceImage::from_gray(self.width, self.height, gray.into_raw())
            }
            other => {
                let rgb = other.to_rgb8();
                let (w, h) = rgb.dimensions();
                self.normalize(&Frame::new(rgb.into_raw(), w, h, 3, 0))
            }
        }
    }
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, FaceError> {
    if bytes.is_empty() {
        return Err(FaceError::InvalidImage("zero-byte input".into()));
    }
    image::load_from_memory(bytes)
        .map_err(|e| FaceError::InvalidImage(format!("decode failed: {e}")))
}

impl Default for FaceNormalizer {
    fn default() -> Self {
        Self {
            width: CANONICAL_FACE_SIZE,
            height: CANONICAL_FACE_SIZE,
        }
    }
}

/// Histogram equalization through the cumulative histogram.
///
/// The lowest occupied intensity maps to 0 and the highest to 255. An
/// image with a single intensity is returned unchanged.
pub fn equalize_histogram(pixels: &[u8]) -> Vec<u8> {
    let mut hist = [0usize; 256];
    for &p in pixels {
        hist[p as usize] += 1;
    }

    let total = pixels.len();
    let Some(first) = hist.iter().position(|&c| c > 0) else {
        return Vec::new();
    };
    if hist[first] == total {
        return pixels.to_vec();
    }

    let scale = 255.0 / (total - hist[first]) as f64;
    let mut lut = [0u8; 256];
    let mut sum = 0usize;
    for level in (first + 1)..256 {
        sum += hist[level];
        lut[level] = (sum as f64 * scale).round().min(255.0) as u8;
    }

    pixels.iter().map(|&p| lut[p as usize]).collect()
}
