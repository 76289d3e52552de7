use std::path::Path;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes a single frame to an image file using the `image` crate.
///
/// The format follows the file extension.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let (w, h) = (frame.width(), frame.height());
        match frame.channels() {
            1 => image::GrayImage::from_raw(w, h, frame.data().to_vec())
                .ok_or("Failed to create gray image from frame data")?
                .save(path)?,
            3 => image::RgbImage::from_raw(w, h, frame.data().to_vec())
                .ok_or("Failed to create RGB image from frame data")?
                .save(path)?,
            n => return Err(format!("Unsupported channel count: {n}").into()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_frame(width: u32, height: u32, r: u8, g: u8, b: u8) -> Frame {
        let data = [r, g, b].repeat((width * height) as usize);
        Frame::new(data, width, height, 3, 0)
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("User_1").join("1.png");
        ImageFileWriter::new()
            .write(&path, &rgb_frame(10, 8, 1, 2, 3))
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_rgb_roundtrip_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        ImageFileWriter::new()
            .write(&path, &rgb_frame(50, 50, 50, 100, 200))
            .unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (50, 50));
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[test]
    fn test_gray_roundtrip_stays_single_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        let frame = Frame::new((0..64).collect(), 8, 8, 1, 0);
        ImageFileWriter::new().write(&path, &frame).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!(img.color(), image::ColorType::L8);
        assert_eq!(img.to_luma8().into_raw(), frame.data());
    }

    #[test]
    fn test_unsupported_channels_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let frame = Frame::new(vec![0; 8], 2, 2, 2, 0);
        assert!(ImageFileWriter::new()
            .write(&dir.path().join("x.png"), &frame)
            .is_err());
    }
}
