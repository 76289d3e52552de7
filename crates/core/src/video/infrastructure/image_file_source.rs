use std::path::{Path, PathBuf};

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::{FrameResult, FrameSource};

/// Serves a still image, or every image in a folder, as a frame sequence.
///
/// Folders are read in file-name order and only files with a known image
/// extension are included. The result has `fps = 0`, so there is no pacing.
#[derive(Default)]
pub struct ImageFileSource {
    paths: Option<Vec<PathBuf>>,
}

impl ImageFileSource {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Lists the image files directly inside `dir`, sorted by name.
pub fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn decode(path: &Path, index: usize) -> FrameResult {
    let img = image::open(path)
        .map_err(|e| format!("{}: {e}", path.display()))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Frame::new(img.into_raw(), width, height, 3, index))
}

impl FrameSource for ImageFileSource {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        let paths = if path.is_dir() {
            list_images(path)?
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            return Err(format!("No such image or folder: {}", path.display()).into());
        };
        let first = paths
            .first()
            .ok_or_else(|| format!("No images found in {}", path.display()))?;
        let (width, height) = image::image_dimensions(first)?;

        let metadata = VideoMetadata {
            width,
            height,
            fps: 0.0,
            total_frames: paths.len(),
            source_path: Some(path.to_path_buf()),
        };
        self.paths = Some(paths);
        Ok(metadata)
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = FrameResult> + '_> {
        match self.paths.as_ref() {
            Some(paths) => Box::new(paths.iter().enumerate().map(|(i, p)| decode(p, i))),
            None => Box::new(std::iter::once(Err("ImageFileSource: not opened".into()))),
        }
    }

    fn close(&mut self) {
        self.paths = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32, value: u8) {
        image::RgbImage::from_pixel(width, height, image::Rgb([value, value, value]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_single_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        write_png(&path, 40, 30, 90);

        let mut source = ImageFileSource::new();
        let meta = source.open(&path).unwrap();
        assert_eq!((meta.width, meta.height, meta.total_frames), (40, 30, 1));
        assert!(meta.frame_interval().is_none());

        let frames: Vec<Frame> = source.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].channels(), 3);
        assert_eq!(frames[0].data()[0], 90);
    }

    #[test]
    fn test_folder_in_name_order_skipping_other_files() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("b.png"), 10, 10, 2);
        write_png(&dir.path().join("a.png"), 10, 10, 1);
        std::fs::write(dir.path().join("readme.txt"), "x").unwrap();

        let mut source = ImageFileSource::new();
        assert_eq!(source.open(dir.path()).unwrap().total_frames, 2);
        let firsts: Vec<(usize, u8)> = source
            .frames()
            .map(|f| f.unwrap())
            .map(|f| (f.index(), f.data()[0]))
            .collect();
        assert_eq!(firsts, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_corrupt_image_is_an_item_error() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("a.png"), 10, 10, 1);
        std::fs::write(dir.path().join("b.png"), b"broken").unwrap();

        let mut source = ImageFileSource::new();
        source.open(dir.path()).unwrap();
        let results: Vec<bool> = source.frames().map(|f| f.is_ok()).collect();
        assert_eq!(results, vec![true, false]);
    }

    #[test]
    fn test_empty_folder_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageFileSource::new().open(dir.path()).is_err());
    }

    #[test]
    fn test_frames_before_open_fail() {
        let mut source = ImageFileSource::new();
        assert!(source.frames().next().unwrap().is_err());
    }
}
