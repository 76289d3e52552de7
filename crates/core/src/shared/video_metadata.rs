use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Time between two frames at the source rate, if the source has one.
    pub fn frame_interval(&self) -> Option<Duration> {
        if self.fps > 0.0 && self.fps.is_finite() {
            Some(Duration::from_secs_f64(1.0 / self.fps))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn metadata(fps: f64) -> VideoMetadata {
        VideoMetadata {
            width: 640,
            height: 480,
            fps,
            total_frames: 100,
            source_path: Some(PathBuf::from("/tmp/cam.mp4")),
        }
    }

    #[test]
    fn test_frame_interval_at_25_fps() {
        let interval = metadata(25.0).frame_interval().unwrap();
        assert_relative_eq!(interval.as_secs_f64(), 0.04);
    }

    #[test]
    fn test_still_images_have_no_interval() {
        assert!(metadata(0.0).frame_interval().is_none());
    }

    #[test]
    fn test_clone_is_equal() {
        let meta = metadata(30.0);
        assert_eq!(meta.clone(), meta);
    }
}
