use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

pub type FrameResult = Result<Frame, Box<dyn std::error::Error>>;

/// Produces frames from a video file, a still image or an image folder.
///
/// The monitor loop only sees `Frame` and `VideoMetadata`; codecs and
/// containers stay behind this trait.
pub trait FrameSource: Send {
    /// Opens `path` and returns what is known about the stream up front.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Frames in decode order. Fails on the first item if not opened.
    fn frames(&mut self) -> Box<dyn Iterator<Item = FrameResult> + '_>;

    /// Releases decoder resources. Safe to call more than once.
    fn close(&mut self);
}
