use crate::detection::domain::face_locator::FaceLocator;
use crate::shared::error::FaceError;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Treats the whole frame as one face. For inputs that are already crops.
#[derive(Clone, Copy, Debug, Default)]
pub struct WholeFrameLocator;

impl WholeFrameLocator {
    pub fn new() -> Self {
        Self
    }
}

impl FaceLocator for WholeFrameLocator {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<Region>, FaceError> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Region::new(
            0,
            0,
            frame.width() as i32,
            frame.height() as i32,
        )])
    }
}
