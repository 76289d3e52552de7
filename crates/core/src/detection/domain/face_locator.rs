use crate::shared::error::FaceError;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Finds face rectangles in a frame.
///
/// The result may be empty and its order is whatever the detector yields.
/// Implementations may keep state between frames, hence `&mut self`.
pub trait FaceLocator: Send {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<Region>, FaceError>;
}
