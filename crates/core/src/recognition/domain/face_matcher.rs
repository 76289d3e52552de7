use crate::recognition::domain::face_image::FaceImage;
use crate::recognition::domain::gallery::Gallery;
use crate::recognition::domain::match_result::MatchResult;
use crate::shared::error::FaceError;

/// Domain interface for classifying one normalized face against a gallery.
///
/// `match_face` takes `&self` so one matcher can serve many analysis
/// threads at once; the gallery is only ever read.
pub trait FaceMatcher: Send + Sync {
    /// Lifecycle hook run before the first match against each published
    /// gallery version. Matchers without a learned model have nothing to
    /// do here.
    fn train(&mut self, gallery: &Gallery) -> Result<(), FaceError>;

    /// Closest gallery person for `query`.
    ///
    /// An empty gallery yields [`MatchResult::no_match`], never an error.
    fn match_face(&self, query: &FaceImage, gallery: &Gallery) -> Result<MatchResult, FaceError>;
}
