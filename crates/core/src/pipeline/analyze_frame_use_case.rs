use std::sync::Arc;
use std::time::Instant;

use crate::detection::domain::face_locator::FaceLocator;
use crate::recognition::domain::face_matcher::FaceMatcher;
use crate::recognition::domain::face_normalizer::FaceNormalizer;
use crate::recognition::domain::gallery::Gallery;
use crate::recognition::domain::match_result::MatchResult;
use crate::recognition::domain::shared_gallery::SharedGallery;
use crate::shared::error::FaceError;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// One located face and its best gallery match.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceObservation {
    pub region: Region,
    pub result: MatchResult,
}

/// Per-stage wall time for one frame, in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageTimings {
    pub locate_ms: f64,
    pub match_ms: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrameAnalysis {
    pub frame_index: usize,
    pub observations: Vec<FaceObservation>,
    pub timings: StageTimings,
}

/// Locate → crop → normalize → match for a single frame.
///
/// All faces of a frame are matched against the same gallery snapshot, so
/// an enrollment landing mid-frame never splits a frame across versions.
/// The matcher is retrained whenever a newer snapshot is published.
pub struct AnalyzeFrameUseCase {
    locator: Box<dyn FaceLocator>,
    normalizer: FaceNormalizer,
    matcher: Box<dyn FaceMatcher>,
    gallery: SharedGallery,
    trained_on: Arc<Gallery>,
}

impl AnalyzeFrameUseCase {
    pub fn new(
        locator: Box<dyn FaceLocator>,
        normalizer: FaceNormalizer,
        mut matcher: Box<dyn FaceMatcher>,
        gallery: SharedGallery,
    ) -> Result<Self, FaceError> {
        let trained_on = gallery.snapshot();
        matcher.train(&trained_on)?;
        Ok(Self {
            locator,
            normalizer,
            matcher,
            gallery,
            trained_on,
        })
    }

    pub fn execute(&mut self, frame: &Frame) -> Result<FrameAnalysis, FaceError> {
        let t0 = Instant::now();
        let regions = self.locator.locate(frame)?;
        let locate_ms = t0.elapsed().as_secs_f64() * 1000.0;

        let t1 = Instant::now();
        let gallery = self.gallery.snapshot();
        if !Arc::ptr_eq(&gallery, &self.trained_on) {
            self.matcher.train(&gallery)?;
            self.trained_on = Arc::clone(&gallery);
        }
        let mut observations = Vec::with_capacity(regions.len());
        for region in regions {
            let face = match self.normalizer.normalize(&frame.crop(&region)) {
                Ok(face) => face,
                Err(FaceError::InvalidImage(reason)) => {
                    log::debug!("Frame {}: skipping {region}: {reason}", frame.index());
                    continue;
                }
                Err(e) => return Err(e),
            };
            let result = self.matcher.match_face(&face, &gallery)?;
            observations.push(FaceObservation { region, result });
        }
        let match_ms = t1.elapsed().as_secs_f64() * 1000.0;

        Ok(FrameAnalysis {
            frame_index: frame.index(),
            observations,
            timings: StageTimings {
                locate_ms,
                match_ms,
            },
        })
    }
}
