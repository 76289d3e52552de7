use std::path::PathBuf;

use crate::detection::domain::face_locator::FaceLocator;
use crate::recognition::domain::face_image::FaceImage;
use crate::recognition::domain::face_normalizer::FaceNormalizer;
use crate::recognition::domain::gallery::PersonId;
use crate::recognition::domain::shared_gallery::SharedGallery;
use crate::recognition::infrastructure::dataset_store::DatasetStore;
use crate::shared::error::{FaceError, StoreError};
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameResult;

/// Outcome of one enrollment run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnrollReport {
    pub saved: Vec<PathBuf>,
    /// Photos that could not be decoded or held no usable face.
    pub skipped: usize,
}

/// Adds reference photos of one person to the dataset and the live gallery.
///
/// Each photo contributes at most one face: the largest one found.
pub struct EnrollFacesUseCase<'a> {
    locator: Box<dyn FaceLocator>,
    normalizer: FaceNormalizer,
    store: &'a DatasetStore,
    gallery: SharedGallery,
}

impl<'a> EnrollFacesUseCase<'a> {
    pub fn new(
        locator: Box<dyn FaceLocator>,
        normalizer: FaceNormalizer,
        store: &'a DatasetStore,
        gallery: SharedGallery,
    ) -> Self {
        Self {
            locator,
            normalizer,
            store,
            gallery,
        }
    }

    pub fn execute(
        &mut self,
        person_id: PersonId,
        photos: impl IntoIterator<Item = FrameResult>,
    ) -> Result<EnrollReport, StoreError> {
        let mut report = EnrollReport::default();
        let mut faces = Vec::new();

        for photo in photos {
            let frame = match photo {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Skipping unreadable photo: {e}");
                    report.skipped += 1;
                    continue;
                }
            };
            match self.largest_face(&frame)? {
                Some(face) => {
                    report.saved.push(self.store.save_face(person_id, &face)?);
                    faces.push(face);
                }
                None => {
                    log::warn!("No usable face in photo {}", frame.index());
                    report.skipped += 1;
                }
            }
        }

        let added = faces.len();
        self.gallery.update(|gallery| {
            faces
                .into_iter()
                .try_for_each(|face| gallery.add(person_id, face))
        })?;
        log::info!(
            "Enrolled {added} faces for person {person_id} ({} photos skipped)",
            report.skipped
        );
        Ok(report)
    }

    fn largest_face(&mut self, frame: &Frame) -> Result<Option<FaceImage>, FaceError> {
        let regions = self.locator.locate(frame)?;
        let Some(region) = regions.into_iter().max_by_key(|r| r.area()) else {
            return Ok(None);
        };
        match self.normalizer.normalize(&frame.crop(&region)) {
            Ok(face) => Ok(Some(face)),
            Err(FaceError::InvalidImage(reason)) => {
                log::debug!("Face {region} rejected: {reason}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
