use std::collections::BTreeMap;

use crate::recognition::domain::face_image::FaceImage;
use crate::shared::error::FaceError;

pub type PersonId = u32;

/// One reference photo of one person.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GalleryEntry {
    pub person_id: PersonId,
    pub image: FaceImage,
}

/// Ordered set of reference faces the matcher compares against.
///
/// Iteration follows insertion order. All entries share one image size,
/// fixed by the first entry added.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a gallery from `(person_id, image)` pairs, preserving order.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, FaceError>
    where
        I: IntoIterator<Item = (PersonId, FaceImage)>,
    {
        let mut gallery = Self::new();
        for (person_id, image) in pairs {
            gallery.add(person_id, image)?;
        }
        Ok(gallery)
    }

    pub fn add(&mut self, person_id: PersonId, image: FaceImage) -> Result<(), FaceError> {
        if let Some(expected) = self.dimensions() {
            if image.dimensions() != expected {
                return Err(FaceError::DimensionMismatch {
                    expected,
                    actual: image.dimensions(),
                });
            }
        }
        self.entries.push(GalleryEntry { person_id, image });
        Ok(())
    }

    /// Removes every entry of `person_id`; returns how many were removed.
    pub fn remove_person(&mut self, person_id: PersonId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.person_id != person_id);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GalleryEntry> {
        self.entries.iter()
    }

    /// Image size shared by all entries, `None` while empty.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.entries.first().map(|e| e.image.dimensions())
    }

    /// Reference photo count per person, ordered by id.
    pub fn counts_by_person(&self) -> BTreeMap<PersonId, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.entries {
            *counts.entry(e.person_id).or_insert(0) += 1;
        }
        counts
    }
}

impl<'a> IntoIterator for &'a Gallery {
    type Item = &'a GalleryEntry;
    type IntoIter = std::slice::Iter<'a, GalleryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(value: u8, size: u32) -> FaceImage {
        FaceImage::from_gray(size, size, vec![value; (size * size) as usize]).unwrap()
    }

    #[test]
    fn test_new_gallery_is_empty() {
        let g = Gallery::new();
        assert!(g.is_empty());
        assert_eq!(g.dimensions(), None);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let g = Gallery::from_pairs([(3, face(1, 4)), (1, face(2, 4)), (3, face(3, 4))]).unwrap();
        let ids: Vec<PersonId> = g.iter().map(|e| e.person_id).collect();
        assert_eq!(ids, vec![3, 1, 3]);
        assert_eq!(g.dimensions(), Some((4, 4)));
    }

    #[test]
    fn test_add_rejects_mismatched_size() {
        let mut g = Gallery::new();
        g.add(1, face(0, 4)).unwrap();
        let err = g.add(2, face(0, 5)).unwrap_err();
        assert!(matches!(
            err,
            FaceError::DimensionMismatch {
                expected: (4, 4),
                actual: (5, 5)
            }
        ));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_remove_person_drops_all_their_photos() {
        let mut g =
            Gallery::from_pairs([(1, face(1, 4)), (2, face(2, 4)), (1, face(3, 4))]).unwrap();
        assert_eq!(g.remove_person(1), 2);
        assert_eq!(g.len(), 1);
        assert_eq!(g.remove_person(9), 0);
    }

    #[test]
    fn test_clear_resets_dimensions() {
        let mut g = Gallery::from_pairs([(1, face(1, 4))]).unwrap();
        g.clear();
        assert!(g.is_empty());
        g.add(1, face(1, 8)).unwrap();
        assert_eq!(g.dimensions(), Some((8, 8)));
    }

    #[test]
    fn test_counts_by_person() {
        let g = Gallery::from_pairs([(5, face(1, 4)), (2, face(2, 4)), (5, face(3, 4))]).unwrap();
        let counts: Vec<_> = g.counts_by_person().into_iter().collect();
        assert_eq!(counts, vec![(2, 1), (5, 2)]);
    }
}
