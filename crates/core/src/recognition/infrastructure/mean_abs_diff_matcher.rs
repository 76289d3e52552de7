/// Brute-force nearest-neighbor matcher over raw equalized pixels.
///
/// Scores every gallery entry by the mean absolute pixel difference to the
/// query and returns the closest one. Linear in entries × pixels with no
/// index; beyond roughly 10,000 reference images on one core a different
/// matcher is needed.
use crate::recognition::domain::face_image::FaceImage;
use crate::recognition::domain::face_matcher::FaceMatcher;
use crate::recognition::domain::gallery::Gallery;
use crate::recognition::domain::match_result::MatchResult;
use crate::shared::error::FaceError;

#[derive(Clone, Copy, Debug, Default)]
pub struct MeanAbsDiffMatcher;

impl MeanAbsDiffMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl FaceMatcher for MeanAbsDiffMatcher {
    /// No-op: the gallery itself is the model.
    fn train(&mut self, _gallery: &Gallery) -> Result<(), FaceError> {
        Ok(())
    }

    /// Ties go to the entry met first in gallery order.
    fn match_face(&self, query: &FaceImage, gallery: &Gallery) -> Result<MatchResult, FaceError> {
        let Some(expected) = gallery.dimensions() else {
            return Ok(MatchResult::no_match());
        };
        if query.dimensions() != expected {
            return Err(FaceError::DimensionMismatch {
                expected,
                actual: query.dimensions(),
            });
        }

        let mut best = MatchResult::no_match();
        for entry in gallery {
            let d = mean_abs_diff(query.pixels(), entry.image.pixels());
            if d < best.distance {
                best = MatchResult::new(entry.person_id, d);
            }
        }
        Ok(best)
    }
}

/// Mean of `|a[i] - b[i]|` over equal-length buffers.
pub fn mean_abs_diff(a: &[u8], b: &[u8]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if a.is_empty() {
        return 0.0;
    }
    let sum: u64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| x.abs_diff(y) as u64)
        .sum();
    sum as f64 / a.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::face_normalizer::FaceNormalizer;
    use crate::shared::frame::Frame;
    use approx::assert_relative_eq;

    const SIZE: u32 = 20;

    fn face_from(f: impl Fn(u32, u32) -> u8) -> FaceImage {
        let mut px = Vec::with_capacity((SIZE * SIZE) as usize);
        for y in 0..SIZE {
            for x in 0..SIZE {
                px.push(f(x, y));
            }
        }
        FaceImage::from_gray(SIZE, SIZE, px).unwrap()
    }

    fn solid(value: u8) -> FaceImage {
        face_from(|_, _| value)
    }

    fn with_pixels(base: &FaceImage, f: impl Fn(usize, u8) -> u8) -> FaceImage {
        let px = base.pixels().iter().enumerate().map(|(i, &p)| f(i, p)).collect();
        FaceImage::from_gray(base.width(), base.height(), px).unwrap()
    }

    #[test]
    fn test_empty_gallery_is_no_match() {
        let result = MeanAbsDiffMatcher::new()
            .match_face(&solid(100), &Gallery::new())
            .unwrap();
        assert_eq!(result, MatchResult::no_match());
    }

    #[test]
    fn test_empty_gallery_ignores_query_size() {
        let query = FaceImage::from_gray(3, 3, vec![0; 9]).unwrap();
        let result = MeanAbsDiffMatcher::new()
            .match_face(&query, &Gallery::new())
            .unwrap();
        assert!(result.is_no_match());
    }

    #[test]
    fn test_identical_query_has_zero_distance() {
        let reference = face_from(|x, y| ((x * 13 + y * 7) % 256) as u8);
        let gallery = Gallery::from_pairs([(1, solid(0)), (4, reference.clone())]).unwrap();
        let result = MeanAbsDiffMatcher::new()
            .match_face(&reference, &gallery)
            .unwrap();
        assert_eq!(result.person_id, Some(4));
        assert_eq!(result.distance, 0.0);
    }

    #[test]
    fn test_repeated_calls_agree() {
        let gallery = Gallery::from_pairs([
            (1, face_from(|x, _| (x * 10) as u8)),
            (2, face_from(|_, y| (y * 10) as u8)),
        ])
        .unwrap();
        let query = face_from(|x, y| ((x + y) * 5) as u8);
        let matcher = MeanAbsDiffMatcher::new();
        let first = matcher.match_face(&query, &gallery).unwrap();
        for _ in 0..5 {
            assert_eq!(matcher.match_face(&query, &gallery).unwrap(), first);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let normalizer = FaceNormalizer::new(SIZE, SIZE).unwrap();
        let a = normalizer
            .normalize(&Frame::new((0..900).map(|i| (i % 97) as u8).collect(), 30, 30, 1, 0))
            .unwrap();
        let b = normalizer
            .normalize(&Frame::new((0..900).map(|i| (i % 31) as u8).collect(), 30, 30, 1, 0))
            .unwrap();
        let matcher = MeanAbsDiffMatcher::new();

        let ab = matcher
            .match_face(&a, &Gallery::from_pairs([(1, b.clone())]).unwrap())
            .unwrap();
        let ba = matcher
            .match_face(&b, &Gallery::from_pairs([(1, a)]).unwrap())
            .unwrap();
        assert_eq!(ab.distance, ba.distance);
    }

    #[test]
    fn test_tie_goes_to_first_entry() {
        // Both references are exactly 10 levels away from the query.
        let gallery = Gallery::from_pairs([(8, solid(90)), (3, solid(110))]).unwrap();
        let matcher = MeanAbsDiffMatcher::new();
        for _ in 0..10 {
            let result = matcher.match_face(&solid(100), &gallery).unwrap();
            assert_eq!(result.person_id, Some(8));
            assert_relative_eq!(result.distance, 10.0);
        }

        let reversed = Gallery::from_pairs([(3, solid(110)), (8, solid(90))]).unwrap();
        let result = matcher.match_face(&solid(100), &reversed).unwrap();
        assert_eq!(result.person_id, Some(3));
    }

    #[test]
    fn test_five_percent_saturated_pixels() {
        let reference = face_from(|x, y| (40 + (x + y) % 60) as u8);
        // every 20th pixel forced to 255 → 5% of 400 pixels
        let query = with_pixels(&reference, |i, p| if i % 20 == 0 { 255 } else { p });
        let gallery = Gallery::from_pairs([(7, reference.clone())]).unwrap();

        let expected: f64 = reference
            .pixels()
            .iter()
            .step_by(20)
            .map(|&p| (255 - p) as f64)
            .sum::<f64>()
            / reference.pixels().len() as f64;

        let result = MeanAbsDiffMatcher::new()
            .match_face(&query, &gallery)
            .unwrap();
        assert_eq!(result.person_id, Some(7));
        assert_relative_eq!(result.distance, expected, epsilon = 1e-9);
        // bounded by 5% of the full intensity range
        assert!(result.distance <= 0.05 * 255.0);
        assert!(result.distance >= 0.05 * (255.0 - 100.0));
    }

    #[test]
    fn test_closest_of_two_people_wins() {
        let person1 = face_from(|x, _| if x < SIZE / 2 { 20 } else { 230 });
        let person2 = face_from(|_, y| if y < SIZE / 2 { 230 } else { 20 });
        let query = with_pixels(&person2, |i, p| if i % 7 == 0 { p.saturating_add(15) } else { p });
        let gallery = Gallery::from_pairs([(1, person1), (2, person2)]).unwrap();

        let result = MeanAbsDiffMatcher::new()
            .match_face(&query, &gallery)
            .unwrap();
        assert_eq!(result.person_id, Some(2));
        assert!(result.distance < 5.0);
    }

    #[test]
    fn test_query_size_mismatch_is_an_error() {
        let gallery = Gallery::from_pairs([(1, solid(0))]).unwrap();
        let query = FaceImage::from_gray(5, 5, vec![0; 25]).unwrap();
        assert!(matches!(
            MeanAbsDiffMatcher::new().match_face(&query, &gallery),
            Err(FaceError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_train_is_a_no_op() {
        let gallery = Gallery::from_pairs([(1, solid(50))]).unwrap();
        let mut matcher = MeanAbsDiffMatcher::new();
        matcher.train(&gallery).unwrap();
        let result = matcher.match_face(&solid(50), &gallery).unwrap();
        assert_eq!(result, MatchResult::new(1, 0.0));
    }

    #[test]
    fn test_usable_as_trait_object() {
        let matcher: Box<dyn FaceMatcher> = Box::new(MeanAbsDiffMatcher::new());
        let gallery = Gallery::from_pairs([(2, solid(10))]).unwrap();
        assert_eq!(
            matcher.match_face(&solid(12), &gallery).unwrap(),
            MatchResult::new(2, 2.0)
        );
    }

    #[test]
    fn test_mean_abs_diff() {
        assert_relative_eq!(mean_abs_diff(&[0, 10, 255], &[10, 0, 0]), 275.0 / 3.0);
        assert_eq!(mean_abs_diff(&[], &[]), 0.0);
    }
}
