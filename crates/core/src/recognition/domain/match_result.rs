use crate::recognition::domain::gallery::PersonId;

/// Outcome of one match call: the closest person and how far away they are.
///
/// Lower distance means more similar; 0 means pixel-identical. Deciding
/// whether the distance is low enough belongs to the caller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    pub person_id: Option<PersonId>,
    pub distance: f64,
}

impl MatchResult {
    pub fn new(person_id: PersonId, distance: f64) -> Self {
        Self {
            person_id: Some(person_id),
            distance,
        }
    }

    /// Result for an empty gallery.
    pub fn no_match() -> Self {
        Self {
            person_id: None,
            distance: f64::MAX,
        }
    }

    pub fn is_no_match(&self) -> bool {
        self.person_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_has_max_distance() {
        let r = MatchResult::no_match();
        assert!(r.is_no_match());
        assert_eq!(r.distance, f64::MAX);
    }

    #[test]
    fn test_new_carries_person() {
        let r = MatchResult::new(7, 1.5);
        assert_eq!(r.person_id, Some(7));
        assert!(!r.is_no_match());
    }
}
