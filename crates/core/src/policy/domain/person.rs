use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::recognition::domain::gallery::PersonId;

/// How the application treats a recognized person.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// On the watch list: recognition raises an alert.
    Flagged,
    Civilian,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Flagged => f.write_str("flagged"),
            Category::Civilian => f.write_str("civilian"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flagged" => Ok(Category::Flagged),
            "civilian" => Ok(Category::Civilian),
            other => Err(format!("unknown category '{other}' (expected flagged or civilian)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: PersonId,
    pub name: String,
    pub category: Category,
}

impl PersonRecord {
    pub fn is_flagged(&self) -> bool {
        self.category == Category::Flagged
    }
}

/// Names and categories of enrolled people, keyed by id.
///
/// Owned by the application; the matching core only ever sees ids.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PersonDirectory {
    people: BTreeMap<PersonId, PersonRecord>,
}

impl PersonDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a person. Without an explicit id the next free one
    /// is assigned.
    pub fn register(
        &mut self,
        id: Option<PersonId>,
        name: impl Into<String>,
        category: Category,
    ) -> PersonId {
        let id = id.unwrap_or_else(|| self.next_id());
        let record = PersonRecord {
            id,
            name: name.into(),
            category,
        };
        if let Some(previous) = self.people.insert(id, record) {
            log::info!("Replaced directory entry {id} ({})", previous.name);
        }
        id
    }

    pub fn remove(&mut self, id: PersonId) -> Option<PersonRecord> {
        self.people.remove(&id)
    }

    pub fn get(&self, id: PersonId) -> Option<&PersonRecord> {
        self.people.get(&id)
    }

    pub fn contains(&self, id: PersonId) -> bool {
        self.people.contains_key(&id)
    }

    /// Records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &PersonRecord> {
        self.people.values()
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn clear(&mut self) {
        self.people.clear();
    }

    /// One past the largest id in use, starting at 1.
    pub fn next_id(&self) -> PersonId {
        self.people
            .keys()
            .next_back()
            .map_or(1, |id| id.saturating_add(1))
    }
}

impl FromIterator<PersonRecord> for PersonDirectory {
    fn from_iter<I: IntoIterator<Item = PersonRecord>>(iter: I) -> Self {
        Self {
            people: iter.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_register_assigns_next_free_id() {
        let mut dir = PersonDirectory::new();
        assert_eq!(dir.register(None, "Ana", Category::Civilian), 1);
        assert_eq!(dir.register(Some(7), "Bruno", Category::Flagged), 7);
        assert_eq!(dir.register(None, "Carla", Category::Civilian), 8);
        assert_eq!(dir.len(), 3);
    }

    #[test]
    fn test_register_existing_id_replaces() {
        let mut dir = PersonDirectory::new();
        dir.register(Some(2), "Old", Category::Civilian);
        dir.register(Some(2), "New", Category::Flagged);
        assert_eq!(dir.len(), 1);
        let person = dir.get(2).unwrap();
        assert_eq!(person.name, "New");
        assert!(person.is_flagged());
    }

    #[test]
    fn test_iter_is_sorted_by_id() {
        let mut dir = PersonDirectory::new();
        dir.register(Some(9), "c", Category::Civilian);
        dir.register(Some(1), "a", Category::Civilian);
        dir.register(Some(4), "b", Category::Civilian);
        let ids: Vec<_> = dir.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 4, 9]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut dir = PersonDirectory::new();
        dir.register(Some(1), "a", Category::Civilian);
        dir.register(Some(2), "b", Category::Flagged);
        assert_eq!(dir.remove(1).map(|p| p.name), Some("a".to_string()));
        assert!(dir.remove(1).is_none());
        assert!(!dir.contains(1));
        dir.clear();
        assert!(dir.is_empty());
        assert_eq!(dir.next_id(), 1);
    }

    #[rstest]
    #[case("flagged", Category::Flagged)]
    #[case("FLAGGED", Category::Flagged)]
    #[case("civilian", Category::Civilian)]
    fn test_category_parse(#[case] input: &str, #[case] expected: Category) {
        assert_eq!(input.parse::<Category>().unwrap(), expected);
        assert_eq!(expected.to_string(), input.to_lowercase());
    }

    #[test]
    fn test_category_parse_rejects_unknown() {
        assert!("visitor".parse::<Category>().is_err());
    }
}
