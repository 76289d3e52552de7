use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::policy::domain::person::{PersonDirectory, PersonRecord};
use crate::shared::error::StoreError;

#[derive(Serialize, Deserialize)]
struct DirectoryFile {
    people: Vec<PersonRecord>,
}

/// Persists the person directory as a JSON document.
pub struct JsonDirectoryStore {
    path: PathBuf,
}

impl JsonDirectoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty directory.
    pub fn load(&self) -> Result<PersonDirectory, StoreError> {
        if !self.path.exists() {
            return Ok(PersonDirectory::new());
        }
        let json = fs::read_to_string(&self.path).map_err(StoreError::io(&self.path))?;
        let file: DirectoryFile = serde_json::from_str(&json).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        Ok(file.people.into_iter().collect())
    }

    pub fn save(&self, directory: &PersonDirectory) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(StoreError::io(parent))?;
        }
        let file = DirectoryFile {
            people: directory.iter().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(StoreError::io(&self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::domain::person::Category;

    #[test]
    fn test_missing_file_is_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirectoryStore::new(dir.path().join("people.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonDirectoryStore::new(dir.path().join("data").join("people.json"));
        let mut people = PersonDirectory::new();
        people.register(Some(4), "Bruno", Category::Flagged);
        people.register(Some(1), "Ana", Category::Civilian);
        store.save(&people).unwrap();

        assert_eq!(store.load().unwrap(), people);
    }

    #[test]
    fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.json");
        fs::write(
            &path,
            r#"{"people":[{"id":2,"name":"Caio","category":"flagged"}]}"#,
        )
        .unwrap();
        let people = JsonDirectoryStore::new(&path).load().unwrap();
        assert!(people.get(2).unwrap().is_flagged());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonDirectoryStore::new(&path).load(),
            Err(StoreError::Json { .. })
        ));
    }
}
