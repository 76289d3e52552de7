use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::recognition::domain::face_image::FaceImage;
use crate::recognition::domain::face_normalizer::FaceNormalizer;
use crate::recognition::domain::gallery::{Gallery, PersonId};
use crate::shared::constants::RECOMMENDED_PHOTOS_PER_PERSON;
use crate::shared::error::StoreError;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::infrastructure::image_file_source::is_image_file;

const PERSON_DIR_PREFIX: &str = "User_";

/// Reference photos on disk, one directory per person.
///
/// Layout: `<root>/User_<id>/<n>.png`. Gray photos already at the
/// canonical size load as-is, so saved faces come back bit-exact. Anything
/// else is normalized on load, so images dropped in by hand are picked up
/// too.
pub struct DatasetStore {
    root: PathBuf,
    normalizer: FaceNormalizer,
    writer: Box<dyn ImageWriter>,
}

impl DatasetStore {
    pub fn new(root: PathBuf, normalizer: FaceNormalizer, writer: Box<dyn ImageWriter>) -> Self {
        Self {
            root,
            normalizer,
            writer,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn person_dir(&self, person_id: PersonId) -> PathBuf {
        self.root.join(format!("{PERSON_DIR_PREFIX}{person_id}"))
    }

    /// Stores one face under the next free photo number for the person.
    pub fn save_face(&self, person_id: PersonId, face: &FaceImage) -> Result<PathBuf, StoreError> {
        let dir = self.person_dir(person_id);
        let next = photo_files(&dir)?
            .iter()
            .filter_map(|p| photo_number(p))
            .max()
            .map_or(1, |n| n + 1);
        let path = dir.join(format!("{next}.png"));
        self.writer
            .write(&path, &face.to_frame())
            .map_err(|e| StoreError::Write {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Ok(path)
    }

    /// Loads every stored photo into a gallery.
    ///
    /// People are visited by ascending id and photos by number, so the
    /// gallery order is reproducible. Unreadable photos are skipped.
    pub fn load_gallery(&self) -> Result<Gallery, StoreError> {
        let mut gallery = Gallery::new();
        for (person_id, dir) in self.person_dirs()? {
            let photos = photo_files(&dir)?;
            if photos.len() < RECOMMENDED_PHOTOS_PER_PERSON {
                log::warn!(
                    "{PERSON_DIR_PREFIX}{person_id}: only {} photos (at least {RECOMMENDED_PHOTOS_PER_PERSON} recommended)",
                    photos.len()
                );
            }
            for path in photos {
                match self.load_face(&path) {
                    Ok(face) => gallery.add(person_id, face)?,
                    Err(e) => log::warn!("Skipping {}: {e}", path.display()),
                }
            }
        }
        log::info!(
            "Loaded {} reference photos of {} people from {}",
            gallery.len(),
            gallery.counts_by_person().len(),
            self.root.display()
        );
        Ok(gallery)
    }

    /// Photo count per stored person, ordered by id.
    pub fn photo_counts(&self) -> Result<BTreeMap<PersonId, usize>, StoreError> {
        self.person_dirs()?
            .into_iter()
            .map(|(id, dir)| Ok((id, photo_files(&dir)?.len())))
            .collect()
    }

    /// Deletes a person's photos. Returns `false` if there were none.
    pub fn remove_person(&self, person_id: PersonId) -> Result<bool, StoreError> {
        let dir = self.person_dir(person_id);
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir).map_err(StoreError::io(&dir))?;
        Ok(true)
    }

    /// Deletes every stored photo.
    pub fn clear(&self) -> Result<(), StoreError> {
        for (_, dir) in self.person_dirs()? {
            fs::remove_dir_all(&dir).map_err(StoreError::io(&dir))?;
        }
        Ok(())
    }

    fn load_face(&self, path: &Path) -> Result<FaceImage, StoreError> {
        let bytes = fs::read(path).map_err(StoreError::io(path))?;
        Ok(self.normalizer.restore_encoded(&bytes)?)
    }

    fn person_dirs(&self) -> Result<Vec<(PersonId, PathBuf)>, StoreError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(StoreError::io(&self.root))? {
            let path = entry.map_err(StoreError::io(&self.root))?.path();
            if !path.is_dir() {
                continue;
            }
            let id = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(PERSON_DIR_PREFIX))
                .and_then(|n| n.parse::<PersonId>().ok());
            if let Some(id) = id {
                dirs.push((id, path));
            }
        }
        dirs.sort_by_key(|(id, _)| *id);
        Ok(dirs)
    }
}

/// Image files directly inside `dir`, numbered photos first by number,
/// then anything else by name.
fn photo_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(StoreError::io(dir))? {
        let path = entry.map_err(StoreError::io(dir))?.path();
        if path.is_file() && is_image_file(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| {
        let key = |p: &PathBuf| (photo_number(p).unwrap_or(u64::MAX), p.file_name().map(|n| n.to_owned()));
        key(a).cmp(&key(b))
    });
    Ok(files)
}

fn photo_number(path: &Path) -> Option<u64> {
    path.file_stem()?.to_str()?.parse().ok()
}
