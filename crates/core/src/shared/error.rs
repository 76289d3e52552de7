use std::path::PathBuf;

use thiserror::Error;

/// Failures of the locate / normalize / match core.
///
/// An empty gallery, zero detected faces and a far best match are not
/// errors; they come back as ordinary return values.
#[derive(Error, Debug)]
pub enum FaceError {
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("face detector unavailable: {0}")]
    DetectorUnavailable(String),
    #[error("face detection failed: {0}")]
    Detection(String),
    #[error("image is {actual:?} but the gallery holds {expected:?} images")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Failures of the on-disk gallery and person directory stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
    #[error(transparent)]
    Face(#[from] FaceError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StoreError::Io { path, source }
    }
}
