use std::sync::{Arc, PoisonError, RwLock};

use crate::recognition::domain::gallery::Gallery;

/// Copy-on-write gallery shared between analysis threads and writers.
///
/// Readers take an immutable [`snapshot`](Self::snapshot) and match against
/// it without holding any lock. Writers run under the exclusive lock and
/// publish a new version; snapshots already handed out never change.
#[derive(Clone, Debug, Default)]
pub struct SharedGallery {
    current: Arc<RwLock<Arc<Gallery>>>,
}

impl SharedGallery {
    pub fn new(gallery: Gallery) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(gallery))),
        }
    }

    pub fn snapshot(&self) -> Arc<Gallery> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Applies `f` to a private copy of the gallery and publishes it.
    ///
    /// When `f` fails the published gallery is left untouched.
    pub fn update<R, E>(&self, f: impl FnOnce(&mut Gallery) -> Result<R, E>) -> Result<R, E> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = Gallery::clone(&guard);
        let out = f(&mut next)?;
        *guard = Arc::new(next);
        Ok(out)
    }
}
