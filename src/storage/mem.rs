use std::collections::HashMap;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{reserve_exact, Storage};

/// In-memory backend holding whole images keyed by path.
///
/// An optional allocation ceiling lets callers exercise the out-of-memory
/// paths without exhausting the host.
#[derive(Debug, Clone, Default)]
pub struct MemStorage {
    files:       HashMap<PathBuf, Arc<[u8]>>,
    alloc_limit: Option<usize>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an image under `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, image: impl Into<Arc<[u8]>>) {
        self.files.insert(path.into(), image.into());
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, image: impl Into<Arc<[u8]>>) -> Self {
        self.insert(path, image);
        self
    }

    /// Refuse any allocation larger than `limit` bytes.
    pub fn with_alloc_limit(mut self, limit: usize) -> Self {
        self.alloc_limit = Some(limit);
        self
    }
}

impl Storage for MemStorage {
    type File = Cursor<Arc<[u8]>>;

    fn open(&self, path: &Path) -> io::Result<Self::File> {
        self.files
            .get(path)
            .map(|image| Cursor::new(Arc::clone(image)))
            .ok_or_else(|| io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory image for {}", path.display()),
            ))
    }

    fn reserve(&self, size: usize) -> io::Result<Vec<u8>> {
        match self.alloc_limit {
            Some(limit) if size > limit => Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("allocation of {size} bytes exceeds limit of {limit}"),
            )),
            _ => reserve_exact(size),
        }
    }
}
