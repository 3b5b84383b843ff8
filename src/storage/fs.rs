use std::fs::File;
use std::io;
use std::path::Path;

use super::Storage;

/// Local filesystem backend.  Files are opened read-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl Storage for FsStorage {
    type File = File;

    fn open(&self, path: &Path) -> io::Result<File> {
        log::debug!("open {}", path.display());
        File::open(path)
    }
}
