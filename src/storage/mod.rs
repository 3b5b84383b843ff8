//! Storage access used by the verifier.
//!
//! The verifier never touches a filesystem directly.  It goes through a
//! [`Storage`] backend that can open a path as a seekable byte stream and
//! hand out zeroed buffers.  Closing a handle or freeing a buffer is simply
//! dropping it.
//!
//! Two backends ship with the crate:
//!   - [`FsStorage`]  — read-only files on the local filesystem.
//!   - [`MemStorage`] — named in-memory images, used by tests and benches.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

mod fs;
mod mem;

pub use fs::FsStorage;
pub use mem::MemStorage;

/// A backend that the inspector reads changefiles through.
pub trait Storage {
    /// Open handle.  Dropping it closes it.
    type File: Read + Seek;

    /// Open `path` read-only.
    fn open(&self, path: &Path) -> io::Result<Self::File>;

    /// Obtain an empty buffer with room for exactly `size` bytes.  Nothing
    /// is written to it, so untouched pages stay unmapped.
    ///
    /// Failure is reported as [`io::ErrorKind::OutOfMemory`] instead of
    /// aborting the process.
    fn reserve(&self, size: usize) -> io::Result<Vec<u8>> {
        reserve_exact(size)
    }

    /// Obtain a zero-filled buffer of exactly `size` bytes.
    fn allocate(&self, size: usize) -> io::Result<Vec<u8>> {
        let mut buf = self.reserve(size)?;
        buf.resize(size, 0);
        Ok(buf)
    }
}

/// Fallible allocation of an empty buffer with capacity `size`.
pub fn reserve_exact(size: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
    Ok(buf)
}

/// Absolute seek.
#[inline]
pub fn seek_to<S: Seek + ?Sized>(stream: &mut S, offset: u64) -> io::Result<()> {
    log::trace!("seek to 0x{offset:x}");
    stream.seek(SeekFrom::Start(offset)).map(|_| ())
}

/// Read until `buf` is full or the stream ends.
///
/// Returns the number of bytes read.  Unlike `read_exact`, hitting EOF early
/// is not an error: callers compare the count against what they asked for
/// and treat a shortfall as a format problem.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    log::trace!("read {filled}/{} bytes", buf.len());
    Ok(filled)
}
