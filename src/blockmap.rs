//! Sparse index→offset table referenced by the header.
//!
//! `total_blocks` little-endian `u64` slots at `blockmap_offset`.  A zero
//! slot is unused; anything else is the absolute offset of a block.  No
//! plausibility checks are made here; bad offsets surface when the block
//! itself fails verification.

use byteorder::{ByteOrder, LittleEndian};
use std::io::{self, Read, Seek};
use thiserror::Error;

use crate::header::Header;
use crate::storage::{seek_to, Storage};

#[derive(Error, Debug)]
pub enum BlockMapError {
    #[error("cannot allocate blockmap ({total_blocks} entries)")]
    TooLarge { total_blocks: u64 },
    #[error("cannot allocate blockmap ({len} bytes): {source}")]
    Alloc { len: u64, source: io::Error },
    #[error("cannot read blockmap ({got} of {expected} bytes)")]
    ShortRead { expected: u64, got: u64 },
    #[error("cannot read blockmap: {0}")]
    Io(#[from] io::Error),
}

impl BlockMapError {
    /// Allocation failures end the whole run, not just the current file.
    pub fn is_alloc_failure(&self) -> bool {
        matches!(self, BlockMapError::TooLarge { .. } | BlockMapError::Alloc { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMap {
    entries: Vec<u64>,
}

impl BlockMap {
    /// Reserve, seek and read the block map described by `header`.
    ///
    /// The buffer is filled only as far as the file goes, so a bogus
    /// `total_blocks` costs a reservation, not a zero-fill.
    pub fn load<S, F>(storage: &S, file: &mut F, header: &Header) -> Result<Self, BlockMapError>
    where
        S: Storage + ?Sized,
        F: Read + Seek,
    {
        let too_large = || BlockMapError::TooLarge { total_blocks: header.total_blocks };
        let len = header.blockmap_len().ok_or_else(too_large)?;
        let size = usize::try_from(len).map_err(|_| too_large())?;

        let mut raw = storage
            .reserve(size)
            .map_err(|source| BlockMapError::Alloc { len, source })?;

        seek_to(file, header.blockmap_offset)?;
        let got = (&mut *file).take(len).read_to_end(&mut raw)?;
        if got != size {
            return Err(BlockMapError::ShortRead { expected: len, got: got as u64 });
        }

        Ok(Self::from_bytes(&raw))
    }

    /// Decode whole slots from `raw`; trailing bytes are ignored.
    pub fn from_bytes(raw: &[u8]) -> Self {
        let mut entries = vec![0u64; raw.len() / 8];
        LittleEndian::read_u64_into(&raw[..entries.len() * 8], &mut entries);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<u64> {
        self.entries.get(index).copied()
    }

    /// `(index, offset)` for every occupied slot, in index order.
    pub fn present(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|&(_, &off)| off != 0)
            .map(|(i, &off)| (i as u64, off))
    }

    pub fn count_present(&self) -> u64 {
        self.present().count() as u64
    }
}
