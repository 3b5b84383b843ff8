//! Block verification and block-size discovery.
//!
//! Neither the header nor the block map records how big a block is.  The
//! size is inferred from the first present block of a file by probing
//! power-of-two candidates until one yields a trailer that checks out:
//!
//! ```text
//! 512, 1024, 2048, ... 64 MiB        (128 MiB is the exclusive limit)
//! ```
//!
//! Once a size verifies it is kept for every remaining block of the file
//! without probing again.  All blocks of one file are assumed to share a
//! size; a file mixing sizes will have its odd blocks reported invalid.
//! A probe that runs out of candidates establishes nothing, so the next
//! present block starts again from the smallest candidate.

use std::io::{self, Read, Seek};
use std::iter;

use crate::checksum::block_checksum;
use crate::storage::{read_full, seek_to, Storage};
use crate::trailer::{BlockFault, BlockTrailer, TRAILER_SIZE};

/// Smallest block size tried during discovery.
pub const MIN_BLOCK_SIZE:   usize = 512;
/// Discovery never tries this size or anything above it.
pub const BLOCK_SIZE_LIMIT: usize = 128 * 1024 * 1024;
/// Highest offset every backend can seek to.
pub const MAX_BLOCK_OFFSET: u64 = i64::MAX as u64;

// ── Probe policy ──────────────────────────────────────────────────────────────

/// Candidate sizes for block-size discovery: `min`, doubling, below `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbePolicy {
    pub min:   usize,
    pub limit: usize,
}

impl Default for ProbePolicy {
    fn default() -> Self {
        Self { min: MIN_BLOCK_SIZE, limit: BLOCK_SIZE_LIMIT }
    }
}

impl ProbePolicy {
    pub fn candidates(&self) -> impl Iterator<Item = usize> {
        let limit = self.limit;
        iter::successors(Some(self.min.max(1)), |s| s.checked_mul(2))
            .take_while(move |&s| s < limit)
    }
}

// ── Single-block verification ─────────────────────────────────────────────────

/// Outcome of checking one block at one size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    pub faults: Vec<BlockFault>,
}

impl Verdict {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.faults.is_empty()
    }

    fn fault(f: BlockFault) -> Self {
        Self { faults: vec![f] }
    }
}

/// Read `buffer.len()` bytes at `offset` plus the trailer behind them and
/// check the trailer against `index` and the buffer's checksum.
///
/// `buffer` holds whatever was read, valid or not, so it can still be
/// dumped.  Bytes past a short read are zeroed, and so is the whole buffer
/// when `offset` cannot be seeked to.  Only genuine I/O errors are returned
/// as `Err`; every format problem is a fault on the verdict.
pub fn verify_block<F>(file: &mut F, offset: u64, index: u64, buffer: &mut [u8]) -> io::Result<Verdict>
where
    F: Read + Seek + ?Sized,
{
    let bad_offset = |buffer: &mut [u8]| -> io::Result<Verdict> {
        buffer.fill(0);
        Ok(Verdict::fault(BlockFault::BadOffset { offset }))
    };
    if offset > MAX_BLOCK_OFFSET {
        return bad_offset(buffer);
    }
    match seek_to(file, offset) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::InvalidInput => return bad_offset(buffer),
        Err(e) => return Err(e),
    }
    let got = read_full(file, buffer)?;
    if got != buffer.len() {
        buffer[got..].fill(0);
        return Ok(Verdict::fault(BlockFault::ShortBlock { expected: buffer.len(), got }));
    }

    let mut raw = [0u8; TRAILER_SIZE];
    let got = read_full(file, &mut raw)?;
    if got != TRAILER_SIZE {
        return Ok(Verdict::fault(BlockFault::ShortTrailer { got }));
    }

    let trailer = BlockTrailer::parse(&raw);
    Ok(Verdict { faults: trailer.check(index, block_checksum(buffer)) })
}

// ── Per-file scanner ──────────────────────────────────────────────────────────

/// Result of [`BlockScanner::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockCheck {
    /// The block was read at the file's block size and judged.
    Checked(Verdict),
    /// Discovery ran out of candidates; no size is known for the file.
    NoValidSize,
}

impl BlockCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, BlockCheck::Checked(v) if v.is_valid())
    }

    pub fn faults(&self) -> &[BlockFault] {
        match self {
            BlockCheck::Checked(v) => &v.faults,
            BlockCheck::NoValidSize => &[],
        }
    }
}

/// Verifies the blocks of one file, discovering and then reusing the block
/// size.  Create a fresh scanner per file.
pub struct BlockScanner<'s, S: Storage + ?Sized> {
    storage:    &'s S,
    policy:     ProbePolicy,
    block_size: Option<usize>,
    buffer:     Vec<u8>,
}

impl<'s, S: Storage + ?Sized> BlockScanner<'s, S> {
    pub fn new(storage: &'s S, policy: ProbePolicy) -> Self {
        Self { storage, policy, block_size: None, buffer: Vec::new() }
    }

    /// The block size established for this file, if any.
    pub fn block_size(&self) -> Option<usize> {
        self.block_size
    }

    /// Bytes of the most recently checked block.  Empty until a size is
    /// established.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Verify the block at `offset` reached from map slot `index`.
    pub fn check<F>(&mut self, file: &mut F, offset: u64, index: u64) -> io::Result<BlockCheck>
    where
        F: Read + Seek + ?Sized,
    {
        if self.block_size.is_some() {
            let verdict = verify_block(file, offset, index, &mut self.buffer)?;
            log::debug!("block {index} @ 0x{offset:x}: valid={}", verdict.is_valid());
            return Ok(BlockCheck::Checked(verdict));
        }
        self.discover(file, offset, index)
    }

    fn discover<F>(&mut self, file: &mut F, offset: u64, index: u64) -> io::Result<BlockCheck>
    where
        F: Read + Seek + ?Sized,
    {
        for size in self.policy.candidates() {
            // Each candidate owns its buffer; a failed one is dropped here
            // before the next, larger one is allocated.
            let mut candidate = self.storage.allocate(size)?;
            let verdict = verify_block(file, offset, index, &mut candidate)?;
            if verdict.is_valid() {
                log::debug!("block {index} @ 0x{offset:x}: block size is {size}");
                self.block_size = Some(size);
                self.buffer = candidate;
                return Ok(BlockCheck::Checked(verdict));
            }
            log::trace!("block {index} @ 0x{offset:x}: size {size} rejected: {:?}", verdict.faults);
        }
        log::debug!("block {index} @ 0x{offset:x}: no size below {} verifies", self.policy.limit);
        Ok(BlockCheck::NoValidSize)
    }
}
