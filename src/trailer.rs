//! Per-block trailer, stored immediately after the raw block bytes.
//!
//! ```text
//! off  size  field
//!   0     8  curblock   index of the block-map slot owning this block
//!   8     4  magic      CF_MAGIC_3
//!  12     4  crc        checksum(0, block bytes)
//! ```

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;
use std::fmt;

pub const CF_MAGIC_3: u32 = 0x544B_4C42; // "BLKT"
pub const TRAILER_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTrailer {
    pub curblock: u64,
    pub magic:    u32,
    pub crc:      u32,
}

impl BlockTrailer {
    pub fn parse(raw: &[u8; TRAILER_SIZE]) -> Self {
        Self {
            curblock: LittleEndian::read_u64(&raw[0..8]),
            magic:    LittleEndian::read_u32(&raw[8..12]),
            crc:      LittleEndian::read_u32(&raw[12..16]),
        }
    }

    /// Compare every field against what the block should carry.
    ///
    /// All three comparisons run; an empty result means the trailer is good.
    pub fn check(&self, index: u64, crc: u32) -> Vec<BlockFault> {
        let mut faults = Vec::new();
        if self.curblock != index {
            faults.push(BlockFault::IndexMismatch { expected: index, found: self.curblock });
        }
        if self.magic != CF_MAGIC_3 {
            faults.push(BlockFault::BadMagic { found: self.magic });
        }
        if self.crc != crc {
            faults.push(BlockFault::ChecksumMismatch { stored: self.crc, computed: crc });
        }
        faults
    }
}

/// Why a block failed verification.  Faults never abort traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockFault {
    BadOffset { offset: u64 },
    ShortBlock { expected: usize, got: usize },
    ShortTrailer { got: usize },
    IndexMismatch { expected: u64, found: u64 },
    BadMagic { found: u32 },
    ChecksumMismatch { stored: u32, computed: u32 },
}

impl fmt::Display for BlockFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockFault::BadOffset { offset } =>
                write!(f, "offset 0x{offset:016x} is out of range"),
            BlockFault::ShortBlock { expected, got } =>
                write!(f, "short block read ({got} of {expected} bytes)"),
            BlockFault::ShortTrailer { got } =>
                write!(f, "short trailer read ({got} of {TRAILER_SIZE} bytes)"),
            BlockFault::IndexMismatch { expected, found } =>
                write!(f, "trailer index {found}, expected {expected}"),
            BlockFault::BadMagic { found } =>
                write!(f, "bad trailer magic 0x{found:08x}"),
            BlockFault::ChecksumMismatch { stored, computed } =>
                write!(f, "crc mismatch (stored 0x{stored:08x}, computed 0x{computed:08x})"),
        }
    }
}
