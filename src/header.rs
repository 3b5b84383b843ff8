//! Fixed-size changefile header at offset 0.
//!
//! ```text
//! off  size  field
//!   0     4  magic1           CF_MAGIC_1
//!   4     4  magic2           CF_MAGIC_2
//!   8     2  version
//!  10     2  flags
//!  12     4  (padding)
//!  16     8  used_blocks
//!  24     8  total_blocks
//!  32     8  blockmap_offset
//! ```
//!
//! All fields little-endian.  Both magic values must match or the file is
//! rejected without looking any further.

use byteorder::{ByteOrder, LittleEndian};
use std::io::{self, Read};
use thiserror::Error;

use crate::storage::read_full;

pub const CF_MAGIC_1: u32 = 0x474E_4843; // "CHNG"
pub const CF_MAGIC_2: u32 = 0x454C_4946; // "FILE"
pub const HEADER_SIZE: usize = 40;
/// Width of one block map slot on disk.
pub const BLOCKMAP_ENTRY_SIZE: u64 = 8;

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("cannot read header ({got} of {} bytes)", HEADER_SIZE)]
    ShortRead { got: usize },
    #[error("invalid header (magic {} / {})", hex::encode(.magic1.to_le_bytes()), hex::encode(.magic2.to_le_bytes()))]
    InvalidMagic { magic1: u32, magic2: u32 },
    #[error("cannot read header: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic1:          u32,
    pub magic2:          u32,
    pub version:         u16,
    pub flags:           u16,
    pub used_blocks:     u64,
    pub total_blocks:    u64,
    pub blockmap_offset: u64,
}

impl Header {
    /// Read and validate a header from the current position of `reader`.
    pub fn read<R: Read>(mut reader: R) -> Result<Self, HeaderError> {
        let mut raw = [0u8; HEADER_SIZE];
        let got = read_full(&mut reader, &mut raw)?;
        if got != HEADER_SIZE {
            return Err(HeaderError::ShortRead { got });
        }
        Self::parse(&raw)
    }

    /// Interpret a raw header record.
    pub fn parse(raw: &[u8; HEADER_SIZE]) -> Result<Self, HeaderError> {
        let header = Self {
            magic1:          LittleEndian::read_u32(&raw[0..4]),
            magic2:          LittleEndian::read_u32(&raw[4..8]),
            version:         LittleEndian::read_u16(&raw[8..10]),
            flags:           LittleEndian::read_u16(&raw[10..12]),
            used_blocks:     LittleEndian::read_u64(&raw[16..24]),
            total_blocks:    LittleEndian::read_u64(&raw[24..32]),
            blockmap_offset: LittleEndian::read_u64(&raw[32..40]),
        };
        if !header.has_valid_magic() {
            return Err(HeaderError::InvalidMagic {
                magic1: header.magic1,
                magic2: header.magic2,
            });
        }
        Ok(header)
    }

    #[inline]
    pub fn has_valid_magic(&self) -> bool {
        self.magic1 == CF_MAGIC_1 && self.magic2 == CF_MAGIC_2
    }

    /// Byte length of the block map, or `None` if it overflows `u64`.
    pub fn blockmap_len(&self) -> Option<u64> {
        self.total_blocks.checked_mul(BLOCKMAP_ENTRY_SIZE)
    }

    /// The structural summary line printed before a file's blocks.
    pub fn summary(&self, name: &str) -> String {
        format!(
            "{}: version {}, flags 0x{:04x}: blocks {} used/{} total",
            name, self.version, self.flags, self.used_blocks, self.total_blocks
        )
    }
}
