//! Changefile image builder shared by the integration tests.
#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use cfdump::checksum::block_checksum;
use cfdump::header::{CF_MAGIC_1, CF_MAGIC_2, HEADER_SIZE};
use cfdump::trailer::CF_MAGIC_3;

/// Deterministic block contents that never look like a trailer.
pub fn payload(len: usize, salt: u8) -> Vec<u8> {
    (0..len).map(|i| ((i * 7) % 251) as u8 ^ salt).collect()
}

struct BlockSpec {
    index:         u64,
    data:          Vec<u8>,
    trailer_index: u64,
    magic:         u32,
    crc:           u32,
}

pub struct Fixture {
    pub image:           Vec<u8>,
    /// `(index, offset)` of every block written.
    pub blocks:          Vec<(u64, u64)>,
    pub blockmap_offset: u64,
}

impl Fixture {
    pub fn offset_of(&self, index: u64) -> u64 {
        self.blocks.iter().find(|(i, _)| *i == index).map(|(_, o)| *o).unwrap()
    }
}

pub struct ChangefileBuilder {
    magic1:          u32,
    magic2:          u32,
    version:         u16,
    flags:           u16,
    used_blocks:     Option<u64>,
    total_blocks:    u64,
    first_block_at:  usize,
    blockmap_offset: Option<u64>,
    blocks:          Vec<BlockSpec>,
    slots:           Vec<(u64, u64)>,
}

impl ChangefileBuilder {
    pub fn new(total_blocks: u64) -> Self {
        Self {
            magic1:          CF_MAGIC_1,
            magic2:          CF_MAGIC_2,
            version:         1,
            flags:           0,
            used_blocks:     None,
            total_blocks,
            first_block_at:  64,
            blockmap_offset: None,
            blocks:          Vec::new(),
            slots:           Vec::new(),
        }
    }

    pub fn magic1(mut self, m: u32) -> Self { self.magic1 = m; self }
    pub fn magic2(mut self, m: u32) -> Self { self.magic2 = m; self }
    pub fn version(mut self, v: u16) -> Self { self.version = v; self }
    pub fn flags(mut self, f: u16) -> Self { self.flags = f; self }
    pub fn used_blocks(mut self, n: u64) -> Self { self.used_blocks = Some(n); self }
    /// Point the header at a block map somewhere other than the real one.
    pub fn blockmap_offset(mut self, off: u64) -> Self { self.blockmap_offset = Some(off); self }

    /// Point map slot `index` at `offset` without writing a block there.
    pub fn slot(mut self, index: u64, offset: u64) -> Self { self.slots.push((index, offset)); self }

    pub fn block(self, index: u64, data: Vec<u8>) -> Self {
        let crc = block_checksum(&data);
        self.raw_block(index, data, index, CF_MAGIC_3, crc)
    }

    pub fn block_bad_crc(self, index: u64, data: Vec<u8>) -> Self {
        let crc = block_checksum(&data) ^ 0x8000_0001;
        self.raw_block(index, data, index, CF_MAGIC_3, crc)
    }

    pub fn raw_block(mut self, index: u64, data: Vec<u8>, trailer_index: u64, magic: u32, crc: u32) -> Self {
        self.blocks.push(BlockSpec { index, data, trailer_index, magic, crc });
        self
    }

    pub fn build(self) -> Fixture {
        let mut image = vec![0u8; self.first_block_at];
        let mut blocks = Vec::new();

        for b in &self.blocks {
            let offset = image.len() as u64;
            image.extend_from_slice(&b.data);
            image.write_u64::<LittleEndian>(b.trailer_index).unwrap();
            image.write_u32::<LittleEndian>(b.magic).unwrap();
            image.write_u32::<LittleEndian>(b.crc).unwrap();
            blocks.push((b.index, offset));
        }

        while image.len() % 8 != 0 {
            image.push(0);
        }
        let real_map_offset = image.len() as u64;
        let mut map = vec![0u64; self.total_blocks as usize];
        for &(index, offset) in &blocks {
            map[index as usize] = offset;
        }
        for &(index, offset) in &self.slots {
            map[index as usize] = offset;
        }
        for slot in map {
            image.write_u64::<LittleEndian>(slot).unwrap();
        }

        let blockmap_offset = self.blockmap_offset.unwrap_or(real_map_offset);
        let mut header = Vec::with_capacity(HEADER_SIZE);
        header.write_u32::<LittleEndian>(self.magic1).unwrap();
        header.write_u32::<LittleEndian>(self.magic2).unwrap();
        header.write_u16::<LittleEndian>(self.version).unwrap();
        header.write_u16::<LittleEndian>(self.flags).unwrap();
        header.write_u32::<LittleEndian>(0).unwrap();
        header.write_u64::<LittleEndian>(self.used_blocks.unwrap_or(self.blocks.len() as u64)).unwrap();
        header.write_u64::<LittleEndian>(self.total_blocks).unwrap();
        header.write_u64::<LittleEndian>(blockmap_offset).unwrap();
        image[..HEADER_SIZE].copy_from_slice(&header);

        Fixture { image, blocks, blockmap_offset }
    }
}
