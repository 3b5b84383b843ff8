//! Table-driven CRC-32 over block payloads.
//!
//! Polynomial `0xEDB88320` (reflected IEEE), processed LSB-first one byte at
//! a time.  Unlike the usual "IEEE CRC-32" wrapper there is no pre- or
//! post-inversion: the caller supplies the seed and receives the raw
//! register.  Block trailers are always computed with seed `0`.
//!
//! The 256-entry lookup table is built on first use behind a [`OnceLock`]
//! and is read-only afterwards.

use std::sync::OnceLock;

/// Reflected CRC-32 polynomial.
pub const CRC_POLY: u32 = 0xEDB8_8320;
/// Number of entries in the lookup table.
pub const CRC_TABLE_LEN: usize = 256;
/// Seed used for every block verification pass.
pub const BLOCK_CRC_SEED: u32 = 0;

static CRC_TABLE: OnceLock<[u32; CRC_TABLE_LEN]> = OnceLock::new();

/// Derive the lookup table from scratch.
///
/// Each candidate byte value goes through eight bit-reduction steps.
/// [`crc_table`] caches the result of this function for the process.
pub fn build_table() -> [u32; CRC_TABLE_LEN] {
    let mut table = [0u32; CRC_TABLE_LEN];
    for (i, slot) in table.iter_mut().enumerate() {
        let mut crc = i as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ CRC_POLY } else { crc >> 1 };
        }
        *slot = crc;
    }
    table
}

/// The process-wide table, built exactly once.
#[inline]
pub fn crc_table() -> &'static [u32; CRC_TABLE_LEN] {
    CRC_TABLE.get_or_init(build_table)
}

/// Update `seed` with `bytes` and return the new register value.
pub fn checksum(seed: u32, bytes: &[u8]) -> u32 {
    let table = crc_table();
    bytes.iter().fold(seed, |crc, &b| {
        (crc >> 8) ^ table[((crc ^ b as u32) & 0xFF) as usize]
    })
}

/// Checksum of a whole block payload as stored in its trailer.
#[inline]
pub fn block_checksum(block: &[u8]) -> u32 {
    checksum(BLOCK_CRC_SEED, block)
}
