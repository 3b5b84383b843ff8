//! Offset / hex / ASCII listing of a block buffer.
//!
//! ```text
//! 0x0000: 43 48 4e 47 00 2e 41 ff ...  CHNG .A.
//! ```
//!
//! Alphanumeric bytes print as themselves, NUL prints as a space and any
//! other byte prints as `.`.

use std::fmt::Write as _;
use std::io::{self, Write};

pub const ROW_LEN: usize = 16;

/// ASCII column character for one byte.
#[inline]
pub fn ascii_char(b: u8) -> char {
    match b {
        b if b.is_ascii_alphanumeric() => b as char,
        0 => ' ',
        _ => '.',
    }
}

/// Format the row starting at `offset` within the block.
///
/// `row` holds at most [`ROW_LEN`] bytes; a short row pads its hex cells so
/// the ASCII column stays aligned.
pub fn format_row(offset: usize, row: &[u8]) -> String {
    let mut line = String::with_capacity(8 + ROW_LEN * 4);
    let _ = write!(line, "0x{offset:04x}: ");
    for i in 0..ROW_LEN {
        match row.get(i) {
            Some(b) => {
                let _ = write!(line, "{b:02x} ");
            }
            None => line.push_str("   "),
        }
    }
    line.extend(row.iter().map(|&b| ascii_char(b)));
    line
}

/// All rows of `buf`, one per [`ROW_LEN`] bytes.
pub fn rows(buf: &[u8]) -> impl Iterator<Item = String> + '_ {
    buf.chunks(ROW_LEN)
        .enumerate()
        .map(|(i, row)| format_row(i * ROW_LEN, row))
}

/// Write the listing of `buf` to `out`, newline-terminated rows.
pub fn write_hexdump<W: Write + ?Sized>(out: &mut W, buf: &[u8]) -> io::Result<()> {
    for line in rows(buf) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
