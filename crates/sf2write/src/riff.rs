//! RIFF chunk envelope writing.
//!
//! The container side of the format: every chunk is a 4-byte ASCII id, a
//! little-endian u32 payload size, the payload, and one pad byte when the
//! payload length is odd. The declared size never includes the pad byte.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

use crate::error::Error;

/// Bytes occupied by a chunk id and size field.
pub const CHUNK_HEADER_SIZE: usize = 8;

/// Validates a payload length against the 32-bit chunk size field.
pub fn check_chunk_size(what: &'static str, len: u64) -> Result<u32, Error> {
    u32::try_from(len).map_err(|_| Error::CapacityExceeded { what, count: len })
}

/// The on-disk length of a chunk with the given payload length, including
/// the header and the pad byte when the payload length is odd.
pub fn chunk_size_on_disk(payload_len: usize) -> usize {
    CHUNK_HEADER_SIZE + payload_len + payload_len % 2
}

/// Write one chunk: id, size, payload, pad byte if the payload is odd.
pub fn write_chunk<W: Write>(
    writer: &mut W,
    id: &[u8; 4],
    payload: &[u8],
) -> Result<(), Error> {
    let size = check_chunk_size("chunk payload bytes", payload.len() as u64)?;
    writer.write_all(id)?;
    writer.write_u32::<LittleEndian>(size)?;
    writer.write_all(payload)?;
    if payload.len() % 2 != 0 {
        writer.write_u8(0)?;
    }
    Ok(())
}

/// Append a zero-terminated, even-padded string (the format's ZSTR rule)
/// to a chunk payload buffer.
pub fn push_zstr(buffer: &mut Vec<u8>, text: &str) {
    buffer.extend_from_slice(text.as_bytes());
    buffer.push(0);
    if buffer.len() % 2 != 0 {
        buffer.push(0);
    }
}

/// A fixed-length, null-padded name field. Longer names are cut to leave
/// room for a terminating zero byte, backing off to a character boundary
/// so no UTF-8 sequence is split.
pub fn name_field<const N: usize>(name: &str) -> [u8; N] {
    let mut field = [0u8; N];
    let mut len = name.len().min(N.saturating_sub(1));
    while !name.is_char_boundary(len) {
        len -= 1;
    }
    field[..len].copy_from_slice(&name.as_bytes()[..len]);
    field
}
