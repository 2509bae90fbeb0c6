//! Chunk offset patching inside an in-memory `moov` box
//!
//! Moving `moov` in front of the media data shifts every absolute chunk
//! offset by the size of `moov`. The offsets live in `stco` (32-bit) and
//! `co64` (64-bit) tables, which are found by probing every byte position of
//! the buffer for one of the two type tags rather than by descending the box
//! tree. That probe order decides which tables get patched on damaged input,
//! so it stays a linear scan.

use super::{uint32_to_len, CMOV_ATOM, CO64_ATOM, STCO_ATOM};
use crate::core::error::{FastStartError, FastStartResult};

fn read_u32(buffer: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([buffer[pos], buffer[pos + 1], buffer[pos + 2], buffer[pos + 3]])
}

fn read_u64(buffer: &[u8], pos: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buffer[pos..pos + 8]);
    u64::from_be_bytes(bytes)
}

/// Add `delta` to every entry of every `stco`/`co64` table in a `moov` buffer.
///
/// `buffer` is the whole `moov` box including its 8 or 16 byte header. Fails with
/// [`FastStartError::UnsupportedFile`] for compressed movies and for `stco`
/// entries that would no longer fit in 32 bits, and with
/// [`FastStartError::MalformedFile`] when a table runs past the buffer.
pub fn patch_chunk_offsets(buffer: &mut [u8], delta: u32) -> FastStartResult<()> {
    // type of the first child box, after an 8 or 16 byte moov header
    let child_type = if buffer.len() >= 4 && read_u32(buffer, 0) == 1 { 20 } else { 12 };
    if buffer.len() >= child_type + 4 && buffer[child_type..child_type + 4] == *CMOV_ATOM {
        return Err(FastStartError::unsupported(
            "compressed moov atoms are not supported",
        ));
    }

    let mut pos = 0usize;
    while buffer.len() - pos >= 8 {
        let atom_head = pos;
        let atom_type = &buffer[atom_head + 4..atom_head + 8];
        let is_co64 = atom_type == CO64_ATOM;
        if atom_type != STCO_ATOM && !is_co64 {
            pos += 1;
            continue;
        }

        let atom_size = read_u32(buffer, atom_head) as usize;
        if atom_size > buffer.len() - atom_head {
            return Err(FastStartError::malformed("bad atom size"));
        }

        // skip size (4 bytes), type (4 bytes), version (1 byte) and flags (3 bytes)
        pos = atom_head + 12;
        if buffer.len() < pos + 4 {
            return Err(FastStartError::malformed("malformed atom"));
        }
        let offset_count = uint32_to_len(read_u32(buffer, pos))?;
        pos += 4;

        let entry_size = if is_co64 { 8 } else { 4 };
        if ((buffer.len() - pos) as u64) < offset_count as u64 * entry_size {
            return Err(FastStartError::malformed("bad atom size/element count"));
        }

        if is_co64 {
            tracing::debug!(entries = offset_count, "patching co64 atom");
            for _ in 0..offset_count {
                // 64-bit overflow is left unchecked
                let new_offset = read_u64(buffer, pos).wrapping_add(delta as u64);
                buffer[pos..pos + 8].copy_from_slice(&new_offset.to_be_bytes());
                pos += 8;
            }
        } else {
            tracing::debug!(entries = offset_count, "patching stco atom");
            for _ in 0..offset_count {
                let current_offset = read_u32(buffer, pos);
                let new_offset = current_offset.checked_add(delta).ok_or_else(|| {
                    FastStartError::unsupported(format!(
                        "stco offset {} + {} overflows uint32; conversion to co64 is not implemented",
                        current_offset, delta
                    ))
                })?;
                buffer[pos..pos + 4].copy_from_slice(&new_offset.to_be_bytes());
                pos += 4;
            }
        }
        // the byte probe resumes right after the patched table
    }

    Ok(())
}
