//! ISO Base Media File Format (BMFF) support
//!
//! This module provides the low-level box utilities shared by the scanner,
//! the chunk offset patcher and the relocation writer:
//! - MPEG-4/QuickTime family: MP4, MOV, M4A, M4V
//!
//! BMFF Structure:
//! - Files are composed of "boxes" (also called "atoms" in QuickTime)
//! - Each box has: 4-byte size, 4-byte type, optional extended size, data
//! - All multi-byte integers are big-endian

use crate::core::error::{FastStartError, FastStartResult};
use std::io::{Read, Seek};

pub mod patcher;
pub mod scanner;

pub use patcher::patch_chunk_offsets;
pub use scanner::{scan_atoms, Atom, AtomDirectory};

// ============================================================================
// Constants
// ============================================================================

/// Size of a plain box header (4-byte size + 4-byte type)
pub const ATOM_PREAMBLE_SIZE: u64 = 8;

/// Size of a box header carrying a 64-bit extended size
pub const EXTENDED_PREAMBLE_SIZE: u64 = 16;

// Top-level QuickTime/MP4 atoms
pub const FREE_ATOM: &[u8; 4] = b"free";
pub const JUNK_ATOM: &[u8; 4] = b"junk";
pub const MDAT_ATOM: &[u8; 4] = b"mdat";
pub const MOOV_ATOM: &[u8; 4] = b"moov";
pub const PNOT_ATOM: &[u8; 4] = b"pnot";
pub const SKIP_ATOM: &[u8; 4] = b"skip";
pub const WIDE_ATOM: &[u8; 4] = b"wide";
pub const PICT_ATOM: &[u8; 4] = b"PICT";
pub const FTYP_ATOM: &[u8; 4] = b"ftyp";
pub const UUID_ATOM: &[u8; 4] = b"uuid";

// Atoms inside moov
pub const CMOV_ATOM: &[u8; 4] = b"cmov";
pub const STCO_ATOM: &[u8; 4] = b"stco";
pub const CO64_ATOM: &[u8; 4] = b"co64";

const TOP_LEVEL_ATOMS: [&[u8; 4]; 10] = [
    FREE_ATOM, JUNK_ATOM, MDAT_ATOM, MOOV_ATOM, PNOT_ATOM, SKIP_ATOM, WIDE_ATOM, PICT_ATOM,
    FTYP_ATOM, UUID_ATOM,
];

/// Check whether a box type may legally appear at the top level of a QuickTime file
pub fn is_top_level_atom(atom_type: &[u8; 4]) -> bool {
    TOP_LEVEL_ATOMS.contains(&atom_type)
}

/// Render a box type for log output; non-ASCII bytes are shown as '.'
pub fn fourcc(atom_type: &[u8; 4]) -> String {
    atom_type
        .iter()
        .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
        .collect()
}

// ============================================================================
// Conversions
// ============================================================================

/// Narrow a raw uint32 to an in-memory length.
///
/// Lengths are capped at `i32::MAX`, so every buffer stays addressable with a
/// signed 32-bit count.
pub fn uint32_to_len(value: u32) -> FastStartResult<usize> {
    if value > i32::MAX as u32 {
        return Err(FastStartError::unsupported(format!(
            "uint32 value {} is too large",
            value
        )));
    }
    Ok(value as usize)
}

/// Ensure a raw uint64 fits a signed 64-bit stream offset.
pub fn uint64_to_len(value: u64) -> FastStartResult<u64> {
    if value > i64::MAX as u64 {
        return Err(FastStartError::unsupported(format!(
            "uint64 value {} is too large",
            value
        )));
    }
    Ok(value)
}

// ============================================================================
// Reading Functions
// ============================================================================

/// Plain 8-byte box header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomHeader {
    /// Raw 32-bit size field (1 means a 64-bit size follows)
    pub size: u32,
    /// Box type (4-byte FourCC, not necessarily ASCII)
    pub atom_type: [u8; 4],
}

impl AtomHeader {
    /// Whether the real size is stored in a following 64-bit field
    pub fn has_extended_size(&self) -> bool {
        self.size == 1
    }
}

/// Read as many bytes as possible into `buf`, stopping early only at end of stream.
///
/// Returns the number of bytes read.
pub fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Read a box header at the current position.
///
/// Returns `Ok(None)` when fewer than 8 bytes remain.
pub fn read_atom_header<R: Read + Seek>(reader: &mut R) -> std::io::Result<Option<AtomHeader>> {
    let mut header = [0u8; 8];
    if read_fully(reader, &mut header)? < header.len() {
        return Ok(None);
    }
    Ok(Some(AtomHeader {
        size: u32::from_be_bytes([header[0], header[1], header[2], header[3]]),
        atom_type: [header[4], header[5], header[6], header[7]],
    }))
}

/// Read the 64-bit extended size that follows a header whose size field is 1.
///
/// Returns `Ok(None)` when the stream ends first.
pub fn read_extended_size<R: Read + Seek>(reader: &mut R) -> FastStartResult<Option<u64>> {
    let mut size_bytes = [0u8; 8];
    if read_fully(reader, &mut size_bytes)? < size_bytes.len() {
        return Ok(None);
    }
    Ok(Some(uint64_to_len(u64::from_be_bytes(size_bytes))?))
}

/// Copy exactly `count` bytes from reader to writer.
///
/// Goes through `std::io::copy`, so file-to-file copies can use the kernel's
/// zero-copy path.
pub fn copy_bytes<R: Read, W: std::io::Write>(
    reader: &mut R,
    writer: &mut W,
    count: u64,
) -> FastStartResult<()> {
    let mut limited = Read::take(&mut *reader, count);
    let copied = std::io::copy(&mut limited, writer)?;
    if copied < count {
        return Err(FastStartError::malformed(format!(
            "expected {} bytes of media data, found {}",
            count, copied
        )));
    }
    Ok(())
}
