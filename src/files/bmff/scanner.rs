//! Top-level atom scanner
//!
//! Walks a QuickTime/MP4 stream box by box from offset 0, keeping the `ftyp`
//! and `moov` boxes in memory and skipping everything else by seeking.

use super::{
    fourcc, is_top_level_atom, read_atom_header, read_extended_size, read_fully, uint32_to_len,
    ATOM_PREAMBLE_SIZE, EXTENDED_PREAMBLE_SIZE, FTYP_ATOM, MOOV_ATOM,
};
use crate::core::error::{FastStartError, FastStartResult};
use std::io::{Read, Seek, SeekFrom};

/// A decoded top-level box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// Box type (4-byte FourCC)
    pub atom_type: [u8; 4],
    /// Box size (including header)
    pub size: u64,
    /// Offset where box header starts
    pub header_offset: u64,
    /// Offset where box data starts (after the 8 or 16 byte header)
    pub data_offset: u64,
    /// Whole box including its header; only kept for `ftyp` and `moov`
    pub payload: Option<Vec<u8>>,
}

/// Result of a top-level scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomDirectory {
    /// Last `ftyp` box seen, if any
    pub ftyp: Option<Atom>,
    /// First `moov` box, if any
    pub moov: Option<Atom>,
    /// Whether the last box decoded before the scan ended was a `moov`
    pub moov_is_last: bool,
    /// Offset right after the kept `ftyp` box, or 0 without one
    pub start_offset: u64,
    /// Total length of the scanned stream
    pub file_size: u64,
}

impl AtomDirectory {
    /// `moov` exists and sits at the tail of the file
    pub fn needs_relocation(&self) -> bool {
        self.moov.is_some() && self.moov_is_last
    }

    /// `moov` exists and something follows it, so playback can start early
    pub fn is_fast_start(&self) -> bool {
        self.moov.is_some() && !self.moov_is_last
    }
}

/// Scan all top-level boxes of a stream.
///
/// The scan stops quietly at end of stream, at a box smaller than its own
/// header (including size 0) and at any box type that cannot appear at the
/// top level of a QuickTime file. Only oversized lengths and a truncated
/// `moov` are reported as errors.
pub fn scan_atoms<R: Read + Seek>(reader: &mut R) -> FastStartResult<AtomDirectory> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    let mut directory = AtomDirectory {
        file_size,
        ..Default::default()
    };
    let mut last_type = None;

    loop {
        let header_offset = reader.stream_position()?;
        let Some(header) = read_atom_header(reader)? else {
            break;
        };
        let atom_type = header.atom_type;
        let mut atom_size = header.size as u64;
        last_type = Some(atom_type);

        // a later ftyp replaces an earlier one
        if atom_type == *FTYP_ATOM && atom_size >= ATOM_PREAMBLE_SIZE {
            let ftyp_size = uint32_to_len(header.size)?;
            let mut payload = vec![0u8; ftyp_size];
            payload[..4].copy_from_slice(&header.size.to_be_bytes());
            payload[4..8].copy_from_slice(&atom_type);
            if read_fully(reader, &mut payload[8..])? < ftyp_size - 8 {
                break;
            }
            directory.start_offset = reader.stream_position()?;
            directory.ftyp = Some(Atom {
                atom_type,
                size: atom_size,
                header_offset,
                data_offset: header_offset + ATOM_PREAMBLE_SIZE,
                payload: Some(payload),
            });
        } else if atom_type == *MOOV_ATOM
            && directory.moov.is_none()
            && (header.has_extended_size() || atom_size >= ATOM_PREAMBLE_SIZE)
        {
            let (moov_size, header_size) = if header.has_extended_size() {
                let Some(extended_size) = read_extended_size(reader)? else {
                    break;
                };
                atom_size = extended_size;
                if extended_size < EXTENDED_PREAMBLE_SIZE {
                    return Err(FastStartError::malformed(format!(
                        "moov atom size {} is smaller than its header",
                        extended_size
                    )));
                }
                let narrowed = u32::try_from(extended_size).map_err(|_| {
                    FastStartError::unsupported(format!(
                        "moov atom of {} bytes is too large",
                        extended_size
                    ))
                })?;
                (uint32_to_len(narrowed)?, EXTENDED_PREAMBLE_SIZE)
            } else {
                (uint32_to_len(header.size)?, ATOM_PREAMBLE_SIZE)
            };
            reader.seek(SeekFrom::Start(header_offset))?;
            let mut payload = vec![0u8; moov_size];
            if read_fully(reader, &mut payload)? < moov_size {
                return Err(FastStartError::malformed("failed to read moov atom"));
            }
            directory.moov = Some(Atom {
                atom_type,
                size: atom_size,
                header_offset,
                data_offset: header_offset + header_size,
                payload: Some(payload),
            });
        } else if header.has_extended_size() {
            let Some(extended_size) = read_extended_size(reader)? else {
                break;
            };
            atom_size = extended_size;
            // extended_size <= i64::MAX, so this cannot wrap
            reader.seek(SeekFrom::Current(
                extended_size as i64 - EXTENDED_PREAMBLE_SIZE as i64,
            ))?;
        } else if atom_size >= ATOM_PREAMBLE_SIZE {
            reader.seek(SeekFrom::Current((atom_size - ATOM_PREAMBLE_SIZE) as i64))?;
        }

        tracing::debug!(
            atom = %fourcc(&atom_type),
            offset = header_offset,
            size = atom_size,
            "scanned top-level atom"
        );

        if !is_top_level_atom(&atom_type) {
            tracing::debug!("encountered non-QT top-level atom (is this a QuickTime file?)");
            break;
        }

        // The header is 8 (or 16) bytes; anything smaller cannot be stepped over.
        if atom_size < ATOM_PREAMBLE_SIZE {
            break;
        }
    }

    directory.moov_is_last = directory.moov.is_some() && last_type == Some(*MOOV_ATOM);
    if directory.moov.is_some() && !directory.moov_is_last {
        tracing::debug!("last atom in file was not a moov atom");
    }

    Ok(directory)
}
