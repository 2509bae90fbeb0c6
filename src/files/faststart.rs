//! Fast start relocation
//!
//! Rewrites a QuickTime/MP4 file whose `moov` box trails the media data so
//! that `moov` comes first:
//!
//! ```text
//! before: ftyp | mdat ... | moov
//! after:  ftyp | moov' | mdat ...
//! ```
//!
//! `moov'` is the source `moov` with every chunk offset shifted by the size
//! of `moov`. Everything between `ftyp` and the trailing `moov` is copied
//! byte for byte.

use crate::core::error::{FastStartError, FastStartResult};
use crate::files::bmff::{copy_bytes, patch_chunk_offsets, scan_atoms, AtomDirectory};
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Move `moov` in front of the media data, reading from `reader` and writing
/// the rewritten file to `writer`.
///
/// # Returns
///
/// * `Ok(true)` if the file was rewritten
/// * `Ok(false)` if there was nothing to do (already fast start, no `moov`,
///   or not a QuickTime file); nothing is written in that case
/// * `Err(FastStartError)` if the file cannot be processed safely
pub fn fast_start_stream<R: Read + Seek, W: Write>(
    mut reader: R,
    mut writer: W,
) -> FastStartResult<bool> {
    let directory = scan_atoms(&mut reader)?;
    if !directory.needs_relocation() {
        tracing::info!("moov atom is not at the end of the file, nothing to do");
        return Ok(false);
    }
    write_relocated(&mut reader, &mut writer, directory)?;
    writer.flush()?;
    Ok(true)
}

/// Check whether `moov` already precedes the rest of the file.
///
/// Returns `false` when there is no `moov` at all.
pub fn is_fast_start_enabled_stream<R: Read + Seek>(mut reader: R) -> FastStartResult<bool> {
    Ok(scan_atoms(&mut reader)?.is_fast_start())
}

/// Write `ftyp`, the patched `moov`, then the untouched middle of the source.
fn write_relocated<R: Read + Seek, W: Write>(
    reader: &mut R,
    writer: &mut W,
    directory: AtomDirectory,
) -> FastStartResult<()> {
    let AtomDirectory {
        ftyp,
        moov,
        start_offset,
        file_size,
        ..
    } = directory;

    let mut moov_atom = moov
        .and_then(|atom| atom.payload)
        .ok_or_else(|| FastStartError::malformed("moov atom was not loaded"))?;
    // The scanner only loads a moov whose size fits in 31 bits.
    let moov_size = moov_atom.len() as u32;

    patch_chunk_offsets(&mut moov_atom, moov_size)?;

    let last_offset = file_size
        .checked_sub(moov_size as u64)
        .filter(|&end| end >= start_offset)
        .ok_or_else(|| {
            FastStartError::malformed(format!(
                "moov atom of {} bytes does not fit between offset {} and end of file {}",
                moov_size, start_offset, file_size
            ))
        })?;

    if let Some(ftyp_atom) = ftyp.and_then(|atom| atom.payload) {
        tracing::info!(size = ftyp_atom.len(), "writing ftyp atom");
        writer.write_all(&ftyp_atom)?;
    }

    tracing::info!(size = moov_atom.len(), "writing moov atom");
    writer.write_all(&moov_atom)?;

    tracing::info!(
        from = start_offset,
        bytes = last_offset - start_offset,
        "copying rest of file"
    );
    reader.seek(SeekFrom::Start(start_offset))?;
    copy_bytes(reader, writer, last_offset - start_offset)?;

    Ok(())
}

/// Move `moov` in front of the media data of `input`, writing the result to `output`.
///
/// `output` is created (or truncated). It is removed again whenever this
/// function does not return `Ok(true)`, so no partial file is left behind.
/// Rewriting a file onto itself is refused with an `InvalidInput` I/O error
/// before anything is touched.
///
/// # Example
///
/// ```rust,no_run
/// # fn main() -> Result<(), qtfaststart::FastStartError> {
/// if qtfaststart::fast_start("movie.mp4", "movie-faststart.mp4")? {
///     println!("moov moved to the front");
/// }
/// # Ok(())
/// # }
/// ```
pub fn fast_start<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> FastStartResult<bool> {
    let input = input.as_ref();
    let output = output.as_ref();

    let reader = File::open(input)?;
    if is_same_file(input, output) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("input and output are the same file: {}", input.display()),
        )
        .into());
    }
    let writer = File::create(output)?;
    // both handles are closed by the time the call returns
    let result = fast_start_stream(reader, writer);

    if !matches!(result, Ok(true)) {
        remove_output(output);
    }
    result
}

/// Check whether the file at `path` already has `moov` in front of the rest.
///
/// The file is only read.
pub fn is_fast_start_enabled<P: AsRef<Path>>(path: P) -> FastStartResult<bool> {
    let reader = File::open(path)?;
    is_fast_start_enabled_stream(reader)
}

/// `false` when either path cannot be resolved, e.g. an output that does not exist yet.
fn is_same_file(input: &Path, output: &Path) -> bool {
    match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(input), Ok(output)) => input == output,
        _ => false,
    }
}

fn remove_output(output: &Path) {
    match fs::remove_file(output) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!("Failed to remove output file {}: {}", output.display(), e);
        }
    }
}
