//! # qtfaststart
//!
//! Pure Rust QuickTime/MP4 "fast start": rewrites a file whose `moov` box
//! trails the media data so that `moov` comes first and playback can begin
//! before the whole file has been downloaded.
//!
//! ## Example
//!
//! ```rust,no_run
//! use qtfaststart::{fast_start, is_fast_start_enabled};
//!
//! # fn main() -> Result<(), qtfaststart::FastStartError> {
//! if !is_fast_start_enabled("movie.mp4")? && fast_start("movie.mp4", "movie-fast.mp4")? {
//!     assert!(is_fast_start_enabled("movie-fast.mp4")?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! `fast_start` returns `Ok(false)` when there is nothing to do (the file is
//! already fast start, has no `moov`, or is not a QuickTime file). Errors are
//! reserved for input that cannot be rewritten safely; see [`FastStartError`].

pub mod core;
pub mod files;

pub use crate::core::error::{FastStartError, FastStartResult};
pub use files::{
    fast_start, fast_start_stream, is_fast_start_enabled, is_fast_start_enabled_stream,
    patch_chunk_offsets, scan_atoms, Atom, AtomDirectory,
};
