//! File format support for fast start
//!
//! This module provides the BMFF box utilities and the relocation entry points.
//! All implementations are pure Rust and work on any `Read + Seek` source.

pub mod bmff;
pub mod faststart;

pub use bmff::{patch_chunk_offsets, scan_atoms, Atom, AtomDirectory};
pub use faststart::{
    fast_start, fast_start_stream, is_fast_start_enabled, is_fast_start_enabled_stream,
};
