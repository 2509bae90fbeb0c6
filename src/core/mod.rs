//! Core module
//!
//! Shared error types used by the box scanner, the offset patcher and the
//! relocation writer.

pub mod error;

pub use error::{FastStartError, FastStartResult};
