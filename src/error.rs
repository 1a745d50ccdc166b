//! Error types for the fallible conversions exposed by the crate.
//!
//! Rendering and progress updates never fail: a broken output stream degrades into a
//! no-op sink instead of surfacing an error. The only errors are produced when parsing
//! configuration values such as [`Units`](crate::Units) from strings.

use compact_str::CompactString;
use thiserror::Error;

/// Errors produced when parsing configuration values.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum Error {
    /// The string does not name a known display unit (`default` or `bytes`).
    #[error("unknown units: {0:?}")]
    UnknownUnits(CompactString),

    /// The string does not name a known output stream (`stdout` or `stderr`).
    #[error("unknown output stream: {0:?}")]
    UnknownStream(CompactString),

    /// The string does not name a known duration unit.
    #[error("unknown duration unit: {0:?}")]
    UnknownDurationUnit(CompactString),
}

/// Result alias for operations that can fail with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
