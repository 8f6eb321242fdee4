//! Centralized error handling for Stowage.
//!
//! Every failure condition in the engine is represented as a `Result` value;
//! nothing panics on malformed input. The library enforces this through
//! `#![deny(clippy::panic)]` and `#![deny(clippy::unwrap_used)]`.
//!
//! ## Design Philosophy
//!
//! 1. **No Panics:** A corrupted or hostile byte buffer must never take the
//!    process down. Every size and offset computation is overflow-checked and
//!    fails closed with [`StowageError::Overflow`].
//!
//! 2. **Specific Failures:** Each variant names one failure domain, so callers
//!    can distinguish "this file is damaged" ([`StowageError::Corrupt`],
//!    [`StowageError::ChecksumMismatch`], [`StowageError::WrongFileType`])
//!    from "this field moved between builds" ([`StowageError::TypeMismatch`],
//!    [`StowageError::NotFound`]), which are recoverable by falling back to
//!    defaults.
//!
//! 3. **Cloneable Errors:** [`StowageError`] is `Clone`, allowing errors to be
//!    stored for later analysis. I/O errors are wrapped in `Arc` to keep
//!    cloning cheap.

use std::fmt;
use std::io;
use std::sync::Arc;

/// A specialized `Result` type for Stowage operations.
pub type Result<T> = std::result::Result<T, StowageError>;

/// The master error enum covering all failure domains in Stowage.
///
/// File-level variants (`WrongFileType`, `ChecksumMismatch`, `Corrupt`) mean
/// the buffer cannot be trusted at all and should be surfaced to the user as
/// "file may be corrupted". Field-level variants (`TypeMismatch`, `NotFound`)
/// occur while restoring values out of an already-verified container and are
/// typically handled by keeping the caller's default value.
#[derive(Debug, Clone)]
pub enum StowageError {
    /// Memory for a buffer could not be reserved.
    Allocation(String),

    /// A size or offset computation would wrap. The engine never performs
    /// unchecked arithmetic on attacker-controlled lengths.
    Overflow(String),

    /// An offset/length pair points outside the buffer it indexes into.
    OutOfRange(String),

    /// The buffer violates the packed layout (truncated header, unterminated
    /// string, table size disagreeing with its entry count, ...).
    Corrupt(String),

    /// A field exists but its recorded type tag or byte size is incompatible
    /// with the requested type, and the widening allow-list does not cover
    /// the combination.
    TypeMismatch(String),

    /// The codec id recorded for a buffer is not registered.
    UnknownEncoding(u8),

    /// The magic tag in the file header does not match the expected
    /// container type.
    WrongFileType {
        /// The magic tag the caller expected.
        expected: u32,
        /// The magic tag found in the header.
        actual: u32,
    },

    /// The checksum recomputed after de-obfuscation disagrees with the one
    /// stored in the header.
    ChecksumMismatch {
        /// The checksum stored in the file header.
        expected: u32,
        /// The checksum computed over the buffer.
        actual: u32,
    },

    /// No field or child with the requested (owner, name) pair exists.
    NotFound {
        /// Owner type name used for the lookup.
        owner: String,
        /// Variable name used for the lookup.
        name: String,
    },

    /// More than one entry matched a lookup that required a unique match.
    MultipleEntries {
        /// Owner type name used for the lookup.
        owner: String,
        /// Variable name used for the lookup.
        name: String,
    },

    /// Low-level I/O failure in the file layer.
    ///
    /// The underlying `io::Error` is wrapped in an `Arc` to make the error
    /// `Clone`. The core engine itself performs no I/O.
    Io(Arc<io::Error>),
}

impl fmt::Display for StowageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation(s) => write!(f, "Allocation Failure: {s}"),
            Self::Overflow(s) => write!(f, "Arithmetic Overflow: {s}"),
            Self::OutOfRange(s) => write!(f, "Offset Out Of Range: {s}"),
            Self::Corrupt(s) => write!(f, "Buffer Corrupt: {s}"),
            Self::TypeMismatch(s) => write!(f, "Type Mismatch: {s}"),
            Self::UnknownEncoding(id) => write!(f, "Unknown Encoding: codec id {id}"),
            Self::WrongFileType { expected, actual } => write!(
                f,
                "Wrong File Type: expected magic {expected:#010x}, got {actual:#010x}"
            ),
            Self::ChecksumMismatch { expected, actual } => write!(
                f,
                "Checksum Mismatch: header says {expected:#010x}, computed {actual:#010x}"
            ),
            Self::NotFound { owner, name } => write!(f, "Not Found: {owner}::{name}"),
            Self::MultipleEntries { owner, name } => {
                write!(f, "Multiple Entries: {owner}::{name} is not unique")
            }
            Self::Io(e) => write!(f, "I/O Error: {e}"),
        }
    }
}

impl std::error::Error for StowageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StowageError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<std::collections::TryReserveError> for StowageError {
    fn from(err: std::collections::TryReserveError) -> Self {
        Self::Allocation(err.to_string())
    }
}
