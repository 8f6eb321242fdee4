//! Defines the physical binary layout of a packed container.
//!
//! # Layout
//! The file is a fixed-size header, an offsets table with one entry per
//! packed node, and a data segment holding the encoded node buffers, padded
//! to a multiple of four bytes:
//!
//! `[ FileHeader ] [ TableEntry * buffer_count ] [ Data Segment ] [ Pad ]`
//!
//! Everything is little-endian. The header stays in cleartext; the offsets
//! table and data segment are covered by the obfuscation pass, and the
//! checksum spans the whole buffer with its own field zeroed.

use crate::buffer::{checked_mul, checked_range};
use crate::error::{Result, StowageError};

/// Number of reserved trailing words in the header.
pub const RESERVED_WORDS: usize = 10;

/// Byte range of the checksum field inside the header.
pub const CHECKSUM_FIELD: std::ops::Range<usize> = 4..8;

/// The file header at offset zero.
///
/// The magic tag doubles as the file-type tag: each consumer (settings,
/// icon bundles, calibration data, logs) packs with its own magic, so opening
/// a file as the wrong kind fails before anything else is looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// File-type tag.
    pub magic: u32,
    /// Checksum over the whole buffer, computed with this field zeroed.
    pub checksum: u32,
    /// Number of entries in the offsets table.
    pub buffer_count: u64,
    /// Absolute offset of the offsets table.
    pub table_offset: u64,
    /// Random per-file seed mixed into the obfuscation key.
    pub seed: u32,
    /// Absolute offset of the data segment.
    pub data_offset: u64,
}

impl FileHeader {
    /// The fixed size of the header:
    /// magic(4) + checksum(4) + count(8) + table(8) + seed(4) + data(8) + reserved(40).
    pub const SIZE: usize = 36 + RESERVED_WORDS * 4;

    /// Serializes the header to its fixed-size byte form.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&self.magic.to_le_bytes());
        buf[4..8].copy_from_slice(&self.checksum.to_le_bytes());
        buf[8..16].copy_from_slice(&self.buffer_count.to_le_bytes());
        buf[16..24].copy_from_slice(&self.table_offset.to_le_bytes());
        buf[24..28].copy_from_slice(&self.seed.to_le_bytes());
        buf[28..36].copy_from_slice(&self.data_offset.to_le_bytes());
        buf
    }

    /// Deserializes a header from the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(StowageError::Corrupt(format!(
                "buffer of {} bytes is smaller than the {}-byte header",
                bytes.len(),
                Self::SIZE
            )));
        }
        Ok(Self {
            magic: read_u32(bytes, 0),
            checksum: read_u32(bytes, 4),
            buffer_count: read_u64(bytes, 8),
            table_offset: read_u64(bytes, 16),
            seed: read_u32(bytes, 24),
            data_offset: read_u64(bytes, 28),
        })
    }
}

/// One offsets-table entry: which codec a node buffer was encoded with and
/// where its bytes live inside the data segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry {
    /// Codec id (see [`crate::codec`]).
    pub codec_id: u8,
    /// Offset of the encoded buffer, relative to the data segment.
    pub offset: u64,
    /// Length of the encoded buffer.
    pub length: u64,
}

impl TableEntry {
    /// The packed size of an entry: codec(1) + offset(8) + length(8).
    pub const SIZE: usize = 17;

    /// Serializes to the packed fixed-size form.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = self.codec_id;
        buf[1..9].copy_from_slice(&self.offset.to_le_bytes());
        buf[9..17].copy_from_slice(&self.length.to_le_bytes());
        buf
    }

    /// Deserializes an entry from the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(StowageError::Corrupt(
                "buffer too small for a table entry".into(),
            ));
        }
        Ok(Self {
            codec_id: bytes[0],
            offset: read_u64(bytes, 1),
            length: read_u64(bytes, 9),
        })
    }
}

/// Validates the offsets-table region declared by `header` against the total
/// buffer length and returns the byte range of the table.
pub(crate) fn table_range(header: &FileHeader, total_len: usize) -> Result<std::ops::Range<usize>> {
    let count = usize::try_from(header.buffer_count)
        .map_err(|_| StowageError::Corrupt("buffer count exceeds address space".into()))?;
    let table_len = checked_mul(count, TableEntry::SIZE)?;
    let start = usize::try_from(header.table_offset)
        .map_err(|_| StowageError::Corrupt("offsets table offset exceeds address space".into()))?;
    let end = checked_range(start, table_len, total_len)?;
    Ok(start..end)
}

pub(crate) fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(raw)
}

pub(crate) fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(raw)
}
