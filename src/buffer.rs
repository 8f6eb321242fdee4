//! The growable, bounds-checked byte store underlying every other stage.
//!
//! A [`ByteBuffer`] only ever grows; regions already written are immutable
//! except through the explicit [`ByteBuffer::overwrite`] patch used for the
//! reserved checksum field. Every read is validated against the current
//! length, and every size computation routes through the checked helpers in
//! this module so that hostile lengths fail closed instead of wrapping.

use crate::error::{Result, StowageError};
use crate::scalar::Scalar;

/// Adds two sizes, failing with [`StowageError::Overflow`] instead of wrapping.
pub(crate) fn checked_add(a: usize, b: usize) -> Result<usize> {
    a.checked_add(b)
        .ok_or_else(|| StowageError::Overflow(format!("{a} + {b} exceeds usize")))
}

/// Multiplies two sizes, failing with [`StowageError::Overflow`] instead of wrapping.
pub(crate) fn checked_mul(a: usize, b: usize) -> Result<usize> {
    a.checked_mul(b)
        .ok_or_else(|| StowageError::Overflow(format!("{a} * {b} exceeds usize")))
}

/// Validates that `[offset, offset + len)` lies inside a buffer of `limit`
/// bytes and returns the (checked) end of the range.
pub(crate) fn checked_range(offset: usize, len: usize, limit: usize) -> Result<usize> {
    let end = checked_add(offset, len)?;
    if end > limit {
        return Err(StowageError::OutOfRange(format!(
            "range {offset}..{end} exceeds buffer of {limit} bytes"
        )));
    }
    Ok(end)
}

/// Contiguous owned bytes with append-only growth and random-access reads.
///
/// The buffer is exclusively owned by whichever pipeline stage is currently
/// building it and moved, never shared, between stages.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
}

impl ByteBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Creates an empty buffer with `capacity` bytes pre-reserved.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Current length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrows the whole buffer.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer, yielding the raw bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    fn reserve(&mut self, additional: usize) -> Result<()> {
        self.data.try_reserve(additional)?;
        Ok(())
    }

    /// Grows the buffer by `n` zero bytes and returns the offset of the first
    /// new byte (the prior length).
    pub fn alloc(&mut self, n: usize) -> Result<usize> {
        let offset = self.data.len();
        checked_add(offset, n)?;
        self.reserve(n)?;
        self.data.resize(offset + n, 0);
        Ok(offset)
    }

    /// Copies `bytes` to the end of the buffer and returns their offset.
    ///
    /// With `dedup` set, the existing content is first scanned linearly for an
    /// identical window; if one exists its offset is returned and the buffer
    /// does not grow. The scan is O(n*m) — callers should only enable it for
    /// short, repetitive payloads such as interned type names.
    pub fn append(&mut self, bytes: &[u8], dedup: bool) -> Result<usize> {
        if bytes.is_empty() {
            return Ok(self.data.len());
        }
        if dedup {
            if let Some(offset) = self
                .data
                .windows(bytes.len())
                .position(|window| window == bytes)
            {
                return Ok(offset);
            }
        }
        let offset = self.data.len();
        checked_add(offset, bytes.len())?;
        self.reserve(bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(offset)
    }

    /// Appends a fixed-size scalar in little-endian encoding, returning its
    /// offset.
    pub fn append_scalar<T: Scalar>(&mut self, value: T) -> Result<usize> {
        let offset = self.data.len();
        checked_add(offset, T::SIZE)?;
        self.reserve(T::SIZE)?;
        value.write_le(&mut self.data);
        Ok(offset)
    }

    /// Appends a NUL-terminated string (`s.len() + 1` bytes), returning its
    /// offset. With `dedup` set, an identical terminated string already in the
    /// buffer is reused instead.
    pub fn append_str(&mut self, s: &str, dedup: bool) -> Result<usize> {
        let mut bytes = Vec::new();
        bytes.try_reserve(checked_add(s.len(), 1)?)?;
        bytes.extend_from_slice(s.as_bytes());
        bytes.push(0);
        self.append(&bytes, dedup)
    }

    /// Appends another buffer's entire contents, returning the offset.
    pub fn append_buffer(&mut self, other: &ByteBuffer) -> Result<usize> {
        self.append(other.as_slice(), false)
    }

    /// Bounds-checked borrow of `len` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let end = checked_range(offset, len, self.data.len())?;
        Ok(&self.data[offset..end])
    }

    /// Bounds-checked typed read of a scalar stored at `offset`.
    pub fn read_scalar<T: Scalar>(&self, offset: usize) -> Result<T> {
        T::read_le(self.slice(offset, T::SIZE)?)
    }

    /// Reads a NUL-terminated string starting at `offset`.
    ///
    /// The scan is capped by the buffer length; a string that runs off the end
    /// without a terminator fails with [`StowageError::Corrupt`], as does
    /// invalid UTF-8.
    pub fn read_str(&self, offset: usize) -> Result<&str> {
        read_cstr(&self.data, offset)
    }

    /// Patches an already-written region in place.
    ///
    /// The only sanctioned use is filling the reserved checksum field of a
    /// file header after the surrounding bytes are final.
    pub fn overwrite(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let end = checked_range(offset, bytes.len(), self.data.len())?;
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

/// Scans `data` from `offset` for a NUL terminator and returns the preceding
/// bytes as UTF-8. Shared by [`ByteBuffer::read_str`] and the node unpacker,
/// which works on plain slices.
pub(crate) fn read_cstr(data: &[u8], offset: usize) -> Result<&str> {
    if offset >= data.len() {
        return Err(StowageError::OutOfRange(format!(
            "string offset {offset} exceeds buffer of {} bytes",
            data.len()
        )));
    }
    let tail = &data[offset..];
    let nul = tail.iter().position(|&b| b == 0).ok_or_else(|| {
        StowageError::Corrupt(format!("string at offset {offset} is unterminated"))
    })?;
    std::str::from_utf8(&tail[..nul])
        .map_err(|e| StowageError::Corrupt(format!("string at offset {offset} is not UTF-8: {e}")))
}
