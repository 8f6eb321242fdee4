//! The two purpose-built run-length codecs and the best-of-N selection.
//!
//! This module defines the [`Codec`] trait, the pass-through, RLE8 and RLE0
//! implementations, and a registry that maps the codec id recorded in a
//! container's offsets table back to a decoder.
//!
//! [`encode_best`] is the only encoding entry point the container uses: it
//! runs every enabled codec and keeps the smallest result, so an encoded
//! buffer is never larger than its raw form.

use crate::error::{Result, StowageError};

/// Codec id for the pass-through encoding.
pub const CODEC_NONE: u8 = 0;
/// Codec id for plain byte run-length encoding.
pub const CODEC_RLE8: u8 = 1;
/// Codec id for the literal-block refinement over RLE8.
pub const CODEC_RLE0: u8 = 2;

/// Interface for buffer transforms.
///
/// Implementors are pure: the same input always yields the same output, and
/// `decode(encode(x)) == x` for every byte buffer `x`.
pub trait Codec: Send + Sync + std::fmt::Debug {
    /// The unique id recorded in the offsets table.
    fn id(&self) -> u8;

    /// Transforms raw bytes into the encoded form.
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Inverse of [`Codec::encode`].
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// The set of codecs `encode_best` is allowed to try.
///
/// The pass-through encoding is always a candidate and cannot be disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecSet(u8);

impl CodecSet {
    /// Pass-through only.
    pub const NONE: CodecSet = CodecSet(0);
    /// RLE8 enabled.
    pub const RLE8: CodecSet = CodecSet(1 << 0);
    /// RLE0 enabled.
    pub const RLE0: CodecSet = CodecSet(1 << 1);
    /// Both RLE variants enabled.
    pub const ALL: CodecSet = CodecSet(0b11);

    /// Returns true if every codec in `other` is enabled in `self`.
    pub fn contains(self, other: CodecSet) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for CodecSet {
    type Output = CodecSet;

    fn bitor(self, rhs: CodecSet) -> CodecSet {
        CodecSet(self.0 | rhs.0)
    }
}

// --- Pass-through ---

/// A codec that performs no transformation (id 0).
#[derive(Debug, Clone, Copy)]
pub struct NoCodec;

impl Codec for NoCodec {
    fn id(&self) -> u8 {
        CODEC_NONE
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

// --- RLE8 ---

/// Byte-level run-length encoding (id 1).
///
/// Each run of identical bytes (capped at 255) becomes a `(count, value)`
/// pair. Worst case output (no repeats anywhere) doubles the input size.
#[derive(Debug, Clone, Copy)]
pub struct Rle8;

impl Codec for Rle8 {
    fn id(&self) -> u8 {
        CODEC_RLE8
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < data.len() {
            let value = data[i];
            let mut count = 1usize;
            while count < 255 && i + count < data.len() && data[i + count] == value {
                count += 1;
            }
            out.push(count as u8);
            out.push(value);
            i += count;
        }
        Ok(out)
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() % 2 != 0 {
            return Err(StowageError::Corrupt(
                "RLE8 stream has a dangling half pair".into(),
            ));
        }
        let mut out = Vec::new();
        for pair in data.chunks_exact(2) {
            let count = pair[0];
            if count == 0 {
                return Err(StowageError::Corrupt("RLE8 run of length zero".into()));
            }
            out.try_reserve(count as usize)?;
            out.resize(out.len() + count as usize, pair[1]);
        }
        Ok(out)
    }
}

// --- RLE0 ---

/// Literal-block refinement over RLE8 (id 2).
///
/// A second pass over the RLE8 pair stream that collapses runs of literal
/// (count = 1) pairs into blocks. The stream is a sequence of records
/// `[0x00 new_size]? occurrence block[block_size]`, where a leading zero byte
/// changes the block-size context (default 1). The same record shape models
/// both literal blocks (occurrence 1) and passthrough RLE8 pairs
/// (block size 1), so decoding needs no mode flag.
#[derive(Debug, Clone, Copy)]
pub struct Rle0;

impl Rle0 {
    /// Emits the command that restores the block-size context, if needed.
    fn restore_context(out: &mut Vec<u8>, block_size: &mut usize) {
        if *block_size != 1 {
            out.push(0);
            out.push(1);
            *block_size = 1;
        }
    }
}

impl Codec for Rle0 {
    fn id(&self) -> u8 {
        CODEC_RLE0
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let pairs = Rle8.encode(data)?;
        let mut out = Vec::new();
        let mut block_size = 1usize;
        let mut i = 0;
        while i < pairs.len() {
            let count = pairs[i];
            if count != 1 {
                Self::restore_context(&mut out, &mut block_size);
                out.push(count);
                out.push(pairs[i + 1]);
                i += 2;
                continue;
            }

            // Gather up to 255 consecutive literal pairs.
            let mut end = i + 2;
            let mut values = 1usize;
            while end < pairs.len() && pairs[end] == 1 && values < 255 {
                values += 1;
                end += 2;
            }

            // The context-switch penalty is charged on the block branch only;
            // a tie falls back to raw pairs.
            let cost_raw = 2 * values;
            let cost_block = values + 1 + if block_size != values { 2 } else { 0 };
            if cost_block < cost_raw {
                if block_size != values {
                    out.push(0);
                    out.push(values as u8);
                    block_size = values;
                }
                out.push(1);
                let mut k = i;
                while k < end {
                    out.push(pairs[k + 1]);
                    k += 2;
                }
            } else {
                Self::restore_context(&mut out, &mut block_size);
                let mut k = i;
                while k < end {
                    out.push(1);
                    out.push(pairs[k + 1]);
                    k += 2;
                }
            }
            i = end;
        }
        Ok(out)
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut block_size = 1usize;
        let mut i = 0;
        while i < data.len() {
            let mut occurrence = data[i];
            i += 1;
            if occurrence == 0 {
                let new_size = *data.get(i).ok_or_else(|| {
                    StowageError::Corrupt("RLE0 block-size command truncated".into())
                })?;
                if new_size == 0 {
                    return Err(StowageError::Corrupt("RLE0 block size of zero".into()));
                }
                block_size = new_size as usize;
                i += 1;
                occurrence = *data.get(i).ok_or_else(|| {
                    StowageError::Corrupt("RLE0 record missing occurrence count".into())
                })?;
                i += 1;
                if occurrence == 0 {
                    return Err(StowageError::Corrupt(
                        "RLE0 consecutive block-size commands".into(),
                    ));
                }
            }
            if i + block_size > data.len() {
                return Err(StowageError::Corrupt("RLE0 block truncated".into()));
            }
            let block = &data[i..i + block_size];
            i += block_size;
            out.try_reserve(occurrence as usize * block_size)?;
            for _ in 0..occurrence {
                out.extend_from_slice(block);
            }
        }
        Ok(out)
    }
}

// --- REGISTRY ---

/// Maps codec ids recorded in a file back to decoder implementations.
#[derive(Debug)]
pub struct CodecRegistry {
    codecs: Vec<Option<Box<dyn Codec>>>,
}

impl CodecRegistry {
    /// Creates a registry with the three standard codecs registered.
    pub fn new() -> Self {
        let mut reg = Self { codecs: Vec::new() };
        reg.register(Box::new(NoCodec));
        reg.register(Box::new(Rle8));
        reg.register(Box::new(Rle0));
        reg
    }

    /// Registers a codec in the slot named by its id, replacing any previous
    /// occupant.
    pub fn register(&mut self, codec: Box<dyn Codec>) {
        let id = codec.id() as usize;
        if id >= self.codecs.len() {
            self.codecs.resize_with(id + 1, || None);
        }
        self.codecs[id] = Some(codec);
    }

    /// Retrieves a codec by id.
    ///
    /// # Errors
    /// Returns [`StowageError::UnknownEncoding`] for unregistered ids.
    pub fn get(&self, id: u8) -> Result<&dyn Codec> {
        self.codecs
            .get(id as usize)
            .and_then(|slot| slot.as_deref())
            .ok_or(StowageError::UnknownEncoding(id))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Encodes `data` with every enabled codec and returns the smallest result
/// tagged with its codec id.
///
/// The pass-through encoding is always a candidate, so the result is never
/// larger than `data`. Among equal-size results the lowest id wins.
pub fn encode_best(data: &[u8], enabled: CodecSet) -> Result<(u8, Vec<u8>)> {
    let mut best_id = CODEC_NONE;
    let mut best = data.to_vec();
    if enabled.contains(CodecSet::RLE8) {
        let candidate = Rle8.encode(data)?;
        if candidate.len() < best.len() {
            best_id = CODEC_RLE8;
            best = candidate;
        }
    }
    if enabled.contains(CodecSet::RLE0) {
        let candidate = Rle0.encode(data)?;
        if candidate.len() < best.len() {
            best_id = CODEC_RLE0;
            best = candidate;
        }
    }
    tracing::trace!(
        codec = best_id,
        raw = data.len(),
        encoded = best.len(),
        "selected encoding"
    );
    Ok((best_id, best))
}

/// Decodes `data` with the codec recorded for it.
pub fn decode_with(id: u8, data: &[u8]) -> Result<Vec<u8>> {
    CodecRegistry::new().get(id)?.decode(data)
}
