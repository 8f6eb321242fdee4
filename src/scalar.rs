//! Fixed-size leaf values and the cross-build widening rules.
//!
//! Every scalar a node can store carries a type tag (interned into the packed
//! string table) and a fixed byte width, and is encoded little-endian. The
//! tag travels with the data, which is what makes a packed buffer
//! self-describing: a reader always knows what it is looking at before it
//! commits to a decode.
//!
//! `usize` and `isize` are stored at their *native* width. A container packed
//! by a 32-bit build therefore records 4-byte entries under the same tag a
//! 64-bit build writes 8 bytes for; the [`Scalar::coerce`] hook is the fixed
//! allow-list that bridges exactly those mismatches and nothing else.

use crate::error::{Result, StowageError};

mod sealed {
    pub trait Sealed {}
}

/// A fixed-size value that can live in a [`FieldRecord`](crate::FieldRecord).
///
/// This trait is sealed; the set of scalar types is part of the wire format.
pub trait Scalar: Copy + sealed::Sealed {
    /// The type tag recorded alongside the value.
    const TAG: &'static str;

    /// Encoded width in bytes.
    const SIZE: usize;

    /// Appends the little-endian encoding to `out`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decodes from exactly [`Scalar::SIZE`] bytes.
    fn read_le(bytes: &[u8]) -> Result<Self>;

    /// Attempts to decode from a *differently sized* stored value.
    ///
    /// This is the numeric-widening allow-list: only the platform-width
    /// integers (`usize`, `isize`) and `char` override it. Every other type
    /// keeps the default, so an unlisted size mismatch fails loudly instead
    /// of silently coercing.
    fn coerce(stored: &[u8]) -> Option<Self> {
        let _ = stored;
        None
    }
}

fn size_guard(tag: &str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(StowageError::Corrupt(format!(
            "scalar {tag} expects {expected} bytes, got {got}"
        )));
    }
    Ok(())
}

fn le_u16(bytes: &[u8]) -> Option<u16> {
    Some(u16::from_le_bytes([*bytes.first()?, *bytes.get(1)?]))
}

fn le_u32(bytes: &[u8]) -> Option<u32> {
    let mut raw = [0u8; 4];
    if bytes.len() != 4 {
        return None;
    }
    raw.copy_from_slice(bytes);
    Some(u32::from_le_bytes(raw))
}

fn le_u64(bytes: &[u8]) -> Option<u64> {
    let mut raw = [0u8; 8];
    if bytes.len() != 8 {
        return None;
    }
    raw.copy_from_slice(bytes);
    Some(u64::from_le_bytes(raw))
}

macro_rules! impl_scalar_le {
    ($($t:ty => $tag:expr),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}

            impl Scalar for $t {
                const TAG: &'static str = $tag;
                const SIZE: usize = std::mem::size_of::<$t>();

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Result<Self> {
                    size_guard($tag, Self::SIZE, bytes.len())?;
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(bytes);
                    Ok(<$t>::from_le_bytes(raw))
                }
            }
        )*
    };
}

impl_scalar_le!(
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    f32 => "f32",
    f64 => "f64",
);

impl sealed::Sealed for usize {}

impl Scalar for usize {
    const TAG: &'static str = "usize";
    const SIZE: usize = std::mem::size_of::<usize>();

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Result<Self> {
        size_guard(Self::TAG, Self::SIZE, bytes.len())?;
        let mut raw = [0u8; std::mem::size_of::<usize>()];
        raw.copy_from_slice(bytes);
        Ok(usize::from_le_bytes(raw))
    }

    // 32 <-> 64 bit builds store this tag at different widths.
    fn coerce(stored: &[u8]) -> Option<Self> {
        match stored.len() {
            4 => Some(le_u32(stored)? as usize),
            8 => usize::try_from(le_u64(stored)?).ok(),
            _ => None,
        }
    }
}

impl sealed::Sealed for isize {}

impl Scalar for isize {
    const TAG: &'static str = "isize";
    const SIZE: usize = std::mem::size_of::<isize>();

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Result<Self> {
        size_guard(Self::TAG, Self::SIZE, bytes.len())?;
        let mut raw = [0u8; std::mem::size_of::<isize>()];
        raw.copy_from_slice(bytes);
        Ok(isize::from_le_bytes(raw))
    }

    fn coerce(stored: &[u8]) -> Option<Self> {
        match stored.len() {
            4 => isize::try_from(i64::from(le_u32(stored)? as i32)).ok(),
            8 => isize::try_from(le_u64(stored)? as i64).ok(),
            _ => None,
        }
    }
}

impl sealed::Sealed for bool {}

impl Scalar for bool {
    const TAG: &'static str = "bool";
    const SIZE: usize = 1;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    // Strict: a flipped bit must not silently become `true`.
    fn read_le(bytes: &[u8]) -> Result<Self> {
        size_guard(Self::TAG, Self::SIZE, bytes.len())?;
        match bytes.first() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            Some(b) => Err(StowageError::Corrupt(format!("bool encoded as {b}"))),
            None => Err(StowageError::Corrupt("bool with no bytes".into())),
        }
    }
}

impl sealed::Sealed for char {}

impl Scalar for char {
    const TAG: &'static str = "char";
    const SIZE: usize = 4;

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&u32::from(self).to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Result<Self> {
        size_guard(Self::TAG, Self::SIZE, bytes.len())?;
        let raw = le_u32(bytes)
            .ok_or_else(|| StowageError::Corrupt("char with truncated bytes".into()))?;
        char::from_u32(raw)
            .ok_or_else(|| StowageError::Corrupt(format!("invalid char code point {raw:#x}")))
    }

    // Accepts 2-byte narrow wide-char storage from older builds.
    fn coerce(stored: &[u8]) -> Option<Self> {
        match stored.len() {
            2 => char::from_u32(u32::from(le_u16(stored)?)),
            _ => None,
        }
    }
}
