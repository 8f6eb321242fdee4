#![allow(missing_docs)]

use stowage::{ByteBuffer, StowageError};

// --- GROWTH ---

#[test]
fn alloc_returns_prior_length_and_zero_fills() -> stowage::Result<()> {
    let mut buf = ByteBuffer::new();
    assert_eq!(buf.alloc(4)?, 0);
    assert_eq!(buf.alloc(3)?, 4);
    assert_eq!(buf.len(), 7);
    assert_eq!(buf.as_slice(), &[0u8; 7]);
    Ok(())
}

#[test]
fn alloc_overflow_fails_closed() -> stowage::Result<()> {
    let mut buf = ByteBuffer::new();
    buf.append(&[1], false)?;
    let err = buf.alloc(usize::MAX).unwrap_err();
    assert!(matches!(err, StowageError::Overflow(_)));
    Ok(())
}

// --- APPEND / DEDUP ---

#[test]
fn append_returns_offsets_in_order() -> stowage::Result<()> {
    let mut buf = ByteBuffer::new();
    assert_eq!(buf.append(b"abc", false)?, 0);
    assert_eq!(buf.append(b"de", false)?, 3);
    assert_eq!(buf.as_slice(), b"abcde");
    Ok(())
}

#[test]
fn dedup_append_reuses_identical_window() -> stowage::Result<()> {
    let mut buf = ByteBuffer::new();
    let first = buf.append(b"Spectrum", true)?;
    let len_after_first = buf.len();
    let second = buf.append(b"Spectrum", true)?;
    assert_eq!(first, second);
    assert_eq!(buf.len(), len_after_first);
    Ok(())
}

#[test]
fn dedup_append_finds_embedded_window() -> stowage::Result<()> {
    let mut buf = ByteBuffer::new();
    buf.append(b"calibration", false)?;
    // "libra" occurs inside the existing content.
    assert_eq!(buf.append(b"libra", true)?, 2);
    assert_eq!(buf.len(), 11);
    Ok(())
}

#[test]
fn append_without_dedup_always_grows() -> stowage::Result<()> {
    let mut buf = ByteBuffer::new();
    buf.append(b"xy", false)?;
    assert_eq!(buf.append(b"xy", false)?, 2);
    assert_eq!(buf.len(), 4);
    Ok(())
}

// --- TYPED ACCESS ---

#[test]
fn scalar_roundtrip_at_offset() -> stowage::Result<()> {
    let mut buf = ByteBuffer::new();
    let a = buf.append_scalar(0xDEAD_BEEFu32)?;
    let b = buf.append_scalar(-42i64)?;
    let c = buf.append_scalar(2.5f64)?;
    assert_eq!(buf.read_scalar::<u32>(a)?, 0xDEAD_BEEF);
    assert_eq!(buf.read_scalar::<i64>(b)?, -42);
    assert_eq!(buf.read_scalar::<f64>(c)?, 2.5);
    Ok(())
}

#[test]
fn read_past_end_is_out_of_range() -> stowage::Result<()> {
    let mut buf = ByteBuffer::new();
    buf.append(&[1, 2, 3], false)?;
    let err = buf.read_scalar::<u32>(1).unwrap_err();
    assert!(matches!(err, StowageError::OutOfRange(_)));
    assert!(matches!(
        buf.slice(4, 1).unwrap_err(),
        StowageError::OutOfRange(_)
    ));
    Ok(())
}

#[test]
fn strings_are_nul_terminated_and_capped() -> stowage::Result<()> {
    let mut buf = ByteBuffer::new();
    let off = buf.append_str("Display", false)?;
    assert_eq!(buf.len(), 8); // 7 chars + NUL
    assert_eq!(buf.read_str(off)?, "Display");

    // A string that runs off the end without a terminator is corrupt.
    let mut raw = ByteBuffer::from(b"abc".to_vec());
    assert!(matches!(
        raw.read_str(0).unwrap_err(),
        StowageError::Corrupt(_)
    ));
    raw.append(&[0], false)?;
    assert_eq!(raw.read_str(0)?, "abc");
    Ok(())
}

#[test]
fn overwrite_patches_in_place_only_within_bounds() -> stowage::Result<()> {
    let mut buf = ByteBuffer::new();
    buf.append(&[0u8; 8], false)?;
    buf.overwrite(4, &[9, 9])?;
    assert_eq!(buf.as_slice(), &[0, 0, 0, 0, 9, 9, 0, 0]);
    assert!(matches!(
        buf.overwrite(7, &[1, 2]).unwrap_err(),
        StowageError::OutOfRange(_)
    ));
    Ok(())
}

#[test]
fn append_buffer_concatenates() -> stowage::Result<()> {
    let mut a = ByteBuffer::new();
    a.append(b"head", false)?;
    let mut b = ByteBuffer::new();
    b.append(b"tail", false)?;
    assert_eq!(a.append_buffer(&b)?, 4);
    assert_eq!(a.as_slice(), b"headtail");
    Ok(())
}
