#![allow(missing_docs)]

use stowage::checksum::checksum;
use stowage::cipher::{decrypt, encrypt};
use stowage::StowageError;

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(7)).collect()
}

// --- CIPHER ---

#[test]
fn cipher_roundtrips_for_all_block_sizes() -> stowage::Result<()> {
    let original = sample(64);
    for block_size in [1usize, 2, 3, 4, 8, 16, 64, 100] {
        for key in [0u32, 1, 0xDEAD_BEEF, u32::MAX] {
            let mut data = original.clone();
            encrypt(&mut data, key, block_size)?;
            decrypt(&mut data, key, block_size)?;
            assert_eq!(data, original, "key {key:#x} block {block_size}");
        }
    }
    Ok(())
}

#[test]
fn cipher_block_zero_is_passthrough() -> stowage::Result<()> {
    let original = sample(32);
    let mut data = original.clone();
    encrypt(&mut data, 0xABCD_EF01, 0)?;
    assert_eq!(data, original);
    Ok(())
}

#[test]
fn cipher_actually_scrambles() -> stowage::Result<()> {
    let original = sample(32);
    let mut data = original.clone();
    encrypt(&mut data, 0x1234_5678, 2)?;
    assert_ne!(data, original);
    Ok(())
}

#[test]
fn cipher_output_depends_on_key_and_block_size() -> stowage::Result<()> {
    let original = sample(32);
    let mut a = original.clone();
    let mut b = original.clone();
    let mut c = original.clone();
    encrypt(&mut a, 1, 2)?;
    encrypt(&mut b, 2, 2)?;
    encrypt(&mut c, 1, 4)?;
    assert_ne!(a, b);
    assert_ne!(a, c);
    Ok(())
}

#[test]
fn cipher_rejects_unaligned_regions() {
    let mut data = sample(30);
    assert!(matches!(
        encrypt(&mut data, 1, 1).unwrap_err(),
        StowageError::Corrupt(_)
    ));
}

#[test]
fn wrong_key_does_not_restore() -> stowage::Result<()> {
    let original = sample(64);
    let mut data = original.clone();
    encrypt(&mut data, 0xAAAA_0001, 4)?;
    decrypt(&mut data, 0xAAAA_0002, 4)?;
    assert_ne!(data, original);
    Ok(())
}

// --- CHECKSUM ---

#[test]
fn checksum_known_values() {
    assert_eq!(checksum(&[]), 0xFFFF_FFFF);
    assert_eq!(checksum(&[0, 0, 0, 0]), 0);
}

#[test]
fn checksum_covers_tail_chunks() {
    // 4-, 2- and 1-byte tails all contribute.
    let base = sample(7);
    for i in 0..base.len() {
        let mut copy = base.clone();
        copy[i] ^= 0x40;
        assert_ne!(checksum(&copy), checksum(&base), "byte {i}");
    }
}

#[test]
fn single_bit_flip_always_changes_checksum() {
    let data = sample(128);
    let reference = checksum(&data);
    for byte in 0..data.len() {
        for bit in 0..8 {
            let mut copy = data.clone();
            copy[byte] ^= 1 << bit;
            assert_ne!(checksum(&copy), reference, "byte {byte} bit {bit}");
        }
    }
}
