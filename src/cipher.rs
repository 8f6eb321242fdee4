//! The reversible obfuscation pass applied to a packed container's body.
//!
//! A keyed additive stream cipher over 32-bit little-endian words. The key is
//! first perturbed by a word derived from the region's word count; the region
//! is then processed as `block_size` interleaved sub-streams (word position
//! modulo `block_size`), each walking its words with a running key that
//! advances by the complement of the ciphertext word plus a replicated,
//! complemented function of the word's index. Feeding the ciphertext in both
//! directions is what makes the transform reversible.
//!
//! This is an avalanche obfuscation, not security-grade encryption: it keeps
//! casual editors out of a settings file and makes every body byte depend on
//! its predecessors within the sub-stream, nothing more.

use crate::error::{Result, StowageError};

/// Replicates a byte across all four lanes of a word.
fn replicate(byte: u8) -> u32 {
    u32::from_le_bytes([byte; 4])
}

fn word_at(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn apply(data: &mut [u8], key: u32, block_size: usize, decrypt: bool) -> Result<()> {
    // Block size zero disables the pass entirely.
    if block_size == 0 {
        return Ok(());
    }
    if data.len() % 4 != 0 {
        return Err(StowageError::Corrupt(format!(
            "cipher region of {} bytes is not word aligned",
            data.len()
        )));
    }
    let word_count = data.len() / 4;
    let base_key = key ^ !replicate(word_count as u8);

    for stream in 0..block_size {
        let mut running = base_key;
        let mut index = stream;
        while index < word_count {
            let offset = index * 4;
            let before = word_at(data, offset);
            let after = before ^ running;
            data[offset..offset + 4].copy_from_slice(&after.to_le_bytes());

            // The ciphertext word: the one just written when encrypting, the
            // one just read when decrypting.
            let feed = if decrypt { before } else { after };
            running = running
                .wrapping_add(!feed)
                .wrapping_add(!replicate(index as u8));
            index += block_size;
        }
    }
    Ok(())
}

/// Obfuscates `data` in place.
pub fn encrypt(data: &mut [u8], key: u32, block_size: usize) -> Result<()> {
    apply(data, key, block_size, false)
}

/// Reverses [`encrypt`] given the same key and block size.
pub fn decrypt(data: &mut [u8], key: u32, block_size: usize) -> Result<()> {
    apply(data, key, block_size, true)
}
