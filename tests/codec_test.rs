#![allow(missing_docs)]

use stowage::codec::{decode_with, encode_best, CODEC_NONE, CODEC_RLE0, CODEC_RLE8};
use stowage::{Codec, CodecRegistry, CodecSet, NoCodec, Rle0, Rle8, StowageError};

fn roundtrip(codec: &dyn Codec, data: &[u8]) {
    let encoded = codec.encode(data).expect("encode");
    let decoded = codec.decode(&encoded).expect("decode");
    assert_eq!(decoded, data, "codec {} roundtrip", codec.id());
}

// --- RLE8 ---

#[test]
fn rle8_known_vectors() -> stowage::Result<()> {
    assert_eq!(Rle8.encode(&[5, 5, 5, 1])?, vec![3, 5, 1, 1]);
    assert_eq!(Rle8.encode(&[])?, Vec::<u8>::new());
    assert_eq!(Rle8.encode(&[9])?, vec![1, 9]);
    Ok(())
}

#[test]
fn rle8_run_cap_at_255() -> stowage::Result<()> {
    let exactly = vec![7u8; 255];
    assert_eq!(Rle8.encode(&exactly)?, vec![255, 7]);

    let one_more = vec![7u8; 256];
    assert_eq!(Rle8.encode(&one_more)?, vec![255, 7, 1, 7]);

    roundtrip(&Rle8, &exactly);
    roundtrip(&Rle8, &one_more);
    roundtrip(&Rle8, &vec![7u8; 1000]);
    Ok(())
}

#[test]
fn rle8_worst_case_doubles() -> stowage::Result<()> {
    let distinct: Vec<u8> = (0..=255).collect();
    let encoded = Rle8.encode(&distinct)?;
    assert_eq!(encoded.len(), distinct.len() * 2);
    roundtrip(&Rle8, &distinct);
    Ok(())
}

#[test]
fn rle8_rejects_malformed_streams() {
    assert!(matches!(
        Rle8.decode(&[3, 1, 2]).unwrap_err(),
        StowageError::Corrupt(_)
    ));
    assert!(matches!(
        Rle8.decode(&[0, 9]).unwrap_err(),
        StowageError::Corrupt(_)
    ));
}

// --- RLE0 ---

#[test]
fn rle0_collapses_literal_runs() -> stowage::Result<()> {
    // Ten distinct bytes: RLE8 doubles them to 20 bytes; RLE0 stores a
    // block-size command, an occurrence tag and the ten literals.
    let data: Vec<u8> = (0..10).collect();
    let encoded = Rle0.encode(&data)?;
    assert_eq!(encoded, vec![0, 10, 1, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(Rle0.decode(&encoded)?, data);
    Ok(())
}

#[test]
fn rle0_short_literal_runs_stay_raw_pairs() -> stowage::Result<()> {
    // Three literals tie with the block form (6 bytes each); ties fall back
    // to raw pairs.
    let data = vec![1, 2, 3];
    assert_eq!(Rle0.encode(&data)?, vec![1, 1, 1, 2, 1, 3]);
    Ok(())
}

#[test]
fn rle0_passes_runs_through() -> stowage::Result<()> {
    let data = vec![4u8; 100];
    assert_eq!(Rle0.encode(&data)?, vec![100, 4]);
    Ok(())
}

#[test]
fn rle0_restores_context_between_blocks_and_runs() -> stowage::Result<()> {
    // Literal block, then a run: the run must be preceded by a
    // restore-to-block-size-1 command.
    let mut data: Vec<u8> = (0..10).collect();
    data.extend(std::iter::repeat(200).take(50));
    let encoded = Rle0.encode(&data)?;
    assert_eq!(
        encoded,
        vec![0, 10, 1, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1, 50, 200]
    );
    assert_eq!(Rle0.decode(&encoded)?, data);
    Ok(())
}

#[test]
fn rle0_roundtrips_edge_shapes() {
    roundtrip(&Rle0, &[]);
    roundtrip(&Rle0, &[0]);
    roundtrip(&Rle0, &vec![9u8; 255]);
    roundtrip(&Rle0, &vec![9u8; 256]);
    roundtrip(&Rle0, &(0..=255).collect::<Vec<u8>>());
    // Literal run longer than 255 splits into chunks.
    let long: Vec<u8> = (0..=255).chain(0..=255).map(|b| b ^ 0x5A).collect();
    roundtrip(&Rle0, &long);
    // Alternating runs and literals.
    let mut mixed = Vec::new();
    for i in 0..40u8 {
        mixed.extend(std::iter::repeat(i).take(if i % 3 == 0 { 7 } else { 1 }));
    }
    roundtrip(&Rle0, &mixed);
}

#[test]
fn rle0_rejects_malformed_streams() {
    // Truncated block-size command.
    assert!(matches!(
        Rle0.decode(&[0]).unwrap_err(),
        StowageError::Corrupt(_)
    ));
    // Block size of zero.
    assert!(matches!(
        Rle0.decode(&[0, 0, 1, 5]).unwrap_err(),
        StowageError::Corrupt(_)
    ));
    // Two commands in a row.
    assert!(matches!(
        Rle0.decode(&[0, 2, 0, 1]).unwrap_err(),
        StowageError::Corrupt(_)
    ));
    // Block runs past the end.
    assert!(matches!(
        Rle0.decode(&[0, 4, 1, 1, 2]).unwrap_err(),
        StowageError::Corrupt(_)
    ));
}

// --- SELECTION ---

#[test]
fn encode_best_never_exceeds_raw() -> stowage::Result<()> {
    let inputs: Vec<Vec<u8>> = vec![
        vec![],
        (0..=255).collect(),
        vec![3; 1000],
        b"mixed mixed mixed payload".to_vec(),
    ];
    for input in inputs {
        let (id, encoded) = encode_best(&input, CodecSet::ALL)?;
        assert!(encoded.len() <= input.len());
        assert_eq!(decode_with(id, &encoded)?, input);
    }
    Ok(())
}

#[test]
fn encode_best_prefers_lowest_id_on_ties() -> stowage::Result<()> {
    // Distinct bytes: both RLE forms are larger than raw, so None wins.
    let distinct: Vec<u8> = (0..64).collect();
    let (id, encoded) = encode_best(&distinct, CodecSet::ALL)?;
    assert_eq!(id, CODEC_NONE);
    assert_eq!(encoded, distinct);

    // A long run: RLE8 and RLE0 produce identical two-byte output; the
    // lower id wins.
    let run = vec![8u8; 500];
    let (id, _) = encode_best(&run, CodecSet::ALL)?;
    assert_eq!(id, CODEC_RLE8);
    Ok(())
}

#[test]
fn encode_best_honors_enabled_set() -> stowage::Result<()> {
    let run = vec![8u8; 500];
    let (id, encoded) = encode_best(&run, CodecSet::NONE)?;
    assert_eq!(id, CODEC_NONE);
    assert_eq!(encoded.len(), run.len());

    let (id, _) = encode_best(&run, CodecSet::RLE0)?;
    assert_eq!(id, CODEC_RLE0);
    Ok(())
}

// --- REGISTRY ---

#[test]
fn registry_dispatches_by_id() -> stowage::Result<()> {
    let registry = CodecRegistry::new();
    assert_eq!(registry.get(CODEC_NONE)?.id(), NoCodec.id());
    assert_eq!(registry.get(CODEC_RLE8)?.id(), Rle8.id());
    assert_eq!(registry.get(CODEC_RLE0)?.id(), Rle0.id());
    assert!(matches!(
        registry.get(7).unwrap_err(),
        StowageError::UnknownEncoding(7)
    ));
    Ok(())
}
