#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use stowage::codec::encode_best;
use stowage::{Codec, CodecSet, Container, ContainerConfig, ObjectNode, Rle0, Rle8};

/// Spectrum-like payload: long flat baselines with occasional peaks.
fn spectrum_bytes(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| if i % 97 < 90 { 12u8 } else { (i % 251) as u8 })
        .collect()
}

fn calibration_container() -> Container {
    let config = ContainerConfig::new(0x4245_4E43).with_cipher(0xBEBE_CAFE, 4);
    let mut container = Container::new(config);
    for run in 0..8 {
        let mut node = ObjectNode::new("Spectrum", format!("run{run}"));
        node.set_type_tag("Spectrum");
        node.add_scalar("Spectrum", "exposure_ms", 250u32);
        node.add_scalar("Spectrum", "gain", 1.5f64);
        node.add_bytes("Spectrum", "samples", &spectrum_bytes(16 * 1024));
        container.push(node);
    }
    container
}

// --- BENCHMARKS ---

fn bench_codecs(c: &mut Criterion) {
    let data = spectrum_bytes(256 * 1024);

    let mut group = c.benchmark_group("Codec Encode");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("rle8", |b| {
        b.iter(|| Rle8.encode(black_box(&data)).expect("encode"));
    });
    group.bench_function("rle0", |b| {
        b.iter(|| Rle0.encode(black_box(&data)).expect("encode"));
    });
    group.bench_function("best_of_n", |b| {
        b.iter(|| encode_best(black_box(&data), CodecSet::ALL).expect("encode"));
    });
    group.finish();
}

fn bench_container(c: &mut Criterion) {
    let container = calibration_container();
    let packed = container.pack(CodecSet::ALL).expect("pack");

    let mut group = c.benchmark_group("Container");
    group.throughput(Throughput::Bytes(packed.len() as u64));

    group.bench_function("pack", |b| {
        b.iter(|| black_box(&container).pack(CodecSet::ALL).expect("pack"));
    });
    group.bench_function("unpack", |b| {
        b.iter(|| {
            Container::unpack(black_box(&packed), container.config()).expect("unpack")
        });
    });
    group.finish();
}

criterion_group!(benches, bench_codecs, bench_container);
criterion_main!(benches);
