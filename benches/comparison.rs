//! Throughput of the three core operations, compared across the two
//! weak/strong algorithm pairs the wire format supports (spec §3):
//! classic+MD4 (upstream rsync's historical default) against
//! RabinKarp+BLAKE2b (the recommended pair).

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use netdelta::magic::Magic;
use netdelta::whole::{self, FileReadSeek};
use std::io::Cursor;

const BLOCK_LEN: u32 = 2048;
const STRONG_LEN: usize = 16;

fn generate_test_data(size: usize) -> (Vec<u8>, Vec<u8>) {
    let mut original = Vec::with_capacity(size);
    let mut seed: u64 = 0xDEAD_BEEF;
    for _ in 0..size {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        original.push((seed >> 56) as u8);
    }

    let mut modified = original.clone();
    if size > 1000 {
        for i in (0..size).step_by(20) {
            modified[i] = modified[i].wrapping_add(1);
        }
        let block_start = size / 3;
        let block_len = size.min(500);
        for byte in modified.iter_mut().take((block_start + block_len).min(size)).skip(block_start) {
            *byte = 0xFF;
        }
        let insert_pos = size / 2;
        let insert_data: Vec<u8> = (0u8..100).map(|i| i.wrapping_mul(7)).collect();
        modified.splice(insert_pos..insert_pos, insert_data);
        let delete_start = size * 3 / 4;
        let delete_end = (delete_start + 50).min(modified.len());
        if delete_start < modified.len() {
            modified.drain(delete_start..delete_end);
        }
    }
    (original, modified)
}

const MAGICS: [(&str, Magic); 2] =
    [("classic_md4", Magic::SigClassicMd4), ("rabinkarp_blake2b", Magic::SigRabinKarpBlake2b)];

fn benchmark_signature_generation(c: &mut Criterion) {
    let sizes = [1_000, 10_000, 100_000, 1_000_000];
    let mut group = c.benchmark_group("signature_generation");

    for size in sizes {
        let (original, _) = generate_test_data(size);
        for (name, magic) in MAGICS {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter_batched(
                    || original.clone(),
                    |data| {
                        let mut sig = Vec::new();
                        whole::signature(&mut Cursor::new(&data), &mut sig, magic, BLOCK_LEN, STRONG_LEN).unwrap();
                        sig
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

fn benchmark_delta_generation(c: &mut Criterion) {
    let sizes = [1_000, 10_000, 100_000, 1_000_000];
    let mut group = c.benchmark_group("delta_generation");

    for size in sizes {
        let (original, modified) = generate_test_data(size);
        for (name, magic) in MAGICS {
            let mut sig_bytes = Vec::new();
            whole::signature(&mut Cursor::new(&original), &mut sig_bytes, magic, BLOCK_LEN, STRONG_LEN).unwrap();
            let table = whole::load_signature(&mut Cursor::new(&sig_bytes)).unwrap();

            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter_batched(
                    || modified.clone(),
                    |data| {
                        let mut delta = Vec::new();
                        whole::delta(&table, &mut Cursor::new(&data), &mut delta).unwrap();
                        delta
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

fn benchmark_patch_application(c: &mut Criterion) {
    let sizes = [1_000, 10_000, 100_000, 1_000_000];
    let mut group = c.benchmark_group("patch_application");

    for size in sizes {
        let (original, modified) = generate_test_data(size);
        for (name, magic) in MAGICS {
            let mut sig_bytes = Vec::new();
            whole::signature(&mut Cursor::new(&original), &mut sig_bytes, magic, BLOCK_LEN, STRONG_LEN).unwrap();
            let table = whole::load_signature(&mut Cursor::new(&sig_bytes)).unwrap();
            let mut delta = Vec::new();
            whole::delta(&table, &mut Cursor::new(&modified), &mut delta).unwrap();

            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter_batched(
                    || delta.clone(),
                    |d| {
                        let mut result = Vec::new();
                        whole::patch(&mut Cursor::new(&d), &mut result, FileReadSeek::new(Cursor::new(&original))).unwrap();
                        result
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

fn benchmark_end_to_end(c: &mut Criterion) {
    let sizes = [1_000, 10_000, 100_000, 1_000_000];
    let mut group = c.benchmark_group("end_to_end");

    for size in sizes {
        let (original, modified) = generate_test_data(size);
        for (name, magic) in MAGICS {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter_batched(
                    || (original.clone(), modified.clone()),
                    |(base, modified)| {
                        let mut sig = Vec::new();
                        whole::signature(&mut Cursor::new(&base), &mut sig, magic, BLOCK_LEN, STRONG_LEN).unwrap();
                        let table = whole::load_signature(&mut Cursor::new(&sig)).unwrap();

                        let mut delta = Vec::new();
                        whole::delta(&table, &mut Cursor::new(&modified), &mut delta).unwrap();

                        let mut result = Vec::new();
                        whole::patch(&mut Cursor::new(&delta), &mut result, FileReadSeek::new(Cursor::new(&base))).unwrap();
                        result
                    },
                    criterion::BatchSize::LargeInput,
                );
            });
        }
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_signature_generation,
    benchmark_delta_generation,
    benchmark_patch_application,
    benchmark_end_to_end,
);

criterion_main!(benches);
