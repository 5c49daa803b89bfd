//! Drain throughput benchmarks.
//!
//! Measures [`OffsetReader::drain`] over an in-memory file. Every trigger
//! ends in a drain, so its cost bounds how far behind a busy file the
//! engine can fall.
//!
//! # Groups
//!
//! | Group | What it measures |
//! |-------|-----------------|
//! | `backfill` | One drain of a 1 MiB file at several chunk sizes, binary and line mode |
//! | `follow` | Repeated small appends, each followed by a drain |
//!
//! # Viewing results
//!
//! ```sh
//! cargo bench --bench drain_bench
//! open target/criterion/report/index.html
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tailgate::reader::OffsetReader;
use tailgate::Mode;

fn corpus(bytes: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes + 64);
    let mut i = 0usize;
    while out.len() < bytes {
        out.extend_from_slice(format!("2026-01-15T10:00:00Z INFO request {i} served in 3ms\n").as_bytes());
        i += 1;
    }
    out.truncate(bytes);
    out
}

// ---------------------------------------------------------------------------
// Backfill
// ---------------------------------------------------------------------------

fn backfill_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("backfill");
    let content = corpus(1 << 20);
    group.throughput(Throughput::Bytes(content.len() as u64));

    for mode in [Mode::Binary, Mode::Line] {
        for chunk_size in [64usize, 1000, 64 * 1024] {
            group.bench_with_input(
                BenchmarkId::new(mode.to_string(), chunk_size),
                &chunk_size,
                |b, &chunk_size| {
                    b.iter_batched(
                        || OffsetReader::new(content.clone(), chunk_size),
                        |mut reader| black_box(reader.drain(mode).unwrap()),
                        criterion::BatchSize::LargeInput,
                    )
                },
            );
        }
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Follow
// ---------------------------------------------------------------------------

fn follow_bench(c: &mut Criterion) {
    let mut group = c.benchmark_group("follow");
    let line = b"2026-01-15T10:00:00Z INFO heartbeat\n";
    group.throughput(Throughput::Bytes((line.len() * 100) as u64));

    for mode in [Mode::Binary, Mode::Line] {
        group.bench_function(BenchmarkId::new(mode.to_string(), 100), |b| {
            b.iter_batched(
                || OffsetReader::new(Vec::with_capacity(line.len() * 100), 1000),
                |mut reader| {
                    for _ in 0..100 {
                        reader.handle_mut().extend_from_slice(line);
                        black_box(reader.drain(mode).unwrap());
                    }
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, backfill_bench, follow_bench);
criterion_main!(benches);
