// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Benchmarks for the persistent queue.
//!
//! Every mutation rewrites the full snapshot, so cost grows with queue length.
//! Measures:
//! - Enqueue latency at different queue lengths (Buffered and Sync)
//! - Dequeue latency at different queue lengths
//! - Snapshot encode/decode cost

use std::{collections::VecDeque, hint::black_box};

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use durable_queue::{FlushMode, PersistentQueue, QueueBuilder, codec};
use tempfile::TempDir;

/// Queue lengths to benchmark
const QUEUE_LENGTHS: &[usize] = &[0, 100, 1_000, 10_000];

/// Payload size of each element (bytes)
const ELEMENT_SIZE: usize = 256;

fn element() -> Vec<u8> { vec![0xABu8; ELEMENT_SIZE] }

/// Create a queue pre-filled with `len` elements in a temporary directory
fn create_queue(temp_dir: &TempDir, flush_mode: FlushMode, len: usize) -> PersistentQueue<Vec<u8>> {
    let queue: PersistentQueue<Vec<u8>> = QueueBuilder::new(temp_dir.path().join("bench.q"))
        .flush_mode(FlushMode::Buffered)
        .build();
    for _ in 0..len {
        queue.enqueue(element());
    }
    drop(queue);

    QueueBuilder::new(temp_dir.path().join("bench.q"))
        .flush_mode(flush_mode)
        .build()
}

fn bench_enqueue(c: &mut Criterion, name: &str, flush_mode: FlushMode) {
    let mut group = c.benchmark_group(name);
    if flush_mode.is_sync() {
        group.sample_size(10);
    }

    for &len in QUEUE_LENGTHS {
        group.throughput(Throughput::Bytes(((len + 1) * ELEMENT_SIZE) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            let temp_dir = TempDir::new().unwrap();
            let queue = create_queue(&temp_dir, flush_mode, len);
            b.iter(|| {
                queue.enqueue(black_box(element()));
                queue.remove_at(len);
            });
        });
    }

    group.finish();
}

fn bench_enqueue_buffered(c: &mut Criterion) {
    bench_enqueue(c, "enqueue_buffered", FlushMode::Buffered);
}

fn bench_enqueue_sync(c: &mut Criterion) { bench_enqueue(c, "enqueue_sync", FlushMode::Sync); }

fn bench_dequeue(c: &mut Criterion) {
    let mut group = c.benchmark_group("dequeue_buffered");

    for &len in QUEUE_LENGTHS.iter().filter(|&&len| len > 0) {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter_batched(
                || {
                    let temp_dir = TempDir::new().unwrap();
                    let queue = create_queue(&temp_dir, FlushMode::Buffered, len);
                    (temp_dir, queue)
                },
                |(_temp_dir, queue)| black_box(queue.dequeue()),
                BatchSize::PerIteration,
            );
        });
    }

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_codec");

    for &len in QUEUE_LENGTHS {
        let items: VecDeque<Vec<u8>> = (0..len).map(|_| element()).collect();
        let bytes = codec::encode(&items).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", len), &items, |b, items| {
            b.iter(|| codec::encode(black_box(items)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("decode", len), &bytes, |b, bytes| {
            b.iter(|| codec::decode::<Vec<u8>>(black_box(bytes)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_enqueue_buffered,
    bench_enqueue_sync,
    bench_dequeue,
    bench_codec
);
criterion_main!(benches);
