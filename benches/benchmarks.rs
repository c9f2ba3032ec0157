//! Benchmarks for lodestone hot paths
//!
//! The binary crate exposes no library target, so the kernels under test
//! are reproduced here standalone: cosine scoring (flat backend), the
//! sliding-window chunk loop, and reciprocal-rank fusion.

use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Generate sample chunk texts for benchmarking
fn generate_texts(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            format!(
                "This is chunk number {} with content about document search, \
                 embeddings, hybrid retrieval, metadata filtering, and index \
                 rebuilds. Chunk {}.",
                i, i
            )
        })
        .collect()
}

/// Benchmark dot product over normalized vectors (flat backend inner loop)
fn bench_dot_product(c: &mut Criterion) {
    for dims in [256, 768] {
        let a: Vec<f32> = (0..dims).map(|i| (i as f32) / 1000.0).collect();
        let b: Vec<f32> = (0..dims).map(|i| (i as f32) / 1000.0).collect();

        c.bench_function(&format!("dot_product_{}d", dims), |bencher| {
            bencher.iter(|| {
                let sum: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
                black_box(sum)
            });
        });
    }
}

/// Benchmark the character sliding-window chunk loop
fn bench_chunking(c: &mut Criterion) {
    let text: String = generate_texts(50).join("\n");
    let size = 512;
    let overlap = 64;

    c.bench_function("chunk_sliding_window", |bencher| {
        bencher.iter(|| {
            let boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
            let char_count = boundaries.len();
            let stride = size - overlap;
            let mut chunks = Vec::new();
            let mut start = 0;
            loop {
                let end = (start + size).min(char_count);
                let byte_end = if end == char_count {
                    text.len()
                } else {
                    boundaries[end]
                };
                chunks.push(&text[boundaries[start]..byte_end]);
                if end == char_count {
                    break;
                }
                start += stride;
            }
            black_box(chunks.len())
        });
    });
}

/// Benchmark weighted reciprocal-rank fusion of two ranked lists
fn bench_fusion(c: &mut Criterion) {
    let mut group = c.benchmark_group("rrf_fusion");

    for list_len in [10, 100, 1000] {
        let semantic: Vec<(usize, f32)> = (0..list_len)
            .map(|i| (i, 1.0 - i as f32 / list_len as f32))
            .collect();
        // Half-overlapping grep list
        let grep: Vec<(usize, f32)> = (0..list_len)
            .map(|i| (i + list_len / 2, (list_len - i) as f32))
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(list_len),
            &(semantic, grep),
            |bencher, (semantic, grep)| {
                bencher.iter(|| {
                    let constant = 60.0f32;
                    let mut scores: HashMap<usize, f32> = HashMap::new();
                    for (rank, (id, _)) in semantic.iter().enumerate() {
                        *scores.entry(*id).or_insert(0.0) +=
                            1.0 / (rank as f32 + 1.0 + constant);
                    }
                    for (rank, (id, _)) in grep.iter().enumerate() {
                        *scores.entry(*id).or_insert(0.0) +=
                            1.0 / (rank as f32 + 1.0 + constant);
                    }
                    let mut fused: Vec<(usize, f32)> = scores.into_iter().collect();
                    fused.sort_by(|a, b| {
                        b.1.partial_cmp(&a.1)
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then(a.0.cmp(&b.0))
                    });
                    black_box(fused.len())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_dot_product, bench_chunking, bench_fusion);
criterion_main!(benches);
