//! Benchmarks for similar-title lookup
//!
//! Run with: cargo bench --package sources
//!
//! Uses a synthetic catalog shaped like a TF-IDF export: 5000 rows, 5000
//! dimensions, ~40 non-zeros per row.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::{Catalog, DistanceMetric, FeatureMatrix, IndexManifest, MovieRecord, SparseVector};
use sources::{BruteForceIndex, NeighborIndex, SimilarTitles};
use std::sync::Arc;

const ROWS: usize = 5000;
const DIMS: usize = 5000;
const NNZ: usize = 40;

fn synthetic_catalog() -> Arc<Catalog> {
    let rows = (0..ROWS)
        .map(|row| {
            let mut indices: Vec<u32> = (0..NNZ)
                .map(|k| ((row * 31 + k * 127 + k * k * 7) % DIMS) as u32)
                .collect();
            indices.sort_unstable();
            indices.dedup();
            let values = indices
                .iter()
                .map(|i| 1.0 / (1.0 + (*i as f32 % 13.0)))
                .collect();
            SparseVector::new(indices, values).expect("indices are sorted and unique")
        })
        .collect();
    let features = FeatureMatrix::new(DIMS, rows).expect("indices are below DIMS");
    let manifest = IndexManifest::for_matrix(&features, DistanceMetric::Cosine);
    let movies = (0..ROWS)
        .map(|row| MovieRecord::new(format!("Movie {}", row), None))
        .collect();
    Arc::new(Catalog::new(movies, features, manifest).expect("parts agree"))
}

fn bench_nearest(c: &mut Criterion) {
    let index = BruteForceIndex::new(synthetic_catalog());

    c.bench_function("brute_force_nearest_16", |b| {
        b.iter(|| black_box(index.nearest(black_box(1234), black_box(16))))
    });
}

fn bench_find_similar(c: &mut Criterion) {
    let engine = SimilarTitles::new(synthetic_catalog());

    c.bench_function("find_similar_15", |b| {
        b.iter(|| {
            let similar = engine.find_similar(black_box("Movie 1234"), black_box(15)).unwrap();
            black_box(similar)
        })
    });
}

fn bench_search_titles(c: &mut Criterion) {
    let engine = SimilarTitles::new(synthetic_catalog());

    c.bench_function("search_titles", |b| {
        b.iter(|| black_box(engine.search_titles(black_box("movie 12"), 20).len()))
    });
}

criterion_group!(benches, bench_nearest, bench_find_similar, bench_search_titles);
criterion_main!(benches);
