//! Integration tests for the query engine over a caller-supplied index.
//!
//! `DistanceMatrixIndex` stands in for any precomputed neighbor structure:
//! it answers from a fixed N x N distance table.

use data_loader::{Catalog, DistanceMetric, FeatureMatrix, IndexManifest, MovieRecord, RowId, SparseVector};
use sources::nearest::select_nearest;
use sources::{Neighbor, NeighborError, NeighborIndex, SimilarTitles};
use std::sync::Arc;

struct DistanceMatrixIndex {
    distances: Vec<Vec<f32>>,
}

impl NeighborIndex for DistanceMatrixIndex {
    fn len(&self) -> usize {
        self.distances.len()
    }

    fn nearest(&self, row: RowId, k: usize) -> Vec<Neighbor> {
        let Some(distances) = self.distances.get(row) else {
            return Vec::new();
        };
        let mut hits: Vec<Neighbor> = distances
            .iter()
            .enumerate()
            .map(|(other, &d)| Neighbor::new(other, d))
            .collect();
        select_nearest(&mut hits, k);
        hits
    }
}

fn catalog_of(titles: &[&str]) -> Arc<Catalog> {
    let rows = (0..titles.len())
        .map(|i| SparseVector::new(vec![i as u32], vec![1.0]).unwrap())
        .collect();
    let features = FeatureMatrix::new(titles.len(), rows).unwrap();
    let manifest = IndexManifest::for_matrix(&features, DistanceMetric::Cosine);
    let movies = titles
        .iter()
        .map(|t| MovieRecord::new(*t, Some(format!("https://www.themoviedb.org/movie/{}", t.len()))))
        .collect();
    Arc::new(Catalog::new(movies, features, manifest).unwrap())
}

/// 0 on the diagonal, growing with row distance elsewhere
fn identity_like(n: usize) -> DistanceMatrixIndex {
    let distances = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| if i == j { 0.0 } else { 0.1 * (i.abs_diff(j) as f32) + 0.5 })
                .collect()
        })
        .collect();
    DistanceMatrixIndex { distances }
}

fn engine() -> SimilarTitles {
    SimilarTitles::with_index(catalog_of(&["A", "B", "C", "D"]), Arc::new(identity_like(4))).unwrap()
}

#[test]
fn test_four_titles_return_the_other_three() {
    let similar = engine().find_similar("A", 3).unwrap();
    let titles: Vec<&str> = similar.iter().map(|s| s.movie.title.as_str()).collect();

    assert_eq!(titles, vec!["B", "C", "D"]);
}

#[test]
fn test_largest_count_returns_everything_but_self() {
    let similar = engine().find_similar("A", usize::MAX).unwrap();
    let titles: Vec<&str> = similar.iter().map(|s| s.movie.title.as_str()).collect();

    assert_eq!(titles, vec!["B", "C", "D"]);
}

#[test]
fn test_results_bounded_ordered_and_exclude_self() {
    let engine = engine();
    for title in ["A", "B", "C", "D"] {
        for k in 1..=5 {
            let similar = engine.find_similar(title, k).unwrap();
            assert!(similar.len() <= k);
            assert!(similar.len() <= 3);
            assert!(similar.iter().all(|s| s.movie.title != title));
            assert!(similar.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }
}

#[test]
fn test_middle_row_neighbors() {
    let similar = engine().find_similar("C", 2).unwrap();
    let rows: Vec<RowId> = similar.iter().map(|s| s.row).collect();

    // B and D are both one row away; ties resolve to the lower row
    assert_eq!(rows, vec![1, 3]);
    assert!((similar[0].distance - 0.6).abs() < 1e-6);
}

#[test]
fn test_unknown_title_is_not_found() {
    let err = engine().find_similar("E", 3).unwrap_err();
    assert_eq!(err, NeighborError::NotFound("E".to_string()));
}

#[test]
fn test_single_row_catalog_has_no_neighbors() {
    let engine = SimilarTitles::with_index(catalog_of(&["Solo"]), Arc::new(identity_like(1))).unwrap();
    assert!(engine.find_similar("Solo", 5).unwrap().is_empty());
}
