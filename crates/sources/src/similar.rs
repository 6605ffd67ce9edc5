//! Similar-title lookup.
//!
//! ## Algorithm
//! 1. Find the catalog row for the exact title (first row on duplicates)
//! 2. Ask the index for the `count + 1` nearest rows
//! 3. Drop the query row itself
//! 4. Return the rest in ascending-distance order, resolved to movies

use crate::nearest::{BruteForceIndex, NeighborIndex};
use crate::types::{NeighborError, SimilarTitle};
use data_loader::{Catalog, MovieRecord, RowId};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Answers "which titles are most like this one"
#[derive(Clone)]
pub struct SimilarTitles {
    /// Shared reference to the catalog (read-only, so no Mutex needed)
    catalog: Arc<Catalog>,
    index: Arc<dyn NeighborIndex>,
}

impl SimilarTitles {
    /// Create an engine backed by an exact brute-force index
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let index = Arc::new(BruteForceIndex::new(catalog.clone()));
        Self { catalog, index }
    }

    /// Create an engine over a caller-supplied index.
    ///
    /// The index must cover exactly the catalog's rows.
    pub fn with_index(
        catalog: Arc<Catalog>,
        index: Arc<dyn NeighborIndex>,
    ) -> Result<Self, NeighborError> {
        if index.len() != catalog.len() {
            return Err(NeighborError::IndexMismatch {
                index_rows: index.len(),
                catalog_rows: catalog.len(),
            });
        }
        Ok(Self { catalog, index })
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Up to `count` titles most similar to `title`, closest first.
    ///
    /// The title itself is never part of the result.
    #[instrument(skip(self))]
    pub fn find_similar(
        &self,
        title: &str,
        count: usize,
    ) -> Result<Vec<SimilarTitle>, NeighborError> {
        if count == 0 {
            return Err(NeighborError::InvalidCount);
        }

        let row = self
            .catalog
            .row_of_title(title)
            .ok_or_else(|| NeighborError::NotFound(title.to_string()))?;

        let mut hits = self.index.nearest(row, count.saturating_add(1));

        // Normally the first hit; with exact-duplicate vectors a tie may move it
        if let Some(pos) = hits.iter().position(|n| n.row == row) {
            hits.remove(pos);
        }
        hits.truncate(count);

        let similar: Vec<SimilarTitle> = hits
            .into_iter()
            .filter_map(|n| {
                let movie = self.catalog.get_movie(n.row)?;
                Some(SimilarTitle {
                    row: n.row,
                    movie: movie.clone(),
                    distance: n.distance,
                })
            })
            .collect();

        debug!("Found {} titles similar to row {}", similar.len(), row);
        Ok(similar)
    }

    /// Case-insensitive title search, exact matches first, then substring
    /// matches in catalog order. Each title appears once.
    pub fn search_titles(&self, query: &str, limit: usize) -> Vec<(RowId, &MovieRecord)> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(u8, RowId, &MovieRecord)> = self
            .catalog
            .movies()
            .iter()
            .enumerate()
            // Only the first row of a duplicated title is addressable by title
            .filter(|(row, movie)| self.catalog.row_of_title(&movie.title) == Some(*row))
            .filter_map(|(row, movie)| {
                let title = movie.title.to_lowercase();
                if title == query {
                    Some((0, row, movie))
                } else if title.contains(&query) {
                    Some((1, row, movie))
                } else {
                    None
                }
            })
            .collect();

        matches.sort_by_key(|(rank, row, _)| (*rank, *row));
        matches.truncate(limit);
        matches.into_iter().map(|(_, row, movie)| (row, movie)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{DistanceMetric, FeatureMatrix, IndexManifest, SparseVector};

    fn build_engine(entries: &[(&str, &[f32])]) -> SimilarTitles {
        let dims = entries[0].1.len();
        let movies = entries
            .iter()
            .map(|(title, _)| MovieRecord::new(*title, None))
            .collect();
        let rows = entries
            .iter()
            .map(|(_, v)| SparseVector::from_dense(v))
            .collect();
        let features = FeatureMatrix::new(dims, rows).unwrap();
        let manifest = IndexManifest::for_matrix(&features, DistanceMetric::Cosine);
        SimilarTitles::new(Arc::new(Catalog::new(movies, features, manifest).unwrap()))
    }

    fn sample_engine() -> SimilarTitles {
        build_engine(&[
            ("The Matrix", &[1.0, 0.2, 0.0]),
            ("The Matrix Reloaded", &[0.9, 0.3, 0.0]),
            ("Toy Story", &[0.0, 0.1, 1.0]),
            ("Heat", &[0.4, 0.9, 0.0]),
            ("Toy Story 2", &[0.0, 0.2, 0.9]),
        ])
    }

    #[test]
    fn test_find_similar_excludes_self_and_orders() {
        let engine = sample_engine();
        let similar = engine.find_similar("The Matrix", 3).unwrap();

        assert_eq!(similar.len(), 3);
        assert_eq!(similar[0].movie.title, "The Matrix Reloaded");
        assert!(similar.iter().all(|s| s.movie.title != "The Matrix"));
        assert!(similar.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_find_similar_not_found() {
        let engine = sample_engine();
        assert_eq!(
            engine.find_similar("the matrix", 3),
            Err(NeighborError::NotFound("the matrix".to_string()))
        );
    }

    #[test]
    fn test_find_similar_zero_count() {
        let engine = sample_engine();
        assert_eq!(
            engine.find_similar("Heat", 0),
            Err(NeighborError::InvalidCount)
        );
    }

    #[test]
    fn test_find_similar_more_than_available() {
        let engine = sample_engine();
        let similar = engine.find_similar("Heat", 15).unwrap();
        assert_eq!(similar.len(), 4);
    }

    #[test]
    fn test_find_similar_unbounded_count() {
        let engine = sample_engine();
        let similar = engine.find_similar("Heat", usize::MAX).unwrap();
        assert_eq!(similar.len(), 4);
        assert!(similar.iter().all(|s| s.movie.title != "Heat"));
    }

    #[test]
    fn test_find_similar_identical_vectors_never_returns_self() {
        // Row 1 ties with row 0 at distance 0; ordering by row keeps 0 first,
        // but the query is row 1
        let engine = build_engine(&[
            ("Twin A", &[1.0, 0.0]),
            ("Twin B", &[1.0, 0.0]),
            ("Other", &[0.0, 1.0]),
        ]);
        let similar = engine.find_similar("Twin B", 1).unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].movie.title, "Twin A");
    }

    #[test]
    fn test_search_titles_exact_first() {
        let engine = sample_engine();
        let results = engine.search_titles("toy story", 10);
        let titles: Vec<&str> = results.iter().map(|(_, m)| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Toy Story", "Toy Story 2"]);

        assert_eq!(engine.search_titles("matrix", 1).len(), 1);
        assert!(engine.search_titles("  ", 10).is_empty());
    }
}
