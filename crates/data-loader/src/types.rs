//! Core domain types for the movie catalog.
//!
//! The catalog is three parallel views of the same rows:
//! - `MovieRecord`: what the row is (title, reference URL)
//! - `FeatureMatrix`: the precomputed sparse text-feature vector of the row
//! - `IndexManifest`: how the nearest-neighbor structure over those vectors was built
//!
//! Row N of every view describes the same movie. `Catalog` owns all three and
//! refuses to exist when they disagree on the number of rows.

use crate::error::{DataLoadError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Position of a movie in the catalog (and of its vector in the feature matrix)
pub type RowId = usize;

/// Identifier of a movie in the remote metadata service (TMDB).
///
/// Expected to be a decimal string but not validated at extraction time.
pub type ExternalId = String;

/// Format version written into `features.bin` and `index.json`
pub const FORMAT_VERSION: u32 = 1;

// =============================================================================
// Movie rows
// =============================================================================

/// One row of the catalog table.
///
/// Titles are not guaranteed unique; see `Catalog::row_of_title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub title: String,
    /// TMDB page for the movie, e.g. `https://www.themoviedb.org/movie/603`
    pub reference_url: Option<String>,
}

impl MovieRecord {
    pub fn new(title: impl Into<String>, reference_url: Option<String>) -> Self {
        Self {
            title: title.into(),
            reference_url,
        }
    }

    /// External id parsed from the reference URL, if any
    pub fn external_id(&self) -> Option<ExternalId> {
        crate::external_id::extract_id(self.reference_url.as_deref())
    }
}

// =============================================================================
// Feature vectors
// =============================================================================

/// A sparse feature vector (TF-IDF weights in practice).
///
/// `indices` is strictly increasing and the same length as `values`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseVector {
    /// Build a vector from parallel index/value lists.
    ///
    /// Fails when the lists differ in length or the indices are not strictly
    /// increasing.
    pub fn new(indices: Vec<u32>, values: Vec<f32>) -> Result<Self> {
        if indices.len() != values.len() {
            return Err(DataLoadError::ValidationError(format!(
                "sparse vector has {} indices but {} values",
                indices.len(),
                values.len()
            )));
        }
        if indices.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DataLoadError::ValidationError(
                "sparse vector indices must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { indices, values })
    }

    /// Build a sparse vector from a dense slice, dropping zero entries
    pub fn from_dense(dense: &[f32]) -> Self {
        let (indices, values) = dense
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, v)| (i as u32, *v))
            .unzip();
        Self { indices, values }
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Largest index + 1, or 0 for an empty vector
    pub fn min_dimensions(&self) -> usize {
        self.indices.last().map(|&i| i as usize + 1).unwrap_or(0)
    }

    /// Dot product via a merge-join over the sorted indices
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Squared L2 norm
    pub fn norm_squared(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum()
    }

    /// L2 norm
    pub fn norm(&self) -> f32 {
        self.norm_squared().sqrt()
    }
}

/// Row-major sparse matrix: one `SparseVector` per catalog row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    dimensions: usize,
    rows: Vec<SparseVector>,
}

impl FeatureMatrix {
    /// Build a matrix, checking every row fits inside `dimensions`
    pub fn new(dimensions: usize, rows: Vec<SparseVector>) -> Result<Self> {
        if let Some((row, vector)) = rows
            .iter()
            .enumerate()
            .find(|(_, v)| v.min_dimensions() > dimensions)
        {
            return Err(DataLoadError::ValidationError(format!(
                "row {} uses feature index {} but matrix has {} dimensions",
                row,
                vector.min_dimensions() - 1,
                dimensions
            )));
        }
        Ok(Self { dimensions, rows })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, row: RowId) -> Option<&SparseVector> {
        self.rows.get(row)
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    /// Total stored entries across all rows
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(SparseVector::nnz).sum()
    }
}

// =============================================================================
// Index manifest
// =============================================================================

/// Distance used to rank neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cosine_similarity`, in `[0, 2]`
    Cosine,
    Euclidean,
}

/// Contents of `index.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub metric: DistanceMetric,
    pub rows: usize,
    pub dimensions: usize,
}

impl IndexManifest {
    /// Manifest describing an existing matrix with the given metric
    pub fn for_matrix(matrix: &FeatureMatrix, metric: DistanceMetric) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            metric,
            rows: matrix.len(),
            dimensions: matrix.dimensions(),
        }
    }
}

// =============================================================================
// Catalog - the read-only in-memory store
// =============================================================================

/// Movies, their feature vectors and the index manifest, loaded once and
/// shared read-only for the life of the process.
#[derive(Debug)]
pub struct Catalog {
    pub(crate) movies: Vec<MovieRecord>,
    pub(crate) features: FeatureMatrix,
    pub(crate) manifest: IndexManifest,
    /// Title -> every row carrying it, in row order
    pub(crate) title_index: HashMap<String, Vec<RowId>>,
}

impl Catalog {
    /// Assemble a catalog from already-parsed parts.
    ///
    /// Runs the same integrity checks as `load_from_files`.
    pub fn new(
        movies: Vec<MovieRecord>,
        features: FeatureMatrix,
        manifest: IndexManifest,
    ) -> Result<Self> {
        let mut title_index: HashMap<String, Vec<RowId>> = HashMap::new();
        for (row, movie) in movies.iter().enumerate() {
            title_index.entry(movie.title.clone()).or_default().push(row);
        }

        let catalog = Self {
            movies,
            features,
            manifest,
            title_index,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Number of movies (and feature rows)
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn get_movie(&self, row: RowId) -> Option<&MovieRecord> {
        self.movies.get(row)
    }

    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    pub fn features(&self) -> &FeatureMatrix {
        &self.features
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Row of the first movie whose title matches exactly
    pub fn row_of_title(&self, title: &str) -> Option<RowId> {
        self.title_index.get(title).and_then(|rows| rows.first().copied())
    }

    /// Every row whose title matches exactly, in row order
    pub fn rows_of_title(&self, title: &str) -> &[RowId] {
        self.title_index
            .get(title)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Number of distinct titles that appear on more than one row
    pub fn duplicate_title_count(&self) -> usize {
        self.title_index.values().filter(|rows| rows.len() > 1).count()
    }
}
