//! Catalog loading and integrity checks.
//!
//! The three artifacts are parsed in parallel, then cross-checked. Any
//! disagreement between them is fatal: catalog row N must be described by
//! feature row N, so a count mismatch means the files were exported from
//! different runs.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::{info, warn};

/// Catalog table file name inside the data directory
pub const MOVIES_FILE: &str = "movies_processed.csv";
/// Feature matrix file name inside the data directory
pub const FEATURES_FILE: &str = "features.bin";
/// Index manifest file name inside the data directory
pub const MANIFEST_FILE: &str = "index.json";

impl Catalog {
    /// Load the catalog from a directory holding the three artifacts
    ///
    /// Steps:
    /// 1. Parse table, matrix and manifest (in parallel)
    /// 2. Build the title lookup
    /// 3. Validate row parity across all three
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading catalog from {:?}", data_dir);

        let movies_path = data_dir.join(MOVIES_FILE);
        let features_path = data_dir.join(FEATURES_FILE);
        let manifest_path = data_dir.join(MANIFEST_FILE);

        // The matrix is by far the largest file, give it its own worker
        let ((movies, manifest), features) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_movies(&movies_path),
                    || parser::parse_index_manifest(&manifest_path),
                )
            },
            || parser::parse_feature_matrix(&features_path),
        );

        let movies = movies?;
        let manifest = manifest?;
        let features = features?;

        info!(
            "Parsed {} movies, {} feature rows ({} dims, {} non-zeros), metric {:?}",
            movies.len(),
            features.len(),
            features.dimensions(),
            features.nnz(),
            manifest.metric
        );

        let catalog = Catalog::new(movies, features, manifest)?;

        let duplicates = catalog.duplicate_title_count();
        if duplicates > 0 {
            warn!(
                "{} titles appear on more than one row; lookups by title use the first row",
                duplicates
            );
        }

        info!("Catalog successfully loaded and validated");
        Ok(catalog)
    }

    /// Validate data integrity
    ///
    /// Check that:
    /// - the manifest version is supported
    /// - manifest, matrix and table agree on the row count
    /// - manifest and matrix agree on the dimensionality
    /// - every title is non-empty
    pub fn validate(&self) -> Result<()> {
        if self.manifest.format_version != FORMAT_VERSION {
            return Err(DataLoadError::UnsupportedVersion {
                artifact: MANIFEST_FILE.to_string(),
                found: self.manifest.format_version,
                expected: FORMAT_VERSION,
            });
        }

        if self.manifest.rows != self.features.len() {
            return Err(DataLoadError::RowCountMismatch {
                left: MANIFEST_FILE.to_string(),
                left_rows: self.manifest.rows,
                right: FEATURES_FILE.to_string(),
                right_rows: self.features.len(),
            });
        }

        if self.movies.len() != self.features.len() {
            return Err(DataLoadError::RowCountMismatch {
                left: MOVIES_FILE.to_string(),
                left_rows: self.movies.len(),
                right: FEATURES_FILE.to_string(),
                right_rows: self.features.len(),
            });
        }

        if self.manifest.dimensions != self.features.dimensions() {
            return Err(DataLoadError::InvalidValue {
                field: "dimensions".to_string(),
                value: format!(
                    "{} declares {} but {} has {}",
                    MANIFEST_FILE,
                    self.manifest.dimensions,
                    FEATURES_FILE,
                    self.features.dimensions()
                ),
            });
        }

        if let Some(row) = self.movies.iter().position(|m| m.title.trim().is_empty()) {
            return Err(DataLoadError::ValidationError(format!(
                "movie at row {} has an empty title",
                row
            )));
        }

        Ok(())
    }
}
