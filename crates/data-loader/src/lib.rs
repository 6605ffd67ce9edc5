//! # Data Loader Crate
//!
//! Loads the read-only movie catalog the recommender works from.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (MovieRecord, SparseVector, FeatureMatrix, Catalog)
//! - **parser**: Parse the CSV table, the binary feature matrix and the index manifest
//! - **index**: Load a data directory and validate row parity across artifacts
//! - **external_id**: Extract metadata-service ids from reference URLs
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Catalog;
//! use std::path::Path;
//!
//! let catalog = Catalog::load_from_files(Path::new("data"))?;
//!
//! let row = catalog.row_of_title("The Matrix").unwrap();
//! let movie = catalog.get_movie(row).unwrap();
//! println!("{} -> {:?}", movie.title, movie.external_id());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;
pub mod external_id;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use external_id::extract_id;
pub use index::{FEATURES_FILE, MANIFEST_FILE, MOVIES_FILE};
pub use types::{
    // Type aliases
    ExternalId,
    RowId,
    // Core types
    Catalog,
    DistanceMetric,
    FeatureMatrix,
    IndexManifest,
    MovieRecord,
    SparseVector,
    FORMAT_VERSION,
};
