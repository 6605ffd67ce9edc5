//! # Sources Crate
//!
//! Candidate generation for "more like this" recommendations: given a title,
//! find the catalog titles whose precomputed text-feature vectors are closest
//! to it.
//!
//! ## Components
//!
//! ### NeighborIndex
//! Trait for nearest-neighbor structures over the feature matrix. The default
//! `BruteForceIndex` scans every row (cosine or euclidean, per the manifest).
//!
//! ### SimilarTitles
//! The query engine: title -> ranked similar titles, never including the
//! title itself.
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Catalog;
//! use sources::SimilarTitles;
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(Catalog::load_from_files("data".as_ref())?);
//! let engine = SimilarTitles::new(catalog);
//!
//! for similar in engine.find_similar("The Matrix", 15)? {
//!     println!("{} ({:.3})", similar.movie.title, similar.distance);
//! }
//! ```

// Public modules
pub mod types;
pub mod nearest;
pub mod similar;

// Re-export commonly used types
pub use types::{Neighbor, NeighborError, SimilarTitle};
pub use nearest::{BruteForceIndex, NeighborIndex};
pub use similar::SimilarTitles;
