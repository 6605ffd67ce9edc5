//! Result and error types for neighbor queries.

use data_loader::{MovieRecord, RowId};
use thiserror::Error;

/// A raw hit from a `NeighborIndex`: a row and its distance to the query row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: RowId,
    pub distance: f32,
}

impl Neighbor {
    pub fn new(row: RowId, distance: f32) -> Self {
        Self { row, distance }
    }
}

/// A recommended title, resolved against the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarTitle {
    pub row: RowId,
    pub movie: MovieRecord,
    /// Distance to the queried title; smaller is more similar
    pub distance: f32,
}

/// Errors returned by `SimilarTitles`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NeighborError {
    /// No catalog row carries exactly this title
    #[error("Title not found in catalog: {0}")]
    NotFound(String),

    /// Neighbor count must be at least one
    #[error("Neighbor count must be at least 1")]
    InvalidCount,

    /// The index was built over a different number of rows than the catalog holds
    #[error("Index covers {index_rows} rows but catalog has {catalog_rows}")]
    IndexMismatch {
        index_rows: usize,
        catalog_rows: usize,
    },
}
