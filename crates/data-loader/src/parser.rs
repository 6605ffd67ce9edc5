//! Parsers for the three catalog artifacts.
//!
//! - `movies_processed.csv`: header row, then one movie per record. Only the
//!   `title` and `tmdb_url` columns are read; quoted fields may contain commas,
//!   doubled quotes and newlines.
//! - `features.bin`: little-endian sparse matrix
//!   `"RRFM" | version u32 | rows u32 | dims u32 | per row: nnz u32, nnz x (index u32, value f32)`
//! - `index.json`: `IndexManifest` as JSON

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Magic bytes at the start of `features.bin`
pub const FEATURE_MAGIC: &[u8; 4] = b"RRFM";

const TITLE_COLUMN: &str = "title";
const URL_COLUMN: &str = "tmdb_url";

/// Read a whole file, mapping a missing file to `FileNotFound`
fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// =============================================================================
// movies_processed.csv
// =============================================================================

/// Parse the catalog table
pub fn parse_movies(path: &Path) -> Result<Vec<MovieRecord>> {
    let bytes = read_bytes(path)?;
    // Exported tables are UTF-8; stray invalid bytes should not abort startup
    let content = String::from_utf8_lossy(&bytes);
    parse_movies_str(&content, &file_name(path))
}

/// Parse catalog CSV content already in memory
pub fn parse_movies_str(content: &str, file: &str) -> Result<Vec<MovieRecord>> {
    let mut records = split_records(content, file)?.into_iter();

    let (_, header) = records.next().ok_or_else(|| DataLoadError::ParseError {
        file: file.to_string(),
        line: 1,
        reason: "Missing header row".to_string(),
    })?;

    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| DataLoadError::MissingColumn {
                file: file.to_string(),
                column: name.to_string(),
            })
    };
    let title_col = column(TITLE_COLUMN)?;
    let url_col = column(URL_COLUMN)?;

    let mut movies = Vec::new();
    for (line_no, fields) in records {
        // Blank lines between records
        if fields.len() == 1 && fields[0].trim().is_empty() {
            continue;
        }

        let title = fields
            .get(title_col)
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DataLoadError::ParseError {
                file: file.to_string(),
                line: line_no,
                reason: "Missing title".to_string(),
            })?;

        let reference_url = fields
            .get(url_col)
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        movies.push(MovieRecord::new(title, reference_url));
    }

    Ok(movies)
}

/// Split CSV content into records of fields.
///
/// Returns the 1-based line each record starts on alongside its fields.
fn split_records(content: &str, file: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_start = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                records.push((record_start, std::mem::take(&mut fields)));
                line += 1;
                record_start = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(DataLoadError::ParseError {
            file: file.to_string(),
            line: record_start,
            reason: "Unterminated quoted field".to_string(),
        });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push((record_start, fields));
    }

    Ok(records)
}

// =============================================================================
// features.bin
// =============================================================================

/// Cursor over a little-endian byte buffer
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
    file: &'a str,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8], file: &'a str) -> Self {
        Self { bytes, pos: 0, file }
    }

    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&end| end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(DataLoadError::Truncated {
                file: self.file.to_string(),
                reason: format!("expected {} at byte offset {}", what, self.pos),
            }),
        }
    }

    fn read_u32(&mut self, what: &str) -> Result<u32> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_f32(&mut self, what: &str) -> Result<f32> {
        let b = self.take(4, what)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

/// Parse the feature matrix artifact
pub fn parse_feature_matrix(path: &Path) -> Result<FeatureMatrix> {
    let bytes = read_bytes(path)?;
    decode_feature_matrix(&bytes, &file_name(path))
}

/// Decode a feature matrix from its binary representation
pub fn decode_feature_matrix(bytes: &[u8], file: &str) -> Result<FeatureMatrix> {
    let mut reader = ByteReader::new(bytes, file);

    if reader.take(4, "magic bytes")? != FEATURE_MAGIC {
        return Err(DataLoadError::BadMagic {
            file: file.to_string(),
        });
    }

    let version = reader.read_u32("format version")?;
    if version != FORMAT_VERSION {
        return Err(DataLoadError::UnsupportedVersion {
            artifact: file.to_string(),
            found: version,
            expected: FORMAT_VERSION,
        });
    }

    let row_count = reader.read_u32("row count")? as usize;
    let dimensions = reader.read_u32("dimensions")? as usize;

    // Every row needs at least its nnz word; reject absurd headers before allocating
    if row_count > reader.remaining() / 4 {
        return Err(DataLoadError::Truncated {
            file: file.to_string(),
            reason: format!("header declares {} rows", row_count),
        });
    }

    let mut rows = Vec::with_capacity(row_count);
    for row in 0..row_count {
        let nnz = reader.read_u32("row length")? as usize;
        if nnz > reader.remaining() / 8 {
            return Err(DataLoadError::Truncated {
                file: file.to_string(),
                reason: format!("row {} declares {} entries", row, nnz),
            });
        }

        let mut indices = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        for _ in 0..nnz {
            indices.push(reader.read_u32("feature index")?);
            values.push(reader.read_f32("feature value")?);
        }

        let vector = SparseVector::new(indices, values).map_err(|e| DataLoadError::InvalidValue {
            field: format!("{} row {}", file, row),
            value: e.to_string(),
        })?;
        rows.push(vector);
    }

    if reader.remaining() != 0 {
        return Err(DataLoadError::ValidationError(format!(
            "{} has {} trailing bytes after {} rows",
            file,
            reader.remaining(),
            row_count
        )));
    }

    FeatureMatrix::new(dimensions, rows)
}

/// Encode a feature matrix into the `features.bin` layout.
///
/// Used by offline exporters and tests; the recommender itself only reads.
pub fn encode_feature_matrix(matrix: &FeatureMatrix) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + matrix.len() * 4 + matrix.nnz() * 8);
    out.extend_from_slice(FEATURE_MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&(matrix.len() as u32).to_le_bytes());
    out.extend_from_slice(&(matrix.dimensions() as u32).to_le_bytes());
    for row in matrix.rows() {
        out.extend_from_slice(&(row.nnz() as u32).to_le_bytes());
        for (index, value) in row.indices().iter().zip(row.values()) {
            out.extend_from_slice(&index.to_le_bytes());
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    out
}

// =============================================================================
// index.json
// =============================================================================

/// Parse the index manifest
pub fn parse_index_manifest(path: &Path) -> Result<IndexManifest> {
    let bytes = read_bytes(path)?;
    let manifest: IndexManifest = serde_json::from_slice(&bytes)?;

    if manifest.format_version != FORMAT_VERSION {
        return Err(DataLoadError::UnsupportedVersion {
            artifact: file_name(path),
            found: manifest.format_version,
            expected: FORMAT_VERSION,
        });
    }
    Ok(manifest)
}
