//! External id extraction from stored reference URLs.

use crate::types::ExternalId;

/// Pull the metadata-service id out of a reference URL.
///
/// The id is taken to be the last non-empty path segment, so both
/// `https://www.themoviedb.org/movie/603` and a bare `603` yield `"603"`.
/// The segment is returned verbatim; whether it is numeric is for the caller
/// to decide. Blank or missing input yields `None`.
pub fn extract_id(url: Option<&str>) -> Option<ExternalId> {
    let url = url?.trim();
    if url.is_empty() {
        return None;
    }

    url.split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .map(str::to_string)
}
