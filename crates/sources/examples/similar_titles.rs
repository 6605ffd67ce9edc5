//! Example: Find titles similar to a given movie
//!
//! Run with: cargo run --package sources --example similar_titles -- "The Matrix"
//!
//! This example shows how to:
//! 1. Load the catalog artifacts
//! 2. Build the brute-force neighbor index
//! 3. Query similar titles and print their distances

use data_loader::Catalog;
use sources::SimilarTitles;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let title = std::env::args().nth(1).unwrap_or_else(|| "The Matrix".to_string());

    println!("=== Similar Titles Example ===\n");

    println!("Loading catalog...");
    let start = Instant::now();
    let catalog = Arc::new(Catalog::load_from_files(Path::new("data"))?);
    println!("Loaded {} movies in {:?}\n", catalog.len(), start.elapsed());

    let engine = SimilarTitles::new(catalog);

    let start = Instant::now();
    let similar = engine.find_similar(&title, 15)?;
    println!("Titles similar to '{}' ({:?}):", title, start.elapsed());
    for (rank, s) in similar.iter().enumerate() {
        println!(
            "  {:2}. {:<50} distance {:.4}  id {}",
            rank + 1,
            s.movie.title,
            s.distance,
            s.movie.external_id().unwrap_or_else(|| "-".to_string())
        );
    }

    Ok(())
}
