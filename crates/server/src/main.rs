//! Simple test harness for the recommendation orchestrator.
//!
//! This binary runs one end-to-end request: load the catalog, resolve
//! posters against the live metadata service, print the recommendations.
//!
//! Usage: `server [TITLE] [DATA_DIR]` (needs `TMDB_API_KEY`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use data_loader::Catalog;
use poster_client::{PosterConfig, PosterResolver};
use server::RecommendationOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info,server=debug,sources=debug,poster_client=debug")
        .init();

    info!("Starting ReelRecs server test harness");

    let mut args = std::env::args().skip(1);
    let title = args.next().unwrap_or_else(|| "The Matrix".to_string());
    let data_dir = PathBuf::from(args.next().unwrap_or_else(|| "data".to_string()));

    info!("Loading catalog from {}...", data_dir.display());
    let catalog = Arc::new(
        Catalog::load_from_files(&data_dir).context("Failed to load movie catalog")?,
    );
    info!("Catalog loaded successfully");

    let config = PosterConfig::from_env().context("Failed to load poster config")?;
    let resolver = Arc::new(PosterResolver::new(config)?);
    let orchestrator = RecommendationOrchestrator::new(catalog, resolver);

    let selected = orchestrator.selected_movie(&title).await?;
    info!("Selected: {} [{}]", selected.title, selected.poster_url);

    let limit = 15;
    info!("Getting recommendations for {:?} (limit: {})", title, limit);
    let recommendations = orchestrator.get_recommendations(&title, limit).await?;

    info!("Received {} recommendations:", recommendations.len());
    for rec in &recommendations {
        info!(
            "{}. {} - Distance: {:.3}",
            rec.rank, rec.title, rec.distance
        );
        info!("   Poster: {}", rec.poster_url);
        if let Some(url) = &rec.reference_url {
            info!("   {}", url);
        }
    }

    Ok(())
}
