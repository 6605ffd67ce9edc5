//! # Recommendation Orchestrator
//!
//! This module coordinates one recommendation request:
//! 1. Find the titles most similar to the selected one (blocking pool)
//! 2. Extract the external id of every result
//! 3. Resolve posters concurrently, once per distinct id
//! 4. Assemble cards in rank order, with a placeholder where no poster exists

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use data_loader::{Catalog, ExternalId, MovieRecord};
use poster_client::PosterResolver;
use sources::{SimilarTitle, SimilarTitles};

/// Image shown when a movie has no resolvable poster
pub const PLACEHOLDER_POSTER_URL: &str =
    "https://via.placeholder.com/300x450.png?text=Poster+Not+Available";

/// Display data for a single movie
#[derive(Debug, Clone, PartialEq)]
pub struct MovieCard {
    pub title: String,
    pub reference_url: Option<String>,
    pub external_id: Option<ExternalId>,
    /// Always renderable: the real poster or `PLACEHOLDER_POSTER_URL`
    pub poster_url: String,
}

impl MovieCard {
    pub fn has_poster(&self) -> bool {
        self.poster_url != PLACEHOLDER_POSTER_URL
    }
}

/// One entry of a recommendation list
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecommendation {
    /// 1-based position, closest first
    pub rank: usize,
    pub title: String,
    pub reference_url: Option<String>,
    pub external_id: Option<ExternalId>,
    pub poster_url: String,
    pub distance: f32,
}

impl MovieRecommendation {
    pub fn has_poster(&self) -> bool {
        self.poster_url != PLACEHOLDER_POSTER_URL
    }
}

/// Combines similar-title lookup with poster resolution
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    catalog: Arc<Catalog>,
    similar: SimilarTitles,
    posters: Arc<PosterResolver>,
}

impl RecommendationOrchestrator {
    /// Orchestrator over an exact brute-force neighbor index
    pub fn new(catalog: Arc<Catalog>, posters: Arc<PosterResolver>) -> Self {
        let similar = SimilarTitles::new(catalog.clone());
        Self::with_similar(similar, posters)
    }

    /// Orchestrator over a prepared similar-title engine
    pub fn with_similar(similar: SimilarTitles, posters: Arc<PosterResolver>) -> Self {
        Self {
            catalog: similar.catalog().clone(),
            similar,
            posters,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn similar_titles(&self) -> &SimilarTitles {
        &self.similar
    }

    pub fn poster_resolver(&self) -> &Arc<PosterResolver> {
        &self.posters
    }

    /// Main entry point: up to `limit` titles most similar to `title`,
    /// closest first, each with a renderable poster.
    ///
    /// An unknown title fails with `sources::NeighborError::NotFound`
    /// (reachable through `anyhow::Error::downcast_ref`).
    #[instrument(skip(self))]
    pub async fn get_recommendations(
        &self,
        title: &str,
        limit: usize,
    ) -> Result<Vec<MovieRecommendation>> {
        let start_time = Instant::now();

        let similar = self.find_similar_blocking(title, limit).await?;
        info!("Found {} similar titles for {:?}", similar.len(), title);

        let external_ids: Vec<Option<ExternalId>> =
            similar.iter().map(|s| s.movie.external_id()).collect();
        let posters = self.resolve_posters(external_ids.iter().flatten()).await;

        let recommendations: Vec<MovieRecommendation> = similar
            .into_iter()
            .zip(external_ids)
            .enumerate()
            .map(|(i, (hit, external_id))| {
                let poster_url = poster_or_placeholder(external_id.as_ref(), &posters);
                MovieRecommendation {
                    rank: i + 1,
                    title: hit.movie.title,
                    reference_url: hit.movie.reference_url,
                    external_id,
                    poster_url,
                    distance: hit.distance,
                }
            })
            .collect();

        let missing = recommendations.iter().filter(|r| !r.has_poster()).count();
        if missing > 0 {
            warn!("{} of {} recommendations have no poster", missing, recommendations.len());
        }

        info!(
            "Total time to get recommendations for {:?}: {:.2?}",
            title,
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    /// Card for the selected title itself (first row on duplicate titles)
    #[instrument(skip(self))]
    pub async fn selected_movie(&self, title: &str) -> Result<MovieCard> {
        let movie = self
            .catalog
            .row_of_title(title)
            .and_then(|row| self.catalog.get_movie(row))
            .ok_or_else(|| sources::NeighborError::NotFound(title.to_string()))?;

        Ok(self.card_for(movie).await)
    }

    async fn card_for(&self, movie: &MovieRecord) -> MovieCard {
        let external_id = movie.external_id();
        let poster_url = self
            .posters
            .resolve_poster(external_id.as_deref())
            .await
            .unwrap_or_else(|| PLACEHOLDER_POSTER_URL.to_string());

        MovieCard {
            title: movie.title.clone(),
            reference_url: movie.reference_url.clone(),
            external_id,
            poster_url,
        }
    }

    /// Run the neighbor query on the blocking pool; the scan is CPU-bound
    async fn find_similar_blocking(&self, title: &str, limit: usize) -> Result<Vec<SimilarTitle>> {
        let similar = self.similar.clone();
        let title = title.to_string();

        let result = tokio::task::spawn_blocking(move || similar.find_similar(&title, limit))
            .await
            .context("Similar-title task panicked")?;

        Ok(result?)
    }

    /// Resolve every distinct id concurrently
    async fn resolve_posters<'a>(
        &self,
        external_ids: impl Iterator<Item = &'a ExternalId>,
    ) -> HashMap<ExternalId, Option<String>> {
        let mut tasks = JoinSet::new();
        let mut seen = HashMap::new();

        for id in external_ids {
            if seen.insert(id.clone(), None).is_some() {
                continue;
            }
            let resolver = self.posters.clone();
            let id = id.clone();
            tasks.spawn(async move {
                let poster = resolver.resolve_poster(Some(&id)).await;
                (id, poster)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, poster)) => {
                    seen.insert(id, poster);
                }
                // Leave the id unresolved so it renders as a placeholder
                Err(e) => warn!("Poster task failed: {}", e),
            }
        }

        seen
    }
}

fn poster_or_placeholder(
    external_id: Option<&ExternalId>,
    posters: &HashMap<ExternalId, Option<String>>,
) -> String {
    external_id
        .and_then(|id| posters.get(id))
        .and_then(|poster| poster.clone())
        .unwrap_or_else(|| PLACEHOLDER_POSTER_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use data_loader::{DistanceMetric, FeatureMatrix, IndexManifest, SparseVector};
    use poster_client::{
        InMemoryPosterCache, MetadataResponse, MetadataTransport, PosterConfig, TransportError,
    };
    use sources::NeighborError;
    use std::sync::Mutex;

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    /// Catalog of five movies; "The Matrix" is closest to its sequel
    fn build_test_catalog() -> Arc<Catalog> {
        let entries: [(&str, Option<&str>, [f32; 3]); 5] = [
            ("The Matrix", Some("https://www.themoviedb.org/movie/603"), [1.0, 0.2, 0.0]),
            ("The Matrix Reloaded", Some("https://www.themoviedb.org/movie/604"), [0.9, 0.3, 0.0]),
            ("Heat", Some("https://www.themoviedb.org/movie/949/"), [0.5, 0.8, 0.0]),
            ("Toy Story", Some("https://www.themoviedb.org/movie/abc"), [0.0, 0.1, 1.0]),
            ("Ronin", None, [0.3, 0.9, 0.1]),
        ];

        let movies = entries
            .iter()
            .map(|(title, url, _)| MovieRecord::new(*title, url.map(str::to_string)))
            .collect();
        let rows = entries
            .iter()
            .map(|(_, _, v)| SparseVector::from_dense(v))
            .collect();
        let features = FeatureMatrix::new(3, rows).unwrap();
        let manifest = IndexManifest::for_matrix(&features, DistanceMetric::Cosine);
        Arc::new(Catalog::new(movies, features, manifest).unwrap())
    }

    /// Metadata service stand-in: "949" has no poster, everything else
    /// numeric has `/<id>.jpg`
    #[derive(Default)]
    struct StubTransport {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MetadataTransport for StubTransport {
        async fn fetch_movie(&self, external_id: &str) -> Result<MetadataResponse, TransportError> {
            self.calls.lock().unwrap().push(external_id.to_string());
            if external_id == "949" {
                return Ok(MetadataResponse::new(404, r#"{"status_code": 34}"#));
            }
            Ok(MetadataResponse::new(
                200,
                format!(r#"{{"poster_path": "/{}.jpg"}}"#, external_id),
            ))
        }
    }

    fn build_test_orchestrator() -> (RecommendationOrchestrator, Arc<StubTransport>) {
        let transport = Arc::new(StubTransport::default());
        let resolver = PosterResolver::with_parts(
            PosterConfig::new("test-key"),
            transport.clone(),
            Arc::new(InMemoryPosterCache::new()),
        );
        let orchestrator =
            RecommendationOrchestrator::new(build_test_catalog(), Arc::new(resolver));
        (orchestrator, transport)
    }

    // ============================================================================
    // get_recommendations
    // ============================================================================

    #[tokio::test]
    async fn test_recommendations_are_ranked_and_exclude_selected() {
        let (orchestrator, _) = build_test_orchestrator();

        let recommendations = orchestrator
            .get_recommendations("The Matrix", 4)
            .await
            .expect("get_recommendations failed");

        assert_eq!(recommendations.len(), 4);
        assert_eq!(recommendations[0].title, "The Matrix Reloaded");
        assert!(recommendations.iter().all(|r| r.title != "The Matrix"));

        let ranks: Vec<usize> = recommendations.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        assert!(recommendations.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[tokio::test]
    async fn test_recommendations_fill_posters_and_placeholders() {
        let (orchestrator, transport) = build_test_orchestrator();

        let recommendations = orchestrator
            .get_recommendations("The Matrix", 4)
            .await
            .expect("get_recommendations failed");
        let by_title = |t: &str| recommendations.iter().find(|r| r.title == t).unwrap();

        let sequel = by_title("The Matrix Reloaded");
        assert_eq!(sequel.external_id.as_deref(), Some("604"));
        assert_eq!(sequel.poster_url, "https://image.tmdb.org/t/p/w500/604.jpg");
        assert!(sequel.has_poster());

        // Service answered without a poster
        assert_eq!(by_title("Heat").poster_url, PLACEHOLDER_POSTER_URL);
        // Non-numeric id: never sent to the service
        assert_eq!(by_title("Toy Story").external_id.as_deref(), Some("abc"));
        assert_eq!(by_title("Toy Story").poster_url, PLACEHOLDER_POSTER_URL);
        // No reference URL at all
        assert_eq!(by_title("Ronin").external_id, None);
        assert!(!by_title("Ronin").has_poster());

        let mut calls = transport.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["604".to_string(), "949".to_string()]);
    }

    #[tokio::test]
    async fn test_repeat_requests_reuse_cached_posters() {
        let (orchestrator, transport) = build_test_orchestrator();

        let first = orchestrator.get_recommendations("Heat", 2).await.unwrap();
        let calls_after_first = transport.calls.lock().unwrap().len();
        let second = orchestrator.get_recommendations("Heat", 2).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.calls.lock().unwrap().len(), calls_after_first);
    }

    #[tokio::test]
    async fn test_unknown_title_is_not_found() {
        let (orchestrator, transport) = build_test_orchestrator();

        let err = orchestrator
            .get_recommendations("The Matrix Revolutions", 5)
            .await
            .expect_err("unknown title should fail");

        assert_eq!(
            err.downcast_ref::<NeighborError>(),
            Some(&NeighborError::NotFound("The Matrix Revolutions".to_string()))
        );
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_limit_larger_than_catalog() {
        let (orchestrator, _) = build_test_orchestrator();

        let recommendations = orchestrator.get_recommendations("Ronin", 15).await.unwrap();
        assert_eq!(recommendations.len(), 4);
    }

    // ============================================================================
    // selected_movie
    // ============================================================================

    #[tokio::test]
    async fn test_selected_movie_card() {
        let (orchestrator, _) = build_test_orchestrator();

        let card = orchestrator.selected_movie("The Matrix").await.unwrap();
        assert_eq!(card.title, "The Matrix");
        assert_eq!(
            card.reference_url.as_deref(),
            Some("https://www.themoviedb.org/movie/603")
        );
        assert_eq!(card.poster_url, "https://image.tmdb.org/t/p/w500/603.jpg");

        let card = orchestrator.selected_movie("Ronin").await.unwrap();
        assert_eq!(card.poster_url, PLACEHOLDER_POSTER_URL);

        assert!(orchestrator.selected_movie("Nope").await.is_err());
    }

    #[test]
    fn test_poster_or_placeholder() {
        let mut posters = HashMap::new();
        posters.insert("1".to_string(), Some("https://img/1.jpg".to_string()));
        posters.insert("2".to_string(), None);

        assert_eq!(
            poster_or_placeholder(Some(&"1".to_string()), &posters),
            "https://img/1.jpg"
        );
        assert_eq!(
            poster_or_placeholder(Some(&"2".to_string()), &posters),
            PLACEHOLDER_POSTER_URL
        );
        assert_eq!(poster_or_placeholder(None, &posters), PLACEHOLDER_POSTER_URL);
    }
}
