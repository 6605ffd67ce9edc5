//! Server crate for the ReelRecs recommendation engine.
//!
//! This crate contains the orchestrator that turns a selected title into a
//! ranked list of similar movies, each with a poster ready to render.

pub mod orchestrator;

pub use orchestrator::{
    MovieCard, MovieRecommendation, RecommendationOrchestrator, PLACEHOLDER_POSTER_URL,
};
