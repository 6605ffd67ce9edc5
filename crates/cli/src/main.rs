use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::Catalog;
use poster_client::{PosterConfig, PosterResolver};
use server::{MovieCard, MovieRecommendation, PLACEHOLDER_POSTER_URL, RecommendationOrchestrator};
use sources::SimilarTitles;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// ReelRecs - Similar Movie Recommender
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Content-based movie recommender with poster lookup", long_about = None)]
struct Cli {
    /// Directory holding movies_processed.csv, features.bin and index.json
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend movies similar to a title
    Recommend {
        /// Exact catalog title
        #[arg(long)]
        title: String,

        /// Number of recommendations to return
        #[arg(long, default_value = "15")]
        limit: usize,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Resolve the poster for one external id
    Poster {
        /// Metadata-service id, e.g. 603
        #[arg(long)]
        id: String,
    },

    /// Show catalog and index summary
    Info,

    /// Measure similar-title query latency over random titles
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend { title, limit } => {
            handle_recommend(load_catalog(&cli.data_dir)?, &title, limit).await?
        }
        Commands::Search { title } => handle_search(load_catalog(&cli.data_dir)?, &title)?,
        // Poster lookups don't need the catalog
        Commands::Poster { id } => handle_poster(&id).await?,
        Commands::Info => {
            let catalog = load_catalog(&cli.data_dir)?;
            handle_info(&catalog)
        }
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(load_catalog(&cli.data_dir)?, requests, concurrent).await?,
    }

    Ok(())
}

fn load_catalog(data_dir: &Path) -> Result<Arc<Catalog>> {
    println!("Loading catalog from {}...", data_dir.display());
    let start = Instant::now();
    let catalog = Catalog::load_from_files(data_dir).context("Failed to load movie catalog")?;
    println!("{} Loaded {} movies in {:?}", "✓".green(), catalog.len(), start.elapsed());
    Ok(Arc::new(catalog))
}

fn build_resolver() -> Result<Arc<PosterResolver>> {
    let config = PosterConfig::from_env()
        .context("Failed to load poster config (is TMDB_API_KEY set?)")?;
    Ok(Arc::new(PosterResolver::new(config)?))
}

/// Handle the 'recommend' command
async fn handle_recommend(catalog: Arc<Catalog>, title: &str, limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(anyhow!("--limit must be at least 1"));
    }

    let orchestrator = RecommendationOrchestrator::new(catalog, build_resolver()?);

    let start = Instant::now();
    let selected = orchestrator.selected_movie(title).await?;
    let recommendations = orchestrator.get_recommendations(title, limit).await?;

    print_selected(&selected);
    print_recommendations(&recommendations);
    println!("\n{} {:?}", "Took".dimmed(), start.elapsed());
    Ok(())
}

/// Handle the 'search' command
fn handle_search(catalog: Arc<Catalog>, title: &str) -> Result<()> {
    let engine = SimilarTitles::new(catalog);
    let matches = engine.search_titles(title, 20);

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    if matches.is_empty() {
        println!("  (no matches)");
    }
    for (row, movie) in matches {
        let id = movie.external_id().unwrap_or_else(|| "-".to_string());
        println!("{}: {} [id {}]", row, movie.title, id);
    }
    Ok(())
}

/// Handle the 'poster' command
async fn handle_poster(id: &str) -> Result<()> {
    let resolver = build_resolver()?;
    match resolver.resolve_poster(Some(id)).await {
        Some(url) => println!("{} {}", "✓".green(), url),
        None => println!("{} no poster, showing {}", "✗".red(), PLACEHOLDER_POSTER_URL),
    }
    Ok(())
}

/// Handle the 'info' command
fn handle_info(catalog: &Catalog) {
    let manifest = catalog.manifest();
    let features = catalog.features();
    let without_url = catalog
        .movies()
        .iter()
        .filter(|m| m.reference_url.is_none())
        .count();
    let without_id = catalog
        .movies()
        .iter()
        .filter(|m| m.external_id().is_none())
        .count();

    println!("{}", "Catalog".bold().blue());
    println!("{}Movies: {}", "• ".green(), catalog.len());
    println!("{}Duplicate titles: {}", "• ".green(), catalog.duplicate_title_count());
    println!("{}Without reference URL: {}", "• ".green(), without_url);
    println!("{}Without external id: {}", "• ".green(), without_id);

    println!("{}", "Index".bold().blue());
    println!("{}Format version: {}", "• ".cyan(), manifest.format_version);
    println!("{}Metric: {:?}", "• ".cyan(), manifest.metric);
    println!("{}Dimensions: {}", "• ".cyan(), features.dimensions());
    println!("{}Stored values: {}", "• ".cyan(), features.nnz());
    if !features.is_empty() {
        println!(
            "{}Avg values per row: {:.1}",
            "• ".cyan(),
            features.nnz() as f64 / features.len() as f64
        );
    }
}

/// Handle the 'benchmark' command
async fn handle_benchmark(catalog: Arc<Catalog>, requests: usize, concurrent: usize) -> Result<()> {
    if catalog.is_empty() {
        return Err(anyhow!("Catalog is empty, nothing to benchmark"));
    }
    if requests == 0 || concurrent == 0 {
        return Err(anyhow!("--requests and --concurrent must be at least 1"));
    }

    let engine = SimilarTitles::new(catalog.clone());

    // Random titles from the catalog
    let titles: Vec<String> = (0..requests)
        .map(|_| {
            let row = rand::random::<u32>() as usize % catalog.len();
            catalog.movies()[row].title.clone()
        })
        .collect();

    let permits = Arc::new(Semaphore::new(concurrent));
    let wall_clock = Instant::now();

    // Queries are CPU-bound, so each runs on the blocking pool
    let mut handles = vec![];
    for title in titles {
        let engine = engine.clone();
        let permits = permits.clone();
        let handle = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await?;
            let elapsed = tokio::task::spawn_blocking(move || {
                let start = Instant::now();
                engine.find_similar(&title, 15)?;
                Ok::<_, anyhow::Error>(start.elapsed())
            })
            .await??;
            Ok::<Duration, anyhow::Error>(elapsed)
        });
        handles.push(handle);
    }

    let mut timings = vec![];
    for handle in handles {
        timings.push(handle.await??);
    }
    let total_time = wall_clock.elapsed();

    timings.sort();
    let latency_sum: Duration = timings.iter().sum();
    let avg_latency = latency_sum / timings.len() as u32;
    let percentile = |p: f64| {
        let idx = ((timings.len() as f64 * p) as usize).min(timings.len() - 1);
        timings[idx]
    };
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

fn print_selected(card: &MovieCard) {
    println!("{}", format!("Selected: {}", card.title).bold().blue());
    println!("   Poster: {}", poster_label(&card.poster_url));
    if let Some(url) = &card.reference_url {
        println!("   More: {}", url);
    }
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[MovieRecommendation]) {
    print!("{}", "\nYou might also like:\n".bold().blue());
    for rec in recommendations {
        println!(
            "{}. {} - Distance: {:.3}",
            rec.rank.to_string().green(),
            rec.title,
            rec.distance
        );
        println!("   Poster: {}", poster_label(&rec.poster_url));
        if let Some(url) = &rec.reference_url {
            println!("   More: {}", url);
        }
    }
}

fn poster_label(url: &str) -> String {
    if url == PLACEHOLDER_POSTER_URL {
        format!("{} {}", url, "(placeholder)".dimmed())
    } else {
        url.to_string()
    }
}
