use data_loader::Catalog;
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data");

    println!("Loading catalog artifacts...\n");

    let start = Instant::now();
    let catalog = Catalog::load_from_files(data_dir)
        .expect("Failed to load catalog");
    let elapsed = start.elapsed();

    let features = catalog.features();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", catalog.len());
    println!("Dimensions: {}", features.dimensions());
    println!("Non-zeros: {}", features.nnz());
    println!("Duplicate titles: {}", catalog.duplicate_title_count());
    println!("\nPerformance: {:.0} rows/second",
             catalog.len() as f64 / elapsed.as_secs_f64());
}
