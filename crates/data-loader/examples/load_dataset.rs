use anyhow::Context;
use data_loader::{Dataset, LoadOptions};
use std::path::Path;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let data_dir = Path::new("data/ml-1m");

    println!("Loading feedback and plots...\n");

    let start = Instant::now();
    let dataset = Dataset::load_from_files(data_dir, &LoadOptions::default())
        .with_context(|| format!("failed to load dataset from {}", data_dir.display()))?;
    let elapsed = start.elapsed();

    let (users, items, records) = dataset.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Users: {}", users);
    println!("Items: {}", items);
    println!("Records: {}", records);
    println!("Documents: {}", dataset.documents().len());
    println!("\nPerformance: {:.0} records/second",
             records as f64 / elapsed.as_secs_f64());

    Ok(())
}
