use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use data_loader::Dataset;
use experiment::{ExperimentConfig, RatioSplit, Weighting};
use modality::{FeatureTable, TextModality};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// vbpr-text - compare VBPR on text features against BPR
#[derive(Parser)]
#[command(name = "vbpr-text")]
#[command(about = "Text modality as visual features for VBPR, compared against BPR", long_about = None)]
struct Cli {
    /// Dataset directory holding the feedback and plot files
    #[arg(short, long, default_value = "data/ml-plots")]
    data_dir: PathBuf,

    /// JSON experiment config; defaults reproduce the reference run
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the split and every model
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build features, split, fit every model and print the metric table
    Run {
        /// Use TF-IDF weights instead of raw token counts
        #[arg(long)]
        tf_idf: bool,

        /// Print the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the vocabulary the text modality builds
    Vocab {
        /// Number of tokens to list, by document frequency
        #[arg(long, default_value = "20")]
        top: usize,
    },

    /// Show dataset and split statistics without fitting
    Stats,

    /// Print the effective config as JSON
    Config,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ExperimentConfig::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => ExperimentConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    config.validate().context("Invalid experiment config")?;

    match cli.command {
        Commands::Run { tf_idf, json } => {
            if tf_idf {
                config.weighting = Weighting::TfIdf;
            }
            let dataset = load_dataset(&cli.data_dir, &config)?;
            handle_run(&config, &dataset, json)?
        }
        Commands::Vocab { top } => {
            let dataset = load_dataset(&cli.data_dir, &config)?;
            handle_vocab(&config, &dataset, top)?
        }
        Commands::Stats => {
            let dataset = load_dataset(&cli.data_dir, &config)?;
            handle_stats(&config, &dataset)?
        }
        Commands::Config => println!("{}", config.to_json_pretty()?),
    }

    Ok(())
}

fn load_dataset(data_dir: &Path, config: &ExperimentConfig) -> Result<Dataset> {
    println!("Loading dataset from {}...", data_dir.display());
    let start = Instant::now();
    let dataset = config
        .load(data_dir)
        .with_context(|| format!("Failed to load dataset from {}", data_dir.display()))?;
    let (users, items, records) = dataset.counts();
    println!(
        "{} Loaded {} records ({} users, {} items) in {:?}",
        "✓".green(),
        records,
        users,
        items,
        start.elapsed()
    );
    Ok(dataset)
}

/// Handle the 'run' command
fn handle_run(config: &ExperimentConfig, dataset: &Dataset, json: bool) -> Result<()> {
    let mut experiment = config
        .prepare(dataset)
        .context("Failed to prepare experiment")?;
    println!(
        "{} Features: {} items, dim {} (as {})",
        "✓".green(),
        experiment.split().features().len(),
        experiment.split().features().dim(),
        experiment.split().features().origin()
    );

    let start = Instant::now();
    let report = experiment.run().context("Experiment failed")?;
    info!("Experiment finished in {:?}", start.elapsed());

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n{}", "Results".bold().blue());
        print!("{}", report);
    }
    Ok(())
}

/// Handle the 'vocab' command
fn handle_vocab(config: &ExperimentConfig, dataset: &Dataset, top: usize) -> Result<()> {
    let modality = TextModality::from_config(&config.text)?;
    let text = modality.build(&dataset.rated_documents())?;
    let vocabulary = text.vocabulary();

    println!(
        "{}",
        format!(
            "Vocabulary: {} tokens over {} documents",
            vocabulary.len(),
            text.counts().len()
        )
        .bold()
        .blue()
    );

    let mut columns: Vec<usize> = (0..vocabulary.len()).collect();
    columns.sort_by_key(|&column| std::cmp::Reverse(vocabulary.doc_freq(column).unwrap_or(0)));
    for (rank, column) in columns.into_iter().take(top).enumerate() {
        println!(
            "{}. {} ({} documents)",
            (rank + 1).to_string().green(),
            vocabulary.token(column).unwrap_or("?"),
            vocabulary.doc_freq(column).unwrap_or(0)
        );
    }
    Ok(())
}

/// Handle the 'stats' command
fn handle_stats(config: &ExperimentConfig, dataset: &Dataset) -> Result<()> {
    let (users, items, records) = dataset.counts();
    let rated = dataset.rated_documents().len();

    println!("{}", "Dataset".bold().blue());
    println!("{}Users: {}", "• ".green(), users);
    println!("{}Items: {}", "• ".green(), items);
    println!("{}Records: {}", "• ".green(), records);
    println!(
        "{}Documents: {} ({} with feedback)",
        "• ".green(),
        dataset.documents().len(),
        rated
    );

    let features = FeatureTable::from_rows(Vec::new(), Vec::new(), config.feature_origin)?;
    let split = RatioSplit::new(config.split.clone()).split(dataset.feedback(), Arc::new(features))?;
    let summary = split.summary();

    println!("{}", "Split".bold().blue());
    println!(
        "{}Train: {} records, {} users, {} items",
        "• ".cyan(),
        summary.train_records,
        summary.train_users,
        summary.train_items
    );
    println!(
        "{}Test: {} records ({} dropped as unknown)",
        "• ".cyan(),
        summary.test_records,
        summary.dropped_test
    );
    if split.val().is_some() {
        println!(
            "{}Validation: {} records ({} dropped as unknown)",
            "• ".cyan(),
            summary.val_records,
            summary.dropped_val
        );
    }
    Ok(())
}
