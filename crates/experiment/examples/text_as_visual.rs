//! Text modality as a substitute for visual features.
//!
//! Builds bag-of-words vectors from movie plots, hands them to VBPR as if they
//! were image features, and compares VBPR against BPR.
//!
//! Run with: cargo run --example text_as_visual -p experiment -- data/ml-plots

use anyhow::{Context, Result};
use data_loader::Dataset;
use experiment::{Auc, Experiment, ExperimentConfig, RatioSplit, Recall};
use modality::{BaseTokenizer, FeatureOrigin, StopWords, TextModality};
use models::{Bpr, BprConfig, Vbpr, VbprConfig};
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/ml-plots"));
    let config = ExperimentConfig::default();

    let dataset = Dataset::load_from_files(&data_dir, &config.data)
        .with_context(|| format!("Failed to load dataset from {:?}", data_dir))?;

    // Plots are tab-separated token lists
    let tokenizer = BaseTokenizer::new('\t').with_stop_words(StopWords::english());
    let text = TextModality::new(tokenizer)
        .with_max_vocab(5000)
        .with_max_doc_freq(0.5)
        .build(&dataset.rated_documents())?;
    println!("Vocabulary: {} tokens", text.vocabulary().len());

    let features = text.into_counts().relabel(FeatureOrigin::Visual);
    let split = RatioSplit::new(config.split.clone()).split(dataset.feedback(), Arc::new(features))?;

    let vbpr = Vbpr::new(VbprConfig {
        k: 10,
        k2: 20,
        n_epochs: 50,
        batch_size: 100,
        learning_rate: 0.005,
        lambda_w: 1.0,
        lambda_b: 0.01,
        lambda_e: 0.0,
        use_gpu: true,
        seed: Some(123),
        ..VbprConfig::default()
    });
    let bpr = Bpr::new(BprConfig {
        k: 10,
        max_iter: 50,
        learning_rate: 0.001,
        lambda_reg: 0.01,
        seed: Some(123),
        ..BprConfig::default()
    });

    let report = Experiment::new(split)
        .add_model(vbpr)
        .add_model(bpr)
        .add_metric(Auc)
        .add_metric(Recall::new(50))
        .run()?;

    println!("\n{}", report);
    Ok(())
}
