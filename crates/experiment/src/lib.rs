//! # Experiment Crate
//!
//! Splits feedback, runs models and reports metrics.
//!
//! ## Components
//!
//! - **split**: seeded ratio split into train/test(/validation) with dense ids
//! - **evaluation**: per-user rankings of a fitted model
//! - **metrics**: AUC, Recall@k, Precision@k, NDCG@k and a row count
//! - **runner**: `Experiment`, which checks feature requirements, then fits
//!   and evaluates each model in order
//! - **report**: `MetricResult` rows and the printed table
//! - **config**: `ExperimentConfig`, wiring the whole run from JSON
//!
//! ## Example Usage
//!
//! ```ignore
//! use experiment::ExperimentConfig;
//! use std::path::Path;
//!
//! let config = ExperimentConfig::default();
//! let dataset = config.load(Path::new("data/ml-plots"))?;
//! let report = config.prepare(&dataset)?.run()?;
//! println!("{}", report);
//! ```

pub mod config;
pub mod error;
pub mod evaluation;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod split;

pub use config::{ExperimentConfig, Weighting};
pub use error::{ExperimentError, Result};
pub use evaluation::{Evaluation, UserRanking};
pub use metrics::{Auc, Metric, MetricConfig, Ndcg, Precision, Recall, TestRows};
pub use report::{ExperimentReport, MetricResult};
pub use runner::Experiment;
pub use split::{RatioSplit, SplitConfig, SplitResult, SplitSummary};
