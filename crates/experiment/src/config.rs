//! Experiment configuration and the load → modality → split → runner wiring.
//!
//! All defaults reproduce the reference text-as-visual run: a 5000-token
//! vocabulary over tab-separated plots with English stop words, relabeled as
//! visual features, a seeded 80/20 split excluding unknowns, and VBPR against
//! BPR scored by AUC and Recall@50.

use crate::error::{ExperimentError, Result};
use crate::metrics::MetricConfig;
use crate::runner::Experiment;
use crate::split::{RatioSplit, SplitConfig};
use data_loader::{Dataset, LoadOptions};
use modality::{FeatureOrigin, FeatureTable, TextModality, TextModalityConfig, TokenizerConfig};
use models::{BprConfig, ModelConfig, VbprConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

const DEFAULT_SEED: u64 = 123;

/// Values placed in the item feature table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// Raw token counts
    #[default]
    Counts,
    /// L2-normalized TF-IDF weights
    TfIdf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub data: LoadOptions,
    pub text: TextModalityConfig,
    pub weighting: Weighting,
    /// Origin the text feature table is relabeled as before models see it
    pub feature_origin: FeatureOrigin,
    pub split: SplitConfig,
    pub models: Vec<ModelConfig>,
    pub metrics: Vec<MetricConfig>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            data: LoadOptions::default(),
            text: TextModalityConfig {
                max_vocab: 5000,
                max_doc_freq: 0.5,
                tokenizer: TokenizerConfig {
                    sep: '\t',
                    stop_words: Some("english".to_string()),
                    ..TokenizerConfig::default()
                },
                ..TextModalityConfig::default()
            },
            weighting: Weighting::Counts,
            feature_origin: FeatureOrigin::Visual,
            split: SplitConfig {
                test_size: 0.2,
                exclude_unknowns: true,
                seed: Some(DEFAULT_SEED),
                verbose: true,
                ..SplitConfig::default()
            },
            models: vec![
                ModelConfig::Vbpr(VbprConfig {
                    k: 10,
                    k2: 20,
                    n_epochs: 50,
                    batch_size: 100,
                    learning_rate: 0.005,
                    lambda_w: 1.0,
                    lambda_b: 0.01,
                    lambda_e: 0.0,
                    use_gpu: true,
                    seed: Some(DEFAULT_SEED),
                    ..VbprConfig::default()
                }),
                ModelConfig::Bpr(BprConfig {
                    k: 10,
                    max_iter: 50,
                    learning_rate: 0.001,
                    lambda_reg: 0.01,
                    seed: Some(DEFAULT_SEED),
                    ..BprConfig::default()
                }),
            ],
            metrics: vec![MetricConfig::Auc, MetricConfig::Recall { k: 50 }],
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Use `seed` for the split and every model
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.split.seed = Some(seed);
        for model in &mut self.models {
            match model {
                ModelConfig::Bpr(config) => config.seed = Some(seed),
                ModelConfig::Vbpr(config) => config.seed = Some(seed),
                ModelConfig::MostPop(_) => {}
            }
        }
        self
    }

    /// Check everything that can be checked without data
    pub fn validate(&self) -> Result<()> {
        TextModality::from_config(&self.text)?;
        RatioSplit::new(self.split.clone()).validate()?;
        for model in &self.models {
            model
                .validate()
                .map_err(|source| ExperimentError::Configuration {
                    model: model.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Build the item feature table from the dataset's rated documents
    #[instrument(skip(self, dataset))]
    pub fn build_features(&self, dataset: &Dataset) -> Result<FeatureTable> {
        let modality = TextModality::from_config(&self.text)?;
        let text = modality.build(&dataset.rated_documents())?;

        let table = match self.weighting {
            Weighting::Counts => text.into_counts(),
            Weighting::TfIdf => text.tf_idf()?,
        };
        info!(
            "Item features: {:?} weighting, {} items, dim {}",
            self.weighting,
            table.len(),
            table.dim()
        );
        Ok(table.relabel(self.feature_origin))
    }

    /// Features, split, models and metrics, ready to `run`
    pub fn prepare(&self, dataset: &Dataset) -> Result<Experiment> {
        self.validate()?;
        let features = self.build_features(dataset)?;
        let split = RatioSplit::new(self.split.clone()).split(dataset.feedback(), Arc::new(features))?;

        let experiment = self
            .models
            .iter()
            .fold(Experiment::new(split), |experiment, model| {
                experiment.add_boxed_model(model.build())
            });
        let experiment = self
            .metrics
            .iter()
            .fold(experiment, |experiment, metric| experiment.add_boxed_metric(metric.build()));
        Ok(experiment)
    }

    /// Load `data_dir` with the configured options
    pub fn load(&self, data_dir: &Path) -> Result<Dataset> {
        Ok(Dataset::load_from_files(data_dir, &self.data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{FeedbackRecord, RawDocument};
    use std::collections::BTreeMap;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = ExperimentConfig::default();
        assert_eq!(config.text.max_vocab, 5000);
        assert_eq!(config.text.tokenizer.sep, '\t');
        assert_eq!(config.split.seed, Some(123));
        assert_eq!(config.feature_origin, FeatureOrigin::Visual);
        let names: Vec<&str> = config.models.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["VBPR", "BPR"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ExperimentConfig::from_json_str(
            r#"{
                "text": {"max_vocab": 50, "max_doc_freq": 1.0},
                "split": {"test_size": 0.1, "seed": 9},
                "metrics": [{"metric": "ndcg", "k": 10}]
            }"#,
        )
        .unwrap();

        assert_eq!(config.text.max_vocab, 50);
        assert_eq!(config.text.min_doc_freq, 1);
        assert_eq!(config.split.seed, Some(9));
        assert!(config.split.exclude_unknowns);
        assert_eq!(config.models.len(), 2);
        assert_eq!(config.metrics, vec![MetricConfig::Ndcg { k: 10 }]);
    }

    #[test]
    fn test_json_round_trip() {
        let config = ExperimentConfig::default().with_seed(5);
        let parsed = ExperimentConfig::from_json_str(&config.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_model_is_a_configuration_error() {
        let mut config = ExperimentConfig::default();
        config.models.push(ModelConfig::Bpr(BprConfig {
            learning_rate: 0.0,
            ..BprConfig::default()
        }));
        assert!(matches!(
            config.validate(),
            Err(ExperimentError::Configuration { model, .. }) if model == "BPR"
        ));
    }

    #[test]
    fn test_features_are_relabeled_and_cover_rated_items() {
        let documents: BTreeMap<String, RawDocument> = [("a", "red apple"), ("b", "green apple"), ("c", "unrated")]
            .iter()
            .map(|(id, text)| (id.to_string(), RawDocument::new(*id, *text)))
            .collect();
        let dataset = Dataset::from_parts(
            vec![FeedbackRecord::new("u", "a", 1.0), FeedbackRecord::new("u", "b", 1.0)],
            documents,
        );
        let config = ExperimentConfig {
            text: TextModalityConfig {
                max_doc_freq: 1.0,
                ..TextModalityConfig::default()
            },
            ..ExperimentConfig::default()
        };

        let table = config.build_features(&dataset).unwrap();
        assert_eq!(table.origin(), FeatureOrigin::Visual);
        assert_eq!(table.len(), 2);
        assert!(!table.contains("c"));
        assert_eq!(table.dim(), 3);
    }
}
