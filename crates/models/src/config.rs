//! Serializable model configurations.
//!
//! Models are constructed explicitly from these values; there is no global
//! registry to look names up in.

use crate::bpr::Bpr;
use crate::error::{Result, invalid};
use crate::most_pop::MostPop;
use crate::traits::Recommender;
use crate::vbpr::Vbpr;
use serde::{Deserialize, Serialize};

/// Bayesian Personalized Ranking hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BprConfig {
    pub name: String,
    /// Latent dimensionality
    pub k: usize,
    /// Epochs; each draws as many triples as there are training interactions
    pub max_iter: usize,
    pub learning_rate: f32,
    pub lambda_reg: f32,
    pub seed: Option<u64>,
}

impl Default for BprConfig {
    fn default() -> Self {
        Self {
            name: "BPR".to_string(),
            k: 10,
            max_iter: 100,
            learning_rate: 0.001,
            lambda_reg: 0.01,
            seed: None,
        }
    }
}

impl BprConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive(&self.name, "k", self.k)?;
        check_positive(&self.name, "max_iter", self.max_iter)?;
        check_rate(&self.name, "learning_rate", self.learning_rate)?;
        check_lambda(&self.name, "lambda_reg", self.lambda_reg)
    }
}

/// Visual Bayesian Personalized Ranking hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VbprConfig {
    pub name: String,
    /// Dimensionality of the non-visual latent factors
    pub k: usize,
    /// Dimensionality of the projected item features
    pub k2: usize,
    pub n_epochs: usize,
    /// Triples drawn between divergence checks
    pub batch_size: usize,
    pub learning_rate: f32,
    /// Regularization of the latent factors
    pub lambda_w: f32,
    /// Regularization of the item biases
    pub lambda_b: f32,
    /// Regularization of the feature projection and feature bias
    pub lambda_e: f32,
    /// Accepted for compatibility; training always runs on the CPU
    pub use_gpu: bool,
    pub seed: Option<u64>,
}

impl Default for VbprConfig {
    fn default() -> Self {
        Self {
            name: "VBPR".to_string(),
            k: 10,
            k2: 10,
            n_epochs: 50,
            batch_size: 100,
            learning_rate: 0.005,
            lambda_w: 0.01,
            lambda_b: 0.01,
            lambda_e: 0.0,
            use_gpu: false,
            seed: None,
        }
    }
}

impl VbprConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive(&self.name, "k", self.k)?;
        check_positive(&self.name, "k2", self.k2)?;
        check_positive(&self.name, "n_epochs", self.n_epochs)?;
        check_positive(&self.name, "batch_size", self.batch_size)?;
        check_rate(&self.name, "learning_rate", self.learning_rate)?;
        check_lambda(&self.name, "lambda_w", self.lambda_w)?;
        check_lambda(&self.name, "lambda_b", self.lambda_b)?;
        check_lambda(&self.name, "lambda_e", self.lambda_e)
    }
}

/// Popularity baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MostPopConfig {
    pub name: String,
}

impl Default for MostPopConfig {
    fn default() -> Self {
        Self {
            name: "MostPop".to_string(),
        }
    }
}

/// One configured model
///
/// ## Example
/// ```ignore
/// let config: ModelConfig = serde_json::from_str(r#"{"model": "bpr", "k": 10, "seed": 123}"#)?;
/// let model = config.build();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelConfig {
    Bpr(BprConfig),
    Vbpr(VbprConfig),
    MostPop(MostPopConfig),
}

impl ModelConfig {
    pub fn name(&self) -> &str {
        match self {
            ModelConfig::Bpr(config) => &config.name,
            ModelConfig::Vbpr(config) => &config.name,
            ModelConfig::MostPop(config) => &config.name,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ModelConfig::Bpr(config) => config.validate(),
            ModelConfig::Vbpr(config) => config.validate(),
            ModelConfig::MostPop(_) => Ok(()),
        }
    }

    /// Construct an unfitted model
    pub fn build(&self) -> Box<dyn Recommender> {
        match self {
            ModelConfig::Bpr(config) => Box::new(Bpr::new(config.clone())),
            ModelConfig::Vbpr(config) => Box::new(Vbpr::new(config.clone())),
            ModelConfig::MostPop(config) => Box::new(MostPop::with_name(config.name.clone())),
        }
    }
}

fn check_positive(model: &str, field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(invalid(model, field, value, "must be greater than 0"));
    }
    Ok(())
}

fn check_rate(model: &str, field: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(model, field, value, "must be a positive number"));
    }
    Ok(())
}

fn check_lambda(model: &str, field: &str, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(model, field, value, "must be a non-negative number"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FitError;

    #[test]
    fn test_deserialize_tagged_configs() {
        let json = r#"[
            {"model": "bpr", "k": 10, "max_iter": 200, "seed": 123},
            {"model": "vbpr", "k": 10, "k2": 20, "lambda_w": 1.0, "use_gpu": true},
            {"model": "most_pop"}
        ]"#;
        let configs: Vec<ModelConfig> = serde_json::from_str(json).unwrap();

        assert_eq!(configs.len(), 3);
        match &configs[0] {
            ModelConfig::Bpr(bpr) => {
                assert_eq!(bpr.max_iter, 200);
                assert_eq!(bpr.seed, Some(123));
                assert_eq!(bpr.learning_rate, 0.001);
            }
            other => panic!("expected bpr, got {:?}", other),
        }
        match &configs[1] {
            ModelConfig::Vbpr(vbpr) => {
                assert_eq!(vbpr.k2, 20);
                assert!(vbpr.use_gpu);
                assert_eq!(vbpr.batch_size, 100);
            }
            other => panic!("expected vbpr, got {:?}", other),
        }
        assert_eq!(configs[2].name(), "MostPop");
    }

    #[test]
    fn test_build_uses_configured_name() {
        let config = ModelConfig::Vbpr(VbprConfig {
            name: "VBPR-text".to_string(),
            ..VbprConfig::default()
        });
        let model = config.build();
        assert_eq!(model.name(), "VBPR-text");
        assert!(model.requirement().is_some());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ModelConfig::Bpr(BprConfig {
            k: 0,
            ..BprConfig::default()
        });
        assert!(matches!(
            config.validate(),
            Err(FitError::InvalidConfig { field, .. }) if field == "k"
        ));

        let config = VbprConfig {
            lambda_e: -1.0,
            ..VbprConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(VbprConfig::default().validate().is_ok());
    }
}
