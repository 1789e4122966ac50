//! Model capability traits.
//!
//! Models are driven by the experiment runner through `Recommender`. A model
//! that needs side information declares it with a `FeatureRequirement`; the
//! runner checks every requirement before any model is fitted.

use crate::error::{FitError, Result};
use data_loader::InteractionSet;
use modality::{AlignedFeatures, FeatureOrigin};
use tracing::warn;

/// Everything a model may read while fitting.
///
/// Indices in `train` are dense: users in `0..n_users`, items in `0..n_items`.
/// `item_features`, when present, has one row per item index.
#[derive(Debug, Clone, Copy)]
pub struct TrainContext<'a> {
    pub train: &'a InteractionSet,
    pub n_users: usize,
    pub n_items: usize,
    pub item_features: Option<&'a AlignedFeatures>,
}

impl<'a> TrainContext<'a> {
    pub fn new(train: &'a InteractionSet, n_users: usize, n_items: usize) -> Self {
        Self {
            train,
            n_users,
            n_items,
            item_features: None,
        }
    }

    pub fn with_item_features(mut self, features: &'a AlignedFeatures) -> Self {
        self.item_features = Some(features);
        self
    }
}

/// Shape of a supplied feature table, as far as requirements care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureShape {
    pub origin: FeatureOrigin,
    pub dim: usize,
    pub items: usize,
}

impl From<&AlignedFeatures> for FeatureShape {
    fn from(features: &AlignedFeatures) -> Self {
        Self {
            origin: features.origin(),
            dim: features.dim(),
            items: features.len(),
        }
    }
}

/// "Needs per-item features of kind `nominal`, dimension `dimension`".
///
/// The kind is informational: a table of any origin with the right shape
/// satisfies the requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureRequirement {
    pub nominal: FeatureOrigin,
    /// `None` accepts any non-zero dimension
    pub dimension: Option<usize>,
}

impl FeatureRequirement {
    pub fn new(nominal: FeatureOrigin) -> Self {
        Self {
            nominal,
            dimension: None,
        }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Check a supplied table against the requirement on behalf of `model`.
    pub fn check(&self, model: &str, supplied: Option<FeatureShape>) -> Result<()> {
        let shape = supplied.ok_or_else(|| FitError::MissingFeatures {
            model: model.to_string(),
        })?;

        if shape.items == 0 || shape.dim == 0 {
            return Err(FitError::MissingFeatures {
                model: model.to_string(),
            });
        }

        if let Some(expected) = self.dimension
            && expected != shape.dim
        {
            return Err(FitError::FeatureDimension {
                model: model.to_string(),
                expected,
                found: shape.dim,
            });
        }

        if shape.origin != self.nominal {
            warn!(
                "{} expects {} item features but receives {} features (dim {}); no distribution check is made",
                model, self.nominal, shape.origin, shape.dim
            );
        }
        Ok(())
    }
}

/// A trainable scoring model over dense user/item indices.
pub trait Recommender: Send + Sync {
    /// Name used in reports
    fn name(&self) -> &str;

    /// Side information the model needs, if any
    fn requirement(&self) -> Option<FeatureRequirement> {
        None
    }

    /// Check hyperparameters without fitting
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn fit(&mut self, ctx: &TrainContext<'_>) -> Result<()>;

    /// Preference score, `None` when the user or item was not seen in fit
    fn score(&self, user: usize, item: usize) -> Option<f32>;

    /// Score used for pairs `score` cannot handle
    fn default_score(&self) -> f32 {
        0.0
    }

    /// Scores for items `0..n_items`, falling back to `default_score`
    fn score_items(&self, user: usize, n_items: usize) -> Vec<f32> {
        let fallback = self.default_score();
        (0..n_items)
            .map(|item| self.score(user, item).unwrap_or(fallback))
            .collect()
    }
}
