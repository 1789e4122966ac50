//! # Models Crate
//!
//! Recommendation models trained on dense interaction indices.
//!
//! ## Components
//!
//! - `Recommender`: the fit/score capability the experiment runner drives
//! - `FeatureRequirement`: "needs per-item features of dimension D"; models
//!   never depend on a concrete modality type
//! - `Bpr`: matrix factorization with the BPR pairwise criterion
//! - `Vbpr`: BPR plus a content term over per-item feature vectors
//! - `MostPop`: popularity baseline
//! - `ModelConfig`: serializable hyperparameters, built explicitly into models
//!
//! ## Example Usage
//!
//! ```ignore
//! use models::{ModelConfig, TrainContext, VbprConfig};
//!
//! let mut model = ModelConfig::Vbpr(VbprConfig { seed: Some(123), ..Default::default() }).build();
//! let ctx = TrainContext::new(&train, n_users, n_items).with_item_features(&features);
//! model.fit(&ctx)?;
//! let scores = model.score_items(user, n_items);
//! ```

pub mod bpr;
pub mod config;
pub mod error;
pub mod most_pop;
mod sampling;
pub mod traits;
pub mod vbpr;

pub use bpr::Bpr;
pub use config::{BprConfig, ModelConfig, MostPopConfig, VbprConfig};
pub use error::{FitError, Result};
pub use most_pop::MostPop;
pub use traits::{FeatureRequirement, FeatureShape, Recommender, TrainContext};
pub use vbpr::Vbpr;

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Interaction, InteractionSet};

    #[test]
    fn test_models_as_trait_objects() {
        let mut train = InteractionSet::new();
        for user in 0..4 {
            for item in 0..2 {
                train.insert(Interaction {
                    user,
                    item: (user + item) % 5,
                    rating: 1.0,
                });
            }
        }

        let configs = vec![
            ModelConfig::Bpr(BprConfig {
                max_iter: 5,
                seed: Some(1),
                ..BprConfig::default()
            }),
            ModelConfig::MostPop(MostPopConfig::default()),
        ];

        let ctx = TrainContext::new(&train, 4, 5);
        for config in &configs {
            let mut model = config.build();
            model.fit(&ctx).unwrap();
            assert_eq!(model.score_items(0, 5).len(), 5);
            assert!(model.score(0, 4).is_some());
        }
    }
}
