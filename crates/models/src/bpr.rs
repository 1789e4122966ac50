//! Bayesian Personalized Ranking with item biases.
//!
//! `score(u, i) = b_i + w_u · h_i`, trained by stochastic gradient ascent on
//! `ln σ(score(u, i) - score(u, j))` over sampled triples where `i` was seen
//! by `u` and `j` was not.

use crate::config::BprConfig;
use crate::error::{FitError, Result};
use crate::sampling::{TripletSampler, all_finite, dot, init_factors, seeded_rng, sigmoid_neg};
use crate::traits::{Recommender, TrainContext};
use tracing::{debug, info, instrument};

/// Matrix factorization model trained with the BPR criterion
#[derive(Debug, Clone)]
pub struct Bpr {
    config: BprConfig,
    n_users: usize,
    n_items: usize,
    /// `n_users × k`, row-major
    user_factors: Vec<f32>,
    /// `n_items × k`, row-major
    item_factors: Vec<f32>,
    item_bias: Vec<f32>,
}

impl Bpr {
    pub fn new(config: BprConfig) -> Self {
        Self {
            config,
            n_users: 0,
            n_items: 0,
            user_factors: Vec::new(),
            item_factors: Vec::new(),
            item_bias: Vec::new(),
        }
    }

    pub fn config(&self) -> &BprConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        !self.item_bias.is_empty()
    }

    pub fn user_factors(&self, user: usize) -> Option<&[f32]> {
        let k = self.config.k;
        (user < self.n_users).then(|| &self.user_factors[user * k..(user + 1) * k])
    }

    pub fn item_factors(&self, item: usize) -> Option<&[f32]> {
        let k = self.config.k;
        (item < self.n_items).then(|| &self.item_factors[item * k..(item + 1) * k])
    }

    /// One SGD step on the triple; returns the pre-update score difference.
    fn update(&mut self, user: usize, positive: usize, negative: usize) -> f32 {
        let k = self.config.k;
        let lr = self.config.learning_rate;
        let reg = self.config.lambda_reg;
        let (u, i, j) = (user * k, positive * k, negative * k);

        let mut x = self.item_bias[positive] - self.item_bias[negative];
        for f in 0..k {
            x += self.user_factors[u + f] * (self.item_factors[i + f] - self.item_factors[j + f]);
        }
        let z = sigmoid_neg(x);

        for f in 0..k {
            let w_u = self.user_factors[u + f];
            let h_i = self.item_factors[i + f];
            let h_j = self.item_factors[j + f];
            self.user_factors[u + f] += lr * (z * (h_i - h_j) - reg * w_u);
            self.item_factors[i + f] += lr * (z * w_u - reg * h_i);
            self.item_factors[j + f] += lr * (-z * w_u - reg * h_j);
        }
        self.item_bias[positive] += lr * (z - reg * self.item_bias[positive]);
        self.item_bias[negative] += lr * (-z - reg * self.item_bias[negative]);

        x
    }

    fn parameters_finite(&self) -> bool {
        all_finite(&self.user_factors) && all_finite(&self.item_factors) && all_finite(&self.item_bias)
    }
}

impl Default for Bpr {
    fn default() -> Self {
        Self::new(BprConfig::default())
    }
}

impl Recommender for Bpr {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn validate(&self) -> Result<()> {
        self.config.validate()
    }

    #[instrument(skip(self, ctx), fields(model = %self.config.name))]
    fn fit(&mut self, ctx: &TrainContext<'_>) -> Result<()> {
        self.validate()?;
        if ctx.train.is_empty() {
            return Err(FitError::EmptyTrainSet {
                model: self.config.name.clone(),
            });
        }

        let k = self.config.k;
        let mut rng = seeded_rng(self.config.seed);
        self.n_users = ctx.n_users;
        self.n_items = ctx.n_items;
        self.user_factors = init_factors(&mut rng, ctx.n_users * k, k);
        self.item_factors = init_factors(&mut rng, ctx.n_items * k, k);
        self.item_bias = vec![0.0; ctx.n_items];

        let sampler = TripletSampler::new(ctx.train, ctx.n_items);
        let samples_per_epoch = ctx.train.len();

        for epoch in 1..=self.config.max_iter {
            let mut correct = 0usize;
            let mut skipped = 0usize;

            for _ in 0..samples_per_epoch {
                let Some((user, positive, negative)) = sampler.sample(&mut rng) else {
                    skipped += 1;
                    continue;
                };
                let x = self.update(user, positive, negative);
                if !x.is_finite() {
                    return Err(FitError::Diverged {
                        model: self.config.name.clone(),
                        epoch,
                    });
                }
                if x > 0.0 {
                    correct += 1;
                }
            }

            if !self.parameters_finite() {
                return Err(FitError::Diverged {
                    model: self.config.name.clone(),
                    epoch,
                });
            }

            debug!(
                epoch,
                skipped,
                "correct ranking {:.2}%",
                100.0 * correct as f64 / samples_per_epoch as f64
            );
        }

        info!(
            "{} fitted: {} users, {} items, k = {}, {} epochs",
            self.config.name, self.n_users, self.n_items, k, self.config.max_iter
        );
        Ok(())
    }

    fn score(&self, user: usize, item: usize) -> Option<f32> {
        let user_factors = self.user_factors(user)?;
        let item_factors = self.item_factors(item)?;
        Some(self.item_bias[item] + dot(user_factors, item_factors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Interaction, InteractionSet};

    /// Two taste groups: users 0..8 like items 0..3, users 8..16 like items 3..6.
    /// Every user has seen two of their group's three items.
    fn create_test_interactions() -> InteractionSet {
        let mut set = InteractionSet::new();
        for user in 0..16 {
            let base = if user < 8 { 0 } else { 3 };
            let skip = user % 3;
            for offset in (0..3).filter(|&o| o != skip) {
                set.insert(Interaction {
                    user,
                    item: base + offset,
                    rating: 1.0,
                });
            }
        }
        set
    }

    fn config() -> BprConfig {
        BprConfig {
            k: 8,
            max_iter: 300,
            learning_rate: 0.05,
            lambda_reg: 0.001,
            seed: Some(42),
            ..BprConfig::default()
        }
    }

    #[test]
    fn test_bpr_learns_group_preferences() {
        let train = create_test_interactions();
        let mut model = Bpr::new(config());
        model.fit(&TrainContext::new(&train, 16, 6)).unwrap();

        // user 0 has not seen item 0; it belongs to the user's group
        let in_group = model.score(0, 0).unwrap();
        let out_group: f32 = (3..6).map(|i| model.score(0, i).unwrap()).sum::<f32>() / 3.0;
        assert!(in_group > out_group, "{} <= {}", in_group, out_group);
    }

    #[test]
    fn test_bpr_deterministic_with_seed() {
        let train = create_test_interactions();
        let ctx = TrainContext::new(&train, 16, 6);

        let mut first = Bpr::new(config());
        let mut second = Bpr::new(config());
        first.fit(&ctx).unwrap();
        second.fit(&ctx).unwrap();

        assert_eq!(first.score_items(3, 6), second.score_items(3, 6));
    }

    #[test]
    fn test_bpr_unknown_indices() {
        let train = create_test_interactions();
        let mut model = Bpr::new(config());
        assert!(model.score(0, 0).is_none());

        model.fit(&TrainContext::new(&train, 16, 6)).unwrap();
        assert!(model.is_fitted());
        assert!(model.score(16, 0).is_none());
        assert!(model.score(0, 6).is_none());
        assert_eq!(model.score_items(99, 2), vec![0.0, 0.0]);
    }

    #[test]
    fn test_bpr_divergence_is_reported() {
        let train = create_test_interactions();
        let mut model = Bpr::new(BprConfig {
            learning_rate: 1e30,
            lambda_reg: 0.5,
            max_iter: 50,
            ..config()
        });
        let err = model.fit(&TrainContext::new(&train, 16, 6)).unwrap_err();
        assert!(matches!(err, FitError::Diverged { .. }));
    }

    #[test]
    fn test_bpr_empty_train_set() {
        let train = InteractionSet::new();
        let mut model = Bpr::default();
        assert_eq!(
            model.fit(&TrainContext::new(&train, 0, 0)),
            Err(FitError::EmptyTrainSet {
                model: "BPR".to_string()
            })
        );
    }
}
