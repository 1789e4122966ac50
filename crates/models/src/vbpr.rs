//! Visual Bayesian Personalized Ranking.
//!
//! VBPR extends BPR with a content term computed from a per-item feature
//! vector `f_i`:
//!
//! ```text
//! score(u, i) = β_i + γ_u · γ_i + θ_u · (Eᵀ f_i) + β' · f_i
//! ```
//!
//! `E` (`dim × k2`) projects features into a `k2`-dimensional space and `β'`
//! is a linear feature bias. The model only needs a feature table with one
//! row per item; bag-of-words counts work as well as CNN embeddings.
//!
//! Feature rows are stored sparsely since text count vectors are mostly
//! zeros.

use crate::config::VbprConfig;
use crate::error::{FitError, Result};
use crate::sampling::{TripletSampler, all_finite, dot, init_factors, seeded_rng, sigmoid_neg};
use crate::traits::{FeatureRequirement, FeatureShape, Recommender, TrainContext};
use modality::{AlignedFeatures, FeatureOrigin};
use tracing::{debug, info, instrument};

type SparseRow = Vec<(usize, f32)>;

#[derive(Debug, Clone)]
pub struct Vbpr {
    config: VbprConfig,
    n_users: usize,
    n_items: usize,
    n_features: usize,
    gamma_user: Vec<f32>,
    gamma_item: Vec<f32>,
    theta_user: Vec<f32>,
    /// `n_features × k2`, row-major
    embedding: Vec<f32>,
    beta_item: Vec<f32>,
    beta_prime: Vec<f32>,
    /// `Eᵀ f_i` per item (`n_items × k2`), filled after training
    item_projection: Vec<f32>,
    /// `β' · f_i` per item
    item_feature_bias: Vec<f32>,
}

/// Per-sample buffers reused across updates
#[derive(Default)]
struct Scratch {
    diff: SparseRow,
    projection: Vec<f32>,
    theta: Vec<f32>,
}

impl Vbpr {
    pub fn new(config: VbprConfig) -> Self {
        Self {
            config,
            n_users: 0,
            n_items: 0,
            n_features: 0,
            gamma_user: Vec::new(),
            gamma_item: Vec::new(),
            theta_user: Vec::new(),
            embedding: Vec::new(),
            beta_item: Vec::new(),
            beta_prime: Vec::new(),
            item_projection: Vec::new(),
            item_feature_bias: Vec::new(),
        }
    }

    pub fn config(&self) -> &VbprConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        !self.beta_item.is_empty()
    }

    /// Dimension of the feature table the model was trained on
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    fn check_features<'a>(&self, ctx: &TrainContext<'a>) -> Result<&'a AlignedFeatures> {
        let features = ctx.item_features.ok_or_else(|| FitError::MissingFeatures {
            model: self.config.name.clone(),
        })?;
        self.requirement_for_fit()
            .check(&self.config.name, Some(FeatureShape::from(features)))?;

        if features.len() < ctx.n_items {
            return Err(FitError::FeatureRows {
                model: self.config.name.clone(),
                expected: ctx.n_items,
                found: features.len(),
            });
        }
        Ok(features)
    }

    fn requirement_for_fit(&self) -> FeatureRequirement {
        FeatureRequirement::new(FeatureOrigin::Visual)
    }

    /// One SGD step; returns the pre-update score difference.
    fn update(
        &mut self,
        rows: &[SparseRow],
        (user, positive, negative): (usize, usize, usize),
        scratch: &mut Scratch,
    ) -> f32 {
        let VbprConfig {
            k,
            k2,
            learning_rate: lr,
            lambda_w,
            lambda_b,
            lambda_e,
            ..
        } = self.config;
        let (u, i, j) = (user * k, positive * k, negative * k);
        let t = user * k2;

        sparse_diff(&rows[positive], &rows[negative], &mut scratch.diff);

        scratch.projection.clear();
        scratch.projection.resize(k2, 0.0);
        let mut feature_bias = 0.0;
        for &(feature, value) in &scratch.diff {
            let e = &self.embedding[feature * k2..(feature + 1) * k2];
            for (p, e) in scratch.projection.iter_mut().zip(e) {
                *p += value * e;
            }
            feature_bias += value * self.beta_prime[feature];
        }

        let mut x = self.beta_item[positive] - self.beta_item[negative] + feature_bias;
        for f in 0..k {
            x += self.gamma_user[u + f] * (self.gamma_item[i + f] - self.gamma_item[j + f]);
        }
        x += dot(&self.theta_user[t..t + k2], &scratch.projection);
        let z = sigmoid_neg(x);

        for f in 0..k {
            let g_u = self.gamma_user[u + f];
            let g_i = self.gamma_item[i + f];
            let g_j = self.gamma_item[j + f];
            self.gamma_user[u + f] += lr * (z * (g_i - g_j) - lambda_w * g_u);
            self.gamma_item[i + f] += lr * (z * g_u - lambda_w * g_i);
            self.gamma_item[j + f] += lr * (-z * g_u - lambda_w * g_j);
        }

        scratch.theta.clear();
        scratch.theta.extend_from_slice(&self.theta_user[t..t + k2]);
        for (c, theta) in self.theta_user[t..t + k2].iter_mut().enumerate() {
            *theta += lr * (z * scratch.projection[c] - lambda_w * *theta);
        }

        self.beta_item[positive] += lr * (z - lambda_b * self.beta_item[positive]);
        self.beta_item[negative] += lr * (-z - lambda_b * self.beta_item[negative]);

        for &(feature, value) in &scratch.diff {
            let e = &mut self.embedding[feature * k2..(feature + 1) * k2];
            for (e, theta) in e.iter_mut().zip(&scratch.theta) {
                *e += lr * (z * value * theta - lambda_e * *e);
            }
            let b = &mut self.beta_prime[feature];
            *b += lr * (z * value - lambda_e * *b);
        }

        x
    }

    fn parameters_finite(&self) -> bool {
        all_finite(&self.gamma_user)
            && all_finite(&self.gamma_item)
            && all_finite(&self.theta_user)
            && all_finite(&self.embedding)
            && all_finite(&self.beta_item)
            && all_finite(&self.beta_prime)
    }

    /// Cache `Eᵀ f_i` and `β' · f_i` for scoring
    fn project_items(&mut self, rows: &[SparseRow]) {
        let k2 = self.config.k2;
        self.item_projection = vec![0.0; self.n_items * k2];
        self.item_feature_bias = vec![0.0; self.n_items];

        for (item, row) in rows.iter().enumerate().take(self.n_items) {
            let projection = &mut self.item_projection[item * k2..(item + 1) * k2];
            for &(feature, value) in row {
                let e = &self.embedding[feature * k2..(feature + 1) * k2];
                for (p, e) in projection.iter_mut().zip(e) {
                    *p += value * e;
                }
                self.item_feature_bias[item] += value * self.beta_prime[feature];
            }
        }
    }
}

impl Default for Vbpr {
    fn default() -> Self {
        Self::new(VbprConfig::default())
    }
}

impl Recommender for Vbpr {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn requirement(&self) -> Option<FeatureRequirement> {
        Some(self.requirement_for_fit())
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
        let features = self.check_features(ctx)?;

        if self.config.use_gpu {
            info!("{}: use_gpu is set; training runs on the CPU", self.config.name);
        }

        let VbprConfig {
            k,
            k2,
            n_epochs,
            batch_size,
            ..
        } = self.config;
        let rows: Vec<SparseRow> = features.rows().iter().map(|row| to_sparse(row)).collect();

        let mut rng = seeded_rng(self.config.seed);
        self.n_users = ctx.n_users;
        self.n_items = ctx.n_items;
        self.n_features = features.dim();
        self.gamma_user = init_factors(&mut rng, ctx.n_users * k, k);
        self.gamma_item = init_factors(&mut rng, ctx.n_items * k, k);
        self.theta_user = init_factors(&mut rng, ctx.n_users * k2, k2);
        self.embedding = init_factors(&mut rng, self.n_features * k2, k2);
        self.beta_item = vec![0.0; ctx.n_items];
        self.beta_prime = vec![0.0; self.n_features];

        let sampler = TripletSampler::new(ctx.train, ctx.n_items);
        let n_batches = ctx.train.len().div_ceil(batch_size);
        let mut scratch = Scratch::default();

        for epoch in 1..=n_epochs {
            let mut correct = 0usize;
            let mut drawn = 0usize;

            for _ in 0..n_batches {
                let mut batch_finite = true;
                for _ in 0..batch_size {
                    let Some(triple) = sampler.sample(&mut rng) else {
                        continue;
                    };
                    let x = self.update(&rows, triple, &mut scratch);
                    batch_finite &= x.is_finite();
                    drawn += 1;
                    if x > 0.0 {
                        correct += 1;
                    }
                }
                if !batch_finite {
                    return Err(FitError::Diverged {
                        model: self.config.name.clone(),
                        epoch,
                    });
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
                drawn,
                "correct ranking {:.2}%",
                100.0 * correct as f64 / drawn.max(1) as f64
            );
        }

        self.project_items(&rows);
        info!(
            "{} fitted: {} users, {} items, {} features, k = {}, k2 = {}",
            self.config.name, self.n_users, self.n_items, self.n_features, k, k2
        );
        Ok(())
    }

    fn score(&self, user: usize, item: usize) -> Option<f32> {
        if user >= self.n_users || item >= self.n_items {
            return None;
        }
        let (k, k2) = (self.config.k, self.config.k2);
        let latent = dot(
            &self.gamma_user[user * k..(user + 1) * k],
            &self.gamma_item[item * k..(item + 1) * k],
        );
        let content = dot(
            &self.theta_user[user * k2..(user + 1) * k2],
            &self.item_projection[item * k2..(item + 1) * k2],
        );
        Some(self.beta_item[item] + latent + content + self.item_feature_bias[item])
    }
}

fn to_sparse(row: &[f32]) -> SparseRow {
    row.iter()
        .enumerate()
        .filter(|(_, v)| **v != 0.0)
        .map(|(index, &v)| (index, v))
        .collect()
}

/// `a - b` for sparse rows sorted by index
fn sparse_diff(a: &[(usize, f32)], b: &[(usize, f32)], out: &mut SparseRow) {
    out.clear();
    let (mut x, mut y) = (0, 0);
    while x < a.len() || y < b.len() {
        match (a.get(x), b.get(y)) {
            (Some(&(ia, va)), Some(&(ib, vb))) if ia == ib => {
                if va != vb {
                    out.push((ia, va - vb));
                }
                x += 1;
                y += 1;
            }
            (Some(&(ia, va)), Some(&(ib, _))) if ia < ib => {
                out.push((ia, va));
                x += 1;
            }
            (Some(&(ia, va)), None) => {
                out.push((ia, va));
                x += 1;
            }
            (_, Some(&(ib, vb))) => {
                out.push((ib, -vb));
                y += 1;
            }
            (None, None) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Interaction, InteractionSet, ItemId};
    use modality::FeatureTable;

    /// Users 0..8 like items 0..3, users 8..16 like items 3..6; each has seen two.
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

    /// Item features separating the two groups: token 0 for 0..3, token 1 for 3..6
    fn create_test_features(origin: FeatureOrigin) -> AlignedFeatures {
        let ids: Vec<ItemId> = (0..6).map(|i| format!("i{}", i)).collect();
        let rows = (0..6)
            .map(|i| if i < 3 { vec![1.0, 0.0, 1.0] } else { vec![0.0, 1.0, 1.0] })
            .collect();
        let table = FeatureTable::from_rows(ids.clone(), rows, origin).unwrap();
        table.align(&ids).0
    }

    fn config() -> VbprConfig {
        VbprConfig {
            k: 4,
            k2: 4,
            n_epochs: 200,
            batch_size: 8,
            learning_rate: 0.05,
            lambda_w: 0.001,
            lambda_b: 0.001,
            lambda_e: 0.0,
            seed: Some(7),
            ..VbprConfig::default()
        }
    }

    #[test]
    fn test_vbpr_accepts_text_features() {
        let train = create_test_interactions();
        let features = create_test_features(FeatureOrigin::Text);
        let ctx = TrainContext::new(&train, 16, 6).with_item_features(&features);

        let mut model = Vbpr::new(config());
        model.fit(&ctx).unwrap();

        assert!(model.is_fitted());
        assert_eq!(model.n_features(), 3);
        let in_group = model.score(0, 0).unwrap();
        let out_group: f32 = (3..6).map(|i| model.score(0, i).unwrap()).sum::<f32>() / 3.0;
        assert!(in_group > out_group, "{} <= {}", in_group, out_group);
    }

    #[test]
    fn test_vbpr_validate_without_fit() {
        let model = Vbpr::new(VbprConfig {
            batch_size: 0,
            ..VbprConfig::default()
        });
        assert!(matches!(
            model.validate(),
            Err(FitError::InvalidConfig { ref field, .. }) if field == "batch_size"
        ));
        assert!(!model.is_fitted());
        assert!(Vbpr::new(VbprConfig::default()).validate().is_ok());
    }

    #[test]
    fn test_vbpr_requires_features() {
        let train = create_test_interactions();
        let mut model = Vbpr::new(config());

        assert_eq!(
            model.requirement(),
            Some(FeatureRequirement::new(FeatureOrigin::Visual))
        );
        assert_eq!(
            model.fit(&TrainContext::new(&train, 16, 6)),
            Err(FitError::MissingFeatures {
                model: "VBPR".to_string()
            })
        );
    }

    #[test]
    fn test_vbpr_feature_rows_must_cover_items() {
        let train = create_test_interactions();
        let features = create_test_features(FeatureOrigin::Visual);
        let ctx = TrainContext::new(&train, 16, 8).with_item_features(&features);

        assert!(matches!(
            Vbpr::new(config()).fit(&ctx),
            Err(FitError::FeatureRows {
                expected: 8,
                found: 6,
                ..
            })
        ));
    }

    #[test]
    fn test_vbpr_deterministic_with_seed() {
        let train = create_test_interactions();
        let features = create_test_features(FeatureOrigin::Visual);
        let ctx = TrainContext::new(&train, 16, 6).with_item_features(&features);

        let mut first = Vbpr::new(config());
        let mut second = Vbpr::new(config());
        first.fit(&ctx).unwrap();
        second.fit(&ctx).unwrap();

        assert_eq!(first.score_items(9, 6), second.score_items(9, 6));
    }

    #[test]
    fn test_vbpr_divergence_is_reported() {
        let train = create_test_interactions();
        let features = create_test_features(FeatureOrigin::Visual);
        let ctx = TrainContext::new(&train, 16, 6).with_item_features(&features);

        let mut model = Vbpr::new(VbprConfig {
            learning_rate: 1e30,
            lambda_w: 0.5,
            n_epochs: 50,
            ..config()
        });
        assert!(matches!(model.fit(&ctx), Err(FitError::Diverged { .. })));
    }

    #[test]
    fn test_sparse_diff() {
        let mut out = Vec::new();
        sparse_diff(&[(0, 1.0), (2, 3.0)], &[(1, 2.0), (2, 3.0), (4, 1.0)], &mut out);
        assert_eq!(out, vec![(0, 1.0), (1, -2.0), (4, -1.0)]);
    }
}
