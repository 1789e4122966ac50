//! Train/test(/validation) partitioning of feedback.
//!
//! `RatioSplit` shuffles record indices with a seeded generator and cuts the
//! permutation into partitions. Dense indices are assigned from the train
//! partition first, so users `0..n_train_users` and items `0..n_train_items`
//! are exactly the ones models are fitted on.

use crate::error::{Result, invalid};
use data_loader::{FeedbackRecord, IdMap, InteractionSet};
use modality::{AlignedFeatures, FeatureTable};
use models::{FeatureShape, TrainContext};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Fractions are tolerated this far above an integer count before rounding up
const SIZE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of records held out for testing, in `[0, 1)`
    pub test_size: f64,
    /// Fraction of records held out for validation, in `[0, 1)`
    pub val_size: f64,
    /// Drop evaluation records whose user or item is not in the train partition
    pub exclude_unknowns: bool,
    /// Evaluation ratings at or above this count as relevant
    pub rating_threshold: f32,
    pub seed: Option<u64>,
    /// Log partition statistics at `info` instead of `debug`
    pub verbose: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            val_size: 0.0,
            exclude_unknowns: true,
            rating_threshold: 1.0,
            seed: None,
            verbose: false,
        }
    }
}

/// Counts describing a split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SplitSummary {
    pub train_users: usize,
    pub train_items: usize,
    pub train_records: usize,
    pub test_records: usize,
    pub val_records: usize,
    /// Evaluation records dropped for referencing unknown users or items
    pub dropped_test: usize,
    pub dropped_val: usize,
    /// Users and items that only appear in evaluation partitions (kept when
    /// unknowns are not excluded)
    pub unknown_users: usize,
    pub unknown_items: usize,
}

/// Random split by ratio
///
/// ## Example
/// ```ignore
/// let split = RatioSplit::new(SplitConfig { test_size: 0.2, seed: Some(123), ..Default::default() })
///     .split(dataset.feedback(), Arc::new(features))?;
/// ```
#[derive(Debug, Clone)]
pub struct RatioSplit {
    config: SplitConfig,
}

impl RatioSplit {
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("test_size", self.config.test_size), ("val_size", self.config.val_size)] {
            if !(0.0..1.0).contains(&value) {
                return Err(invalid(field, value, "must be a fraction in [0, 1)"));
            }
        }
        if self.config.test_size + self.config.val_size >= 1.0 {
            return Err(invalid(
                "test_size + val_size",
                self.config.test_size + self.config.val_size,
                "must leave records for training",
            ));
        }
        if !self.config.rating_threshold.is_finite() {
            return Err(invalid(
                "rating_threshold",
                self.config.rating_threshold,
                "must be finite",
            ));
        }
        Ok(())
    }

    /// Partition sizes `(train, test, val)` for `n` records
    pub fn sizes(&self, n: usize) -> Result<(usize, usize, usize)> {
        self.validate()?;
        let count = |fraction: f64| ((fraction * n as f64) - SIZE_EPSILON).ceil().max(0.0) as usize;
        let test = count(self.config.test_size);
        let val = count(self.config.val_size);

        match n.checked_sub(test + val) {
            Some(train) if train > 0 => Ok((train, test, val)),
            _ => Err(invalid(
                "test_size",
                self.config.test_size,
                &format!("leaves no training records out of {}", n),
            )),
        }
    }

    #[instrument(skip(self, feedback, features), fields(records = feedback.len()))]
    pub fn split(&self, feedback: &[FeedbackRecord], features: Arc<FeatureTable>) -> Result<SplitResult> {
        let n = feedback.len();
        let (n_train, n_test, _) = self.sizes(n)?;

        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut rng);

        // Partitions keep the original record order
        let partition = |range: &[usize]| {
            let mut indices = range.to_vec();
            indices.sort_unstable();
            indices.into_iter().map(|i| &feedback[i]).collect::<Vec<_>>()
        };
        let train_records = partition(&order[..n_train]);
        let val_records = partition(&order[n_train..n - n_test]);
        let test_records = partition(&order[n - n_test..]);

        let mut users = IdMap::new();
        let mut items = IdMap::new();
        for record in &train_records {
            users.get_or_insert(&record.user_id);
            items.get_or_insert(&record.item_id);
        }
        let (n_train_users, n_train_items) = (users.len(), items.len());
        let (train, _) = InteractionSet::from_records(train_records.iter().copied(), &users, &items);

        let (test, dropped_test) = self.evaluation_set(&test_records, &mut users, &mut items);
        let val = if val_records.is_empty() {
            None
        } else {
            Some(self.evaluation_set(&val_records, &mut users, &mut items))
        };
        let dropped_val = val.as_ref().map_or(0, |(_, dropped)| *dropped);
        let val = val.map(|(set, _)| set);

        let summary = SplitSummary {
            train_users: n_train_users,
            train_items: n_train_items,
            train_records: train.len(),
            test_records: test.len(),
            val_records: val.as_ref().map_or(0, |set| set.len()),
            dropped_test,
            dropped_val,
            unknown_users: users.len() - n_train_users,
            unknown_items: items.len() - n_train_items,
        };
        log_summary(&summary, self.config.verbose);

        Ok(SplitResult {
            users,
            items,
            n_train_users,
            n_train_items,
            train,
            test,
            val,
            features,
            rating_threshold: self.config.rating_threshold,
            summary,
        })
    }

    /// Index an evaluation partition, excluding or registering unknown ids
    fn evaluation_set(
        &self,
        records: &[&FeedbackRecord],
        users: &mut IdMap,
        items: &mut IdMap,
    ) -> (InteractionSet, usize) {
        if !self.config.exclude_unknowns {
            for record in records {
                users.get_or_insert(&record.user_id);
                items.get_or_insert(&record.item_id);
            }
        }
        InteractionSet::from_records(records.iter().copied(), users, items)
    }
}

fn log_summary(summary: &SplitSummary, verbose: bool) {
    let line = format!(
        "train: {} users, {} items, {} records | test: {} records ({} dropped) | validation: {} records ({} dropped) | unknown users {}, unknown items {}",
        summary.train_users,
        summary.train_items,
        summary.train_records,
        summary.test_records,
        summary.dropped_test,
        summary.val_records,
        summary.dropped_val,
        summary.unknown_users,
        summary.unknown_items
    );
    if verbose {
        info!("{}", line);
    } else {
        debug!("{}", line);
    }
}

/// Partitions in dense index space plus the shared item feature table.
#[derive(Debug, Clone)]
pub struct SplitResult {
    users: IdMap,
    items: IdMap,
    n_train_users: usize,
    n_train_items: usize,
    train: InteractionSet,
    test: InteractionSet,
    val: Option<InteractionSet>,
    features: Arc<FeatureTable>,
    rating_threshold: f32,
    summary: SplitSummary,
}

impl SplitResult {
    pub fn train(&self) -> &InteractionSet {
        &self.train
    }

    pub fn test(&self) -> &InteractionSet {
        &self.test
    }

    pub fn val(&self) -> Option<&InteractionSet> {
        self.val.as_ref()
    }

    /// All known users: train users first, then evaluation-only users
    pub fn users(&self) -> &IdMap {
        &self.users
    }

    pub fn items(&self) -> &IdMap {
        &self.items
    }

    pub fn n_train_users(&self) -> usize {
        self.n_train_users
    }

    pub fn n_train_items(&self) -> usize {
        self.n_train_items
    }

    pub fn rating_threshold(&self) -> f32 {
        self.rating_threshold
    }

    pub fn summary(&self) -> &SplitSummary {
        &self.summary
    }

    pub fn features(&self) -> &Arc<FeatureTable> {
        &self.features
    }

    pub fn feature_shape(&self) -> FeatureShape {
        FeatureShape {
            origin: self.features.origin(),
            dim: self.features.dim(),
            items: self.features.len(),
        }
    }

    /// Feature rows in train item order; items without a row get zeros
    pub fn aligned_item_features(&self) -> AlignedFeatures {
        let ids = &self.items.ids()[..self.n_train_items];
        let (aligned, missing) = self.features.align(ids);
        if missing > 0 {
            warn!("{} of {} train items have no feature row", missing, ids.len());
        }
        aligned
    }

    pub fn train_context<'a>(&'a self, features: Option<&'a AlignedFeatures>) -> TrainContext<'a> {
        let ctx = TrainContext::new(&self.train, self.n_train_users, self.n_train_items);
        match features {
            Some(features) => ctx.with_item_features(features),
            None => ctx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modality::FeatureOrigin;

    fn create_test_feedback(n_users: usize, n_items: usize) -> Vec<FeedbackRecord> {
        (0..n_users)
            .flat_map(|u| {
                (0..n_items).map(move |i| {
                    FeedbackRecord::new(format!("u{}", u), format!("i{}", i), ((u + i) % 5 + 1) as f32)
                })
            })
            .collect()
    }

    fn empty_features() -> Arc<FeatureTable> {
        Arc::new(FeatureTable::from_rows(Vec::new(), Vec::new(), FeatureOrigin::Visual).unwrap())
    }

    fn splitter(test_size: f64, seed: u64, exclude_unknowns: bool) -> RatioSplit {
        RatioSplit::new(SplitConfig {
            test_size,
            seed: Some(seed),
            exclude_unknowns,
            ..SplitConfig::default()
        })
    }

    #[test]
    fn test_sizes_round_up_with_tolerance() {
        assert_eq!(splitter(0.2, 1, true).sizes(100).unwrap(), (80, 20, 0));
        assert_eq!(splitter(0.2, 1, true).sizes(11).unwrap(), (8, 3, 0));

        let with_val = RatioSplit::new(SplitConfig {
            test_size: 0.2,
            val_size: 0.1,
            ..SplitConfig::default()
        });
        assert_eq!(with_val.sizes(100).unwrap(), (70, 20, 10));
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(splitter(1.0, 1, true).sizes(10).is_err());
        assert!(splitter(-0.1, 1, true).sizes(10).is_err());
        assert!(splitter(0.9, 1, true).sizes(1).is_err());
    }

    #[test]
    fn test_split_is_deterministic() {
        let feedback = create_test_feedback(10, 10);
        let first = splitter(0.2, 1, true).split(&feedback, empty_features()).unwrap();
        let second = splitter(0.2, 1, true).split(&feedback, empty_features()).unwrap();

        assert_eq!(first.train().interactions(), second.train().interactions());
        assert_eq!(first.test().interactions(), second.test().interactions());
        assert_eq!(first.users().ids(), second.users().ids());

        let other = splitter(0.2, 2, true).split(&feedback, empty_features()).unwrap();
        assert_ne!(first.test().interactions(), other.test().interactions());
    }

    #[test]
    fn test_exclude_unknowns_postcondition() {
        // u9 and i9 each appear in a single record, often only in test
        let mut feedback = create_test_feedback(6, 6);
        feedback.push(FeedbackRecord::new("u9", "i0", 5.0));
        feedback.push(FeedbackRecord::new("u0", "i9", 5.0));

        for seed in 0..20 {
            let split = splitter(0.3, seed, true).split(&feedback, empty_features()).unwrap();
            for interaction in split.test().interactions() {
                assert!(interaction.user < split.n_train_users());
                assert!(interaction.item < split.n_train_items());
            }
            let summary = split.summary();
            assert_eq!(summary.test_records + summary.dropped_test, 12);
            assert_eq!(summary.unknown_users + summary.unknown_items, 0);
        }
    }

    #[test]
    fn test_unknowns_kept_beyond_train_range() {
        let mut feedback = create_test_feedback(4, 4);
        feedback.push(FeedbackRecord::new("cold", "i0", 5.0));

        let found = (0..50).any(|seed| {
            let split = splitter(0.25, seed, false).split(&feedback, empty_features()).unwrap();
            assert_eq!(split.summary().dropped_test, 0);
            split.users().get("cold").is_some_and(|idx| idx >= split.n_train_users())
        });
        assert!(found);
    }

    #[test]
    fn test_aligned_item_features_follow_train_order() {
        let feedback = create_test_feedback(3, 3);
        let table = FeatureTable::from_rows(
            vec!["i0".to_string(), "i1".to_string(), "i2".to_string()],
            vec![vec![0.0], vec![1.0], vec![2.0]],
            FeatureOrigin::Text,
        )
        .unwrap();
        let split = splitter(0.2, 5, true).split(&feedback, Arc::new(table)).unwrap();

        let aligned = split.aligned_item_features();
        assert_eq!(aligned.len(), split.n_train_items());
        for (idx, id) in split.items().ids()[..split.n_train_items()].iter().enumerate() {
            let expected: f32 = id[1..].parse().unwrap();
            assert_eq!(aligned.row(idx), Some(&[expected][..]));
        }
    }
}
