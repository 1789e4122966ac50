//! Per-user rankings of a fitted model over an evaluation partition.
//!
//! Only users and items known to training take part in ranking: a user's
//! candidates are all train items except the ones the user interacted with in
//! training, and the relevant items are the user's evaluation items rated at
//! or above the split's threshold.

use data_loader::InteractionSet;
use models::Recommender;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// One user's candidates, best first, with the relevant subset
#[derive(Debug, Clone, PartialEq)]
pub struct UserRanking {
    pub user: usize,
    /// `(item, score)` sorted by descending score, ties by item index.
    /// NaN scores are stored as negative infinity and `-0.0` as `0.0`.
    pub ranked: Vec<(usize, f32)>,
    pub relevant: HashSet<usize>,
}

impl UserRanking {
    /// Sort candidates into ranking order
    pub fn new(user: usize, mut ranked: Vec<(usize, f32)>, relevant: HashSet<usize>) -> Self {
        for (_, score) in ranked.iter_mut() {
            if score.is_nan() {
                *score = f32::NEG_INFINITY;
            } else if *score == 0.0 {
                // -0.0 and 0.0 tie
                *score = 0.0;
            }
        }
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self {
            user,
            ranked,
            relevant,
        }
    }

    /// Number of relevant items among the first `k`
    pub fn hits_at(&self, k: usize) -> usize {
        self.ranked
            .iter()
            .take(k)
            .filter(|(item, _)| self.relevant.contains(item))
            .count()
    }
}

/// Everything metrics need from one partition
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Records retained in the partition
    pub rows: usize,
    pub users: Vec<UserRanking>,
}

impl Evaluation {
    /// Score every eligible user of `partition` with `model`.
    pub fn compute(
        model: &dyn Recommender,
        train: &InteractionSet,
        partition: &InteractionSet,
        n_train_users: usize,
        n_train_items: usize,
        rating_threshold: f32,
    ) -> Self {
        let eval_users: Vec<usize> = partition
            .users()
            .into_iter()
            .filter(|&user| user < n_train_users)
            .collect();

        let users: Vec<UserRanking> = eval_users
            .par_iter()
            .filter_map(|&user| {
                let seen = train.user_items(user);
                let is_seen = |item: &usize| seen.is_some_and(|items| items.contains(item));

                let relevant: HashSet<usize> = partition
                    .user_ratings(user)
                    .iter()
                    .filter(|(item, rating)| {
                        *item < n_train_items && *rating >= rating_threshold && !is_seen(item)
                    })
                    .map(|(item, _)| *item)
                    .collect();
                if relevant.is_empty() {
                    return None;
                }

                let scores = model.score_items(user, n_train_items);
                let candidates = scores
                    .into_iter()
                    .enumerate()
                    .filter(|(item, _)| !is_seen(item))
                    .collect();
                Some(UserRanking::new(user, candidates, relevant))
            })
            .collect();

        debug!(
            "{}: ranked {} of {} evaluation users",
            model.name(),
            users.len(),
            eval_users.len()
        );

        Self {
            rows: partition.len(),
            users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::Interaction;
    use models::{FitError, TrainContext};

    /// Scores items by index, higher index first
    struct ByIndex;

    impl Recommender for ByIndex {
        fn name(&self) -> &str {
            "ByIndex"
        }
        fn fit(&mut self, _ctx: &TrainContext<'_>) -> Result<(), FitError> {
            Ok(())
        }
        fn score(&self, _user: usize, item: usize) -> Option<f32> {
            Some(item as f32)
        }
    }

    fn set(triples: &[(usize, usize, f32)]) -> InteractionSet {
        let mut set = InteractionSet::new();
        for &(user, item, rating) in triples {
            set.insert(Interaction { user, item, rating });
        }
        set
    }

    #[test]
    fn test_candidates_exclude_train_items() {
        let train = set(&[(0, 3, 5.0), (1, 0, 5.0)]);
        let test = set(&[(0, 1, 5.0), (0, 2, 0.5), (1, 3, 4.0)]);

        let evaluation = Evaluation::compute(&ByIndex, &train, &test, 2, 4, 1.0);

        assert_eq!(evaluation.rows, 3);
        assert_eq!(evaluation.users.len(), 2);
        let first = &evaluation.users[0];
        assert_eq!(first.user, 0);
        assert_eq!(first.ranked, vec![(2, 2.0), (1, 1.0), (0, 0.0)]);
        assert_eq!(first.relevant, HashSet::from([1]));
        assert_eq!(first.hits_at(1), 0);
        assert_eq!(first.hits_at(2), 1);
    }

    #[test]
    fn test_unknown_users_and_items_are_skipped() {
        let train = set(&[(0, 0, 5.0)]);
        let test = set(&[(0, 5, 5.0), (3, 0, 5.0)]);

        let evaluation = Evaluation::compute(&ByIndex, &train, &test, 1, 2, 1.0);

        assert_eq!(evaluation.rows, 2);
        assert!(evaluation.users.is_empty());
    }

    #[test]
    fn test_ties_broken_by_item() {
        let ranking = UserRanking::new(0, vec![(2, 1.0), (0, 1.0), (1, 3.0)], HashSet::new());
        let order: Vec<usize> = ranking.ranked.iter().map(|(item, _)| *item).collect();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn test_nan_scores_rank_last() {
        let ranking = UserRanking::new(
            0,
            vec![(0, f32::NAN), (1, 0.5), (2, f32::NEG_INFINITY), (3, 0.1)],
            HashSet::new(),
        );
        let order: Vec<usize> = ranking.ranked.iter().map(|(item, _)| *item).collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
        assert!(ranking.ranked.iter().all(|(_, score)| !score.is_nan()));

        let zeros = UserRanking::new(0, vec![(1, 0.0), (0, -0.0)], HashSet::new());
        assert_eq!(zeros.ranked[0].0, 0);
        assert!(zeros.ranked.iter().all(|(_, score)| score.is_sign_positive()));
    }
}
