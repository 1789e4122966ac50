//! Area under the ROC curve, averaged over users.

use super::{Metric, mean_over_users};
use crate::evaluation::{Evaluation, UserRanking};
use std::cmp::Ordering;

/// Per user: the fraction of (relevant, non-relevant) candidate pairs ranked
/// correctly, ties counting one half.
#[derive(Debug, Clone, Copy, Default)]
pub struct Auc;

impl Auc {
    pub(crate) fn user_auc(ranking: &UserRanking) -> Option<f64> {
        let positives = ranking
            .ranked
            .iter()
            .filter(|(item, _)| ranking.relevant.contains(item))
            .count();
        let negatives = ranking.ranked.len() - positives;
        if positives == 0 || negatives == 0 {
            return None;
        }

        // Walk groups of equal score from best to worst
        let mut correct = 0.0;
        let mut negatives_above = 0usize;
        let mut start = 0;
        while start < ranking.ranked.len() {
            let score = ranking.ranked[start].1;
            let end = ranking.ranked[start..]
                .iter()
                .position(|(_, s)| s.total_cmp(&score) != Ordering::Equal)
                .map_or(ranking.ranked.len(), |offset| start + offset);

            let group_pos = ranking.ranked[start..end]
                .iter()
                .filter(|(item, _)| ranking.relevant.contains(item))
                .count();
            let group_neg = (end - start) - group_pos;

            let below = negatives - negatives_above - group_neg;
            correct += group_pos as f64 * below as f64 + 0.5 * group_pos as f64 * group_neg as f64;
            negatives_above += group_neg;
            start = end;
        }

        Some(correct / (positives as f64 * negatives as f64))
    }
}

impl Metric for Auc {
    fn name(&self) -> &str {
        "AUC"
    }

    fn compute(&self, evaluation: &Evaluation) -> f64 {
        mean_over_users(evaluation, Self::user_auc)
    }
}
