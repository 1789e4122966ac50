//! Top-k ranking metrics with binary relevance.

use super::{Metric, mean_over_users};
use crate::evaluation::Evaluation;

/// Share of a user's relevant items found in the top `k`
#[derive(Debug, Clone)]
pub struct Recall {
    k: usize,
    name: String,
}

impl Recall {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            name: format!("Recall@{}", k),
        }
    }
}

impl Metric for Recall {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, evaluation: &Evaluation) -> f64 {
        mean_over_users(evaluation, |ranking| {
            Some(ranking.hits_at(self.k) as f64 / ranking.relevant.len() as f64)
        })
    }
}

/// Share of the top `k` that is relevant
#[derive(Debug, Clone)]
pub struct Precision {
    k: usize,
    name: String,
}

impl Precision {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            name: format!("Precision@{}", k),
        }
    }
}

impl Metric for Precision {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, evaluation: &Evaluation) -> f64 {
        if self.k == 0 {
            return 0.0;
        }
        mean_over_users(evaluation, |ranking| {
            Some(ranking.hits_at(self.k) as f64 / self.k as f64)
        })
    }
}

/// Normalized discounted cumulative gain of the top `k`
#[derive(Debug, Clone)]
pub struct Ndcg {
    k: usize,
    name: String,
}

impl Ndcg {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            name: format!("NDCG@{}", k),
        }
    }
}

fn discount(position: usize) -> f64 {
    1.0 / (position as f64 + 2.0).log2()
}

impl Metric for Ndcg {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute(&self, evaluation: &Evaluation) -> f64 {
        mean_over_users(evaluation, |ranking| {
            let dcg: f64 = ranking
                .ranked
                .iter()
                .take(self.k)
                .enumerate()
                .filter(|(_, (item, _))| ranking.relevant.contains(item))
                .map(|(position, _)| discount(position))
                .sum();
            let ideal: f64 = (0..self.k.min(ranking.relevant.len())).map(discount).sum();
            (ideal > 0.0).then(|| dcg / ideal)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::UserRanking;
    use std::collections::HashSet;

    /// Items 0..5 ranked in index order; relevant items given
    fn create_test_evaluation(relevant: &[usize]) -> Evaluation {
        let ranked = (0..5).map(|item| (item, 10.0 - item as f32)).collect();
        Evaluation {
            rows: relevant.len(),
            users: vec![UserRanking::new(
                0,
                ranked,
                relevant.iter().copied().collect::<HashSet<_>>(),
            )],
        }
    }

    #[test]
    fn test_recall_and_precision() {
        let evaluation = create_test_evaluation(&[1, 4]);
        assert_eq!(Recall::new(2).compute(&evaluation), 0.5);
        assert_eq!(Recall::new(5).compute(&evaluation), 1.0);
        assert_eq!(Precision::new(2).compute(&evaluation), 0.5);
        assert_eq!(Precision::new(4).compute(&evaluation), 0.25);
    }

    #[test]
    fn test_ndcg() {
        let perfect = create_test_evaluation(&[0, 1]);
        assert!((Ndcg::new(3).compute(&perfect) - 1.0).abs() < 1e-12);

        let second = create_test_evaluation(&[1]);
        let expected = 1.0 / 3f64.log2();
        assert!((Ndcg::new(3).compute(&second) - expected).abs() < 1e-12);

        let missed = create_test_evaluation(&[4]);
        assert_eq!(Ndcg::new(3).compute(&missed), 0.0);
    }

    #[test]
    fn test_names() {
        assert_eq!(Recall::new(50).name(), "Recall@50");
        assert_eq!(Precision::new(10).name(), "Precision@10");
        assert_eq!(Ndcg::new(20).name(), "NDCG@20");
    }
}
