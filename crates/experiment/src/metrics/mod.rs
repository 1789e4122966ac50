//! Evaluation metrics.
//!
//! Metrics are explicit values passed to the runner; `MetricConfig` builds
//! them from configuration.

pub mod auc;
pub mod count;
pub mod ranking;

pub use auc::Auc;
pub use count::TestRows;
pub use ranking::{Ndcg, Precision, Recall};

use crate::evaluation::{Evaluation, UserRanking};
use serde::{Deserialize, Serialize};

/// A number computed from an `Evaluation`.
///
/// `Send + Sync` so metric lists can be shared with worker threads.
pub trait Metric: Send + Sync {
    /// Column header in reports
    fn name(&self) -> &str;

    fn compute(&self, evaluation: &Evaluation) -> f64;
}

/// Serializable metric selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum MetricConfig {
    Auc,
    Recall { k: usize },
    Precision { k: usize },
    Ndcg { k: usize },
    TestRows,
}

impl MetricConfig {
    pub fn build(&self) -> Box<dyn Metric> {
        match *self {
            MetricConfig::Auc => Box::new(Auc),
            MetricConfig::Recall { k } => Box::new(Recall::new(k)),
            MetricConfig::Precision { k } => Box::new(Precision::new(k)),
            MetricConfig::Ndcg { k } => Box::new(Ndcg::new(k)),
            MetricConfig::TestRows => Box::new(TestRows),
        }
    }
}

/// Mean of `per_user` over ranked users, 0 when there are none
pub(crate) fn mean_over_users(
    evaluation: &Evaluation,
    per_user: impl Fn(&UserRanking) -> Option<f64>,
) -> f64 {
    let (sum, count) = evaluation
        .users
        .iter()
        .filter_map(per_user)
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_config_names() {
        let configs: Vec<MetricConfig> =
            serde_json::from_str(r#"[{"metric": "auc"}, {"metric": "recall", "k": 50}, {"metric": "test_rows"}]"#)
                .unwrap();
        let names: Vec<String> = configs.iter().map(|c| c.build().name().to_string()).collect();
        assert_eq!(names, vec!["AUC", "Recall@50", "TestRows"]);
    }
}
