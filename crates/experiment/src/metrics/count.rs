//! Partition size as a metric.

use super::Metric;
use crate::evaluation::Evaluation;

/// Number of records retained in the evaluated partition
#[derive(Debug, Clone, Copy, Default)]
pub struct TestRows;

impl Metric for TestRows {
    fn name(&self) -> &str {
        "TestRows"
    }

    fn compute(&self, evaluation: &Evaluation) -> f64 {
        evaluation.rows as f64
    }
}
