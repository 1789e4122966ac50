//! Popularity baseline: every user gets the same ranking, by train count.

use crate::error::{FitError, Result};
use crate::traits::{Recommender, TrainContext};
use tracing::info;

#[derive(Debug, Clone)]
pub struct MostPop {
    name: String,
    item_counts: Vec<f32>,
}

impl MostPop {
    pub fn new() -> Self {
        Self::with_name("MostPop")
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            item_counts: Vec::new(),
        }
    }
}

impl Default for MostPop {
    fn default() -> Self {
        Self::new()
    }
}

impl Recommender for MostPop {
    fn name(&self) -> &str {
        &self.name
    }

    fn fit(&mut self, ctx: &TrainContext<'_>) -> Result<()> {
        if ctx.train.is_empty() {
            return Err(FitError::EmptyTrainSet {
                model: self.name.clone(),
            });
        }
        self.item_counts = ctx
            .train
            .item_counts(ctx.n_items)
            .into_iter()
            .map(|count| count as f32)
            .collect();
        info!("{} fitted over {} items", self.name, ctx.n_items);
        Ok(())
    }

    /// Ignores the user; unknown items have no score
    fn score(&self, _user: usize, item: usize) -> Option<f32> {
        self.item_counts.get(item).copied()
    }
}
