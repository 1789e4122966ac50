//! The experiment runner fits and evaluates models in sequence.

use crate::error::{ExperimentError, Result, invalid};
use crate::evaluation::Evaluation;
use crate::metrics::Metric;
use crate::report::{ExperimentReport, MetricResult};
use crate::split::SplitResult;
use data_loader::InteractionSet;
use models::Recommender;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// A split plus the models and metrics to run on it.
///
/// ## Usage
/// ```ignore
/// let report = Experiment::new(split)
///     .add_model(Vbpr::new(vbpr_config))
///     .add_model(Bpr::new(bpr_config))
///     .add_metric(Auc)
///     .add_metric(Recall::new(50))
///     .run()?;
/// println!("{}", report);
/// ```
pub struct Experiment {
    split: SplitResult,
    models: Vec<Box<dyn Recommender>>,
    metrics: Vec<Box<dyn Metric>>,
}

impl Experiment {
    pub fn new(split: SplitResult) -> Self {
        Self {
            split,
            models: Vec::new(),
            metrics: Vec::new(),
        }
    }

    pub fn add_model(self, model: impl Recommender + 'static) -> Self {
        self.add_boxed_model(Box::new(model))
    }

    pub fn add_boxed_model(mut self, model: Box<dyn Recommender>) -> Self {
        self.models.push(model);
        self
    }

    pub fn add_metric(self, metric: impl Metric + 'static) -> Self {
        self.add_boxed_metric(Box::new(metric))
    }

    pub fn add_boxed_metric(mut self, metric: Box<dyn Metric>) -> Self {
        self.metrics.push(metric);
        self
    }

    pub fn split(&self) -> &SplitResult {
        &self.split
    }

    pub fn models(&self) -> &[Box<dyn Recommender>] {
        &self.models
    }

    /// Check every model's hyperparameters and feature requirement against
    /// the split's table
    pub fn check_requirements(&self) -> Result<()> {
        let shape = self.split.feature_shape();
        for model in &self.models {
            let checked = model.validate().and_then(|()| match model.requirement() {
                Some(requirement) => requirement.check(model.name(), Some(shape)),
                None => Ok(()),
            });
            checked.map_err(|source| ExperimentError::Configuration {
                model: model.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Fit and evaluate every model in order.
    ///
    /// ## Algorithm
    /// 1. Validate the model and metric lists and every feature requirement
    /// 2. For each model:
    ///    a. Fit on the train partition (timed)
    ///    b. Rank the test partition and compute every metric (timed)
    ///    c. Repeat b. on the validation partition, if there is one
    /// 3. Return the accumulated report
    ///
    /// A fitting failure aborts the run.
    #[instrument(skip(self), fields(models = self.models.len(), metrics = self.metrics.len()))]
    pub fn run(&mut self) -> Result<ExperimentReport> {
        if self.models.is_empty() {
            return Err(invalid("models", 0, "at least one model is required"));
        }
        if self.metrics.is_empty() {
            return Err(invalid("metrics", 0, "at least one metric is required"));
        }
        self.check_requirements()?;

        let needs_features = self.models.iter().any(|model| model.requirement().is_some());
        let features = needs_features.then(|| self.split.aligned_item_features());

        let mut report = ExperimentReport::new();
        for model in &mut self.models {
            let name = model.name().to_string();
            let model_features = model.requirement().and(features.as_ref());
            let ctx = self.split.train_context(model_features);

            debug!("Fitting {} ({} train records)", name, ctx.train.len());
            let start = Instant::now();
            model.fit(&ctx)?;
            let train_time = start.elapsed().as_secs_f64();

            let start = Instant::now();
            let values = evaluate(&**model, &self.split, self.split.test(), &self.metrics);
            let test_time = start.elapsed().as_secs_f64();

            for (metric, value) in self.metrics.iter().zip(values) {
                report.push(MetricResult {
                    model_name: name.clone(),
                    metric_name: metric.name().to_string(),
                    value,
                    train_time,
                    test_time,
                });
            }

            if let Some(val) = self.split.val() {
                let start = Instant::now();
                let values = evaluate(&**model, &self.split, val, &self.metrics);
                let val_time = start.elapsed().as_secs_f64();
                for (metric, value) in self.metrics.iter().zip(values) {
                    report.push_validation(MetricResult {
                        model_name: name.clone(),
                        metric_name: metric.name().to_string(),
                        value,
                        train_time,
                        test_time: val_time,
                    });
                }
            }

            info!(
                "{} done: train {:.4}s, test {:.4}s",
                name, train_time, test_time
            );
        }

        Ok(report)
    }
}

fn evaluate(
    model: &dyn Recommender,
    split: &SplitResult,
    partition: &InteractionSet,
    metrics: &[Box<dyn Metric>],
) -> Vec<f64> {
    let evaluation = Evaluation::compute(
        model,
        split.train(),
        partition,
        split.n_train_users(),
        split.n_train_items(),
        split.rating_threshold(),
    );
    metrics.iter().map(|metric| metric.compute(&evaluation)).collect()
}
