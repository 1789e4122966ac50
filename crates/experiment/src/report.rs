//! Experiment results and their tabular rendering.

use serde::Serialize;
use std::fmt;

/// One (model, metric) value with the model's timings in seconds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricResult {
    pub model_name: String,
    pub metric_name: String,
    pub value: f64,
    pub train_time: f64,
    pub test_time: f64,
}

/// Results of a run, in model order then metric order.
///
/// `Display` renders one row per model:
///
/// ```text
/// TEST:
///      |    AUC | Recall@50 | Train (s) | Test (s)
/// ---- + ------ + --------- + --------- + --------
/// BPR  | 0.8581 |    0.1044 |    0.9120 |   0.4019
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExperimentReport {
    test: Vec<MetricResult>,
    validation: Vec<MetricResult>,
}

impl ExperimentReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: MetricResult) {
        self.test.push(result);
    }

    pub fn push_validation(&mut self, result: MetricResult) {
        self.validation.push(result);
    }

    /// Test partition results
    pub fn rows(&self) -> &[MetricResult] {
        &self.test
    }

    pub fn validation_rows(&self) -> &[MetricResult] {
        &self.validation
    }

    pub fn value(&self, model: &str, metric: &str) -> Option<f64> {
        find(&self.test, model, metric).map(|result| result.value)
    }

    /// Model names in run order
    pub fn models(&self) -> Vec<&str> {
        unique(self.test.iter().map(|result| result.model_name.as_str()))
    }

    /// Metric names in first-seen order
    pub fn metrics(&self) -> Vec<&str> {
        unique(self.test.iter().map(|result| result.metric_name.as_str()))
    }
}

fn find<'a>(rows: &'a [MetricResult], model: &str, metric: &str) -> Option<&'a MetricResult> {
    rows.iter()
        .find(|result| result.model_name == model && result.metric_name == metric)
}

fn unique<'a>(names: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for name in names {
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

/// Render `rows` as an aligned table; validation tables have a single time column.
fn write_table(f: &mut fmt::Formatter<'_>, rows: &[MetricResult], validation: bool) -> fmt::Result {
    let models = unique(rows.iter().map(|result| result.model_name.as_str()));
    let metrics = unique(rows.iter().map(|result| result.metric_name.as_str()));

    let mut header: Vec<String> = metrics.iter().map(|m| m.to_string()).collect();
    if validation {
        header.push("Time (s)".to_string());
    } else {
        header.push("Train (s)".to_string());
        header.push("Test (s)".to_string());
    }

    let cells: Vec<Vec<String>> = models
        .iter()
        .map(|model| {
            let mut line: Vec<String> = metrics
                .iter()
                .map(|metric| {
                    find(rows, model, metric).map_or_else(|| "N/A".to_string(), |r| format!("{:.4}", r.value))
                })
                .collect();
            let timing = rows.iter().find(|result| result.model_name == *model);
            let (train_time, test_time) = timing.map_or((0.0, 0.0), |r| (r.train_time, r.test_time));
            if !validation {
                line.push(format!("{:.4}", train_time));
            }
            line.push(format!("{:.4}", test_time));
            line
        })
        .collect();

    let name_width = models.iter().map(|m| m.len()).max().unwrap_or(0);
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(column, title)| {
            cells
                .iter()
                .map(|line| line[column].len())
                .chain(std::iter::once(title.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    write!(f, "{:name_width$}", "")?;
    for (title, width) in header.iter().zip(&widths) {
        write!(f, " | {:>width$}", title, width = *width)?;
    }
    writeln!(f)?;

    write!(f, "{}", "-".repeat(name_width))?;
    for width in &widths {
        write!(f, " + {}", "-".repeat(*width))?;
    }
    writeln!(f)?;

    for (model, line) in models.iter().zip(&cells) {
        write!(f, "{:name_width$}", model)?;
        for (cell, width) in line.iter().zip(&widths) {
            write!(f, " | {:>width$}", cell, width = *width)?;
        }
        writeln!(f)?;
    }
    Ok(())
}

impl fmt::Display for ExperimentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.validation.is_empty() {
            writeln!(f, "VALIDATION:")?;
            write_table(f, &self.validation, true)?;
            writeln!(f)?;
        }
        writeln!(f, "TEST:")?;
        write_table(f, &self.test, false)
    }
}
