use thiserror::Error;

/// Errors raised while fitting a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("{model}: invalid hyperparameter {field} = {value}: {reason}")]
    InvalidConfig {
        model: String,
        field: String,
        value: String,
        reason: String,
    },

    #[error("{model}: training set is empty")]
    EmptyTrainSet { model: String },

    #[error("{model}: item features are required but none were supplied")]
    MissingFeatures { model: String },

    #[error("{model}: expected item features of dimension {expected}, got {found}")]
    FeatureDimension {
        model: String,
        expected: usize,
        found: usize,
    },

    #[error("{model}: item features cover {found} items, training set has {expected}")]
    FeatureRows {
        model: String,
        expected: usize,
        found: usize,
    },

    #[error("{model}: parameters diverged (non-finite values) in epoch {epoch}")]
    Diverged { model: String, epoch: usize },
}

pub type Result<T> = std::result::Result<T, FitError>;

pub(crate) fn invalid(model: &str, field: &str, value: impl ToString, reason: &str) -> FitError {
    FitError::InvalidConfig {
        model: model.to_string(),
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
