use data_loader::DataLoadError;
use modality::ModalityError;
use models::FitError;
use thiserror::Error;

/// Errors raised while setting up or running an experiment
#[derive(Error, Debug)]
pub enum ExperimentError {
    /// A model's feature requirement is not met; raised before any fitting
    #[error("model {model} cannot run with the supplied features: {source}")]
    Configuration {
        model: String,
        #[source]
        source: FitError,
    },

    #[error("invalid {field} = {value}: {reason}")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Fit(#[from] FitError),

    #[error(transparent)]
    Modality(#[from] ModalityError),

    #[error(transparent)]
    Data(#[from] DataLoadError),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExperimentError>;

pub(crate) fn invalid(field: &str, value: impl ToString, reason: &str) -> ExperimentError {
    ExperimentError::InvalidConfig {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
