use thiserror::Error;

use crate::model::ModelError;

#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("window has {rows} rows, scoring needs exactly {required}")]
    WindowShape { rows: usize, required: usize },

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("configuration error: {0}")]
    Config(#[from] hydrowatch_core::HydroError),
}
