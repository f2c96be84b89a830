//! Sequence reconstruction models.
//!
//! - [`lstm`]: LSTM and dense layers (inference only)
//! - [`autoencoder`]: the encoder/decoder model and its JSON artifact format
//! - [`provider`]: resolves a usable model at startup, falling back to an
//!   untrained one when no artifact can be loaded

pub mod autoencoder;
pub mod lstm;
pub mod provider;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use hydrowatch_core::config::DetectionConfig;
use hydrowatch_core::FEATURE_DIM;

use crate::scaler::ScaledWindow;

pub use autoencoder::LstmAutoencoder;
pub use provider::ModelProvider;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model artifact I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model artifact format error: {0}")]
    Format(String),

    #[error("architecture mismatch: expected {expected}, artifact has {found}")]
    ArchitectureMismatch {
        expected: Architecture,
        found: Architecture,
    },

    #[error("invalid architecture: {0}")]
    InvalidArchitecture(String),

    #[error("input shape mismatch: expected {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    Shape {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Format(e.to_string())
    }
}

/// Shape parameters of the reconstruction model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    pub sequence_length: usize,
    pub feature_dim: usize,
    pub latent_size: usize,
}

impl Default for Architecture {
    fn default() -> Self {
        Self {
            sequence_length: 3,
            feature_dim: FEATURE_DIM,
            latent_size: 16,
        }
    }
}

impl Architecture {
    pub fn from_config(config: &DetectionConfig) -> Self {
        Self {
            sequence_length: config.sequence_length,
            feature_dim: config.feature_dim,
            latent_size: config.latent_size,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.sequence_length == 0 || self.latent_size == 0 {
            return Err(ModelError::InvalidArchitecture(format!(
                "sequence_length and latent_size must be non-zero ({self})"
            )));
        }
        if self.feature_dim != FEATURE_DIM {
            return Err(ModelError::InvalidArchitecture(format!(
                "feature_dim must be {FEATURE_DIM}, got {}",
                self.feature_dim
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seq={} features={} latent={}",
            self.sequence_length, self.feature_dim, self.latent_size
        )
    }
}

/// A model that reproduces its own input window.
///
/// Implementations must be pure: the same input always yields the same
/// reconstruction.
pub trait ReconstructionModel: Send + Sync {
    fn architecture(&self) -> Architecture;

    /// Reconstruct `input`, which must have `sequence_length` rows.
    fn predict(&self, input: &ScaledWindow) -> Result<ScaledWindow, ModelError>;
}

/// Where the process-wide model came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSource {
    Loaded { path: PathBuf },
    Fallback { reason: String },
}

/// Shared, read-only model resolved once at startup.
#[derive(Clone)]
pub struct ModelHandle {
    model: Arc<dyn ReconstructionModel>,
    source: ModelSource,
}

impl ModelHandle {
    pub fn new(model: Arc<dyn ReconstructionModel>, source: ModelSource) -> Self {
        Self { model, source }
    }

    pub fn source(&self) -> &ModelSource {
        &self.source
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ModelSource::Fallback { .. })
    }

    pub fn architecture(&self) -> Architecture {
        self.model.architecture()
    }

    pub fn predict(&self, input: &ScaledWindow) -> Result<ScaledWindow, ModelError> {
        self.model.predict(input)
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("architecture", &self.model.architecture())
            .field("source", &self.source)
            .finish()
    }
}
