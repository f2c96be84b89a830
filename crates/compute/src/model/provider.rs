//! Startup model resolution.
//!
//! Loads the trained artifact when possible; otherwise builds an untrained
//! model of the configured architecture so detection keeps running. Which
//! path was taken is recorded on the returned handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use hydrowatch_core::config::DetectionConfig;

use super::autoencoder::LstmAutoencoder;
use super::{Architecture, ModelError, ModelHandle, ModelSource, ReconstructionModel};

#[derive(Debug, Clone)]
pub struct ModelProvider {
    path: PathBuf,
    architecture: Architecture,
    seed: u64,
}

impl ModelProvider {
    pub fn new(path: impl Into<PathBuf>, architecture: Architecture, seed: u64) -> Self {
        Self {
            path: path.into(),
            architecture,
            seed,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(
            config.model_path.clone(),
            Architecture::from_config(config),
            config.seed,
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve the process-wide model. Call once at startup.
    ///
    /// # Errors
    /// Only when even the fallback model cannot be built, which means the
    /// configured architecture itself is invalid.
    pub fn resolve(&self) -> Result<ModelHandle, ModelError> {
        match self.load() {
            Ok(model) => {
                info!(
                    path = %self.path.display(),
                    architecture = %self.architecture,
                    "loaded reconstruction model"
                );
                Ok(ModelHandle::new(
                    Arc::new(model),
                    ModelSource::Loaded { path: self.path.clone() },
                ))
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "model artifact unusable, falling back to untrained model"
                );
                let model = LstmAutoencoder::untrained(self.architecture, self.seed)?;
                Ok(ModelHandle::new(
                    Arc::new(model),
                    ModelSource::Fallback { reason: e.to_string() },
                ))
            }
        }
    }

    fn load(&self) -> Result<LstmAutoencoder, ModelError> {
        let model = LstmAutoencoder::load(&self.path)?;
        let found = model.architecture();
        if found != self.architecture {
            return Err(ModelError::ArchitectureMismatch {
                expected: self.architecture,
                found,
            });
        }
        Ok(model)
    }
}
