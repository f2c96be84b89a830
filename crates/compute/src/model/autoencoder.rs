//! LSTM encoder/decoder that reconstructs a window of scaled readings.
//!
//! The encoder compresses the sequence into its final hidden state (the
//! latent vector). The decoder is fed that vector at every timestep and a
//! time-distributed dense layer maps each decoder state back to feature space.
//!
//! Artifacts are stored as JSON so offline training tooling can emit them.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use hydrowatch_core::FEATURE_DIM;

use super::lstm::{Activation, DenseLayer, LstmLayer};
use super::{Architecture, ModelError, ReconstructionModel};
use crate::scaler::ScaledWindow;

/// Training objective recorded in artifacts. Inference does not use it.
pub const FIT_LOSS: &str = "mse";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmAutoencoder {
    architecture: Architecture,
    loss: String,
    encoder: LstmLayer,
    decoder: LstmLayer,
    output: DenseLayer,
}

impl LstmAutoencoder {
    /// Untrained model with deterministic weights for `seed`.
    pub fn untrained(architecture: Architecture, seed: u64) -> Result<Self, ModelError> {
        architecture.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);
        let latent = architecture.latent_size;
        let model = Self {
            architecture,
            loss: FIT_LOSS.to_string(),
            encoder: LstmLayer::initialized(
                &mut rng,
                architecture.feature_dim,
                latent,
                Activation::Relu,
            ),
            decoder: LstmLayer::initialized(&mut rng, latent, latent, Activation::Relu),
            output: DenseLayer::initialized(&mut rng, latent, architecture.feature_dim),
        };
        model.check_shapes()?;
        Ok(model)
    }

    /// Build from explicit layers, e.g. weights exported by a training job.
    pub fn from_layers(
        architecture: Architecture,
        encoder: LstmLayer,
        decoder: LstmLayer,
        output: DenseLayer,
    ) -> Result<Self, ModelError> {
        architecture.validate()?;
        let model = Self {
            architecture,
            loss: FIT_LOSS.to_string(),
            encoder,
            decoder,
            output,
        };
        model.check_shapes()?;
        Ok(model)
    }

    /// Read and validate a JSON artifact.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&raw)?;
        model.architecture.validate()?;
        model.check_shapes()?;
        debug!(path = %path.display(), architecture = %model.architecture, "model artifact parsed");
        Ok(model)
    }

    /// Write the model as a JSON artifact.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn loss(&self) -> &str {
        &self.loss
    }

    fn check_shapes(&self) -> Result<(), ModelError> {
        let a = &self.architecture;
        let layers_match = self.encoder.input_dim == a.feature_dim
            && self.encoder.units == a.latent_size
            && self.decoder.input_dim == a.latent_size
            && self.decoder.units == a.latent_size
            && self.output.input_dim == a.latent_size
            && self.output.units == a.feature_dim;
        if !layers_match {
            return Err(ModelError::Format(format!(
                "layer dimensions do not match architecture ({a})"
            )));
        }
        self.encoder.check_shapes()?;
        self.decoder.check_shapes()?;
        self.output.check_shapes()
    }
}

impl ReconstructionModel for LstmAutoencoder {
    fn architecture(&self) -> Architecture {
        self.architecture
    }

    fn predict(&self, input: &ScaledWindow) -> Result<ScaledWindow, ModelError> {
        let seq = self.architecture.sequence_length;
        if input.len() != seq {
            return Err(ModelError::Shape {
                expected_rows: seq,
                expected_cols: FEATURE_DIM,
                rows: input.len(),
                cols: FEATURE_DIM,
            });
        }

        let encoded = self.encoder.run(input.rows().iter().map(|r| &r[..]));
        let latent = encoded.last().cloned().unwrap_or_default();

        let decoded = self
            .decoder
            .run(std::iter::repeat(latent.as_slice()).take(seq));

        let rows = decoded
            .iter()
            .map(|h| {
                let out = self.output.forward(h);
                let mut row = [0.0; FEATURE_DIM];
                row.copy_from_slice(&out[..FEATURE_DIM]);
                row
            })
            .collect();

        Ok(ScaledWindow::new(rows))
    }
}
