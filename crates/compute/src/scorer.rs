//! Reconstruction-error scoring.
//!
//! The score of a window is the mean squared difference between the scaled
//! input and the model's reconstruction of it. A window is anomalous when its
//! score is strictly greater than the threshold.

use serde::{Deserialize, Serialize};

use crate::error::ComputeError;
use crate::model::ModelHandle;
use crate::scaler::ScaledWindow;

/// Default reconstruction-error threshold.
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Outcome of scoring one full window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_anomaly: bool,
    pub score: f64,
    pub threshold: f64,
}

impl Verdict {
    pub fn from_score(score: f64, threshold: f64) -> Self {
        Self {
            is_anomaly: score > threshold,
            score,
            threshold,
        }
    }
}

/// Scores windows against a fixed threshold.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyScorer {
    threshold: f64,
}

impl Default for AnomalyScorer {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl AnomalyScorer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score a full window.
    ///
    /// # Errors
    /// [`ComputeError::WindowShape`] unless both the window and the model's
    /// reconstruction have exactly the model's sequence length in rows;
    /// model failures pass through.
    pub fn score(&self, scaled: &ScaledWindow, model: &ModelHandle) -> Result<Verdict, ComputeError> {
        let required = model.architecture().sequence_length;
        if scaled.len() != required {
            return Err(ComputeError::WindowShape {
                rows: scaled.len(),
                required,
            });
        }

        let reconstruction = model.predict(scaled)?;
        if reconstruction.len() != required {
            return Err(ComputeError::WindowShape {
                rows: reconstruction.len(),
                required,
            });
        }
        let score = reconstruction_error(scaled, &reconstruction);
        Ok(Verdict::from_score(score, self.threshold))
    }
}

/// Mean squared element-wise difference between two windows of equal shape.
pub fn reconstruction_error(input: &ScaledWindow, reconstruction: &ScaledWindow) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (a, b) in input.values().zip(reconstruction.values()) {
        sum += (a - b).powi(2);
        count += 1;
    }
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}
