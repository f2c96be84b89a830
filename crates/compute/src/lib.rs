//! Anomaly detection over station telemetry.
//!
//! A reading flows through [`window`] → [`scaler`] → [`model`] → [`scorer`],
//! orchestrated by [`detector::Detector`].

pub mod detector;
pub mod error;
pub mod metrics;
pub mod model;
pub mod scaler;
pub mod scorer;
pub mod window;

pub use detector::{Detection, Detector};
pub use error::ComputeError;
pub use metrics::DetectorMetrics;
pub use model::{
    Architecture, LstmAutoencoder, ModelError, ModelHandle, ModelProvider, ModelSource,
    ReconstructionModel,
};
pub use scaler::ScaledWindow;
pub use scorer::{AnomalyScorer, Verdict, DEFAULT_THRESHOLD};
pub use window::{SequenceWindow, WindowStore};
