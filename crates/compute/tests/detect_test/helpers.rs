use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use hydrowatch_compute::model::lstm::{Activation, DenseLayer, LstmLayer};
use hydrowatch_compute::{
    AnomalyScorer, Architecture, Detector, LstmAutoencoder, ModelError, ModelHandle, ModelSource,
    ReconstructionModel, ScaledWindow,
};
use hydrowatch_core::{FeatureVector, Reading};
use hydrowatch_notify::{AlertDispatcher, Notification, Notifier, NotifyError};

pub const STATION: (f64, f64) = (26.91, 75.79);

/// Create a unique temp directory for each test.
pub fn test_data_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hydrowatch-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Reading at `STATION`, `minute` minutes into the test day.
pub fn station_reading(minute: i64, features: FeatureVector) -> Reading {
    reading_at(STATION, minute, features)
}

pub fn reading_at(location: (f64, f64), minute: i64, features: FeatureVector) -> Reading {
    Reading {
        timestamp: Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap() + Duration::minutes(minute),
        water_level: features[0],
        temperature: features[1],
        rainfall: features[2],
        ph: features[3],
        dissolved_oxygen: features[4],
        latitude: location.0,
        longitude: location.1,
    }
}

/// `wl=1.0, t=20, rf=0, ph=7, do=8`.
pub const STABLE: FeatureVector = [1.0, 20.0, 0.0, 7.0, 8.0];

/// Water level alone jumps from 1.0 to 500.0; every other feature is steady.
pub const LEVEL_JUMP: FeatureVector = [500.0, 20.0, 0.0, 7.0, 8.0];

/// Flash flood: water level jumps from 1.0 to 500.0 alongside a warm,
/// turbid, oxygen-starved inflow.
pub const SURGE: FeatureVector = [500.0, 35.0, 120.0, 4.5, 2.0];

/// Autoencoder whose weights are all zero: it reconstructs every window as
/// zeros, so the score is the mean square of the scaled input.
pub fn zero_model() -> LstmAutoencoder {
    let arch = Architecture::default();
    let lstm = |input_dim: usize, units: usize| LstmLayer {
        units,
        input_dim,
        activation: Activation::Relu,
        kernel: vec![vec![0.0; 4 * units]; input_dim],
        recurrent: vec![vec![0.0; 4 * units]; units],
        bias: vec![0.0; 4 * units],
    };
    LstmAutoencoder::from_layers(
        arch,
        lstm(arch.feature_dim, arch.latent_size),
        lstm(arch.latent_size, arch.latent_size),
        DenseLayer {
            input_dim: arch.latent_size,
            units: arch.feature_dim,
            kernel: vec![vec![0.0; arch.feature_dim]; arch.latent_size],
            bias: vec![0.0; arch.feature_dim],
        },
    )
    .unwrap()
}

pub fn fallback_model() -> LstmAutoencoder {
    LstmAutoencoder::untrained(Architecture::default(), 42).unwrap()
}

/// Wraps a model and counts inference calls.
pub struct CountingModel<M> {
    inner: M,
    pub calls: Arc<AtomicUsize>,
}

impl<M> CountingModel<M> {
    pub fn new(inner: M) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { inner, calls: calls.clone() }, calls)
    }
}

impl<M: ReconstructionModel> ReconstructionModel for CountingModel<M> {
    fn architecture(&self) -> Architecture {
        self.inner.architecture()
    }

    fn predict(&self, input: &ScaledWindow) -> Result<ScaledWindow, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.predict(input)
    }
}

pub fn handle(model: impl ReconstructionModel + 'static) -> ModelHandle {
    ModelHandle::new(
        Arc::new(model),
        ModelSource::Fallback { reason: "test".to_string() },
    )
}

pub fn detector(model: impl ReconstructionModel + 'static, dispatcher: AlertDispatcher) -> Detector {
    Detector::new(handle(model), AnomalyScorer::default(), dispatcher)
}

/// Records delivered notifications; optionally fails every delivery.
pub struct RecordingNotifier {
    pub delivered: Arc<Mutex<Vec<Notification>>>,
    pub attempts: Arc<AtomicUsize>,
    should_fail: bool,
}

impl RecordingNotifier {
    pub fn new(should_fail: bool) -> Self {
        Self {
            delivered: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(AtomicUsize::new(0)),
            should_fail,
        }
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(NotifyError::Smtp("535 authentication failed".to_string()));
        }
        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}
