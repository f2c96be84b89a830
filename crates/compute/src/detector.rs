//! The ingestion entry point.
//!
//! Per reading: validate, append to the location's window, and once the
//! window is full scale it, score it, and attempt an alert when anomalous.
//! The caller always gets a [`Detection`]; alert delivery problems are
//! reported alongside the verdict, never as errors.

use std::sync::Mutex;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use hydrowatch_core::{Config, Reading};
use hydrowatch_notify::{AlertDispatcher, AlertOutcome, AlertReport};

use crate::error::ComputeError;
use crate::metrics::DetectorMetrics;
use crate::model::{ModelHandle, ModelProvider};
use crate::scaler;
use crate::scorer::{AnomalyScorer, Verdict};
use crate::window::WindowStore;

/// What happened to one ingested reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Detection {
    /// Malformed reading; nothing was appended.
    Rejected { reason: String },
    /// Appended, but the location does not yet have a full window.
    WindowFilling { len: usize, required: usize },
    /// Full window, but the model could not score it. The reading stays in
    /// the window.
    ScoringFailed { reason: String },
    /// Full window scored. `alert` is set when the verdict was anomalous.
    Scored {
        verdict: Verdict,
        alert: Option<AlertOutcome>,
    },
}

impl Detection {
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Detection::Scored { verdict, .. } => Some(verdict),
            _ => None,
        }
    }

    pub fn is_anomaly(&self) -> bool {
        self.verdict().is_some_and(|v| v.is_anomaly)
    }

    pub fn alert(&self) -> Option<&AlertOutcome> {
        match self {
            Detection::Scored { alert, .. } => alert.as_ref(),
            _ => None,
        }
    }
}

pub struct Detector {
    model: ModelHandle,
    scorer: AnomalyScorer,
    windows: WindowStore,
    dispatcher: AlertDispatcher,
    metrics: Mutex<DetectorMetrics>,
}

impl Detector {
    /// Windows hold as many readings as the model's sequence length.
    pub fn new(model: ModelHandle, scorer: AnomalyScorer, dispatcher: AlertDispatcher) -> Self {
        let capacity = model.architecture().sequence_length;
        Self {
            model,
            scorer,
            windows: WindowStore::new(capacity),
            dispatcher,
            metrics: Mutex::new(DetectorMetrics::default()),
        }
    }

    /// Validate config, resolve the model, and set up alerting.
    ///
    /// # Errors
    /// Invalid detection parameters, or a model that cannot be built even as
    /// a fallback.
    pub fn from_config(config: &Config) -> Result<Self, ComputeError> {
        config.validate()?;
        let model = ModelProvider::from_config(&config.detection).resolve()?;
        info!(source = ?model.source(), "reconstruction model ready");
        Ok(Self::new(
            model,
            AnomalyScorer::new(config.detection.threshold),
            AlertDispatcher::from_config(&config.alert),
        ))
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    pub fn windows(&self) -> &WindowStore {
        &self.windows
    }

    pub fn metrics(&self) -> DetectorMetrics {
        self.metrics.lock().expect("metrics lock poisoned").clone()
    }

    /// Run one reading through the pipeline.
    pub async fn detect(&self, reading: Reading) -> Detection {
        self.with_metrics(DetectorMetrics::record_ingest);

        if let Err(e) = reading.validate() {
            warn!(error = %e, "reading rejected");
            self.with_metrics(DetectorMetrics::record_rejected);
            return Detection::Rejected { reason: e.to_string() };
        }

        let location = reading.location();
        let window = self.windows.append(reading);
        let required = self.windows.capacity();
        if window.len() < required {
            debug!(location = %location, len = window.len(), required, "window filling");
            return Detection::WindowFilling { len: window.len(), required };
        }

        let start = Instant::now();
        let scaled = scaler::transform(&window);
        let verdict = match self.scorer.score(&scaled, &self.model) {
            Ok(v) => v,
            Err(e) => {
                // Window capacity is the model's sequence length, so only a
                // misbehaving model gets here.
                warn!(location = %location, error = %e, "scoring failed");
                return Detection::ScoringFailed { reason: e.to_string() };
            }
        };
        let elapsed = start.elapsed();
        self.with_metrics(|m| m.record_score(verdict.score, verdict.is_anomaly, elapsed));

        if !verdict.is_anomaly {
            debug!(location = %location, score = verdict.score, "window normal");
            return Detection::Scored { verdict, alert: None };
        }

        let Some(newest) = window.last() else {
            return Detection::Scored { verdict, alert: None };
        };
        info!(
            location = %location,
            score = verdict.score,
            threshold = verdict.threshold,
            "anomaly detected"
        );
        let outcome = self.alert(newest, &verdict).await;
        self.with_metrics(|m| m.record_alert(&outcome));

        Detection::Scored { verdict, alert: Some(outcome) }
    }

    async fn alert(&self, reading: &Reading, verdict: &Verdict) -> AlertOutcome {
        let report = match AlertReport::new(reading, verdict.score, verdict.threshold).render() {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "alert report could not be rendered");
                return AlertOutcome::Failed { reason: e.to_string() };
            }
        };
        self.dispatcher.send(&report).await
    }

    fn with_metrics(&self, f: impl FnOnce(&mut DetectorMetrics)) {
        f(&mut self.metrics.lock().expect("metrics lock poisoned"));
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("model", &self.model)
            .field("threshold", &self.scorer.threshold())
            .field("locations", &self.windows.locations())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}
