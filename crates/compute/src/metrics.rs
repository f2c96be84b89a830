use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use hydrowatch_notify::AlertOutcome;

/// Detection counters, updated on every ingested reading.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectorMetrics {
    /// Readings passed to `detect`.
    pub readings_ingested: u64,
    /// Readings refused as malformed.
    pub readings_rejected: u64,
    /// Full windows that were scored.
    pub windows_scored: u64,
    /// Scored windows whose error exceeded the threshold.
    pub anomalies_detected: u64,
    pub alerts_sent: u64,
    pub alerts_skipped: u64,
    pub alerts_failed: u64,
    /// Score of the most recently scored window.
    pub last_score: Option<f64>,
    pub last_scored_at: Option<DateTime<Utc>>,
    /// Average model inference plus scoring time in microseconds.
    pub avg_inference_us: f64,

    #[serde(skip)]
    total_inference_us: f64,
}

impl DetectorMetrics {
    pub fn record_ingest(&mut self) {
        self.readings_ingested += 1;
    }

    pub fn record_rejected(&mut self) {
        self.readings_rejected += 1;
    }

    /// Record one scored window and how long scoring took.
    pub fn record_score(&mut self, score: f64, is_anomaly: bool, elapsed: Duration) {
        self.windows_scored += 1;
        if is_anomaly {
            self.anomalies_detected += 1;
        }
        self.last_score = Some(score);
        self.last_scored_at = Some(Utc::now());
        self.total_inference_us += elapsed.as_micros() as f64;
        self.avg_inference_us = self.total_inference_us / self.windows_scored as f64;
    }

    pub fn record_alert(&mut self, outcome: &AlertOutcome) {
        match outcome {
            AlertOutcome::Sent => self.alerts_sent += 1,
            AlertOutcome::Skipped { .. } => self.alerts_skipped += 1,
            AlertOutcome::Failed { .. } => self.alerts_failed += 1,
        }
    }
}
