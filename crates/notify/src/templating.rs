//! Minijinja rendering of anomaly alert reports.
//!
//! The built-in template produces the plain-text report mailed to duty
//! officers. Callers may pass their own template string; a fresh
//! [`minijinja::Environment`] is created per render call.

use serde::Serialize;

use hydrowatch_core::Reading;

use crate::traits::NotifyError;

/// Plain-text report sent for an anomalous reading.
pub const DEFAULT_REPORT_TEMPLATE: &str = "ANOMALY DETECTED
Location: {{ location.latitude }}, {{ location.longitude }}
Timestamp: {{ timestamp }}
Water Level: {{ water_level }}
Temperature: {{ temperature }}
Rainfall: {{ rainfall }}
pH: {{ ph }}
Dissolved Oxygen: {{ dissolved_oxygen }}
Reconstruction Error: {{ score | round(4) }} (threshold {{ threshold }})";

#[derive(Debug, Clone, Serialize)]
pub struct LocationContext {
    pub latitude: f64,
    pub longitude: f64,
}

/// Values exposed to report templates.
#[derive(Debug, Clone, Serialize)]
pub struct AlertReport {
    pub location: LocationContext,
    /// `YYYY-MM-DD HH:MM:SS`, UTC.
    pub timestamp: String,
    pub water_level: f64,
    pub temperature: f64,
    pub rainfall: f64,
    pub ph: f64,
    pub dissolved_oxygen: f64,
    /// Reconstruction error of the window ending at this reading.
    pub score: f64,
    pub threshold: f64,
}

impl AlertReport {
    pub fn new(reading: &Reading, score: f64, threshold: f64) -> Self {
        Self {
            location: LocationContext {
                latitude: reading.latitude,
                longitude: reading.longitude,
            },
            timestamp: reading.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            water_level: reading.water_level,
            temperature: reading.temperature,
            rainfall: reading.rainfall,
            ph: reading.ph,
            dissolved_oxygen: reading.dissolved_oxygen,
            score,
            threshold,
        }
    }

    /// Render with [`DEFAULT_REPORT_TEMPLATE`].
    pub fn render(&self) -> Result<String, NotifyError> {
        TemplateRenderer::new().render(DEFAULT_REPORT_TEMPLATE, self)
    }
}

#[derive(Debug)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.add_filter("round", round_filter);
        env
    }

    /// Render a template string against a report.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Template`] if the template is invalid or
    /// rendering fails.
    pub fn render(&self, template_str: &str, report: &AlertReport) -> Result<String, NotifyError> {
        let env = Self::build_env();
        env.render_str(template_str, report)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Check template syntax without rendering.
    pub fn validate(&self, template_str: &str) -> Result<(), NotifyError> {
        let env = Self::build_env();
        env.template_from_str(template_str)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(())
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Round a float to N decimal places.
fn round_filter(value: f64, decimals: Option<u32>) -> String {
    let n = decimals.unwrap_or(0);
    format!("{:.prec$}", value, prec = n as usize)
}
