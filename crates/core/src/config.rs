use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::HydroError;
use crate::reading::FEATURE_DIM;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub detection: DetectionConfig,
    pub alert: AlertConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `HYDROWATCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("HYDROWATCH_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            detection: DetectionConfig::from_env_profiled(p),
            alert: AlertConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Reject detection parameters the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), HydroError> {
        self.detection.validate()
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  detection:   model={}, threshold={}, seq_len={}, features={}, latent={}",
            self.detection.model_path.display(),
            self.detection.threshold,
            self.detection.sequence_length,
            self.detection.feature_dim,
            self.detection.latent_size
        );
        tracing::info!(
            "  alert:       smtp={}:{}, tls={}, configured={}",
            self.alert.smtp_host,
            self.alert.smtp_port,
            self.alert.tls,
            self.alert.is_configured()
        );
    }

    /// Return a redacted view safe for diagnostics output (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "detection": {
                "model_path": self.detection.model_path,
                "threshold": self.detection.threshold,
                "sequence_length": self.detection.sequence_length,
                "feature_dim": self.detection.feature_dim,
                "latent_size": self.detection.latent_size,
                "seed": self.detection.seed,
            },
            "alert": {
                "smtp_host": self.alert.smtp_host,
                "smtp_port": self.alert.smtp_port,
                "tls": self.alert.tls,
                "sender": self.alert.sender,
                "recipient": self.alert.recipient,
                "configured": self.alert.is_configured(),
            },
        })
    }
}

// ── Detection ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Location of the trained reconstruction model artifact.
    pub model_path: PathBuf,
    /// Reconstruction error above which a window is anomalous.
    pub threshold: f64,
    pub sequence_length: usize,
    pub feature_dim: usize,
    pub latent_size: usize,
    /// Seed for the fallback model's weight initialiser.
    pub seed: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("lstm_autoencoder.json"),
            threshold: 0.1,
            sequence_length: 3,
            feature_dim: FEATURE_DIM,
            latent_size: 16,
            seed: 42,
        }
    }
}

impl DetectionConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            model_path: PathBuf::from(profiled_env_or(
                p,
                "MODEL_PATH",
                d.model_path.to_str().unwrap_or("lstm_autoencoder.json"),
            )),
            threshold: profiled_env_parse(p, "ANOMALY_THRESHOLD", d.threshold),
            sequence_length: profiled_env_parse(p, "SEQUENCE_LENGTH", d.sequence_length),
            feature_dim: profiled_env_parse(p, "FEATURE_DIM", d.feature_dim),
            latent_size: profiled_env_parse(p, "LATENT_SIZE", d.latent_size),
            seed: profiled_env_parse(p, "MODEL_SEED", d.seed),
        }
    }

    pub fn validate(&self) -> Result<(), HydroError> {
        if self.sequence_length == 0 {
            return Err(HydroError::Config(
                "sequence_length must be at least 1".to_string(),
            ));
        }
        if self.feature_dim != FEATURE_DIM {
            return Err(HydroError::Config(format!(
                "feature_dim must be {FEATURE_DIM} (readings carry {FEATURE_DIM} features), got {}",
                self.feature_dim
            )));
        }
        if self.latent_size == 0 {
            return Err(HydroError::Config(
                "latent_size must be at least 1".to_string(),
            ));
        }
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(HydroError::Config(format!(
                "threshold must be a non-negative number, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

// ── Alert delivery (SMTP) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub tls: bool,
    pub timeout_secs: u64,
    pub subject: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            sender: None,
            recipient: None,
            password: None,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            tls: true,
            timeout_secs: 10,
            subject: "DWLR Anomaly Alert".to_string(),
        }
    }
}

impl AlertConfig {
    fn from_env_profiled(p: &str) -> Self {
        let d = Self::default();
        Self {
            sender: profiled_env_opt(p, "SENDER_EMAIL"),
            recipient: profiled_env_opt(p, "RECEIVER_EMAIL"),
            password: profiled_env_opt(p, "EMAIL_PASSWORD"),
            smtp_host: profiled_env_or(p, "SMTP_HOST", &d.smtp_host),
            smtp_port: profiled_env_parse(p, "SMTP_PORT", d.smtp_port),
            tls: profiled_env_bool(p, "SMTP_TLS", d.tls),
            timeout_secs: profiled_env_parse(p, "SMTP_TIMEOUT_SECS", d.timeout_secs),
            subject: profiled_env_or(p, "ALERT_SUBJECT", &d.subject),
        }
    }

    /// Names of the delivery credentials that are not set.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.sender.is_none() {
            missing.push("SENDER_EMAIL");
        }
        if self.recipient.is_none() {
            missing.push("RECEIVER_EMAIL");
        }
        if self.password.is_none() {
            missing.push("EMAIL_PASSWORD");
        }
        missing
    }

    pub fn is_configured(&self) -> bool {
        self.missing_credentials().is_empty()
    }
}
