use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::HydroError;

/// Number of model features carried by a reading.
pub const FEATURE_DIM: usize = 5;

/// Feature labels in model column order.
pub const FEATURE_NAMES: [&str; FEATURE_DIM] = [
    "water_level",
    "temperature",
    "rainfall",
    "ph",
    "dissolved_oxygen",
];

/// The five model features of a reading, in fixed column order.
pub type FeatureVector = [f64; FEATURE_DIM];

/// A single telemetry sample reported by a station.
///
/// Identity is `(latitude, longitude, timestamp)`. Readings are never mutated
/// once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub water_level: f64,
    pub temperature: f64,
    pub rainfall: f64,
    pub ph: f64,
    pub dissolved_oxygen: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl Reading {
    /// Parse a reading from a JSON object, e.g. a station upload payload.
    pub fn from_json(raw: &str) -> Result<Self, HydroError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Feature vector in `FEATURE_NAMES` order.
    pub fn features(&self) -> FeatureVector {
        [
            self.water_level,
            self.temperature,
            self.rainfall,
            self.ph,
            self.dissolved_oxygen,
        ]
    }

    pub fn location(&self) -> LocationKey {
        LocationKey::new(self.latitude, self.longitude)
    }

    /// Reject readings the pipeline cannot score: non-finite values or
    /// coordinates outside the valid range.
    pub fn validate(&self) -> Result<(), HydroError> {
        for (name, value) in FEATURE_NAMES.iter().zip(self.features()) {
            if !value.is_finite() {
                return Err(HydroError::InvalidReading(format!(
                    "{name} is not a finite number ({value})"
                )));
            }
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(HydroError::InvalidReading(format!(
                "latitude out of range: {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(HydroError::InvalidReading(format!(
                "longitude out of range: {}",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// Accepts RFC 3339 timestamps as well as naive ISO-8601 date-times, which
/// are taken to be UTC. A bare date means midnight UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, HydroError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(HydroError::InvalidReading(format!(
        "unrecognised timestamp: {raw}"
    )))
}

/// Hashable station location derived from exact coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationKey {
    lat_bits: u64,
    lng_bits: u64,
}

impl LocationKey {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        // -0.0 and 0.0 are the same place.
        let norm = |v: f64| if v == 0.0 { 0.0f64 } else { v };
        Self {
            lat_bits: norm(latitude).to_bits(),
            lng_bits: norm(longitude).to_bits(),
        }
    }

    pub fn latitude(&self) -> f64 {
        f64::from_bits(self.lat_bits)
    }

    pub fn longitude(&self) -> f64 {
        f64::from_bits(self.lng_bits)
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude(), self.longitude())
    }
}
