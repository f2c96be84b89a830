//! Per-window min-max feature scaling.
//!
//! Every call fits the column ranges on the window it is given and nothing
//! else, so one station's history never influences another's scaling.

use serde::Serialize;

use hydrowatch_core::{FeatureVector, Reading, FEATURE_DIM};

/// Feature rows scaled into `[0, 1]`, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledWindow {
    rows: Vec<FeatureVector>,
}

impl ScaledWindow {
    pub fn new(rows: Vec<FeatureVector>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row-major iterator over every scaled value.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().flat_map(|row| row.iter().copied())
    }
}

/// Scale each feature column of `window` to `(x - min) / (max - min)`.
///
/// A column whose values are all equal scales to 0 for every row.
pub fn transform(window: &[Reading]) -> ScaledWindow {
    let features: Vec<FeatureVector> = window.iter().map(Reading::features).collect();
    scale_rows(&features)
}

/// Same as [`transform`] on bare feature rows.
pub fn scale_rows(features: &[FeatureVector]) -> ScaledWindow {
    let mut min = [f64::INFINITY; FEATURE_DIM];
    let mut max = [f64::NEG_INFINITY; FEATURE_DIM];
    for row in features {
        for col in 0..FEATURE_DIM {
            min[col] = min[col].min(row[col]);
            max[col] = max[col].max(row[col]);
        }
    }

    let rows = features
        .iter()
        .map(|row| {
            let mut scaled = [0.0; FEATURE_DIM];
            for col in 0..FEATURE_DIM {
                let range = max[col] - min[col];
                if range > 0.0 {
                    scaled[col] = (row[col] - min[col]) / range;
                }
            }
            scaled
        })
        .collect();

    ScaledWindow { rows }
}
