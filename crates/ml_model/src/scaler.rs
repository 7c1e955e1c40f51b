//! Standardization of raw features.

use loan_structs::FEATURE_COUNT;
use serde::{Deserialize, Serialize};

/// Rescales each feature to zero mean and unit variance.
///
/// Statistics are fixed at fit time and replayed unchanged at inference.
/// A constant column gets a scale of 1 so it maps to zero instead of NaN.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StandardScaler {
    pub mean: [f64; FEATURE_COUNT],
    pub scale: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    /// Fits the scaler on raw feature rows using the population variance.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no rows.
    pub fn fit<'a>(
        rows: impl IntoIterator<Item = &'a [f64; FEATURE_COUNT]> + Clone,
    ) -> anyhow::Result<Self> {
        let mut count = 0usize;
        let mut sum = [0.0; FEATURE_COUNT];
        for row in rows.clone() {
            count += 1;
            for (acc, value) in sum.iter_mut().zip(row) {
                *acc += value;
            }
        }

        if count == 0 {
            anyhow::bail!("Cannot fit a scaler on zero rows");
        }

        let n = count as f64;
        let mean = sum.map(|s| s / n);

        let mut squares = [0.0; FEATURE_COUNT];
        for row in rows {
            for ((acc, value), m) in squares.iter_mut().zip(row).zip(&mean) {
                *acc += (value - m).powi(2);
            }
        }

        let scale = squares.map(|sq| {
            let std = (sq / n).sqrt();
            if std.is_finite() && std > 0.0 { std } else { 1.0 }
        });

        Ok(Self { mean, scale })
    }

    /// Applies the fitted transform to one raw feature vector.
    #[must_use]
    pub fn transform(&self, features: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = (features[i] - self.mean[i]) / self.scale[i];
        }
        out
    }
}
