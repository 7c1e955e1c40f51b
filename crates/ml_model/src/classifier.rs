//! Inference over exported model parameters.

use loan_structs::{FEATURE_COUNT, LoanStatus, PredictionResult};
use serde::{Deserialize, Serialize};

/// Errors raised while classifying a feature vector.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("Model produced a non-finite decision value ({0})")]
    NonFinite(f64),
}

/// Parameters of a linear decision function `w·x + b`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LinearWeights {
    pub weights: [f64; FEATURE_COUNT],
    pub bias: f64,
}

impl LinearWeights {
    /// Evaluates the decision function on a scaled feature vector.
    #[must_use]
    pub fn decision_function(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        self.weights
            .iter()
            .zip(features)
            .fold(self.bias, |acc, (w, x)| w.mul_add(*x, acc))
    }
}

/// A fitted binary classifier.
///
/// Whether a probability estimate is available is part of the variant, so
/// it is settled once when the artifact is loaded.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    /// Logistic regression; exposes the approval probability.
    Logistic(LinearWeights),
    /// Decision-only linear classifier; no probability estimate.
    Linear(LinearWeights),
}

impl Classifier {
    /// Returns true if predictions carry an approval confidence.
    #[must_use]
    pub const fn supports_probability(&self) -> bool {
        matches!(self, Self::Logistic(_))
    }

    /// Returns the underlying linear parameters.
    #[must_use]
    pub const fn weights(&self) -> &LinearWeights {
        match self {
            Self::Logistic(w) | Self::Linear(w) => w,
        }
    }

    /// Classifies a scaled feature vector.
    ///
    /// A positive decision value means `Approved`.
    ///
    /// # Errors
    ///
    /// Returns an error if the decision value is NaN or infinite.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> Result<PredictionResult, PredictError> {
        let z = self.weights().decision_function(features);
        if !z.is_finite() {
            return Err(PredictError::NonFinite(z));
        }

        let loan_status = if z > 0.0 {
            LoanStatus::Approved
        } else {
            LoanStatus::Rejected
        };

        let approval_confidence = match self {
            Self::Logistic(_) => Some(sigmoid(z)),
            Self::Linear(_) => None,
        };

        Ok(PredictionResult {
            loan_status,
            approval_confidence,
        })
    }
}

/// Numerically stable logistic function.
#[must_use]
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
