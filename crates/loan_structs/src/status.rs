use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Outcome of a loan application.
///
/// Class code 1 is the positive class (`Approved`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, strum::Display,
)]
pub enum LoanStatus {
    Rejected,
    Approved,
}

impl LoanStatus {
    /// Both classes ordered by class code.
    pub const ALL: [Self; 2] = [Self::Rejected, Self::Approved];

    /// Returns the binary class code.
    #[must_use]
    pub const fn class(self) -> u8 {
        match self {
            Self::Rejected => 0,
            Self::Approved => 1,
        }
    }
}

impl From<u8> for LoanStatus {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Approved,
            _ => Self::Rejected,
        }
    }
}

impl FromStr for LoanStatus {
    type Err = anyhow::Error;

    /// Parses a dataset label. Surrounding whitespace and case are ignored.
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "approved" | "1" => Ok(Self::Approved),
            "rejected" | "0" => Ok(Self::Rejected),
            _ => Err(anyhow::anyhow!("Invalid loan status: {s}")),
        }
    }
}

/// Result of classifying a single applicant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionResult {
    pub loan_status: LoanStatus,
    /// Estimated probability of approval, when the classifier provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_confidence: Option<f64>,
}
