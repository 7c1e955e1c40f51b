use serde::{Deserialize, Serialize};

use crate::FEATURE_COUNT;

/// A single loan applicant, already validated and typed.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ApplicantRecord {
    pub no_of_dependents: i64,
    pub income_annum: f64,
    pub loan_amount: f64,
    /// Months or years, depending on the dataset the model was trained on.
    pub loan_term: i64,
    pub cibil_score: i64,
    pub residential_assets_value: f64,
    pub commercial_assets_value: f64,
}

impl ApplicantRecord {
    /// Returns the raw (unscaled) feature vector in schema order.
    #[must_use]
    pub fn to_features(&self) -> [f64; FEATURE_COUNT] {
        [
            self.no_of_dependents as f64,
            self.income_annum,
            self.loan_amount,
            self.loan_term as f64,
            self.cibil_score as f64,
            self.residential_assets_value,
            self.commercial_assets_value,
        ]
    }
}
