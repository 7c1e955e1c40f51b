//! Label encoding for categorical columns.

use std::collections::BTreeMap;

use dataset_loader::ParsedDataset;
use loan_structs::CATEGORICAL_COLUMNS;
use serde::{Deserialize, Serialize};

use crate::FeatureError;

/// Maps each distinct category of a column to a stable small integer.
///
/// Codes are assigned in sorted order of the category text and are fixed
/// once fitted. There is no bucket for unknown categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

/// Fitted encoders keyed by column name.
pub type LabelEncoders = BTreeMap<String, LabelEncoder>;

impl LabelEncoder {
    /// Fits an encoder on the given values.
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut classes: Vec<String> = values.into_iter().map(str::to_string).collect();
        classes.sort_unstable();
        classes.dedup();
        Self { classes }
    }

    /// Returns the known categories ordered by code.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Returns the code of a category, or `None` if it was not seen at fit time.
    #[must_use]
    pub fn encode(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .ok()
    }

    /// Returns the category behind a code.
    #[must_use]
    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }
}

/// Fits one encoder per categorical column over every row of the dataset.
///
/// # Errors
///
/// Returns an error if the dataset has no rows.
pub fn fit_label_encoders(dataset: &ParsedDataset) -> Result<LabelEncoders, FeatureError> {
    if dataset.is_empty() {
        return Err(FeatureError::Empty);
    }

    Ok(CATEGORICAL_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, &column)| {
            let encoder =
                LabelEncoder::fit(dataset.rows.iter().map(|row| row.categorical[i].as_str()));
            (column.to_string(), encoder)
        })
        .collect())
}

/// Per-code row counts of each categorical column, keyed by column name.
pub type CategoryCounts = BTreeMap<String, Vec<usize>>;

/// Encodes every categorical cell and counts the rows per code.
///
/// # Errors
///
/// Returns an error if a column has no encoder or a value was not seen
/// when the encoders were fitted.
pub fn category_counts(
    dataset: &ParsedDataset,
    encoders: &LabelEncoders,
) -> Result<CategoryCounts, FeatureError> {
    let mut counts = CategoryCounts::new();
    for (i, &column) in CATEGORICAL_COLUMNS.iter().enumerate() {
        let Some(encoder) = encoders.get(column) else {
            return Err(FeatureError::MissingEncoder(column));
        };
        let mut column_counts = vec![0; encoder.classes().len()];
        for row in &dataset.rows {
            let value = row.categorical[i].as_str();
            let code = encoder.encode(value).ok_or_else(|| FeatureError::UnseenCategory {
                column: column.to_string(),
                value: value.to_string(),
            })?;
            column_counts[code] += 1;
        }
        counts.insert(column.to_string(), column_counts);
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_sorted_order() {
        let encoder = LabelEncoder::fit(["Not Graduate", "Graduate", "Graduate"]);
        assert_eq!(encoder.classes(), ["Graduate", "Not Graduate"]);
        assert_eq!(encoder.encode("Graduate"), Some(0));
        assert_eq!(encoder.encode("Not Graduate"), Some(1));
        assert_eq!(encoder.decode(1), Some("Not Graduate"));
        assert_eq!(encoder.decode(2), None);
    }

    fn dataset(education: &[&str]) -> ParsedDataset {
        ParsedDataset {
            rows: education
                .iter()
                .map(|&value| dataset_loader::LoanApplication {
                    loan_id: None,
                    features: [Some(1.0); loan_structs::FEATURE_COUNT],
                    categorical: [value.to_string(), "No".to_string()],
                    loan_status: loan_structs::LoanStatus::Approved,
                })
                .collect(),
        }
    }

    #[test]
    fn test_category_counts() {
        let data = dataset(&["Graduate", "Not Graduate", "Graduate"]);
        let encoders = fit_label_encoders(&data).unwrap();

        let counts = category_counts(&data, &encoders).unwrap();
        assert_eq!(counts["education"], [2, 1]);
        assert_eq!(counts["self_employed"], [3]);
    }

    #[test]
    fn test_unseen_category() {
        let encoders = fit_label_encoders(&dataset(&["Graduate"])).unwrap();
        let err = category_counts(&dataset(&["Graduate", "Not Graduate"]), &encoders).unwrap_err();
        assert!(matches!(
            err,
            FeatureError::UnseenCategory { ref column, ref value }
                if column == "education" && value == "Not Graduate"
        ));

        let mut partial = encoders;
        partial.remove("self_employed");
        let err = category_counts(&dataset(&["Graduate"]), &partial).unwrap_err();
        assert!(matches!(err, FeatureError::MissingEncoder("self_employed")));
    }

    #[test]
    fn test_serializes_as_class_list() {
        let encoder = LabelEncoder::fit(["Yes", "No"]);
        let json = serde_json::to_value(&encoder).unwrap();
        assert_eq!(json, serde_json::json!(["No", "Yes"]));

        let back: LabelEncoder = serde_json::from_value(json).unwrap();
        assert_eq!(back, encoder);
    }
}
