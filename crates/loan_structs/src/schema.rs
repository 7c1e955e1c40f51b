//! The feature schema shared by training and serving.

/// Declared numeric type of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FeatureKind {
    Integer,
    Real,
}

/// A named model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub name: &'static str,
    pub kind: FeatureKind,
}

/// The number of features fed to the model.
pub const FEATURE_COUNT: usize = 7;

/// Model inputs in column order.
///
/// Training matrix columns, scaler statistics, model weights and request
/// validation all follow this order.
pub const FEATURES: [Feature; FEATURE_COUNT] = [
    Feature {
        name: "no_of_dependents",
        kind: FeatureKind::Integer,
    },
    Feature {
        name: "income_annum",
        kind: FeatureKind::Real,
    },
    Feature {
        name: "loan_amount",
        kind: FeatureKind::Real,
    },
    Feature {
        name: "loan_term",
        kind: FeatureKind::Integer,
    },
    Feature {
        name: "cibil_score",
        kind: FeatureKind::Integer,
    },
    Feature {
        name: "residential_assets_value",
        kind: FeatureKind::Real,
    },
    Feature {
        name: "commercial_assets_value",
        kind: FeatureKind::Real,
    },
];

/// Identifier column of the training dataset. Dropped before training.
pub const ID_COLUMN: &str = "loan_id";

/// Ground-truth label column of the training dataset.
pub const TARGET_COLUMN: &str = "loan_status";

/// Categorical columns that are label-encoded at training time.
pub const CATEGORICAL_COLUMNS: [&str; 2] = ["education", "self_employed"];

/// Inclusive range accepted for `cibil_score`.
pub const CIBIL_SCORE_RANGE: std::ops::RangeInclusive<i64> = 300..=900;

/// Returns the feature names in column order.
#[must_use]
pub fn feature_names() -> Vec<String> {
    FEATURES.iter().map(|f| f.name.to_string()).collect()
}

/// Returns the column index of a feature.
#[cfg(test)]
pub(crate) fn feature_index(name: &str) -> Option<usize> {
    FEATURES.iter().position(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_order() {
        let names = feature_names();
        assert_eq!(names.len(), FEATURE_COUNT);
        assert_eq!(names[0], "no_of_dependents");
        assert_eq!(names[4], "cibil_score");
        assert_eq!(names[6], "commercial_assets_value");
    }

    #[test]
    fn test_feature_index() {
        assert_eq!(feature_index("loan_term"), Some(3));
        assert_eq!(feature_index("loan_id"), None);
    }

    #[test]
    fn test_integer_features() {
        let integers: Vec<_> = FEATURES
            .iter()
            .filter(|f| f.kind == FeatureKind::Integer)
            .map(|f| f.name)
            .collect();
        assert_eq!(integers, ["no_of_dependents", "loan_term", "cibil_score"]);
        assert_eq!(FeatureKind::Integer.to_string(), "integer");
    }
}
