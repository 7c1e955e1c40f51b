//! Request validation for `/predict`.
//!
//! Each step returns the first failure it finds, so errors are reported in
//! schema order and no inference runs on a rejected record.

use loan_structs::{ApplicantRecord, CIBIL_SCORE_RANGE, FEATURES, FeatureKind};
use serde_json::{Map, Value};

/// Reasons a request body is refused before inference.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid data format: {field} must be {expected}, got {found}")]
    InvalidType {
        field: &'static str,
        expected: FeatureKind,
        found: String,
    },

    #[error("CIBIL score must be between 300 and 900")]
    CibilScoreOutOfRange,

    #[error("Loan term must be positive")]
    NonPositiveLoanTerm,

    #[error("Loan amount must be positive")]
    NonPositiveLoanAmount,
}

/// Parses a request body into a JSON object.
///
/// # Errors
///
/// Returns an error if the body is not JSON or not an object.
pub fn parse_body(body: &[u8]) -> Result<Map<String, Value>, ValidationError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationError::NotAnObject),
        Err(e) => Err(ValidationError::InvalidJson(e.to_string())),
    }
}

/// Runs presence, type and range checks on a request object.
///
/// # Errors
///
/// Returns the first failed check.
pub fn validate_record(body: &Map<String, Value>) -> Result<ApplicantRecord, ValidationError> {
    check_required_fields(body)?;
    let record = convert_fields(body)?;
    check_ranges(&record)?;
    Ok(record)
}

/// Fails on the first schema field absent from the body.
fn check_required_fields(body: &Map<String, Value>) -> Result<(), ValidationError> {
    match FEATURES.iter().find(|f| !body.contains_key(f.name)) {
        Some(feature) => Err(ValidationError::MissingField(feature.name)),
        None => Ok(()),
    }
}

/// Converts each field with the parser of its declared kind, in schema order.
fn convert_fields(body: &Map<String, Value>) -> Result<ApplicantRecord, ValidationError> {
    Ok(ApplicantRecord {
        no_of_dependents: integer_field(body, "no_of_dependents")?,
        income_annum: real_field(body, "income_annum")?,
        loan_amount: real_field(body, "loan_amount")?,
        loan_term: integer_field(body, "loan_term")?,
        cibil_score: integer_field(body, "cibil_score")?,
        residential_assets_value: real_field(body, "residential_assets_value")?,
        commercial_assets_value: real_field(body, "commercial_assets_value")?,
    })
}

fn integer_field(body: &Map<String, Value>, name: &'static str) -> Result<i64, ValidationError> {
    convert_field(body, name, FeatureKind::Integer, to_integer)
}

fn real_field(body: &Map<String, Value>, name: &'static str) -> Result<f64, ValidationError> {
    convert_field(body, name, FeatureKind::Real, to_real)
}

fn convert_field<T>(
    body: &Map<String, Value>,
    name: &'static str,
    kind: FeatureKind,
    convert: fn(&Value) -> Option<T>,
) -> Result<T, ValidationError> {
    let raw = body.get(name).ok_or(ValidationError::MissingField(name))?;
    convert(raw).ok_or_else(|| ValidationError::InvalidType {
        field: name,
        expected: kind,
        found: raw.to_string(),
    })
}

fn check_ranges(record: &ApplicantRecord) -> Result<(), ValidationError> {
    if !CIBIL_SCORE_RANGE.contains(&record.cibil_score) {
        return Err(ValidationError::CibilScoreOutOfRange);
    }
    if record.loan_term <= 0 {
        return Err(ValidationError::NonPositiveLoanTerm);
    }
    if record.loan_amount <= 0.0 {
        return Err(ValidationError::NonPositiveLoanAmount);
    }
    Ok(())
}

/// Accepts JSON integers, integral floats and integer strings.
fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn integral(v: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    let in_range = v >= i64::MIN as f64 && v < i64::MAX as f64;
    (v.is_finite() && v.fract() == 0.0 && in_range).then_some(v as i64)
}

/// Accepts JSON numbers and finite numeric strings.
fn to_real(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn valid_body() -> Map<String, Value> {
        match json!({
            "no_of_dependents": 2,
            "income_annum": 9_600_000,
            "loan_amount": 29_900_000,
            "loan_term": 12,
            "cibil_score": 778,
            "residential_assets_value": 2_400_000,
            "commercial_assets_value": 17_600_000,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn with(field: &str, value: Value) -> Map<String, Value> {
        let mut body = valid_body();
        body.insert(field.to_string(), value);
        body
    }

    #[test]
    fn test_valid_record() {
        let record = validate_record(&valid_body()).unwrap();
        assert_eq!(record.cibil_score, 778);
        assert_eq!(record.loan_term, 12);
        assert!((record.loan_amount - 29_900_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_each_missing_field_is_named() {
        for feature in &FEATURES {
            let mut body = valid_body();
            body.remove(feature.name);

            let err = validate_record(&body).unwrap_err();
            assert_eq!(err.to_string(), format!("Missing required field: {}", feature.name));
        }
    }

    #[test]
    fn test_missing_fields_reported_in_schema_order() {
        let mut body = valid_body();
        body.remove("cibil_score");
        body.remove("income_annum");

        let err = validate_record(&body).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField("income_annum")));
    }

    #[test]
    fn test_missing_field_wins_over_bad_type() {
        let mut body = with("no_of_dependents", json!("many"));
        body.remove("commercial_assets_value");

        let err = validate_record(&body).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField("commercial_assets_value")));
    }

    #[test]
    fn test_numeric_strings_are_converted() {
        let mut body = with("cibil_score", json!(" 650 "));
        body.insert("income_annum".to_string(), json!("1250000.5"));
        body.insert("loan_term".to_string(), json!(10.0));

        let record = validate_record(&body).unwrap();
        assert_eq!(record.cibil_score, 650);
        assert_eq!(record.loan_term, 10);
        assert!((record.income_annum - 1_250_000.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_types() {
        for (field, value) in [
            ("no_of_dependents", json!("two")),
            ("cibil_score", json!(700.5)),
            ("loan_term", json!(null)),
            ("income_annum", json!(true)),
            ("loan_amount", json!([1, 2])),
            ("residential_assets_value", json!("NaN")),
            ("commercial_assets_value", json!({"value": 1})),
        ] {
            let err = validate_record(&with(field, value)).unwrap_err();
            let message = err.to_string();
            assert!(message.starts_with("Invalid data format:"), "{message}");
            assert!(message.contains(field), "{message}");
        }
    }

    #[test]
    fn test_type_error_wins_over_range_error() {
        let mut body = with("cibil_score", json!(100));
        body.insert("loan_amount".to_string(), json!("lots"));

        let err = validate_record(&body).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidType { field: "loan_amount", .. }));
    }

    #[test]
    fn test_cibil_score_bounds() {
        for score in [300, 900] {
            assert!(validate_record(&with("cibil_score", json!(score))).is_ok());
        }
        for score in [299, 901] {
            let err = validate_record(&with("cibil_score", json!(score))).unwrap_err();
            assert_eq!(err.to_string(), "CIBIL score must be between 300 and 900");
        }
    }

    #[test]
    fn test_loan_term_and_amount_must_be_positive() {
        assert!(validate_record(&with("loan_term", json!(1))).is_ok());
        assert!(validate_record(&with("loan_amount", json!(0.01))).is_ok());

        for term in [0, -5] {
            let err = validate_record(&with("loan_term", json!(term))).unwrap_err();
            assert_eq!(err.to_string(), "Loan term must be positive");
        }
        for amount in [0.0, -1.0] {
            let err = validate_record(&with("loan_amount", json!(amount))).unwrap_err();
            assert_eq!(err.to_string(), "Loan amount must be positive");
        }
    }

    #[test]
    fn test_range_checks_run_in_order() {
        let mut body = with("loan_term", json!(0));
        body.insert("cibil_score".to_string(), json!(1000));

        let err = validate_record(&body).unwrap_err();
        assert!(matches!(err, ValidationError::CibilScoreOutOfRange));
    }

    #[test]
    fn test_parse_body() {
        assert!(parse_body(br#"{"a": 1}"#).is_ok());
        assert!(matches!(parse_body(b"[1, 2]"), Err(ValidationError::NotAnObject)));
        assert!(matches!(parse_body(b"{oops"), Err(ValidationError::InvalidJson(_))));
        assert!(matches!(parse_body(b""), Err(ValidationError::InvalidJson(_))));
    }

    #[test]
    fn test_fields_use_their_declared_kind() {
        for feature in &FEATURES {
            let err = validate_record(&with(feature.name, json!("x"))).unwrap_err();
            match err {
                ValidationError::InvalidType {
                    field, expected, ..
                } => {
                    assert_eq!(field, feature.name);
                    assert_eq!(expected, feature.kind);
                }
                other => panic!("unexpected error for {}: {other}", feature.name),
            }
        }
    }

    #[test]
    fn test_fractional_integer_is_not_truncated() {
        for field in ["no_of_dependents", "loan_term", "cibil_score"] {
            let err = validate_record(&with(field, json!("12.5"))).unwrap_err();
            assert!(
                matches!(
                    err,
                    ValidationError::InvalidType {
                        field: f,
                        expected: FeatureKind::Integer,
                        ..
                    } if f == field
                ),
                "{err}"
            );
        }
    }

    #[test]
    fn test_first_invalid_field_in_schema_order() {
        let mut body = valid_body();
        for feature in &FEATURES {
            body.insert(feature.name.to_string(), json!(null));
        }

        let err = validate_record(&body).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidType { field, .. } if field == FEATURES[0].name
        ));
    }
}
