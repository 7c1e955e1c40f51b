//! Predict command - classifies a single applicant offline.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use loan_structs::PredictionResult;
use ml_model::ModelArtifact;
use tracing::info;

use crate::server::{parse_body, validate_record};

/// Runs the predict command.
///
/// # Arguments
///
/// * `artifact_dir` - Directory holding the trained model
/// * `input` - JSON applicant record, or `-` to read it from stdin
///
/// # Errors
///
/// Returns an error if the artifact cannot be loaded, or the record is
/// unreadable or fails validation.
pub fn run(artifact_dir: &Path, input: &Path) -> Result<PredictionResult> {
    let artifact = ModelArtifact::load(artifact_dir)
        .with_context(|| format!("Failed to load model from {}", artifact_dir.display()))?;

    let body = read_input(input)?;
    let result = predict(&artifact, &body)?;

    info!(loan_status = %result.loan_status, "Prediction complete");

    println!("Loan status: {}", result.loan_status);
    if let Some(approved) = result.approval_confidence {
        println!("  approved: {approved:.4}");
        println!("  rejected: {:.4}", 1.0 - approved);
    }

    Ok(result)
}

/// Validates a raw JSON record and classifies it.
///
/// # Errors
///
/// Returns an error if the record fails validation or inference.
pub fn predict(artifact: &ModelArtifact, body: &[u8]) -> Result<PredictionResult> {
    let fields = parse_body(body)?;
    let record = validate_record(&fields)?;
    Ok(artifact.predict(&record)?)
}

fn read_input(input: &Path) -> Result<Vec<u8>> {
    if input == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read applicant record from stdin")?;
        Ok(buf)
    } else {
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))
    }
}
