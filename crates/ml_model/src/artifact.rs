//! Persistence of the fitted model, scaler and label encoders.

use std::fs;
use std::path::{Path, PathBuf};

use feature_extractor::LabelEncoders;
use loan_structs::{ApplicantRecord, PredictionResult, feature_names};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Classifier, PredictError, StandardScaler};

/// File holding the classifier parameters.
pub const MODEL_FILE: &str = "loan_model.json";
/// File holding the scaler statistics.
pub const SCALER_FILE: &str = "scaler.json";
/// File holding the categorical encoders.
pub const ENCODERS_FILE: &str = "label_encoders.json";

/// Version written into the model file.
pub const FORMAT_VERSION: u32 = 1;

/// Errors raised while reading or writing artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed artifact {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported model format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Feature list in {file} does not match the schema: {found:?}")]
    FeatureMismatch {
        file: &'static str,
        found: Vec<String>,
    },
}

#[derive(Deserialize, Serialize)]
struct ModelFile {
    format_version: u32,
    features: Vec<String>,
    classifier: Classifier,
}

#[derive(Deserialize, Serialize)]
struct ScalerFile {
    features: Vec<String>,
    #[serde(flatten)]
    scaler: StandardScaler,
}

/// Everything needed to serve predictions.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub classifier: Classifier,
    pub scaler: StandardScaler,
    /// Fitted for the categorical columns; not consumed at inference.
    pub encoders: LabelEncoders,
}

impl ModelArtifact {
    /// Writes the three artifact files into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or any file cannot be written.
    pub fn save(&self, dir: &Path) -> Result<(), ArtifactError> {
        fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        write_json(
            &dir.join(MODEL_FILE),
            &ModelFile {
                format_version: FORMAT_VERSION,
                features: feature_names(),
                classifier: self.classifier.clone(),
            },
        )?;
        write_json(
            &dir.join(SCALER_FILE),
            &ScalerFile {
                features: feature_names(),
                scaler: self.scaler.clone(),
            },
        )?;
        write_json(&dir.join(ENCODERS_FILE), &self.encoders)?;

        info!(dir = %dir.display(), "Saved model artifact");
        Ok(())
    }

    /// Loads an artifact from `dir`.
    ///
    /// The model and scaler files are required; a missing encoders file
    /// yields empty encoders.
    ///
    /// # Errors
    ///
    /// Returns an error if a required file is missing or malformed, or if
    /// the stored feature order differs from the schema.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let model: ModelFile = read_json(&dir.join(MODEL_FILE))?;
        if model.format_version != FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: model.format_version,
                expected: FORMAT_VERSION,
            });
        }
        check_features(MODEL_FILE, model.features)?;

        let scaler: ScalerFile = read_json(&dir.join(SCALER_FILE))?;
        check_features(SCALER_FILE, scaler.features)?;

        let encoders = match read_json(&dir.join(ENCODERS_FILE)) {
            Ok(encoders) => encoders,
            Err(ArtifactError::NotFound(path)) => {
                debug!(path = %path.display(), "No label encoders stored");
                LabelEncoders::new()
            }
            Err(e) => return Err(e),
        };

        info!(
            dir = %dir.display(),
            probability = model.classifier.supports_probability(),
            "Loaded model artifact"
        );

        Ok(Self {
            classifier: model.classifier,
            scaler: scaler.scaler,
            encoders,
        })
    }

    /// Scales a record and classifies it.
    ///
    /// # Errors
    ///
    /// Returns an error if the model output is not finite.
    pub fn predict(&self, record: &ApplicantRecord) -> Result<PredictionResult, PredictError> {
        let scaled = self.scaler.transform(&record.to_features());
        self.classifier.predict(&scaled)
    }
}

fn check_features(file: &'static str, found: Vec<String>) -> Result<(), ArtifactError> {
    if found == feature_names() {
        Ok(())
    } else {
        Err(ArtifactError::FeatureMismatch { file, found })
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let json = serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let contents = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ArtifactError::NotFound(path.to_path_buf())
        } else {
            ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    serde_json::from_str(&contents).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}
