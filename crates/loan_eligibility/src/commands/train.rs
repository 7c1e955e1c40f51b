//! Train command - fits the model on a CSV dataset and writes the artifact.

use std::path::Path;

use anyhow::{Context, Result};
use burn::backend::{Autodiff, NdArray};
use dataset_loader::load_dataset;
use feature_extractor::{extract_training_data, train_test_split};
use ml_model::{
    Classifier, ClassificationReport, ModelArtifact, TrainingConfig, TrainingOutput, evaluate,
};
use loan_structs::FEATURES;
use tracing::{debug, info};

use super::init_device;

type Backend = Autodiff<NdArray>;

/// Outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub report: ClassificationReport,
    pub output: TrainingOutput,
    /// Loss weight per class code, `[rejected, approved]`.
    pub class_weights: [f64; 2],
    pub train_samples: usize,
    pub test_samples: usize,
}

/// Runs the train command.
///
/// # Arguments
///
/// * `data_path` - CSV dataset to train on
/// * `output_dir` - Directory the artifact files are written to
/// * `config` - Training configuration
/// * `decision_only` - Export a classifier without probability estimates
///
/// # Errors
///
/// Returns an error if loading, training or saving fails.
pub fn run(
    data_path: &Path,
    output_dir: &Path,
    config: &TrainingConfig,
    decision_only: bool,
) -> Result<TrainSummary> {
    info!(data = %data_path.display(), "Starting training");

    let dataset = load_dataset(data_path)
        .with_context(|| format!("Failed to load dataset {}", data_path.display()))?;

    let prepared = extract_training_data(&dataset).context("Failed to prepare features")?;
    for (feature, median) in FEATURES.iter().zip(&prepared.medians) {
        debug!(feature = feature.name, median, "Imputation median");
    }
    for (column, counts) in &prepared.category_counts {
        let Some(encoder) = prepared.encoders.get(column) else {
            continue;
        };
        for (code, count) in counts.iter().enumerate() {
            debug!(column = %column, category = encoder.decode(code), count, "Category count");
        }
    }

    let (train_data, test_data) =
        train_test_split(&prepared.data, config.test_ratio, config.seed)?;
    info!(
        train = train_data.len(),
        test = test_data.len(),
        "Split dataset"
    );

    let device = init_device();
    info!(epochs = config.epochs, "Training model");
    let fitted = ml_model::fit::<Backend>(&train_data, config, &device)?;
    info!(
        rejected_weight = fitted.class_weights[0],
        approved_weight = fitted.class_weights[1],
        "Applied balanced class weights"
    );

    let classifier = if decision_only {
        Classifier::Linear(fitted.weights)
    } else {
        Classifier::Logistic(fitted.weights)
    };

    let report = evaluate(&classifier, &fitted.scaler, &test_data)?;
    info!(accuracy = report.accuracy, "Evaluated on held-out split");
    println!("Model Accuracy: {:.4}", report.accuracy);
    println!("\nClassification Report:\n{report}");

    let artifact = ModelArtifact {
        classifier,
        scaler: fitted.scaler,
        encoders: prepared.encoders,
    };
    artifact
        .save(output_dir)
        .with_context(|| format!("Failed to save artifact to {}", output_dir.display()))?;

    info!(
        output = %output_dir.display(),
        loss = fitted.output.final_train_loss,
        epochs = fitted.output.epochs_completed,
        stopped_early = fitted.output.stopped_early,
        "Training complete"
    );

    Ok(TrainSummary {
        report,
        output: fitted.output,
        class_weights: fitted.class_weights,
        train_samples: train_data.len(),
        test_samples: test_data.len(),
    })
}
