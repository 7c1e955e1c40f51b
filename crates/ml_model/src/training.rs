//! Training logic for the logistic model.

use burn::data::dataset::Dataset;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use feature_extractor::{TrainingData, shuffle_indices};
use tracing::{debug, info};

use crate::dataset::{LoanBatcher, LoanDataset};
use crate::{LinearWeights, LogisticModel, StandardScaler, TrainingConfig};

/// Output from training.
#[derive(Debug, Clone)]
pub struct TrainingOutput {
    /// Mean weighted loss of the last epoch.
    pub final_train_loss: f32,
    /// Number of epochs completed.
    pub epochs_completed: usize,
    /// Whether training stopped before `epochs` because the loss stalled.
    pub stopped_early: bool,
}

/// A fitted scaler and model parameters.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub scaler: StandardScaler,
    pub weights: LinearWeights,
    pub class_weights: [f64; 2],
    pub output: TrainingOutput,
}

/// Computes balanced class weights, `n_samples / (2 * n_class)`.
///
/// # Errors
///
/// Returns an error if either class has no samples.
pub fn balanced_class_weights(counts: [usize; 2]) -> anyhow::Result<[f64; 2]> {
    if counts.contains(&0) {
        anyhow::bail!(
            "Both classes are required for training (rejected: {}, approved: {})",
            counts[0],
            counts[1]
        );
    }

    let total = (counts[0] + counts[1]) as f64;
    Ok(counts.map(|c| total / (2.0 * c as f64)))
}

/// Fits the scaler and the logistic model on the training split.
///
/// The scaler sees only `train`; the model is trained on the scaled rows
/// with class-balanced weights.
///
/// # Errors
///
/// Returns an error if the data is empty, single-class, or training fails.
pub fn fit<B: AutodiffBackend>(
    train_data: &TrainingData,
    config: &TrainingConfig,
    device: &B::Device,
) -> anyhow::Result<FittedModel> {
    let scaler = StandardScaler::fit(train_data.samples.iter().map(|s| &s.features))?;
    let class_weights = balanced_class_weights(train_data.class_counts())?;
    debug!(?class_weights, "Computed class weights");

    let dataset = LoanDataset::new(train_data, &scaler, &class_weights);
    let mut model = LogisticModel::<B>::new(device);
    let output = train(&mut model, &dataset, config)?;
    let weights = model.to_weights()?;

    Ok(FittedModel {
        scaler,
        weights,
        class_weights,
        output,
    })
}

/// Trains the model on the provided data.
///
/// Uses mini-batch Adam with L2 weight decay on the class-weighted binary
/// cross-entropy. Stops early once the epoch loss stops improving by more
/// than `config.tolerance` for `config.patience` epochs.
///
/// # Arguments
///
/// * `model` - The model to train (will be modified in place).
/// * `dataset` - Scaled and weighted training items.
/// * `config` - Training configuration.
///
/// # Errors
///
/// Returns an error if the dataset is empty or the configuration is invalid.
pub fn train<B: AutodiffBackend>(
    model: &mut LogisticModel<B>,
    dataset: &LoanDataset,
    config: &TrainingConfig,
) -> anyhow::Result<TrainingOutput> {
    if dataset.is_empty() {
        anyhow::bail!("No training data provided");
    }
    if config.epochs == 0 || config.batch_size == 0 {
        anyhow::bail!("Epochs and batch size must be positive");
    }
    if !(config.learning_rate.is_finite() && config.learning_rate > 0.0) {
        anyhow::bail!("Learning rate must be positive, got {}", config.learning_rate);
    }

    let device = model.linear.weight.val().device();
    let batcher = LoanBatcher::<B>::new(device);

    let mut optimizer = AdamConfig::new()
        .with_weight_decay(Some(WeightDecayConfig::new(config.weight_decay)))
        .init();

    let num_samples = dataset.len();
    let mut indices: Vec<usize> = (0..num_samples).collect();

    let mut final_train_loss = 0.0;
    let mut best_loss = f64::MAX;
    let mut epochs_without_improvement = 0;

    for epoch in 0..config.epochs {
        let mut epoch_loss = 0.0;
        let mut weight_total = 0.0;

        shuffle_indices(&mut indices, config.seed.wrapping_add(epoch as u64));

        for batch_indices in indices.chunks(config.batch_size) {
            let items: Vec<_> = batch_indices
                .iter()
                .filter_map(|&i| dataset.get(i))
                .collect();

            if items.is_empty() {
                continue;
            }

            let batch_weight: f64 = items.iter().map(|item| f64::from(item.weight)).sum();
            let batch = batcher.batch(items);

            let logits = model.forward(batch.inputs);
            let loss = weighted_binary_cross_entropy(logits, batch.targets, batch.weights);

            epoch_loss += f64::from(scalar(&loss)) * batch_weight;
            weight_total += batch_weight;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, model);

            *model = optimizer.step(config.learning_rate, model.clone(), grads);
        }

        let mean_loss = if weight_total > 0.0 {
            epoch_loss / weight_total
        } else {
            0.0
        };
        final_train_loss = mean_loss as f32;

        if epoch % 10 == 0 {
            debug!(epoch = epoch + 1, loss = mean_loss, "Training progress");
        }

        if best_loss - mean_loss > config.tolerance {
            best_loss = mean_loss;
            epochs_without_improvement = 0;
        } else {
            epochs_without_improvement += 1;
            if epochs_without_improvement >= config.patience {
                info!(
                    epochs = epoch + 1,
                    loss = mean_loss,
                    "Loss stopped improving, ending training early"
                );
                return Ok(TrainingOutput {
                    final_train_loss,
                    epochs_completed: epoch + 1,
                    stopped_early: true,
                });
            }
        }
    }

    info!(epochs = config.epochs, loss = final_train_loss, "Training finished");

    Ok(TrainingOutput {
        final_train_loss,
        epochs_completed: config.epochs,
        stopped_early: false,
    })
}

/// Weighted mean of the binary cross-entropy computed from logits.
///
/// Uses `softplus(z) - y * z`, with softplus evaluated as
/// `max(z, 0) + ln(1 + exp(-|z|))` so large logits do not overflow.
fn weighted_binary_cross_entropy<B: Backend>(
    logits: Tensor<B, 2>,
    targets: Tensor<B, 2>,
    weights: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let softplus = logits.clone().clamp_min(0.0)
        + logits.clone().abs().neg().exp().add_scalar(1.0).log();
    let per_sample = softplus - targets * logits;

    (per_sample * weights.clone()).sum().div(weights.sum())
}

/// Reads a single-element tensor back as `f32`.
fn scalar<B: Backend>(tensor: &Tensor<B, 1>) -> f32 {
    tensor
        .clone()
        .into_data()
        .to_vec::<f32>()
        .ok()
        .and_then(|v| v.first().copied())
        .unwrap_or(0.0)
}
