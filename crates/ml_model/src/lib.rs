//! ML model crate for loan eligibility prediction.
//!
//! This crate uses the Burn deep learning framework to fit a logistic
//! regression on standardized applicant features. The fitted parameters
//! are exported into a plain [`Classifier`], which is what gets persisted
//! and served; inference needs no Burn backend.

use anyhow::Context;
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::prelude::*;
use loan_structs::FEATURE_COUNT;

mod artifact;
mod classifier;
mod dataset;
mod metrics;
mod scaler;
mod training;

pub use artifact::*;
pub use classifier::*;
pub use dataset::*;
pub use metrics::*;
pub use scaler::*;
pub use training::*;

/// Configuration for training the model.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Learning rate for the optimizer.
    pub learning_rate: f64,
    /// Maximum number of training epochs.
    pub epochs: usize,
    /// Batch size for training.
    pub batch_size: usize,
    /// L2 penalty applied through the optimizer.
    pub weight_decay: f32,
    /// Fraction of samples held out for evaluation.
    pub test_ratio: f64,
    /// Seed for the train/test split and batch shuffling.
    pub seed: u64,
    /// Minimum loss improvement that resets the early-stopping counter.
    pub tolerance: f64,
    /// Epochs without improvement before training stops.
    pub patience: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            epochs: 300,
            batch_size: 64,
            weight_decay: 1e-4,
            test_ratio: 0.2,
            seed: 42,
            tolerance: 1e-6,
            patience: 10,
        }
    }
}

/// Binary logistic regression as a single linear layer.
///
/// The forward pass returns logits; the sigmoid is folded into the loss
/// during training and into [`Classifier`] at inference time.
#[derive(Module, Debug)]
pub struct LogisticModel<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> LogisticModel<B> {
    /// Creates a zero-initialized model, so training runs are reproducible.
    pub fn new(device: &B::Device) -> Self {
        let linear = LinearConfig::new(FEATURE_COUNT, 1)
            .with_initializer(Initializer::Zeros)
            .init(device);

        Self { linear }
    }

    /// Forward pass through the network.
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor of shape [`batch_size`, `FEATURE_COUNT`]
    ///
    /// # Returns
    ///
    /// Tensor of shape [`batch_size`, 1] containing logits.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(input)
    }

    /// Copies the learned parameters out of the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensors cannot be read back.
    pub fn to_weights(&self) -> anyhow::Result<LinearWeights> {
        let weights: Vec<f32> = self
            .linear
            .weight
            .val()
            .into_data()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("Failed to read weights: {e:?}"))?;

        let bias: f32 = match &self.linear.bias {
            Some(bias) => bias
                .val()
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| anyhow::anyhow!("Failed to read bias: {e:?}"))?
                .first()
                .copied()
                .context("Bias tensor is empty")?,
            None => 0.0,
        };

        let weights: [f32; FEATURE_COUNT] = weights
            .try_into()
            .map_err(|w: Vec<f32>| anyhow::anyhow!("Expected {FEATURE_COUNT} weights, got {}", w.len()))?;

        Ok(LinearWeights {
            weights: weights.map(f64::from),
            bias: f64::from(bias),
        })
    }
}
