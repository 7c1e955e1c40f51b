//! Dataset and batching for Burn training.

use burn::prelude::*;
use feature_extractor::{TrainingData, TrainingSample};
use loan_structs::FEATURE_COUNT;

use crate::StandardScaler;

/// A single item in the loan dataset.
#[derive(Debug, Clone)]
pub struct LoanDatasetItem {
    /// Standardized feature vector.
    pub features: [f32; FEATURE_COUNT],
    /// Class code of the label (1.0 = approved).
    pub target: f32,
    /// Class-balancing weight of the label.
    pub weight: f32,
}

impl LoanDatasetItem {
    /// Scales a sample and attaches its class weight.
    #[must_use]
    pub fn from_sample(
        sample: &TrainingSample,
        scaler: &StandardScaler,
        class_weights: &[f64; 2],
    ) -> Self {
        let class = usize::from(sample.label.class());
        Self {
            features: scaler.transform(&sample.features).map(|v| v as f32),
            target: f32::from(sample.label.class()),
            weight: class_weights[class] as f32,
        }
    }
}

/// Dataset for loan eligibility training.
#[derive(Debug, Clone)]
pub struct LoanDataset {
    items: Vec<LoanDatasetItem>,
}

impl LoanDataset {
    /// Creates a dataset of scaled, weighted items from training samples.
    #[must_use]
    pub fn new(data: &TrainingData, scaler: &StandardScaler, class_weights: &[f64; 2]) -> Self {
        let items = data
            .samples
            .iter()
            .map(|s| LoanDatasetItem::from_sample(s, scaler, class_weights))
            .collect();
        Self { items }
    }
}

impl burn::data::dataset::Dataset<LoanDatasetItem> for LoanDataset {
    fn get(&self, index: usize) -> Option<LoanDatasetItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A batch of training data.
#[derive(Debug, Clone)]
pub struct LoanBatch<B: Backend> {
    /// Input features tensor of shape `[batch_size, FEATURE_COUNT]`.
    pub inputs: Tensor<B, 2>,
    /// Targets tensor of shape `[batch_size, 1]`.
    pub targets: Tensor<B, 2>,
    /// Per-sample loss weights of shape `[batch_size, 1]`.
    pub weights: Tensor<B, 2>,
}

/// Batcher for creating training batches.
#[derive(Debug, Clone)]
pub struct LoanBatcher<B: Backend> {
    device: B::Device,
}

impl<B: Backend> LoanBatcher<B> {
    /// Creates a new batcher for the given device.
    #[must_use]
    pub const fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Creates a batch from a vector of items.
    pub fn batch(&self, items: Vec<LoanDatasetItem>) -> LoanBatch<B> {
        let batch_size = items.len();

        let mut features_data = Vec::with_capacity(batch_size * FEATURE_COUNT);
        let mut targets_data = Vec::with_capacity(batch_size);
        let mut weights_data = Vec::with_capacity(batch_size);

        for item in items {
            features_data.extend_from_slice(&item.features);
            targets_data.push(item.target);
            weights_data.push(item.weight);
        }

        let inputs = Tensor::<B, 1>::from_floats(features_data.as_slice(), &self.device)
            .reshape([batch_size, FEATURE_COUNT]);

        let targets = Tensor::<B, 1>::from_floats(targets_data.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        let weights = Tensor::<B, 1>::from_floats(weights_data.as_slice(), &self.device)
            .reshape([batch_size, 1]);

        LoanBatch {
            inputs,
            targets,
            weights,
        }
    }
}
