//! Feature extractor crate for the loan eligibility model.
//!
//! This crate turns parsed dataset rows into ML-ready samples. It fits
//! label encoders for the categorical columns, imputes missing numeric
//! cells with column medians, and splits samples into train and test sets.

use dataset_loader::ParsedDataset;
use loan_structs::{FEATURE_COUNT, FEATURES, LoanStatus};
use tracing::{debug, info};

mod encoding;
mod split;

pub use encoding::{
    CategoryCounts, LabelEncoder, LabelEncoders, category_counts, fit_label_encoders,
};
pub use split::{shuffle_indices, train_test_split};

/// Errors raised while extracting features.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("Dataset contains no rows")]
    Empty,

    #[error("Column {0} has no values to compute a median from")]
    AllMissing(&'static str),

    #[error("No label encoder fitted for column {0}")]
    MissingEncoder(&'static str),

    #[error("Unseen category {value:?} in column {column}")]
    UnseenCategory { column: String, value: String },

    #[error("Test ratio must be strictly between 0 and 1, got {0}")]
    InvalidSplitRatio(f64),

    #[error("Not enough samples to split: {0}")]
    TooFewSamples(usize),
}

/// A single labelled sample with raw (unscaled) features in schema order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSample {
    pub features: [f64; FEATURE_COUNT],
    pub label: LoanStatus,
}

/// Training data container.
#[derive(Debug, Clone, Default)]
pub struct TrainingData {
    pub samples: Vec<TrainingSample>,
}

impl TrainingData {
    /// Creates a new empty training data container.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            samples: Vec::new(),
        }
    }

    /// Adds samples to the training data.
    pub fn add_samples(&mut self, samples: impl IntoIterator<Item = TrainingSample>) {
        self.samples.extend(samples);
    }

    /// Returns the number of samples.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if there are no samples.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the labels in sample order.
    #[must_use]
    pub fn labels(&self) -> Vec<LoanStatus> {
        self.samples.iter().map(|s| s.label).collect()
    }

    /// Counts samples per class, indexed by class code.
    #[must_use]
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0; 2];
        for sample in &self.samples {
            counts[usize::from(sample.label.class())] += 1;
        }
        counts
    }
}

/// Output of [`extract_training_data`].
#[derive(Debug, Clone)]
pub struct PreparedData {
    /// Imputed samples.
    pub data: TrainingData,
    /// Encoders fitted on the categorical columns.
    pub encoders: LabelEncoders,
    /// Rows per category code of each categorical column.
    pub category_counts: CategoryCounts,
    /// Median of each feature, used to fill missing cells.
    pub medians: [f64; FEATURE_COUNT],
    /// Number of cells that were filled with a median.
    pub imputed_cells: usize,
}

/// Extracts labelled samples from a parsed dataset.
///
/// Missing numeric cells are filled with the median of their column over
/// the whole dataset, before any train/test split.
///
/// # Errors
///
/// Returns an error if the dataset is empty or a column has no values at all.
pub fn extract_training_data(dataset: &ParsedDataset) -> Result<PreparedData, FeatureError> {
    let encoders = fit_label_encoders(dataset)?;
    for (column, encoder) in &encoders {
        debug!(column = %column, classes = ?encoder.classes(), "Fitted label encoder");
    }

    let category_counts = category_counts(dataset, &encoders)?;
    let medians = column_medians(dataset)?;
    let mut imputed_cells = 0;

    let mut data = TrainingData::new();
    data.add_samples(dataset.rows.iter().map(|row| {
        let mut features = [0.0; FEATURE_COUNT];
        for ((slot, value), median) in features.iter_mut().zip(&row.features).zip(&medians) {
            *slot = value.unwrap_or_else(|| {
                imputed_cells += 1;
                *median
            });
        }
        TrainingSample {
            features,
            label: row.loan_status,
        }
    }));

    info!(samples = data.len(), imputed_cells, "Extracted training samples");

    Ok(PreparedData {
        data,
        encoders,
        category_counts,
        medians,
        imputed_cells,
    })
}

/// Computes the median of each feature column, ignoring missing cells.
///
/// # Errors
///
/// Returns an error if the dataset is empty or a column has no values.
pub fn column_medians(dataset: &ParsedDataset) -> Result<[f64; FEATURE_COUNT], FeatureError> {
    if dataset.is_empty() {
        return Err(FeatureError::Empty);
    }

    let mut medians = [0.0; FEATURE_COUNT];
    for (i, slot) in medians.iter_mut().enumerate() {
        let mut values: Vec<f64> = dataset.rows.iter().filter_map(|r| r.features[i]).collect();
        *slot = median(&mut values).ok_or(FeatureError::AllMissing(FEATURES[i].name))?;
    }
    Ok(medians)
}

/// Median of a slice; the mean of the two middle values for even lengths.
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some(f64::midpoint(values[mid - 1], values[mid]))
    } else {
        Some(values[mid])
    }
}
