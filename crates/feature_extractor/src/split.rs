//! Reproducible train/test splitting.

use crate::{FeatureError, TrainingData};

/// Splits samples into `(train, test)` sets.
///
/// The test set takes `ceil(len * test_ratio)` samples from a permutation
/// seeded with `seed`, so the same inputs always give the same split.
///
/// # Errors
///
/// Returns an error if `test_ratio` is not strictly between 0 and 1, or if
/// either side of the split would be empty.
pub fn train_test_split(
    data: &TrainingData,
    test_ratio: f64,
    seed: u64,
) -> Result<(TrainingData, TrainingData), FeatureError> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(FeatureError::InvalidSplitRatio(test_ratio));
    }

    let n = data.len();
    let n_test = ((n as f64) * test_ratio).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(FeatureError::TooFewSamples(n));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    shuffle_indices(&mut indices, seed);

    let (test_idx, train_idx) = indices.split_at(n_test);
    let pick = |idx: &[usize]| TrainingData {
        samples: idx.iter().map(|&i| data.samples[i]).collect(),
    };

    Ok((pick(train_idx), pick(test_idx)))
}

/// Shuffles indices using a simple LCG-based shuffle.
pub fn shuffle_indices(indices: &mut [usize], seed: u64) {
    // Fisher-Yates driven by an LCG
    let mut rng_state = seed.wrapping_add(12345);

    for i in (1..indices.len()).rev() {
        // LCG: state = (a * state + c) mod m
        rng_state = rng_state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let j = ((rng_state >> 33) as usize) % (i + 1);
        indices.swap(i, j);
    }
}
