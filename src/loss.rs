//! Cross-entropy loss.
//!
//! `L = -mean_i ln(prediction_i[label_i])`.
//!
//! A true-class probability of exactly zero gives `ln(0) = -inf` and therefore an
//! infinite loss. That value is returned as-is; nothing here clamps probabilities.
//!
//! The mean over zero samples is `0 / 0`, so every loss of an empty input is `NaN`.

use crate::mlp::{Scratch, predict_into};
use crate::{Dataset, WeightStore};

/// Mean negative log-likelihood of the true class over a batch of predictions.
///
/// Shape contract: `predictions.len() == labels.len()`, each label indexes its row.
pub fn cross_entropy<P: AsRef<[f64]>>(predictions: &[P], labels: &[usize]) -> f64 {
    assert_eq!(
        predictions.len(),
        labels.len(),
        "predictions len {} does not match labels len {}",
        predictions.len(),
        labels.len()
    );
    let mut sum = 0.0_f64;
    for (pred, &label) in predictions.iter().zip(labels) {
        sum += pred.as_ref()[label].ln();
    }
    -sum / labels.len() as f64
}

/// Cross-entropy of `weights` on the rows of `data` selected by `indices`.
///
/// Allocation-free: every sample reuses `scratch`.
pub fn batch_loss(
    weights: &WeightStore,
    data: &Dataset,
    indices: &[usize],
    scratch: &mut Scratch,
) -> f64 {
    let mut sum = 0.0_f64;
    for &idx in indices {
        let y = predict_into(data.features(idx), weights, scratch);
        sum += y[data.label(idx)].ln();
    }
    -sum / indices.len() as f64
}

/// Cross-entropy of `weights` over a whole split.
pub fn split_loss(weights: &WeightStore, data: &Dataset) -> f64 {
    let mut scratch = Scratch::new(weights);
    let mut sum = 0.0_f64;
    for (label, x) in data.iter() {
        sum += predict_into(x, weights, &mut scratch)[label].ln();
    }
    -sum / data.len() as f64
}
