//! Classification accuracy.
//!
//! The predicted class is the argmax of the forward pass output. Ties resolve to the
//! *first* index attaining the maximum (a stable left-to-right scan).

use crate::mlp::{Scratch, predict_into};
use crate::{Dataset, Error, Result, WeightStore};

/// Index of the first maximum in `xs`.
///
/// `NaN` entries never compare greater, so an all-`NaN` row yields `0`.
/// Panics if `xs` is empty.
#[inline]
pub fn argmax(xs: &[f64]) -> usize {
    assert!(!xs.is_empty(), "argmax of an empty slice");
    let mut best = 0;
    for (i, &x) in xs.iter().enumerate().skip(1) {
        if x > xs[best] {
            best = i;
        }
    }
    best
}

/// Fraction of `predictions` whose argmax equals the label.
pub fn accuracy_of_predictions<P: AsRef<[f64]>>(predictions: &[P], labels: &[usize]) -> Result<f64> {
    if predictions.len() != labels.len() {
        return Err(Error::InvalidData(format!(
            "predictions len {} does not match labels len {}",
            predictions.len(),
            labels.len()
        )));
    }
    if labels.is_empty() {
        return Err(Error::InvalidData("accuracy of an empty split".to_owned()));
    }

    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|&(p, &l)| argmax(p.as_ref()) == l)
        .count();
    Ok(correct as f64 / labels.len() as f64)
}

/// Accuracy of `weights` over a whole split.
pub fn accuracy(data: &Dataset, weights: &WeightStore) -> Result<f64> {
    if data.is_empty() {
        return Err(Error::InvalidData("accuracy of an empty split".to_owned()));
    }
    if data.input_dim() != weights.input_dim() {
        return Err(Error::InvalidShape(format!(
            "dataset input_dim {} does not match model input_dim {}",
            data.input_dim(),
            weights.input_dim()
        )));
    }

    let mut scratch = Scratch::new(weights);
    let mut correct = 0_usize;
    for (label, x) in data.iter() {
        if argmax(predict_into(x, weights, &mut scratch)) == label {
            correct += 1;
        }
    }
    Ok(correct as f64 / data.len() as f64)
}
