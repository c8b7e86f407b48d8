//! Forward pass.
//!
//! `x → affine(W1, b1) → relu → affine(W2, b2) → softmax`.
//!
//! Two layers of API, as elsewhere in the crate:
//! - [`predict_into`] is the hot path used by the gradient estimator. It reuses a
//!   [`Scratch`] and panics on shape misuse.
//! - [`predict`] / [`try_predict`] allocate and, for the latter, return a shape error.

use crate::activation::{relu_in_place, softmax_in_place};
use crate::layer::affine;
use crate::{Error, Result, WeightStore};

/// Reusable buffers for [`predict_into`].
///
/// The output of the most recent forward pass lives inside `Scratch`.
#[derive(Debug, Clone)]
pub struct Scratch {
    hidden: Vec<f64>,
    output: Vec<f64>,
}

impl Scratch {
    pub fn new(weights: &WeightStore) -> Self {
        Self {
            hidden: vec![0.0; weights.hidden_dim()],
            output: vec![0.0; weights.output_dim()],
        }
    }

    /// Post-ReLU hidden activations of the most recent forward pass.
    #[inline]
    pub fn hidden(&self) -> &[f64] {
        &self.hidden
    }
}

/// Forward pass for a single sample.
///
/// Writes intermediate activations into `scratch` and returns the class probabilities.
///
/// Shape contract:
/// - `input.len() == weights.input_dim()`
/// - `scratch` must be built for weights of the same shape
pub fn predict_into<'a>(input: &[f64], weights: &WeightStore, scratch: &'a mut Scratch) -> &'a [f64] {
    assert_eq!(
        input.len(),
        weights.input_dim(),
        "input len {} does not match model input_dim {}",
        input.len(),
        weights.input_dim()
    );
    assert_eq!(
        scratch.hidden.len(),
        weights.hidden_dim(),
        "scratch hidden len {} does not match model hidden_dim {}",
        scratch.hidden.len(),
        weights.hidden_dim()
    );
    assert_eq!(
        scratch.output.len(),
        weights.output_dim(),
        "scratch output len {} does not match model output_dim {}",
        scratch.output.len(),
        weights.output_dim()
    );

    affine(input, weights.w1(), weights.b1(), &mut scratch.hidden);
    relu_in_place(&mut scratch.hidden);
    affine(&scratch.hidden, weights.w2(), weights.b2(), &mut scratch.output);
    softmax_in_place(&mut scratch.output);

    &scratch.output
}

/// Class probabilities for `input`.
///
/// Panics if `input.len() != weights.input_dim()`.
pub fn predict(input: &[f64], weights: &WeightStore) -> Vec<f64> {
    let mut scratch = Scratch::new(weights);
    predict_into(input, weights, &mut scratch).to_vec()
}

/// Shape-checked [`predict`].
pub fn try_predict(input: &[f64], weights: &WeightStore) -> Result<Vec<f64>> {
    if input.len() != weights.input_dim() {
        return Err(Error::InvalidShape(format!(
            "input len {} does not match model input_dim {}",
            input.len(),
            weights.input_dim()
        )));
    }
    Ok(predict(input, weights))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::Matrix;

    fn unit_store() -> WeightStore {
        WeightStore::from_parts(
            Matrix::from_rows(&[vec![1.0]]).unwrap(),
            vec![0.0],
            Matrix::from_rows(&[vec![1.0]]).unwrap(),
            vec![0.0],
        )
        .unwrap()
    }

    #[test]
    fn single_unit_network_walkthrough() {
        let w = unit_store();
        let mut scratch = Scratch::new(&w);
        let y = predict_into(&[2.0], &w, &mut scratch).to_vec();
        assert_eq!(scratch.hidden(), &[2.0]);
        assert_eq!(y, vec![1.0]);
    }

    #[test]
    fn relu_zeroes_negative_hidden_units() {
        let w = WeightStore::from_parts(
            Matrix::from_rows(&[vec![1.0, -1.0]]).unwrap(),
            vec![0.0, 0.0],
            Matrix::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap(),
            vec![0.0, 0.0],
        )
        .unwrap();
        let mut scratch = Scratch::new(&w);
        let y = predict_into(&[3.0], &w, &mut scratch).to_vec();
        assert_eq!(scratch.hidden(), &[3.0, 0.0]);

        let e3 = 3.0_f64.exp();
        assert!((y[0] - e3 / (e3 + 1.0)).abs() < 1e-12);
        assert!((y[0] + y[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn seeded_predictions_are_distributions() {
        let w = WeightStore::new_with_seed(3, 4, 3, 1.0, 9).unwrap();
        let y = predict(&[0.2, 0.7, 0.1], &w);
        assert_eq!(y.len(), 3);
        assert!(y.iter().all(|&p| p >= 0.0));
        assert!((y.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn try_predict_rejects_wrong_input_len() {
        let w = unit_store();
        assert!(matches!(
            try_predict(&[1.0, 2.0], &w),
            Err(Error::InvalidShape(_))
        ));
    }

    #[test]
    #[should_panic]
    fn predict_into_panics_on_scratch_mismatch() {
        let a = WeightStore::zeros(3, 4, 3).unwrap();
        let b = WeightStore::zeros(3, 5, 3).unwrap();
        let mut scratch = Scratch::new(&b);
        predict_into(&[0.0; 3], &a, &mut scratch);
    }
}
