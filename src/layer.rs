use crate::weights::Matrix;

/// Affine transform for a single sample: `outputs = inputs · weights + biases`.
///
/// `weights` has shape `(in_dim, out_dim)`, so
/// `outputs[j] = Σ_i inputs[i] * weights[i][j] + biases[j]`.
///
/// Shape contract:
/// - `inputs.len() == weights.rows()`
/// - `biases.len() == weights.cols()`
/// - `outputs.len() == weights.cols()`
#[inline]
pub fn affine(inputs: &[f64], weights: &Matrix, biases: &[f64], outputs: &mut [f64]) {
    debug_assert_eq!(inputs.len(), weights.rows());
    debug_assert_eq!(biases.len(), weights.cols());
    debug_assert_eq!(outputs.len(), weights.cols());

    outputs.copy_from_slice(biases);
    for (i, &x) in inputs.iter().enumerate() {
        let row = weights.row(i);
        for (out, &w) in outputs.iter_mut().zip(row) {
            *out = x.mul_add(w, *out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affine_matches_hand_computation() {
        // x = [1, 2], W = [[1, 0, -1], [2, 1, 0]], b = [0.5, 0, 1]
        let w = Matrix::from_rows(&[vec![1.0, 0.0, -1.0], vec![2.0, 1.0, 0.0]]).unwrap();
        let mut out = [0.0; 3];
        affine(&[1.0, 2.0], &w, &[0.5, 0.0, 1.0], &mut out);
        assert_eq!(out, [5.5, 2.0, 0.0]);
    }
}
