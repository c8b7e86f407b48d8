//! Activation functions.
//!
//! The hidden layer uses ReLU; the output layer turns logits into class probabilities
//! with softmax. Both work in place on a layer's output buffer so the forward pass stays
//! allocation-free.
//!
//! The softmax is deliberately *not* shifted by the maximum logit: large logits overflow
//! to `inf` and the resulting `NaN`s propagate to the caller unchanged.

/// `x = max(0, x)` element-wise.
#[inline]
pub fn relu_in_place(xs: &mut [f64]) {
    for x in xs.iter_mut() {
        *x = x.max(0.0);
    }
}

/// `x[k] = exp(x[k]) / Σ_m exp(x[m])`, without max-subtraction.
#[inline]
pub fn softmax_in_place(xs: &mut [f64]) {
    let mut sum_exp = 0.0_f64;
    for x in xs.iter_mut() {
        *x = x.exp();
        sum_exp += *x;
    }
    for x in xs.iter_mut() {
        *x /= sum_exp;
    }
}

/// Allocating softmax, for callers outside the hot path.
pub fn softmax(xs: &[f64]) -> Vec<f64> {
    let mut out = xs.to_vec();
    softmax_in_place(&mut out);
    out
}
