//! Numerical gradients by central finite differences.
//!
//! For every scalar parameter `p` with value `v`:
//!
//! ```text
//! p = v + h  ->  f1 = loss(weights)
//! p = v - h  ->  f2 = loss(weights)
//! p = v
//! dL/dp ~= (f1 - f2) / (2h)
//! ```
//!
//! The estimate has `O(h^2)` truncation error. Its cost is two loss evaluations per
//! parameter, so a run with `P` parameters and batch size `B` performs `2 * P * B`
//! forward passes per step. Keep the hidden layer and the batch small.

use crate::weights::{Gradient, ParamGroup, WeightStore};

/// Perturbation used for every finite difference.
pub const H: f64 = 1e-4;

/// Central-difference gradient of `loss_of` with respect to every parameter in `weights`.
///
/// Parameters are visited in group order `W1, b1, W2, b2`, row-major inside each group.
/// Each parameter is restored to its exact original value before moving on, so
/// `weights` is unchanged when this returns.
pub fn numerical_gradient<F>(weights: &mut WeightStore, mut loss_of: F) -> Gradient
where
    F: FnMut(&WeightStore) -> f64,
{
    let mut grad = weights.gradient();

    for group in ParamGroup::ALL {
        let len = weights.param(group).len();
        for idx in 0..len {
            let orig = weights.param(group)[idx];

            weights.param_mut(group)[idx] = orig + H;
            let f1 = loss_of(weights);

            weights.param_mut(group)[idx] = orig - H;
            let f2 = loss_of(weights);

            weights.param_mut(group)[idx] = orig;

            grad.param_mut(group)[idx] = (f1 - f2) / (2.0 * H);
        }
    }

    grad
}

/// Central-difference gradient of `f` with respect to every element of `xs`.
///
/// Same perturbation scheme as [`numerical_gradient`], over a plain slice.
pub fn central_difference<F>(xs: &mut [f64], mut f: F) -> Vec<f64>
where
    F: FnMut(&[f64]) -> f64,
{
    let mut grad = vec![0.0; xs.len()];
    for idx in 0..xs.len() {
        let orig = xs[idx];

        xs[idx] = orig + H;
        let f1 = f(xs);

        xs[idx] = orig - H;
        let f2 = f(xs);

        xs[idx] = orig;

        grad[idx] = (f1 - f2) / (2.0 * H);
    }
    grad
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::Dataset;
    use crate::loss::batch_loss;
    use crate::mlp::Scratch;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn quadratic_matches_closed_form() {
        // f(x, y) = 3x^2 + 2xy - y, grad = (6x + 2y, 2x - 1)
        let mut xs = [0.7, -1.3];
        let g = central_difference(&mut xs, |v| 3.0 * v[0] * v[0] + 2.0 * v[0] * v[1] - v[1]);
        assert!((g[0] - (6.0 * 0.7 + 2.0 * -1.3)).abs() < 1e-6);
        assert!((g[1] - (2.0 * 0.7 - 1.0)).abs() < 1e-6);
        assert_eq!(xs, [0.7, -1.3]);
    }

    #[test]
    fn cubic_error_is_second_order_in_h() {
        // d/dx x^3 at x = 2 is 12; the central difference error is exactly h^2.
        let mut xs = [2.0];
        let g = central_difference(&mut xs, |v| v[0].powi(3));
        assert!((g[0] - 12.0).abs() < 2.0 * H * H + 1e-9);
    }

    #[test]
    fn weight_gradient_matches_per_parameter_quadratic() {
        // loss = sum over all parameters of (p - 1)^2, so dL/dp = 2(p - 1).
        let mut w = WeightStore::new_with_seed(2, 3, 2, 1.0, 5).unwrap();
        let before = w.clone();
        let grad = numerical_gradient(&mut w, |w| {
            ParamGroup::ALL
                .iter()
                .flat_map(|&g| w.param(g))
                .map(|p| (p - 1.0) * (p - 1.0))
                .sum()
        });

        assert_eq!(w, before);
        for group in ParamGroup::ALL {
            for (&p, &g) in w.param(group).iter().zip(grad.param(group)) {
                assert!((g - 2.0 * (p - 1.0)).abs() < 1e-6, "group {}", group.name());
            }
        }
    }

    #[test]
    fn gradient_step_reduces_batch_loss() {
        let mut rng = StdRng::seed_from_u64(11);
        let data = Dataset::primary_colors(30, &mut rng);
        let mut w = WeightStore::new_with_seed(3, 4, 3, 0.5, 1).unwrap();
        let batch: Vec<usize> = (0..10).collect();
        let mut scratch = Scratch::new(&w);

        let before = batch_loss(&w, &data, &batch, &mut scratch);
        let grad = numerical_gradient(&mut w, |w| batch_loss(w, &data, &batch, &mut scratch));
        assert!(grad.norm() > 0.0);

        crate::Sgd::new(0.05).unwrap().step(&mut w, &grad);
        let after = batch_loss(&w, &data, &batch, &mut scratch);
        assert!(after < before, "before={before} after={after}");
    }
}
