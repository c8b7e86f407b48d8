//! Optimizer.
//!
//! Plain gradient descent with a fixed learning rate: `w -= lr * g` for every parameter.
//! No momentum, no adaptive rates, no state between steps.

use crate::weights::{Gradient, ParamGroup, WeightStore};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
/// Stochastic gradient descent with a fixed learning rate.
pub struct Sgd {
    lr: f64,
}

impl Sgd {
    #[inline]
    /// Construct an SGD optimizer.
    ///
    /// Returns an error if `lr` is not finite or `lr <= 0`.
    pub fn new(lr: f64) -> Result<Self> {
        if !(lr.is_finite() && lr > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {lr}"
            )));
        }
        Ok(Self { lr })
    }

    #[inline]
    /// Returns the learning rate.
    pub fn lr(&self) -> f64 {
        self.lr
    }

    /// Apply one optimizer step in place: `param -= lr * d_param`.
    pub fn step(&self, weights: &mut WeightStore, grad: &Gradient) {
        for group in ParamGroup::ALL {
            let g = grad.param(group);
            let w = weights.param_mut(group);
            assert_eq!(
                w.len(),
                g.len(),
                "gradient {} len {} does not match weights len {}",
                group.name(),
                g.len(),
                w.len()
            );
            for (w, &g) in w.iter_mut().zip(g) {
                *w -= self.lr * g;
            }
        }
    }
}
