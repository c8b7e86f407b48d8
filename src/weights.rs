//! Network parameters.
//!
//! The topology is fixed: `input → hidden (ReLU) → output (softmax)`. Parameters are
//! kept as four named groups instead of a keyed map, so every consumer (forward pass,
//! gradient estimator, optimizer) walks them in the same fixed order:
//! `W1, b1, W2, b2`.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{Error, Result};

/// Dense row-major matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    #[inline]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn from_flat(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidShape(format!(
                "matrix data length {} does not match rows * cols ({rows} * {cols})",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix from nested rows; every row must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::InvalidShape(format!(
                    "matrix row {i} has len {}, expected {cols}",
                    row.len()
                )));
            }
        }
        let data = rows.iter().flatten().copied().collect();
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.cols.max(1)).map(<[f64]>::to_vec).collect()
    }
}

/// One of the four parameter groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamGroup {
    W1,
    B1,
    W2,
    B2,
}

impl ParamGroup {
    /// All groups in visiting order.
    pub const ALL: [ParamGroup; 4] = [
        ParamGroup::W1,
        ParamGroup::B1,
        ParamGroup::W2,
        ParamGroup::B2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ParamGroup::W1 => "W1",
            ParamGroup::B1 => "b1",
            ParamGroup::W2 => "W2",
            ParamGroup::B2 => "b2",
        }
    }
}

/// Parameters of the two affine layers.
///
/// Shape invariants (checked by every constructor):
/// - `w1`: `(input_dim, hidden_dim)`, `b1`: `(hidden_dim,)`
/// - `w2`: `(hidden_dim, output_dim)`, `b2`: `(output_dim,)`
#[derive(Debug, Clone, PartialEq)]
pub struct WeightStore {
    w1: Matrix,
    b1: Vec<f64>,
    w2: Matrix,
    b2: Vec<f64>,
}

impl WeightStore {
    /// Build from explicit parts, rejecting any shape inconsistency.
    pub fn from_parts(w1: Matrix, b1: Vec<f64>, w2: Matrix, b2: Vec<f64>) -> Result<Self> {
        if w1.rows() == 0 || w1.cols() == 0 || w2.cols() == 0 {
            return Err(Error::InvalidShape(format!(
                "all layer dims must be > 0, got W1 {}x{} and W2 {}x{}",
                w1.rows(),
                w1.cols(),
                w2.rows(),
                w2.cols()
            )));
        }
        if b1.len() != w1.cols() {
            return Err(Error::InvalidShape(format!(
                "b1 length {} does not match W1 cols {}",
                b1.len(),
                w1.cols()
            )));
        }
        if w2.rows() != w1.cols() {
            return Err(Error::InvalidShape(format!(
                "W2 rows {} does not match W1 cols {}",
                w2.rows(),
                w1.cols()
            )));
        }
        if b2.len() != w2.cols() {
            return Err(Error::InvalidShape(format!(
                "b2 length {} does not match W2 cols {}",
                b2.len(),
                w2.cols()
            )));
        }
        Ok(Self { w1, b1, w2, b2 })
    }

    /// All-zero parameters for the given dimensions.
    pub fn zeros(input_dim: usize, hidden_dim: usize, output_dim: usize) -> Result<Self> {
        Self::from_parts(
            Matrix::zeros(input_dim, hidden_dim),
            vec![0.0; hidden_dim],
            Matrix::zeros(hidden_dim, output_dim),
            vec![0.0; output_dim],
        )
    }

    pub fn new_with_seed(
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
        weight_init_std: f64,
        seed: u64,
    ) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(input_dim, hidden_dim, output_dim, weight_init_std, &mut rng)
    }

    /// Random initialization.
    ///
    /// Weight entries are uniform in `[0, 1)` scaled by `weight_init_std`; biases start at
    /// zero.
    pub fn new_with_rng<R: Rng + ?Sized>(
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
        weight_init_std: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if !weight_init_std.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "weight_init_std must be finite, got {weight_init_std}"
            )));
        }
        let mut store = Self::zeros(input_dim, hidden_dim, output_dim)?;
        for w in store
            .w1
            .as_mut_slice()
            .iter_mut()
            .chain(store.w2.as_mut_slice())
        {
            *w = rng.r#gen::<f64>() * weight_init_std;
        }
        Ok(store)
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.w1.rows()
    }

    #[inline]
    pub fn hidden_dim(&self) -> usize {
        self.w1.cols()
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.w2.cols()
    }

    /// Total number of scalar parameters.
    pub fn num_params(&self) -> usize {
        ParamGroup::ALL.iter().map(|&g| self.param(g).len()).sum()
    }

    #[inline]
    pub fn w1(&self) -> &Matrix {
        &self.w1
    }

    #[inline]
    pub fn b1(&self) -> &[f64] {
        &self.b1
    }

    #[inline]
    pub fn w2(&self) -> &Matrix {
        &self.w2
    }

    #[inline]
    pub fn b2(&self) -> &[f64] {
        &self.b2
    }

    /// Flat (row-major) view of one parameter group.
    #[inline]
    pub fn param(&self, group: ParamGroup) -> &[f64] {
        match group {
            ParamGroup::W1 => self.w1.as_slice(),
            ParamGroup::B1 => &self.b1,
            ParamGroup::W2 => self.w2.as_slice(),
            ParamGroup::B2 => &self.b2,
        }
    }

    #[inline]
    pub fn param_mut(&mut self, group: ParamGroup) -> &mut [f64] {
        match group {
            ParamGroup::W1 => self.w1.as_mut_slice(),
            ParamGroup::B1 => &mut self.b1,
            ParamGroup::W2 => self.w2.as_mut_slice(),
            ParamGroup::B2 => &mut self.b2,
        }
    }

    /// Allocate a zeroed gradient with this store's shape.
    pub fn gradient(&self) -> Gradient {
        Gradient::new(self)
    }
}

/// Partial derivatives of the loss, one per parameter (same shape as [`WeightStore`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    d_w1: Vec<f64>,
    d_b1: Vec<f64>,
    d_w2: Vec<f64>,
    d_b2: Vec<f64>,
}

impl Gradient {
    pub fn new(weights: &WeightStore) -> Self {
        Self {
            d_w1: vec![0.0; weights.w1.as_slice().len()],
            d_b1: vec![0.0; weights.b1.len()],
            d_w2: vec![0.0; weights.w2.as_slice().len()],
            d_b2: vec![0.0; weights.b2.len()],
        }
    }

    #[inline]
    pub fn param(&self, group: ParamGroup) -> &[f64] {
        match group {
            ParamGroup::W1 => &self.d_w1,
            ParamGroup::B1 => &self.d_b1,
            ParamGroup::W2 => &self.d_w2,
            ParamGroup::B2 => &self.d_b2,
        }
    }

    #[inline]
    pub fn param_mut(&mut self, group: ParamGroup) -> &mut [f64] {
        match group {
            ParamGroup::W1 => &mut self.d_w1,
            ParamGroup::B1 => &mut self.d_b1,
            ParamGroup::W2 => &mut self.d_w2,
            ParamGroup::B2 => &mut self.d_b2,
        }
    }

    /// Returns a gradient with every component negated.
    pub fn negated(&self) -> Self {
        let neg = |v: &[f64]| -> Vec<f64> { v.iter().map(|g| -g).collect() };
        Self {
            d_w1: neg(&self.d_w1),
            d_b1: neg(&self.d_b1),
            d_w2: neg(&self.d_w2),
            d_b2: neg(&self.d_b2),
        }
    }

    /// Euclidean norm over all components.
    pub fn norm(&self) -> f64 {
        ParamGroup::ALL
            .iter()
            .flat_map(|&g| self.param(g))
            .map(|g| g * g)
            .sum::<f64>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_rejects_mismatched_hidden_dim() {
        let w1 = Matrix::zeros(3, 4);
        let w2 = Matrix::zeros(5, 2);
        let err = WeightStore::from_parts(w1, vec![0.0; 4], w2, vec![0.0; 2]).unwrap_err();
        assert!(matches!(err, Error::InvalidShape(_)));
    }

    #[test]
    fn from_parts_rejects_bias_length_mismatch() {
        let err = WeightStore::from_parts(
            Matrix::zeros(3, 4),
            vec![0.0; 3],
            Matrix::zeros(4, 2),
            vec![0.0; 2],
        )
        .unwrap_err();
        assert!(format!("{err}").contains("b1"));

        let err = WeightStore::from_parts(
            Matrix::zeros(3, 4),
            vec![0.0; 4],
            Matrix::zeros(4, 2),
            vec![0.0; 3],
        )
        .unwrap_err();
        assert!(format!("{err}").contains("b2"));
    }

    #[test]
    fn matrix_from_rows_rejects_ragged_input() {
        assert!(Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).is_err());
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.get(1, 0), 3.0);
        assert_eq!(m.to_rows(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn seeded_init_is_deterministic_and_scaled() {
        let a = WeightStore::new_with_seed(3, 4, 3, 0.01, 123).unwrap();
        let b = WeightStore::new_with_seed(3, 4, 3, 0.01, 123).unwrap();
        assert_eq!(a, b);

        assert_eq!(a.num_params(), 3 * 4 + 4 + 4 * 3 + 3);
        for &w in a.w1().as_slice().iter().chain(a.w2().as_slice()) {
            assert!((0.0..0.01).contains(&w));
        }
        assert!(a.b1().iter().chain(a.b2()).all(|&b| b == 0.0));
    }

    #[test]
    fn gradient_matches_store_shape() {
        let w = WeightStore::zeros(2, 5, 3).unwrap();
        let g = w.gradient();
        for group in ParamGroup::ALL {
            assert_eq!(g.param(group).len(), w.param(group).len());
        }
    }
}
