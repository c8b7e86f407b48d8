//! Labeled dataset splits.
//!
//! A split pairs a contiguous, row-major feature matrix with one class label per row.
//! Splits are validated once at construction and never mutated afterwards; the trainer
//! only ever reads rows by index.

use std::path::Path;

use rand::Rng;

use crate::{Error, Result};

/// Number of features in a normalized RGB color.
pub const RGB_DIM: usize = 3;

/// Number of classes produced by [`Dataset::primary_colors`].
pub const PRIMARY_CLASSES: usize = 3;

/// An immutable split of `(label, features)` pairs.
///
/// Stored as contiguous buffers:
/// - `features.len() == len * input_dim`
/// - `labels.len() == len`, every label `< num_classes`
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Vec<f64>,
    labels: Vec<usize>,
    input_dim: usize,
    num_classes: usize,
}

impl Dataset {
    /// Build a split from a flat feature buffer with shape `(len, input_dim)`.
    pub fn from_flat(
        features: Vec<f64>,
        labels: Vec<usize>,
        input_dim: usize,
        num_classes: usize,
    ) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }
        if num_classes == 0 {
            return Err(Error::InvalidData("num_classes must be > 0".to_owned()));
        }
        if features.len() != labels.len() * input_dim {
            return Err(Error::InvalidData(format!(
                "features length {} does not match len * input_dim ({} * {})",
                features.len(),
                labels.len(),
                input_dim
            )));
        }
        if let Some((row, &label)) = labels
            .iter()
            .enumerate()
            .find(|(_, l)| **l >= num_classes)
        {
            return Err(Error::InvalidData(format!(
                "row {row} has label {label}, expected < {num_classes}"
            )));
        }
        if features.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "features must contain only finite values".to_owned(),
            ));
        }

        Ok(Self {
            features,
            labels,
            input_dim,
            num_classes,
        })
    }

    /// Build a split from per-sample rows.
    ///
    /// This is a convenience constructor (it copies into contiguous storage).
    pub fn from_rows(features: &[Vec<f64>], labels: &[usize], num_classes: usize) -> Result<Self> {
        if features.len() != labels.len() {
            return Err(Error::InvalidData(format!(
                "features/labels length mismatch: {} vs {}",
                features.len(),
                labels.len()
            )));
        }
        let input_dim = features.first().map(|r| r.len()).unwrap_or(0);
        for (i, row) in features.iter().enumerate() {
            if row.len() != input_dim {
                return Err(Error::InvalidData(format!(
                    "feature row {i} has len {}, expected {input_dim}",
                    row.len()
                )));
            }
        }

        let flat = features.iter().flatten().copied().collect();
        Self::from_flat(flat, labels.to_vec(), input_dim, num_classes)
    }

    /// Parse `label,f0,f1,...` rows.
    ///
    /// Blank lines and lines starting with `#` are skipped. When `num_classes` is `None`
    /// it is inferred as `max(label) + 1`.
    pub fn from_csv_str(s: &str, input_dim: usize, num_classes: Option<usize>) -> Result<Self> {
        let mut features = Vec::new();
        let mut labels = Vec::new();

        for (lineno, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split(',').map(str::trim);
            let label = fields
                .next()
                .and_then(|f| f.parse::<usize>().ok())
                .ok_or_else(|| {
                    Error::InvalidData(format!("line {}: missing or bad label", lineno + 1))
                })?;

            let before = features.len();
            for field in fields {
                let v = field.parse::<f64>().map_err(|e| {
                    Error::InvalidData(format!("line {}: bad feature {field:?}: {e}", lineno + 1))
                })?;
                features.push(v);
            }
            if features.len() - before != input_dim {
                return Err(Error::InvalidData(format!(
                    "line {}: expected {input_dim} features, got {}",
                    lineno + 1,
                    features.len() - before
                )));
            }
            labels.push(label);
        }

        if labels.is_empty() {
            return Err(Error::InvalidData("csv contains no rows".to_owned()));
        }

        let num_classes = match num_classes {
            Some(n) => n,
            None => labels.iter().copied().max().map_or(0, |m| m + 1),
        };
        Self::from_flat(features, labels, input_dim, num_classes)
    }

    /// Load a split from a CSV file (see [`Dataset::from_csv_str`]).
    pub fn load_csv<P: AsRef<Path>>(
        path: P,
        input_dim: usize,
        num_classes: Option<usize>,
    ) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidData(format!("failed to read {}: {e}", p.display())))?;
        Self::from_csv_str(&s, input_dim, num_classes)
            .map_err(|e| Error::InvalidData(format!("{}: {e}", p.display())))
    }

    /// Synthetic, linearly separable primary-color split.
    ///
    /// Class `k` has channel `k` uniform in `[0.6, 1.0]` and the other channels uniform in
    /// `[0.0, 0.4]`.
    pub fn primary_colors<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        let mut features = Vec::with_capacity(len * RGB_DIM);
        let mut labels = Vec::with_capacity(len);
        for _ in 0..len {
            let class = rng.gen_range(0..PRIMARY_CLASSES);
            for channel in 0..RGB_DIM {
                let v = if channel == class {
                    rng.gen_range(0.6..=1.0)
                } else {
                    rng.gen_range(0.0..=0.4)
                };
                features.push(v);
            }
            labels.push(class);
        }
        Self {
            features,
            labels,
            input_dim: RGB_DIM,
            num_classes: PRIMARY_CLASSES,
        }
    }

    /// Returns a copy of this split declaring `num_classes` classes.
    ///
    /// Used to align train and test splits whose inferred class counts differ.
    pub fn with_num_classes(self, num_classes: usize) -> Result<Self> {
        Self::from_flat(self.features, self.labels, self.input_dim, num_classes)
    }

    #[inline]
    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    /// Returns true if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    /// Returns the per-sample feature dimension.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    #[inline]
    /// Returns the `idx`-th feature row (shape: `(input_dim,)`).
    ///
    /// Panics if `idx >= len`.
    pub fn features(&self, idx: usize) -> &[f64] {
        let start = idx * self.input_dim;
        &self.features[start..start + self.input_dim]
    }

    #[inline]
    /// Returns the `idx`-th label.
    ///
    /// Panics if `idx >= len`.
    pub fn label(&self, idx: usize) -> usize {
        self.labels[idx]
    }

    /// Iterate `(label, features)` pairs in split order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[f64])> + '_ {
        self.labels
            .iter()
            .copied()
            .zip(self.features.chunks_exact(self.input_dim))
    }
}
