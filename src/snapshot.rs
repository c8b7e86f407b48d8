//! Serializable weight snapshots.
//!
//! Progress events carry a copy of the live [`WeightStore`] in the nested-array layout
//! observers render from:
//!
//! ```json
//! { "W1": [[...], ...], "b1": [...], "W2": [[...], ...], "b2": [...] }
//! ```
//!
//! A snapshot is a detached value: mutating it never touches the trainer's weights.
//! Converting back into a `WeightStore` re-runs the shape checks.

use serde::{Deserialize, Serialize};

use crate::weights::Matrix;
use crate::{Error, Result, WeightStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSnapshot {
    /// Shape `(input_dim, hidden_dim)`.
    #[serde(rename = "W1")]
    pub w1: Vec<Vec<f64>>,
    pub b1: Vec<f64>,
    /// Shape `(hidden_dim, output_dim)`.
    #[serde(rename = "W2")]
    pub w2: Vec<Vec<f64>>,
    pub b2: Vec<f64>,
}

impl From<&WeightStore> for WeightSnapshot {
    fn from(weights: &WeightStore) -> Self {
        Self {
            w1: weights.w1().to_rows(),
            b1: weights.b1().to_vec(),
            w2: weights.w2().to_rows(),
            b2: weights.b2().to_vec(),
        }
    }
}

impl TryFrom<WeightSnapshot> for WeightStore {
    type Error = Error;

    fn try_from(value: WeightSnapshot) -> std::result::Result<Self, Self::Error> {
        let w1 = Matrix::from_rows(&value.w1)
            .map_err(|e| Error::InvalidShape(format!("W1 invalid: {e}")))?;
        let w2 = Matrix::from_rows(&value.w2)
            .map_err(|e| Error::InvalidShape(format!("W2 invalid: {e}")))?;
        WeightStore::from_parts(w1, value.b1, w2, value.b2)
    }
}

impl WeightSnapshot {
    /// Serialize to a compact JSON string.
    ///
    /// Non-finite values are written as `null`.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::InvalidData(format!("failed to serialize weights: {e}")))
    }

    /// Parse a snapshot and validate its shape.
    pub fn weights_from_json_str(s: &str) -> Result<WeightStore> {
        let snap: WeightSnapshot = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse weights json: {e}")))?;
        snap.try_into()
    }
}
