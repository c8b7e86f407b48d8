//! File configuration for the command-line host.
//!
//! ```toml
//! [train]
//! iters_num = 1000
//! hidden_size = 4
//! batch_size = 10
//! learning_rate = 0.001
//! weight_init_std = 0.01
//! seed = 7
//!
//! [data]
//! train = "data/train.csv"
//! test = "data/test.csv"
//! synthetic = 300
//! ```
//!
//! Every key is optional. Unknown keys are rejected so typos do not silently fall back
//! to defaults.

use std::path::{Path, PathBuf};

use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::data::RGB_DIM;
use crate::{Dataset, Error, Result, TrainConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub train: TrainConfig,
    pub data: DataConfig,
}

/// Where the train/test splits come from.
///
/// Either both CSV paths are set, or neither is and a synthetic primary-color dataset of
/// `synthetic` samples per split is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub train: Option<PathBuf>,
    pub test: Option<PathBuf>,
    pub synthetic: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            train: None,
            test: None,
            synthetic: 300,
        }
    }
}

impl AppConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidConfig(format!("failed to read {}: {e}", p.display())))?;
        Self::from_toml_str(&s)
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", p.display())))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(s)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse config: {e}")))?;
        cfg.train.validate()?;
        Ok(cfg)
    }
}

impl DataConfig {
    /// Load or generate `(train, test)`.
    ///
    /// `seed` only affects synthetic data.
    pub fn load_splits(&self, seed: Option<u64>) -> Result<(Dataset, Dataset)> {
        match (&self.train, &self.test) {
            (Some(train_path), Some(test_path)) => {
                let train = Dataset::load_csv(train_path, RGB_DIM, None)?;
                let test = Dataset::load_csv(test_path, RGB_DIM, None)?;
                let classes = train.num_classes().max(test.num_classes());
                info!(
                    "loaded {} train / {} test rows, {} classes",
                    train.len(),
                    test.len(),
                    classes
                );
                Ok((
                    train.with_num_classes(classes)?,
                    test.with_num_classes(classes)?,
                ))
            }
            (None, None) => {
                if self.synthetic == 0 {
                    return Err(Error::InvalidConfig(
                        "synthetic sample count must be > 0".to_owned(),
                    ));
                }
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let train = Dataset::primary_colors(self.synthetic, &mut rng);
                let test = Dataset::primary_colors(self.synthetic, &mut rng);
                info!(
                    "generated synthetic primary-color splits with {} rows each",
                    self.synthetic
                );
                Ok((train, test))
            }
            _ => Err(Error::InvalidConfig(
                "train and test paths must be given together".to_owned(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.train.iters_num, 1000);
        assert_eq!(cfg.data.synthetic, 300);
    }

    #[test]
    fn partial_sections_override_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [train]
            iters_num = 50
            learning_rate = 0.1
            seed = 7

            [data]
            synthetic = 12
            "#,
        )
        .unwrap();
        assert_eq!(cfg.train.iters_num, 50);
        assert_eq!(cfg.train.learning_rate, 0.1);
        assert_eq!(cfg.train.seed, Some(7));
        assert_eq!(cfg.train.batch_size, 10);
        assert_eq!(cfg.data.synthetic, 12);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppConfig::from_toml_str("[train]\nlearnig_rate = 0.1\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn invalid_hyperparams_are_rejected() {
        assert!(AppConfig::from_toml_str("[train]\nlearning_rate = 0.0\n").is_err());
    }

    #[test]
    fn synthetic_splits_are_seeded() {
        let data = DataConfig {
            synthetic: 20,
            ..DataConfig::default()
        };
        let (a_train, a_test) = data.load_splits(Some(5)).unwrap();
        let (b_train, _) = data.load_splits(Some(5)).unwrap();
        assert_eq!(a_train, b_train);
        assert_eq!(a_train.len(), 20);
        assert_eq!(a_test.len(), 20);
    }

    #[test]
    fn lone_csv_path_is_rejected() {
        let data = DataConfig {
            train: Some(PathBuf::from("train.csv")),
            ..DataConfig::default()
        };
        assert!(data.load_splits(None).is_err());
    }
}
