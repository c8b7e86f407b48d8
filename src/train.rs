//! Training loop.
//!
//! A [`Trainer`] owns one run's parameters and walks a small state machine:
//!
//! ```text
//! Idle -> Initializing -> Running -> Finished
//! ```
//!
//! - `Initializing`: allocate a randomly initialized [`WeightStore`], emit `train:info`.
//! - `Running`: `iters_num` iterations of sample batch → numerical gradient → SGD step →
//!   `train:iterator`. Every `iter_per_epoch` iterations (starting at `iter == 0`) the
//!   trainer also measures train/test accuracy and test loss and emits `train:epoch`.
//! - `Finished`: measure final accuracy, emit `train:finish`.
//!
//! There is no pause, resume or cancellation check. Calling [`Trainer::run`] again
//! starts a fresh run with freshly initialized weights.

use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::gradient::numerical_gradient;
use crate::loss::{batch_loss, split_loss};
use crate::metrics::accuracy;
use crate::mlp::Scratch;
use crate::progress::{EpochSummary, IterationUpdate, ProgressEvent, ProgressSink, RunInfo};
use crate::sampler::BatchSampler;
use crate::snapshot::WeightSnapshot;
use crate::{Dataset, Error, Result, Sgd, WeightStore};

/// Hyperparameters of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    pub iters_num: usize,
    pub hidden_size: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Scale applied to uniform `[0, 1)` weight initialization.
    pub weight_init_std: f64,
    /// Seed for initialization and batch sampling; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            iters_num: 1000,
            hidden_size: 4,
            batch_size: 10,
            learning_rate: 0.001,
            weight_init_std: 0.01,
            seed: None,
        }
    }
}

impl TrainConfig {
    /// Validate hyperparameters that do not depend on the data.
    pub fn validate(&self) -> Result<()> {
        if self.iters_num == 0 {
            return Err(Error::InvalidConfig("iters_num must be > 0".to_owned()));
        }
        if self.hidden_size == 0 {
            return Err(Error::InvalidConfig("hidden_size must be > 0".to_owned()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        if !(self.weight_init_std.is_finite() && self.weight_init_std >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "weight_init_std must be finite and >= 0, got {}",
                self.weight_init_std
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerState {
    Idle,
    Initializing,
    Running,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    pub iterations: usize,
    pub final_train_accuracy: f64,
    pub final_test_accuracy: f64,
    /// Batch loss after the last optimizer step.
    pub final_train_loss: f64,
}

pub struct Trainer<'a> {
    train: &'a Dataset,
    test: &'a Dataset,
    config: TrainConfig,
    optimizer: Sgd,
    state: TrainerState,
    weights: Option<WeightStore>,
}

impl<'a> Trainer<'a> {
    /// Validate `config` against the splits and build an idle trainer.
    pub fn new(train: &'a Dataset, test: &'a Dataset, config: TrainConfig) -> Result<Self> {
        config.validate()?;
        let optimizer = Sgd::new(config.learning_rate)?;

        if train.is_empty() {
            return Err(Error::InvalidData(
                "train split must not be empty".to_owned(),
            ));
        }
        if test.is_empty() {
            return Err(Error::InvalidData("test split must not be empty".to_owned()));
        }
        if train.input_dim() != test.input_dim() {
            return Err(Error::InvalidData(format!(
                "train input_dim {} does not match test input_dim {}",
                train.input_dim(),
                test.input_dim()
            )));
        }
        if train.num_classes() != test.num_classes() {
            return Err(Error::InvalidData(format!(
                "train num_classes {} does not match test num_classes {}",
                train.num_classes(),
                test.num_classes()
            )));
        }
        if config.batch_size > train.len() {
            return Err(Error::InvalidBatch {
                batch_size: config.batch_size,
                split_size: train.len(),
            });
        }

        Ok(Self {
            train,
            test,
            config,
            optimizer,
            state: TrainerState::Idle,
            weights: None,
        })
    }

    #[inline]
    pub fn state(&self) -> TrainerState {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Parameters of the most recent run, if one has completed.
    #[inline]
    pub fn weights(&self) -> Option<&WeightStore> {
        self.weights.as_ref()
    }

    /// Iterations per epoch: `max(train_size / batch_size, 1)`.
    pub fn iter_per_epoch(&self) -> usize {
        (self.train.len() / self.config.batch_size).max(1)
    }

    /// Number of epoch boundaries a run crosses (including `iter == 0`).
    pub fn max_epoch(&self) -> usize {
        self.config.iters_num.div_ceil(self.iter_per_epoch())
    }

    pub fn run_info(&self) -> RunInfo {
        RunInfo {
            weight_init_std: self.config.weight_init_std,
            iters_num: self.config.iters_num,
            hidden_size: self.config.hidden_size,
            train_size: self.train.len(),
            input_size: self.train.input_dim(),
            output_size: self.train.num_classes(),
            batch_size: self.config.batch_size,
            learning_rate: self.config.learning_rate,
            max_epoch: self.max_epoch(),
        }
    }

    /// Run a fresh training run to completion, streaming events into `sink`.
    ///
    /// On error the trainer goes back to `Idle` with no weights, and no `train:finish` is
    /// emitted.
    pub fn run<S: ProgressSink + ?Sized>(&mut self, sink: &mut S) -> Result<TrainReport> {
        self.state = TrainerState::Initializing;
        self.weights = None;

        let result = self.run_to_end(sink);
        if result.is_err() {
            self.state = TrainerState::Idle;
            self.weights = None;
        }
        result
    }

    fn run_to_end<S: ProgressSink + ?Sized>(&mut self, sink: &mut S) -> Result<TrainReport> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut weights = WeightStore::new_with_rng(
            self.train.input_dim(),
            self.config.hidden_size,
            self.train.num_classes(),
            self.config.weight_init_std,
            &mut rng,
        )?;
        let mut sampler = BatchSampler::new_with_seed(rng.r#gen());

        let info = self.run_info();
        info!(
            "training started: iters={} hidden={} batch={} lr={} params={}",
            info.iters_num,
            info.hidden_size,
            info.batch_size,
            self.optimizer.lr(),
            weights.num_params()
        );
        sink.emit(ProgressEvent::Info(info));

        self.state = TrainerState::Running;
        let train = self.train;
        let test = self.test;
        let iter_per_epoch = self.iter_per_epoch();
        let max_epoch = self.max_epoch();
        let mut scratch = Scratch::new(&weights);
        let mut train_loss = f64::NAN;
        let start = Instant::now();

        for iter in 0..self.config.iters_num {
            let batch = sampler.sample(train.len(), self.config.batch_size)?;

            let grad = numerical_gradient(&mut weights, |w| {
                batch_loss(w, train, &batch, &mut scratch)
            });
            self.optimizer.step(&mut weights, &grad);

            train_loss = batch_loss(&weights, train, &batch, &mut scratch);
            sink.emit(ProgressEvent::Iteration(IterationUpdate {
                weights: WeightSnapshot::from(&weights),
                iter,
                train_loss,
            }));

            if iter % iter_per_epoch == 0 {
                let summary = EpochSummary {
                    epoch: iter / iter_per_epoch,
                    max_epoch,
                    train_accuracy: accuracy(train, &weights)?,
                    test_accuracy: accuracy(test, &weights)?,
                    test_loss: split_loss(&weights, test),
                };
                debug!(
                    "epoch {}/{}: train_acc={:.4} test_acc={:.4} test_loss={:.6} batch_loss={:.6}",
                    summary.epoch,
                    summary.max_epoch,
                    summary.train_accuracy,
                    summary.test_accuracy,
                    summary.test_loss,
                    train_loss
                );
                sink.emit(ProgressEvent::Epoch(summary));
            }
        }

        let report = TrainReport {
            iterations: self.config.iters_num,
            final_train_accuracy: accuracy(train, &weights)?,
            final_test_accuracy: accuracy(test, &weights)?,
            final_train_loss: train_loss,
        };
        info!(
            "training finished: train_acc={:.4} test_acc={:.4} in {:.2}s",
            report.final_train_accuracy,
            report.final_test_accuracy,
            start.elapsed().as_secs_f64()
        );

        self.weights = Some(weights);
        self.state = TrainerState::Finished;
        sink.emit(ProgressEvent::Finish);

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splits(seed: u64) -> (Dataset, Dataset) {
        let mut rng = StdRng::seed_from_u64(seed);
        let train = Dataset::primary_colors(40, &mut rng);
        let test = Dataset::primary_colors(20, &mut rng);
        (train, test)
    }

    fn small_config() -> TrainConfig {
        TrainConfig {
            iters_num: 10,
            hidden_size: 3,
            batch_size: 10,
            learning_rate: 0.1,
            weight_init_std: 0.5,
            seed: Some(1),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn config_validation_rejects_bad_hyperparams() {
        let bad = [
            TrainConfig {
                iters_num: 0,
                ..TrainConfig::default()
            },
            TrainConfig {
                hidden_size: 0,
                ..TrainConfig::default()
            },
            TrainConfig {
                batch_size: 0,
                ..TrainConfig::default()
            },
            TrainConfig {
                learning_rate: -0.1,
                ..TrainConfig::default()
            },
            TrainConfig {
                weight_init_std: f64::NAN,
                ..TrainConfig::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{cfg:?}");
        }
    }

    #[test]
    fn new_rejects_batch_larger_than_train_split() {
        let (train, test) = splits(0);
        let cfg = TrainConfig {
            batch_size: 41,
            ..small_config()
        };
        assert!(matches!(
            Trainer::new(&train, &test, cfg),
            Err(Error::InvalidBatch {
                batch_size: 41,
                split_size: 40
            })
        ));
    }

    #[test]
    fn new_rejects_mismatched_splits() {
        let (train, _) = splits(0);
        let other = Dataset::from_rows(&[vec![0.1, 0.2]], &[0], 3).unwrap();
        assert!(Trainer::new(&train, &other, small_config()).is_err());

        let empty = Dataset::from_flat(vec![], vec![], 3, 3).unwrap();
        assert!(Trainer::new(&train, &empty, small_config()).is_err());
    }

    #[test]
    fn run_emits_events_in_order() {
        let (train, test) = splits(2);
        let mut trainer = Trainer::new(&train, &test, small_config()).unwrap();
        assert_eq!(trainer.state(), TrainerState::Idle);
        assert_eq!(trainer.iter_per_epoch(), 4);
        assert_eq!(trainer.max_epoch(), 3);

        let mut events: Vec<ProgressEvent> = Vec::new();
        let report = trainer.run(&mut events).unwrap();
        assert_eq!(trainer.state(), TrainerState::Finished);
        assert_eq!(report.iterations, 10);

        // info + 10 iterator + 3 epoch (iters 0, 4, 8) + finish
        assert_eq!(events.len(), 15);
        assert!(matches!(&events[0], ProgressEvent::Info(info) if info.max_epoch == 3));
        assert_eq!(events.last(), Some(&ProgressEvent::Finish));

        let iters: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Iteration(u) => Some(u.iter),
                _ => None,
            })
            .collect();
        assert_eq!(iters, (0..10).collect::<Vec<_>>());

        let epochs: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Epoch(s) => Some(s.epoch),
                _ => None,
            })
            .collect();
        assert_eq!(epochs, vec![0, 1, 2]);

        // Each epoch event directly follows the iterator event of its boundary iteration.
        for (i, e) in events.iter().enumerate() {
            if let ProgressEvent::Epoch(s) = e {
                match &events[i - 1] {
                    ProgressEvent::Iteration(u) => assert_eq!(u.iter, s.epoch * 4),
                    other => panic!("epoch preceded by {}", other.label()),
                }
            }
        }
    }

    #[test]
    fn failed_run_returns_to_idle() {
        let (train, test) = splits(5);
        // Bypass `new` so sampling fails on the first iteration.
        let config = TrainConfig {
            batch_size: 41,
            ..small_config()
        };
        let mut trainer = Trainer {
            train: &train,
            test: &test,
            optimizer: Sgd::new(config.learning_rate).unwrap(),
            config,
            state: TrainerState::Idle,
            weights: None,
        };

        let mut events: Vec<ProgressEvent> = Vec::new();
        assert!(matches!(
            trainer.run(&mut events),
            Err(Error::InvalidBatch { .. })
        ));
        assert_eq!(trainer.state(), TrainerState::Idle);
        assert!(trainer.weights().is_none());
        assert!(matches!(events.as_slice(), [ProgressEvent::Info(_)]));
    }

    #[test]
    fn overflowing_weights_flow_into_events() {
        let (train, test) = splits(6);
        let config = TrainConfig {
            weight_init_std: 1e4,
            ..small_config()
        };
        let mut trainer = Trainer::new(&train, &test, config).unwrap();
        let mut events: Vec<ProgressEvent> = Vec::new();
        let report = trainer.run(&mut events).unwrap();

        assert_eq!(trainer.state(), TrainerState::Finished);
        assert_eq!(events.last(), Some(&ProgressEvent::Finish));
        assert!(!report.final_train_loss.is_finite());
        assert!(events.iter().any(|e| matches!(
            e,
            ProgressEvent::Iteration(u) if !u.train_loss.is_finite()
        )));
    }

    #[test]
    fn last_snapshot_matches_final_weights() {
        let (train, test) = splits(3);
        let mut trainer = Trainer::new(&train, &test, small_config()).unwrap();
        let mut events: Vec<ProgressEvent> = Vec::new();
        trainer.run(&mut events).unwrap();

        let last = events
            .iter()
            .rev()
            .find_map(|e| match e {
                ProgressEvent::Iteration(u) => Some(u.weights.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(last, WeightSnapshot::from(trainer.weights().unwrap()));
    }

    #[test]
    fn seeded_runs_are_reproducible_and_rerun_starts_fresh() {
        let (train, test) = splits(4);
        let mut a = Trainer::new(&train, &test, small_config()).unwrap();
        let mut b = Trainer::new(&train, &test, small_config()).unwrap();

        let ra = a.run(&mut Vec::<ProgressEvent>::new()).unwrap();
        let rb = b.run(&mut Vec::<ProgressEvent>::new()).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(a.weights(), b.weights());

        let first = a.weights().cloned();
        a.run(&mut Vec::<ProgressEvent>::new()).unwrap();
        assert_eq!(a.weights().cloned(), first);
    }
}
