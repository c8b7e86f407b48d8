//! A tiny RGB color classifier trained by numerical gradient descent.
//!
//! `colornet` trains a fixed two-layer perceptron
//!
//! ```text
//! x (RGB) -> affine(W1, b1) -> relu -> affine(W2, b2) -> softmax -> class probabilities
//! ```
//!
//! with mini-batch gradient descent. The gradient is *not* computed by backpropagation:
//! every parameter is perturbed by `±h` and the loss re-evaluated (central finite
//! differences). This is slow and keeps the maths obviously correct. It also
//! means the hidden layer and batch must stay small.
//!
//! Training streams [`ProgressEvent`]s to an observer, either directly through a
//! [`ProgressSink`] or, via [`worker::spawn`], over a channel from a dedicated thread.
//!
//! # Panics vs `Result`
//!
//! - Low-level hot path (panics on misuse): [`mlp::predict_into`], [`loss::batch_loss`],
//!   [`Sgd::step`]. Shape mismatches are programmer error.
//! - Construction and API boundaries return [`Result`]: [`WeightStore::from_parts`],
//!   [`Dataset::from_flat`], [`Trainer::new`], [`BatchSampler::sample`],
//!   [`mlp::try_predict`].
//!
//! # Numerical sharp edges
//!
//! The softmax is not max-shifted and the loss does not clamp `ln(0)`. Overflowing logits
//! and zero true-class probabilities produce `inf`/`NaN`, which flow into progress events
//! unchanged.
//!
//! # Quick start
//!
//! ```rust
//! use colornet::{Dataset, ProgressEvent, TrainConfig, Trainer};
//! use rand::SeedableRng;
//!
//! # fn main() -> colornet::Result<()> {
//! let mut rng = rand::rngs::StdRng::seed_from_u64(0);
//! let train = Dataset::primary_colors(60, &mut rng);
//! let test = Dataset::primary_colors(30, &mut rng);
//!
//! let config = TrainConfig {
//!     iters_num: 20,
//!     learning_rate: 0.1,
//!     weight_init_std: 0.5,
//!     seed: Some(0),
//!     ..TrainConfig::default()
//! };
//! let mut trainer = Trainer::new(&train, &test, config)?;
//! let mut events: Vec<ProgressEvent> = Vec::new();
//! let report = trainer.run(&mut events)?;
//! assert_eq!(events.last(), Some(&ProgressEvent::Finish));
//! assert!(report.final_train_accuracy >= 0.0);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod config;
pub mod data;
pub mod error;
pub mod gradient;
pub(crate) mod layer;
pub mod loss;
pub mod metrics;
pub mod mlp;
pub mod optim;
pub mod progress;
pub mod sampler;
pub mod snapshot;
pub mod train;
pub mod weights;
pub mod worker;

pub use config::{AppConfig, DataConfig};
pub use data::Dataset;
pub use error::{Error, Result};
pub use gradient::numerical_gradient;
pub use metrics::{accuracy, accuracy_of_predictions, argmax};
pub use mlp::{Scratch, predict};
pub use optim::Sgd;
pub use progress::{
    ChannelSink, EpochSummary, HostCommand, IterationUpdate, ProgressEvent, ProgressMessage,
    ProgressSink, RunInfo,
};
pub use sampler::BatchSampler;
pub use snapshot::WeightSnapshot;
pub use train::{TrainConfig, TrainReport, Trainer, TrainerState};
pub use weights::{Gradient, Matrix, ParamGroup, WeightStore};
pub use worker::WorkerHandle;
