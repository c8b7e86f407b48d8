//! Progress events and the host message protocol.
//!
//! The trainer is the only producer. It pushes [`ProgressEvent`]s into a
//! [`ProgressSink`]; the host decides what a sink does with them (collect them, forward
//! them over a channel, print them).
//!
//! On the wire every event is wrapped as
//! `{ "command": "progress", "label": <label>, "data": <payload> }`:
//!
//! | label            | payload                                                    |
//! |------------------|------------------------------------------------------------|
//! | `train:info`     | [`RunInfo`]                                                |
//! | `train:iterator` | [`IterationUpdate`]                                        |
//! | `train:epoch`    | [`EpochSummary`]                                           |
//! | `train:finish`   | none                                                       |

use crossbeam_channel::Sender;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::snapshot::WeightSnapshot;
use crate::{Error, Result};

/// Static configuration of a run, emitted once before the first iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunInfo {
    pub weight_init_std: f64,
    pub iters_num: usize,
    pub hidden_size: usize,
    pub train_size: usize,
    pub input_size: usize,
    pub output_size: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub max_epoch: usize,
}

/// State after one optimizer step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationUpdate {
    pub weights: WeightSnapshot,
    pub iter: usize,
    /// Batch loss evaluated with the updated weights.
    pub train_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    pub epoch: usize,
    pub max_epoch: usize,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub test_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "label", content = "data")]
pub enum ProgressEvent {
    #[serde(rename = "train:info")]
    Info(RunInfo),
    #[serde(rename = "train:iterator")]
    Iteration(IterationUpdate),
    #[serde(rename = "train:epoch")]
    Epoch(EpochSummary),
    #[serde(rename = "train:finish")]
    Finish,
}

impl ProgressEvent {
    pub fn label(&self) -> &'static str {
        match self {
            ProgressEvent::Info(_) => "train:info",
            ProgressEvent::Iteration(_) => "train:iterator",
            ProgressEvent::Epoch(_) => "train:epoch",
            ProgressEvent::Finish => "train:finish",
        }
    }
}

/// Outbound message envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressMessage {
    pub command: &'static str,
    #[serde(flatten)]
    pub event: ProgressEvent,
}

impl ProgressMessage {
    pub const COMMAND: &'static str = "progress";

    pub fn new(event: ProgressEvent) -> Self {
        Self {
            command: Self::COMMAND,
            event,
        }
    }

    /// Serialize to a single JSON line (no trailing newline).
    ///
    /// Non-finite values are written as `null`.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::InvalidData(format!("failed to serialize progress message: {e}")))
    }
}

/// Inbound command from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum HostCommand {
    /// Start a fresh training run.
    #[serde(rename = "train:start")]
    TrainStart,
}

impl HostCommand {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse host command: {e}")))
    }
}

/// Receiver of progress events.
///
/// `emit` must not block the trainer for long; there is no backpressure signal.
pub trait ProgressSink {
    fn emit(&mut self, event: ProgressEvent);
}

impl ProgressSink for Vec<ProgressEvent> {
    fn emit(&mut self, event: ProgressEvent) {
        self.push(event);
    }
}

/// Fire-and-forget sink over a channel.
///
/// Once the receiving side is dropped every further event is discarded; training itself
/// keeps going.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<ProgressMessage>,
    disconnected: bool,
}

impl ChannelSink {
    pub fn new(tx: Sender<ProgressMessage>) -> Self {
        Self {
            tx,
            disconnected: false,
        }
    }

    /// True once a send has failed because the receiver is gone.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&mut self, event: ProgressEvent) {
        if self.disconnected {
            return;
        }
        if self.tx.send(ProgressMessage::new(event)).is_err() {
            warn!("progress receiver dropped, discarding further events");
            self.disconnected = true;
        }
    }
}
