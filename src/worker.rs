//! Dedicated training thread.
//!
//! The host talks to the worker through two unbounded channels:
//!
//! - commands in: [`HostCommand`]
//! - events out: [`ProgressMessage`]
//!
//! Every `train:start` builds a fresh [`Trainer`] over the worker's splits and runs it
//! to completion on the worker thread. Sends on the event channel never block, and a
//! dropped receiver only means further events are discarded. A run that fails logs the
//! error and emits nothing further; the worker then waits for the next command.
//!
//! The worker exits once every command sender is gone and the current run is done.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, error, info};

use crate::progress::{ChannelSink, HostCommand, ProgressMessage};
use crate::{Dataset, TrainConfig, Trainer};

/// Host-side handle to a spawned worker.
#[derive(Debug)]
pub struct WorkerHandle {
    commands: Option<Sender<HostCommand>>,
    events: Receiver<ProgressMessage>,
    thread: Option<JoinHandle<()>>,
}

/// Spawn a worker owning `train`, `test` and `config`.
pub fn spawn(train: Dataset, test: Dataset, config: TrainConfig) -> WorkerHandle {
    let (cmd_tx, cmd_rx) = unbounded::<HostCommand>();
    let (event_tx, event_rx) = unbounded::<ProgressMessage>();

    let thread = thread::spawn(move || worker_loop(&train, &test, &config, cmd_rx, event_tx));

    WorkerHandle {
        commands: Some(cmd_tx),
        events: event_rx,
        thread: Some(thread),
    }
}

impl WorkerHandle {
    /// Queue a command. Returns `false` if the worker is no longer listening.
    pub fn send(&self, command: HostCommand) -> bool {
        self.commands
            .as_ref()
            .is_some_and(|tx| tx.send(command).is_ok())
    }

    /// Queue a `train:start`.
    pub fn start(&self) -> bool {
        self.send(HostCommand::TrainStart)
    }

    /// Outbound progress messages, in emission order.
    ///
    /// The channel disconnects once the worker has exited.
    pub fn events(&self) -> &Receiver<ProgressMessage> {
        &self.events
    }

    /// Stop accepting commands. Already queued runs still complete.
    pub fn close(&mut self) {
        self.commands = None;
    }

    /// Close the command channel and wait for the worker thread to exit.
    pub fn shutdown(mut self) -> thread::Result<()> {
        self.close();
        match self.thread.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }
}

fn worker_loop(
    train: &Dataset,
    test: &Dataset,
    config: &TrainConfig,
    commands: Receiver<HostCommand>,
    events: Sender<ProgressMessage>,
) {
    for command in commands.iter() {
        match command {
            HostCommand::TrainStart => {
                debug!("received train:start");
                let mut sink = ChannelSink::new(events.clone());
                let result = Trainer::new(train, test, config.clone())
                    .and_then(|mut trainer| trainer.run(&mut sink));
                match result {
                    Ok(report) => info!(
                        "run complete: {} iterations, final train_acc={:.4} test_acc={:.4}",
                        report.iterations, report.final_train_accuracy, report.final_test_accuracy
                    ),
                    Err(e) => error!("training run failed: {e}"),
                }
            }
        }
    }
    debug!("command channel closed, worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn idle_worker_exits_when_closed() {
        let mut rng = StdRng::seed_from_u64(0);
        let train = Dataset::primary_colors(10, &mut rng);
        let test = Dataset::primary_colors(5, &mut rng);
        let handle = spawn(train, test, TrainConfig::default());
        assert!(handle.shutdown().is_ok());
    }

    #[test]
    fn send_after_close_is_refused() {
        let mut rng = StdRng::seed_from_u64(0);
        let train = Dataset::primary_colors(10, &mut rng);
        let test = Dataset::primary_colors(5, &mut rng);
        let mut handle = spawn(train, test, TrainConfig::default());
        handle.close();
        assert!(!handle.start());
        assert!(handle.events().recv().is_err());
        assert!(handle.shutdown().is_ok());
    }
}
