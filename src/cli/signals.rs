//! Control signals for the recorder's event loop

use std::path::PathBuf;

use colored::Colorize;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, oneshot};

use crate::domain::recording::Command;

/// Requests handled by the recorder's event loop
#[derive(Debug)]
pub enum ControlSignal {
    /// Run a control command; `ack` fires once the handler ran
    Command {
        command: Command,
        ack: oneshot::Sender<()>,
    },
    /// Save the last recording; replies with the written path
    Save {
        reply: oneshot::Sender<Result<PathBuf, String>>,
    },
    /// Stop capturing and exit (SIGINT/SIGTERM)
    Shutdown,
}

impl ControlSignal {
    /// A command request and the receiver for its acknowledgment
    pub fn command(command: Command) -> (Self, oneshot::Receiver<()>) {
        let (ack, done) = oneshot::channel();
        (Self::Command { command, ack }, done)
    }

    /// A save request and the receiver for its result
    pub fn save() -> (Self, oneshot::Receiver<Result<PathBuf, String>>) {
        let (reply, result) = oneshot::channel();
        (Self::Save { reply }, result)
    }
}

/// Recorder signal handler
///
/// Handles OS shutdown signals (SIGINT/SIGTERM) and provides a channel
/// for requests from other sources (the control socket).
pub struct ControlSignalHandler {
    receiver: mpsc::Receiver<ControlSignal>,
}

impl ControlSignalHandler {
    /// Create the handler and start listening for shutdown signals.
    ///
    /// Returns the handler and a sender for other request sources.
    pub fn new() -> Result<(Self, mpsc::Sender<ControlSignal>), std::io::Error> {
        let (tx, rx) = mpsc::channel(10);

        for (kind, name) in [
            (SignalKind::interrupt(), "SIGINT"),
            (SignalKind::terminate(), "SIGTERM"),
        ] {
            let tx = tx.clone();
            let mut stream = signal(kind)?;
            tokio::spawn(async move {
                stream.recv().await;
                eprintln!("{} Received {} (shutdown)", "↓".cyan(), name);
                let _ = tx.send(ControlSignal::Shutdown).await;
            });
        }

        Ok((Self { receiver: rx }, tx))
    }

    /// Wait for the next signal
    pub async fn recv(&mut self) -> Option<ControlSignal> {
        self.receiver.recv().await
    }
}
