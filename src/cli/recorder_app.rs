//! Recorder runner: acquisition, the event loop and the control socket

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use chrono::Local;
use tokio::sync::mpsc;

use crate::application::ports::{ArtifactStore, MediaEncoder, PresentationSink, StateNotifier};
use crate::application::{AcquisitionEvent, RecorderError, RecordingStateMachine, StreamAcquirer};
use crate::domain::media::{AudioConstraints, CaptureSettings, VideoConstraints};
use crate::domain::recording::{Command, RecordingState};
use crate::infrastructure::{BroadcastNotifier, FfmpegCapture, FileArtifactStore};

use super::app::{EXIT_ERROR, EXIT_SUCCESS};
use super::args::RecorderOptions;
use super::ipc::{create_ipc_server, StateFn};
use super::pid_file::PidFile;
use super::presenter::{Presenter, TerminalPresenter};
use super::signals::{ControlSignal, ControlSignalHandler};

/// Status name after acquisition failed
const STATUS_FAILED: &str = "failed";

/// Status name shared with the control socket
type StatusCell = Arc<Mutex<&'static str>>;

/// Run the recorder until SIGINT/SIGTERM
pub async fn run_recorder(options: RecorderOptions) -> ExitCode {
    let presenter = Presenter::new();

    let mut pid_file = PidFile::new();
    if let Err(e) = pid_file.acquire() {
        presenter.error(&e.to_string());
        return ExitCode::from(EXIT_ERROR);
    }

    // Handler plus a sender for the socket server
    let (mut signals, signal_tx) = match ControlSignalHandler::new() {
        Ok(s) => s,
        Err(e) => {
            presenter.error(&format!("Failed to setup signal handler: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut server = create_ipc_server();
    if let Err(e) = server.bind() {
        presenter.error(&format!("Failed to bind socket {}: {}", server.path(), e));
        return ExitCode::from(EXIT_ERROR);
    }
    let socket = server.path();

    let notifier = BroadcastNotifier::default();
    let status: StatusCell = Arc::new(Mutex::new(RecordingState::default().as_str()));
    let state_fn: StateFn = {
        let status = Arc::clone(&status);
        Arc::new(move || *status.lock().unwrap_or_else(|e| e.into_inner()))
    };

    // Dropping the server at exit removes the socket file
    let server_notifier = notifier.clone();
    tokio::spawn(async move {
        if let Err(e) = server.run(signal_tx, state_fn, server_notifier).await {
            tracing::error!(error = %e, "control socket stopped");
        }
    });

    let store = FileArtifactStore::new(options.output_dir.clone());
    presenter.recorder_status("Started");
    presenter.info(&format!(
        "PID: {} | Socket: {} | Output: {} | SIGINT: exit",
        std::process::id(),
        socket,
        store.output_dir().display()
    ));

    let capture = FfmpegCapture::new(options.display.clone(), options.audio_device.clone());
    let mut machine = RecordingStateMachine::new(
        capture.clone(),
        TerminalPresenter::new(),
        notifier,
        CaptureSettings::default(),
    );

    let (acquisition_tx, acquisition_rx) = mpsc::unbounded_channel();
    let acquirer = StreamAcquirer::new(
        capture,
        VideoConstraints::screen(options.frame_rate),
        AudioConstraints::default(),
    );
    tokio::spawn(acquirer.run(acquisition_tx));

    event_loop(
        &mut machine,
        acquisition_rx,
        &mut signals,
        &store,
        &status,
        &presenter,
    )
    .await;

    presenter.recorder_status("Shutting down...");
    machine.shutdown().await;
    let _ = pid_file.release();

    ExitCode::from(EXIT_SUCCESS)
}

/// Serve acquisition progress, control requests and capture output
/// until shutdown is requested
async fn event_loop<E, P, N, S>(
    machine: &mut RecordingStateMachine<E, P, N>,
    mut acquisition: mpsc::UnboundedReceiver<AcquisitionEvent>,
    signals: &mut ControlSignalHandler,
    store: &S,
    status: &StatusCell,
    presenter: &Presenter,
) where
    E: MediaEncoder,
    P: PresentationSink,
    N: StateNotifier,
    S: ArtifactStore,
{
    publish_status(status, machine);

    loop {
        tokio::select! {
            Some(event) = acquisition.recv() => {
                machine.handle_acquisition(event);
                publish_status(status, machine);
            }
            signal = signals.recv() => match signal {
                Some(ControlSignal::Command { command, ack }) => {
                    run_command(machine, command, presenter).await;
                    publish_status(status, machine);
                    let _ = ack.send(());
                }
                Some(ControlSignal::Save { reply }) => {
                    let result = save_recording(machine, store, presenter).await;
                    let _ = reply.send(result);
                }
                Some(ControlSignal::Shutdown) | None => return,
            },
            fragment = machine.next_fragment() => match fragment {
                Some(fragment) => {
                    machine.append_fragment(fragment);
                }
                None => {
                    tracing::warn!(state = %machine.current_state(), "capture output ended");
                    presenter.warn("Capture ended unexpectedly, stop the recording to keep what was captured");
                }
            },
        }
    }
}

async fn run_command<E, P, N>(
    machine: &mut RecordingStateMachine<E, P, N>,
    command: Command,
    presenter: &Presenter,
) where
    E: MediaEncoder,
    P: PresentationSink,
    N: StateNotifier,
{
    match machine.apply_command(command).await {
        Ok(change) => {
            tracing::info!(command = command.as_str(), from = %change.from, to = %change.to, "command applied");
        }
        Err(RecorderError::Invalid(e)) => {
            tracing::trace!(error = %e, "command ignored");
        }
        Err(e) => {
            tracing::error!(command = command.as_str(), error = %e, "command failed");
            presenter.error(&e.to_string());
        }
    }
}

async fn save_recording<E, P, N, S>(
    machine: &RecordingStateMachine<E, P, N>,
    store: &S,
    presenter: &Presenter,
) -> Result<PathBuf, String>
where
    E: MediaEncoder,
    P: PresentationSink,
    N: StateNotifier,
    S: ArtifactStore,
{
    let artifact = machine.export().map_err(|e| e.to_string())?;
    match store.save(&artifact, Local::now()).await {
        Ok(path) => {
            presenter.success(&format!(
                "Saved recording ({}) to {}",
                artifact.human_readable_size(),
                path.display()
            ));
            Ok(path)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            Err(e.to_string())
        }
    }
}

fn publish_status<E, P, N>(status: &StatusCell, machine: &RecordingStateMachine<E, P, N>)
where
    E: MediaEncoder,
    P: PresentationSink,
    N: StateNotifier,
{
    let name = if machine.is_failed() {
        STATUS_FAILED
    } else {
        machine.current_state().as_str()
    };
    *status.lock().unwrap_or_else(|e| e.into_inner()) = name;
}
