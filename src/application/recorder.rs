//! Recording state machine
//!
//! Owns the recorder state, the acquired stream, the active capture session
//! and the chunk buffer. Every transition renders the new presentation and
//! announces the new state; nothing else mutates this state.

use thiserror::Error;

use crate::domain::error::AcquisitionError;
use crate::domain::media::{CaptureSettings, ExportedArtifact, MediaStream};
use crate::domain::recording::presentation::ALERT_INIT_FAILED;
use crate::domain::recording::{
    transition, ChunkBuffer, ChunkSequence, Command, Event, Fragment, InvalidCommand,
    Notification, Presentation, RecordingState, StateChange,
};

use super::acquire::AcquisitionEvent;
use super::ports::{
    CaptureError, CaptureSession, ExportError, MediaEncoder, PresentationSink, StateNotifier,
};

/// Errors from applying a command
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error(transparent)]
    Invalid(#[from] InvalidCommand),

    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),
}

/// The recorder's state machine
pub struct RecordingStateMachine<E, P, N>
where
    E: MediaEncoder,
    P: PresentationSink,
    N: StateNotifier,
{
    encoder: E,
    ui: P,
    notifier: N,
    settings: CaptureSettings,
    state: RecordingState,
    failure: Option<AcquisitionError>,
    stream: Option<MediaStream>,
    session: Option<Box<dyn CaptureSession>>,
    session_ended: bool,
    buffer: ChunkBuffer,
    last_recording: Option<ChunkSequence>,
}

impl<E, P, N> RecordingStateMachine<E, P, N>
where
    E: MediaEncoder,
    P: PresentationSink,
    N: StateNotifier,
{
    /// Create the state machine in the `AcquiringVideo` state and render it
    pub fn new(encoder: E, ui: P, notifier: N, settings: CaptureSettings) -> Self {
        let machine = Self {
            encoder,
            ui,
            notifier,
            settings,
            state: RecordingState::AcquiringVideo,
            failure: None,
            stream: None,
            session: None,
            session_ended: false,
            buffer: ChunkBuffer::new(),
            last_recording: None,
        };
        machine.render();
        machine
    }

    /// Get the current state
    pub fn current_state(&self) -> RecordingState {
        self.state
    }

    /// Check if acquisition failed for good
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Current presentation
    pub fn presentation(&self) -> Presentation {
        if self.failure.is_some() {
            Presentation::acquisition_failed()
        } else {
            Presentation::project(self.state, self.has_recording())
        }
    }

    /// Frozen fragments of the most recent finished recording
    pub fn last_recording(&self) -> Option<&ChunkSequence> {
        self.last_recording.as_ref()
    }

    /// Number of fragments buffered by the active recording
    pub fn buffered_fragments(&self) -> usize {
        self.buffer.len()
    }

    /// Apply progress reported by the stream acquirer
    pub fn handle_acquisition(&mut self, event: AcquisitionEvent) -> Option<StateChange> {
        if self.failure.is_some() || !self.state.is_acquiring() {
            return None;
        }

        match event {
            AcquisitionEvent::VideoReady => self.fire(Event::VideoReady),
            AcquisitionEvent::StreamReady(stream) => {
                transition(self.state, Event::AudioReady)?;
                self.stream = Some(stream);
                self.fire(Event::AudioReady)
            }
            AcquisitionEvent::Failed(err) => {
                tracing::error!(step = %err.step, error = %err, "device acquisition failed");
                self.failure = Some(err);
                self.ui.alert(ALERT_INIT_FAILED);
                self.render();
                None
            }
        }
    }

    /// Apply a command from the UI or the external channel.
    ///
    /// Commands the current state has no handler for return
    /// `RecorderError::Invalid` and change nothing.
    pub async fn apply_command(&mut self, command: Command) -> Result<StateChange, RecorderError> {
        let invalid = InvalidCommand {
            command,
            state: self.state,
        };
        if self.failure.is_some() {
            return Err(invalid.into());
        }
        let Some(event) = command.resolve(self.state) else {
            return Err(invalid.into());
        };
        let Some(to) = transition(self.state, event) else {
            return Err(invalid.into());
        };

        match event {
            Event::Start => self.start_session().await?,
            Event::Pause => self.pause_session().await?,
            Event::Resume => self.resume_session().await?,
            Event::Stop => self.stop_session().await,
            Event::VideoReady | Event::AudioReady => {}
        }

        Ok(self.enter(to))
    }

    /// Wait for the next fragment of the active session.
    ///
    /// Returns `None` once when the session's output ends, then pends
    /// forever until a new session is started, as it does while none runs.
    pub async fn next_fragment(&mut self) -> Option<Fragment> {
        match self.session.as_mut() {
            Some(session) if !self.session_ended => {
                let fragment = session.next_fragment().await;
                if fragment.is_none() {
                    self.session_ended = true;
                }
                fragment
            }
            _ => std::future::pending().await,
        }
    }

    /// Buffer a fragment. Rejected unless recording.
    pub fn append_fragment(&mut self, fragment: Fragment) -> bool {
        if self.state != RecordingState::Recording {
            tracing::trace!(state = %self.state, "dropping fragment outside recording");
            return false;
        }
        self.buffer.append(fragment).is_ok()
    }

    /// Assemble the most recent recording for saving
    pub fn export(&self) -> Result<ExportedArtifact, ExportError> {
        if self.state != RecordingState::Stopped {
            return Err(ExportError::NotStopped(self.state.to_string()));
        }
        match self.last_recording.as_ref() {
            Some(sequence) if !sequence.is_empty() => Ok(ExportedArtifact::assemble(
                sequence,
                self.settings.container,
            )),
            _ => Err(ExportError::NoRecording),
        }
    }

    /// Stop any running session before the process exits
    pub async fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!("stopping active capture for shutdown");
            if let Err(e) = session.stop().await {
                tracing::warn!(error = %e, "capture did not stop cleanly");
            }
        }
    }

    async fn start_session(&mut self) -> Result<(), CaptureError> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| CaptureError::StartFailed("no media stream acquired".to_string()))?;
        let session = self.encoder.start(stream, &self.settings).await?;

        self.buffer.clear();
        self.last_recording = None;
        self.session = Some(session);
        self.session_ended = false;
        Ok(())
    }

    async fn pause_session(&mut self) -> Result<(), CaptureError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| CaptureError::PauseFailed("no active session".to_string()))?;
        let pending = session.pause().await?;

        // Still recording here, so these land in the buffer.
        for fragment in pending {
            self.append_fragment(fragment);
        }
        Ok(())
    }

    async fn resume_session(&mut self) -> Result<(), CaptureError> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| CaptureError::ResumeFailed("no active session".to_string()))?;
        session.resume().await
    }

    async fn stop_session(&mut self) {
        if let Some(session) = self.session.take() {
            match session.stop().await {
                Ok(tail) => {
                    for fragment in tail {
                        self.append_fragment(fragment);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "capture did not stop cleanly"),
            }
        }

        let sequence = self.buffer.freeze();
        tracing::info!(
            fragments = sequence.len(),
            bytes = sequence.total_bytes(),
            "recording finished"
        );
        self.last_recording = Some(sequence);
    }

    fn fire(&mut self, event: Event) -> Option<StateChange> {
        transition(self.state, event).map(|to| self.enter(to))
    }

    fn enter(&mut self, to: RecordingState) -> StateChange {
        let from = self.state;
        self.state = to;
        tracing::debug!(%from, %to, "state changed");

        self.render();
        if let Some(notification) = Notification::for_state(to) {
            self.notifier.notify(notification);
        }
        StateChange { from, to }
    }

    fn render(&self) {
        self.ui.render(&self.presentation());
    }

    fn has_recording(&self) -> bool {
        self.last_recording
            .as_ref()
            .is_some_and(|sequence| !sequence.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::media::{AudioTrack, VideoTrack};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tokio::sync::mpsc;

    type Log<T> = Arc<Mutex<Vec<T>>>;

    fn log<T>() -> Log<T> {
        Arc::new(Mutex::new(Vec::new()))
    }

    /// Encoder whose sessions are fed by the test through `feeds`
    struct MockEncoder {
        calls: Log<&'static str>,
        feeds: Log<mpsc::UnboundedSender<Fragment>>,
        fail_start: bool,
    }

    struct MockSession {
        calls: Log<&'static str>,
        fragments: mpsc::UnboundedReceiver<Fragment>,
    }

    impl MockSession {
        fn drain(&mut self) -> Vec<Fragment> {
            let mut out = Vec::new();
            while let Ok(fragment) = self.fragments.try_recv() {
                out.push(fragment);
            }
            out
        }
    }

    #[async_trait]
    impl MediaEncoder for MockEncoder {
        async fn start(
            &self,
            _stream: &MediaStream,
            settings: &CaptureSettings,
        ) -> Result<Box<dyn CaptureSession>, CaptureError> {
            assert_eq!(settings.fragment_interval.as_millis(), 20);
            if self.fail_start {
                return Err(CaptureError::FfmpegNotFound);
            }
            self.calls.lock().unwrap().push("start");
            let (tx, rx) = mpsc::unbounded_channel();
            self.feeds.lock().unwrap().push(tx);
            Ok(Box::new(MockSession {
                calls: Arc::clone(&self.calls),
                fragments: rx,
            }))
        }
    }

    #[async_trait]
    impl CaptureSession for MockSession {
        async fn next_fragment(&mut self) -> Option<Fragment> {
            self.fragments.recv().await
        }

        async fn pause(&mut self) -> Result<Vec<Fragment>, CaptureError> {
            self.calls.lock().unwrap().push("pause");
            Ok(self.drain())
        }

        async fn resume(&mut self) -> Result<(), CaptureError> {
            self.calls.lock().unwrap().push("resume");
            Ok(())
        }

        async fn stop(self: Box<Self>) -> Result<Vec<Fragment>, CaptureError> {
            let mut session = *self;
            session.calls.lock().unwrap().push("stop");
            Ok(session.drain())
        }
    }

    struct MockUi {
        renders: Log<Presentation>,
        alerts: Log<String>,
        order: Log<&'static str>,
    }

    impl PresentationSink for MockUi {
        fn render(&self, presentation: &Presentation) {
            self.renders.lock().unwrap().push(*presentation);
            self.order.lock().unwrap().push("render");
        }

        fn alert(&self, message: &str) {
            self.alerts.lock().unwrap().push(message.to_string());
            self.order.lock().unwrap().push("alert");
        }
    }

    struct MockNotifier {
        sent: Log<Notification>,
    }

    impl StateNotifier for MockNotifier {
        fn notify(&self, notification: Notification) {
            self.sent.lock().unwrap().push(notification);
        }
    }

    struct Harness {
        machine: RecordingStateMachine<MockEncoder, MockUi, MockNotifier>,
        calls: Log<&'static str>,
        feeds: Log<mpsc::UnboundedSender<Fragment>>,
        renders: Log<Presentation>,
        alerts: Log<String>,
        ui_order: Log<&'static str>,
        sent: Log<Notification>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_failing_start(false)
        }

        fn with_failing_start(fail_start: bool) -> Self {
            let calls = log();
            let feeds = log();
            let renders = log();
            let alerts = log();
            let ui_order = log();
            let sent = log();
            let machine = RecordingStateMachine::new(
                MockEncoder {
                    calls: Arc::clone(&calls),
                    feeds: Arc::clone(&feeds),
                    fail_start,
                },
                MockUi {
                    renders: Arc::clone(&renders),
                    alerts: Arc::clone(&alerts),
                    order: Arc::clone(&ui_order),
                },
                MockNotifier {
                    sent: Arc::clone(&sent),
                },
                CaptureSettings::default(),
            );
            Self {
                machine,
                calls,
                feeds,
                renders,
                alerts,
                ui_order,
                sent,
            }
        }

        fn ready() -> Self {
            let mut h = Self::new();
            h.machine.handle_acquisition(AcquisitionEvent::VideoReady);
            h.machine
                .handle_acquisition(AcquisitionEvent::StreamReady(stream()));
            h
        }

        /// Emit a fragment from the active session
        fn emit(&self, bytes: &[u8]) {
            let feeds = self.feeds.lock().unwrap();
            feeds.last().unwrap().send(bytes.to_vec()).unwrap();
        }

        /// Let the machine pick up one emitted fragment
        async fn pump(&mut self) -> bool {
            let fragment = self.machine.next_fragment().await.unwrap();
            self.machine.append_fragment(fragment)
        }

        fn last_render(&self) -> Presentation {
            *self.renders.lock().unwrap().last().unwrap()
        }

        fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn stream() -> MediaStream {
        let mut stream = MediaStream::from_video(VideoTrack {
            input_format: "mock".to_string(),
            device: "screen".to_string(),
            width: 1280,
            height: 720,
            frame_rate: 30,
        });
        stream.add_audio_track(AudioTrack {
            input_format: "mock".to_string(),
            device: "mic".to_string(),
        });
        stream
    }

    #[test]
    fn new_machine_is_acquiring_video() {
        let h = Harness::new();
        assert_eq!(h.machine.current_state(), RecordingState::AcquiringVideo);
        let p = h.last_render();
        assert!(!p.any_enabled());
        assert_eq!(p.status, "checking video input");
        assert!(h.sent().is_empty());
    }

    #[test]
    fn acquisition_reaches_stopped() {
        let mut h = Harness::new();

        let change = h
            .machine
            .handle_acquisition(AcquisitionEvent::VideoReady)
            .unwrap();
        assert_eq!(change.to, RecordingState::AcquiringAudio);
        assert_eq!(h.last_render().status, "checking audio input");

        let change = h
            .machine
            .handle_acquisition(AcquisitionEvent::StreamReady(stream()))
            .unwrap();
        assert_eq!(change.from, RecordingState::AcquiringAudio);
        assert_eq!(change.to, RecordingState::Stopped);

        let p = h.last_render();
        assert!(!p.save_enabled);
        assert!(p.start.enabled);
        assert_eq!(p.start.label, "start");
        assert_eq!(h.sent(), vec![Notification::Stopped]);
    }

    #[test]
    fn stream_ready_before_video_ready_is_ignored() {
        let mut h = Harness::new();
        assert!(h
            .machine
            .handle_acquisition(AcquisitionEvent::StreamReady(stream()))
            .is_none());
        assert_eq!(h.machine.current_state(), RecordingState::AcquiringVideo);
    }

    #[tokio::test]
    async fn video_failure_is_terminal() {
        let mut h = Harness::new();
        h.machine
            .handle_acquisition(AcquisitionEvent::Failed(AcquisitionError::video("denied")));

        assert!(h.machine.is_failed());
        assert_eq!(h.alerts.lock().unwrap().len(), 1);
        // Alert first, then the failed status
        let order = h.ui_order.lock().unwrap().clone();
        assert_eq!(order[order.len() - 2..], ["alert", "render"]);
        assert!(!h.last_render().any_enabled());
        assert_eq!(h.last_render().status, "initialization failed");

        // Late events and commands change nothing
        assert!(h
            .machine
            .handle_acquisition(AcquisitionEvent::VideoReady)
            .is_none());
        for command in [Command::StartOrStop, Command::PauseOrResume] {
            assert!(matches!(
                h.machine.apply_command(command).await,
                Err(RecorderError::Invalid(_))
            ));
        }

        assert_eq!(h.machine.current_state(), RecordingState::AcquiringVideo);
        assert!(h.sent().is_empty());
        assert!(!h.last_render().any_enabled());
    }

    #[tokio::test]
    async fn commands_ignored_while_acquiring() {
        let mut h = Harness::new();
        assert!(h.machine.apply_command(Command::StartOrStop).await.is_err());
        h.machine.handle_acquisition(AcquisitionEvent::VideoReady);
        assert!(h.machine.apply_command(Command::PauseOrResume).await.is_err());
        assert_eq!(h.machine.current_state(), RecordingState::AcquiringAudio);
        assert!(h.calls().is_empty());
    }

    #[tokio::test]
    async fn start_from_stopped() {
        let mut h = Harness::ready();
        let change = h.machine.apply_command(Command::StartOrStop).await.unwrap();

        assert_eq!(change.to, RecordingState::Recording);
        assert_eq!(h.machine.buffered_fragments(), 0);
        let p = h.last_render();
        assert!(!p.save_enabled);
        assert!(p.pause.enabled);
        assert_eq!(p.pause.label, "pause");
        assert_eq!(p.start.label, "stop");
        assert_eq!(h.sent().last(), Some(&Notification::Recording));
        assert_eq!(h.calls(), vec!["start"]);
    }

    #[tokio::test]
    async fn start_failure_stays_stopped() {
        let mut h = Harness::with_failing_start(true);
        h.machine.handle_acquisition(AcquisitionEvent::VideoReady);
        h.machine
            .handle_acquisition(AcquisitionEvent::StreamReady(stream()));

        let result = h.machine.apply_command(Command::StartOrStop).await;
        assert!(matches!(result, Err(RecorderError::Capture(_))));
        assert_eq!(h.machine.current_state(), RecordingState::Stopped);
        assert_eq!(h.sent(), vec![Notification::Stopped]);
    }

    #[tokio::test]
    async fn pause_resume_stop_notifications() {
        let mut h = Harness::ready();
        h.machine.apply_command(Command::StartOrStop).await.unwrap();
        let before = h.sent().len();

        h.machine.apply_command(Command::PauseOrResume).await.unwrap();
        h.machine.apply_command(Command::PauseOrResume).await.unwrap();
        h.machine.apply_command(Command::StartOrStop).await.unwrap();

        assert_eq!(h.machine.current_state(), RecordingState::Stopped);
        assert_eq!(
            h.sent()[before..].to_vec(),
            vec![
                Notification::Paused,
                Notification::Recording,
                Notification::Stopped
            ]
        );
        assert_eq!(h.calls(), vec!["start", "pause", "resume", "stop"]);
    }

    #[tokio::test]
    async fn stop_while_paused_is_ignored() {
        let mut h = Harness::ready();
        h.machine.apply_command(Command::StartOrStop).await.unwrap();
        h.machine.apply_command(Command::PauseOrResume).await.unwrap();

        let err = h.machine.apply_command(Command::StartOrStop).await;
        assert!(matches!(err, Err(RecorderError::Invalid(_))));
        assert_eq!(h.machine.current_state(), RecordingState::Paused);
        assert!(!h.last_render().start.enabled);
    }

    #[tokio::test]
    async fn save_enabled_only_after_recording_with_data() {
        let mut h = Harness::ready();
        h.machine.apply_command(Command::StartOrStop).await.unwrap();
        h.emit(b"abc");
        assert!(h.pump().await);
        h.machine.apply_command(Command::StartOrStop).await.unwrap();

        let p = h.last_render();
        assert!(p.save_enabled);
        assert_eq!(p.status, "recording complete");
    }

    #[tokio::test]
    async fn two_toggles_start_then_stop() {
        let mut h = Harness::ready();
        let first = h.machine.apply_command(Command::StartOrStop).await.unwrap();
        let second = h.machine.apply_command(Command::StartOrStop).await.unwrap();

        assert_eq!(first.to, RecordingState::Recording);
        assert_eq!(second.to, RecordingState::Stopped);
        assert_eq!(h.calls(), vec!["start", "stop"]);
    }

    #[tokio::test]
    async fn fragments_between_start_and_stop_are_kept_in_order() {
        let mut h = Harness::ready();

        // Before any recording: rejected
        assert!(!h.machine.append_fragment(b"early".to_vec()));

        h.machine.apply_command(Command::StartOrStop).await.unwrap();
        h.emit(b"1");
        h.emit(b"2");
        assert!(h.pump().await);
        assert!(h.pump().await);

        // Emitted before the pause but not picked up yet
        h.emit(b"3");
        h.machine.apply_command(Command::PauseOrResume).await.unwrap();
        assert!(!h.machine.append_fragment(b"paused".to_vec()));

        h.machine.apply_command(Command::PauseOrResume).await.unwrap();
        h.emit(b"4");
        assert!(h.pump().await);

        // Tail handed back by stop
        h.emit(b"5");
        h.machine.apply_command(Command::StartOrStop).await.unwrap();
        assert!(!h.machine.append_fragment(b"late".to_vec()));

        let sequence = h.machine.last_recording().unwrap();
        assert_eq!(
            sequence.fragments(),
            &[
                b"1".to_vec(),
                b"2".to_vec(),
                b"3".to_vec(),
                b"4".to_vec(),
                b"5".to_vec()
            ]
        );
    }

    #[tokio::test]
    async fn export_concatenates_last_recording() {
        let mut h = Harness::ready();
        h.machine.apply_command(Command::StartOrStop).await.unwrap();
        h.emit(b"ab");
        h.emit(b"cd");
        assert!(h.pump().await);
        h.machine.apply_command(Command::StartOrStop).await.unwrap();

        let artifact = h.machine.export().unwrap();
        assert_eq!(artifact.data(), b"abcd");

        // A new recording discards the previous one
        h.machine.apply_command(Command::StartOrStop).await.unwrap();
        assert!(h.machine.last_recording().is_none());
        assert!(matches!(
            h.machine.export(),
            Err(ExportError::NotStopped(_))
        ));
        h.emit(b"xyz");
        h.machine.apply_command(Command::StartOrStop).await.unwrap();
        assert_eq!(h.machine.export().unwrap().data(), b"xyz");
    }

    #[tokio::test]
    async fn export_requires_data() {
        let mut h = Harness::ready();
        assert!(matches!(h.machine.export(), Err(ExportError::NoRecording)));

        h.machine.apply_command(Command::StartOrStop).await.unwrap();
        h.machine.apply_command(Command::StartOrStop).await.unwrap();
        assert!(matches!(h.machine.export(), Err(ExportError::NoRecording)));
        assert!(!h.last_render().save_enabled);
    }

    #[tokio::test]
    async fn ended_session_reports_once() {
        let mut h = Harness::ready();
        h.machine.apply_command(Command::StartOrStop).await.unwrap();
        h.feeds.lock().unwrap().clear();

        assert!(h.machine.next_fragment().await.is_none());
        let again =
            tokio::time::timeout(std::time::Duration::from_millis(20), h.machine.next_fragment())
                .await;
        assert!(again.is_err());

        // Stopping still works and freezes an empty recording
        h.machine.apply_command(Command::StartOrStop).await.unwrap();
        assert!(!h.last_render().save_enabled);
    }

    #[tokio::test]
    async fn every_command_sequence_follows_the_table() {
        let commands = [Command::StartOrStop, Command::PauseOrResume];

        for len in 1..=6u32 {
            for mask in 0..(1u32 << len) {
                let mut h = Harness::ready();
                for i in 0..len {
                    let command = commands[((mask >> i) & 1) as usize];
                    let before = h.machine.current_state();
                    let expected = command
                        .resolve(before)
                        .and_then(|event| transition(before, event));

                    let result = h.machine.apply_command(command).await;
                    let after = h.machine.current_state();

                    match expected {
                        Some(to) => {
                            let change = result.unwrap();
                            assert_eq!(change, StateChange { from: before, to });
                            assert_eq!(after, to);
                        }
                        None => {
                            assert!(result.is_err());
                            assert_eq!(after, before);
                        }
                    }
                    assert!(RecordingState::ALL.contains(&after));
                }
                h.machine.shutdown().await;
            }
        }
    }
}
