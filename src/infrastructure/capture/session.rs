//! Running ffmpeg capture session
//!
//! Capture and encoding run in separate processes. Each source process
//! (screen grabber, microphone reader) writes raw frames or samples that a
//! feed task forwards into an input of the encoder process. The encoder
//! stamps its inputs by frame and sample count, so units the feeds drop
//! while paused leave no gap in the output.
//!
//! The encoder writes the muxed container to stdout, where a pump task
//! collects the bytes and emits them as one fragment per interval.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::application::ports::{CaptureError, CaptureSession};
use crate::domain::recording::Fragment;

/// Read buffer size for the encoder's stdout
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// A source process whose stdout is forwarded into one encoder input
pub struct Feed {
    source: Child,
    sink: Box<dyn AsyncWrite + Send + Unpin>,
    unit: usize,
}

impl Feed {
    /// Forward `source`'s stdout into `sink` in whole `unit`-byte frames
    pub fn new(
        source: Child,
        sink: impl AsyncWrite + Send + Unpin + 'static,
        unit: usize,
    ) -> Self {
        Self {
            source,
            sink: Box::new(sink),
            unit: unit.max(1),
        }
    }
}

/// Capture session backed by ffmpeg source processes and an encoder process
pub struct FfmpegCaptureSession {
    encoder: Child,
    sources: Vec<Child>,
    feeds: Vec<JoinHandle<io::Result<()>>>,
    fragments: mpsc::UnboundedReceiver<Fragment>,
    paused: Arc<AtomicBool>,
    pump: JoinHandle<io::Result<()>>,
    _scratch: Option<TempDir>,
}

impl FfmpegCaptureSession {
    /// Take over a freshly spawned encoder and its feeds and start pumping
    pub fn spawn(
        mut encoder: Child,
        feeds: Vec<Feed>,
        fragment_interval: Duration,
    ) -> Result<Self, CaptureError> {
        let stdout = encoder
            .stdout
            .take()
            .ok_or_else(|| CaptureError::StartFailed("encoder stdout not captured".to_string()))?;

        let paused = Arc::new(AtomicBool::new(false));
        let mut sources = Vec::with_capacity(feeds.len());
        let mut tasks = Vec::with_capacity(feeds.len());
        for mut feed in feeds {
            let output = feed.source.stdout.take().ok_or_else(|| {
                CaptureError::StartFailed("capture source stdout not captured".to_string())
            })?;
            tasks.push(tokio::spawn(forward_feed(
                output,
                feed.sink,
                feed.unit,
                Arc::clone(&paused),
            )));
            sources.push(feed.source);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let pump = tokio::spawn(pump_fragments(
            stdout,
            tx,
            Arc::clone(&paused),
            fragment_interval,
        ));

        Ok(Self {
            encoder,
            sources,
            feeds: tasks,
            fragments: rx,
            paused,
            pump,
            _scratch: None,
        })
    }

    /// Keep `dir` (named pipes of the feeds) until the session ends
    pub fn with_scratch_dir(mut self, dir: TempDir) -> Self {
        self._scratch = Some(dir);
        self
    }

    fn drain(&mut self) -> Vec<Fragment> {
        let mut out = Vec::new();
        while let Ok(fragment) = self.fragments.try_recv() {
            out.push(fragment);
        }
        out
    }

    fn ended(&self) -> bool {
        self.pump.is_finished()
    }
}

#[async_trait]
impl CaptureSession for FfmpegCaptureSession {
    async fn next_fragment(&mut self) -> Option<Fragment> {
        self.fragments.recv().await
    }

    async fn pause(&mut self) -> Result<Vec<Fragment>, CaptureError> {
        if self.ended() {
            return Err(CaptureError::PauseFailed("encoder has exited".to_string()));
        }
        self.paused.store(true, Ordering::SeqCst);
        Ok(self.drain())
    }

    async fn resume(&mut self) -> Result<(), CaptureError> {
        if self.ended() {
            return Err(CaptureError::ResumeFailed("encoder has exited".to_string()));
        }
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(self: Box<Self>) -> Result<Vec<Fragment>, CaptureError> {
        let mut session = *self;

        // Ending the sources ends the feeds, which closes the encoder's
        // inputs and lets it finalize the container
        for source in &mut session.sources {
            let _ = source.start_kill();
        }
        for feed in session.feeds.drain(..) {
            match feed.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "forwarding capture input failed"),
                Err(e) => tracing::warn!(error = %e, "capture feed task failed"),
            }
        }
        for source in &mut session.sources {
            let _ = source.wait().await;
        }

        let status = session
            .encoder
            .wait()
            .await
            .map_err(|e| CaptureError::StopFailed(e.to_string()))?;
        tracing::debug!(%status, "encoder exited");

        match (&mut session.pump).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "reading encoder output failed"),
            Err(e) => tracing::warn!(error = %e, "fragment pump task failed"),
        }

        Ok(session.drain())
    }
}

/// Copy `source` into `sink` one `unit` at a time, dropping units read while
/// paused. A torn unit at end of stream is dropped too.
async fn forward_feed<R, W>(
    mut source: R,
    mut sink: W,
    unit: usize,
    paused: Arc<AtomicBool>,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut frame = vec![0u8; unit];
    loop {
        match source.read_exact(&mut frame).await {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
        if !paused.load(Ordering::SeqCst) {
            sink.write_all(&frame).await?;
        }
    }
    sink.flush().await
}

/// Collect `source` and emit what was read once per `every`, unless paused.
/// Whatever is left at end of stream is emitted as a last fragment.
async fn pump_fragments<R>(
    mut source: R,
    tx: mpsc::UnboundedSender<Fragment>,
    paused: Arc<AtomicBool>,
    every: Duration,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut pending: Fragment = Vec::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            read = source.read(&mut buf) => {
                let n = read?;
                if n == 0 {
                    break;
                }
                pending.extend_from_slice(&buf[..n]);
            }
            _ = ticker.tick() => {
                if !paused.load(Ordering::SeqCst)
                    && !pending.is_empty()
                    && tx.send(std::mem::take(&mut pending)).is_err()
                {
                    // Receiver gone, nobody wants the output anymore
                    return Ok(());
                }
            }
        }
    }

    if !pending.is_empty() {
        let _ = tx.send(pending);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    #[tokio::test]
    async fn pump_emits_everything_in_order() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let paused = Arc::new(AtomicBool::new(false));

        let pump = tokio::spawn(pump_fragments(
            reader,
            tx,
            paused,
            Duration::from_millis(5),
        ));

        writer.write_all(b"hello ").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        writer.write_all(b"world").await.unwrap();
        drop(writer);

        pump.await.unwrap().unwrap();

        let mut out = Vec::new();
        while let Some(fragment) = rx.recv().await {
            assert!(!fragment.is_empty());
            out.extend(fragment);
        }
        assert_eq!(out, b"hello world");
    }

    #[tokio::test]
    async fn pump_holds_output_while_paused() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let paused = Arc::new(AtomicBool::new(true));

        let pump = tokio::spawn(pump_fragments(
            reader,
            tx,
            Arc::clone(&paused),
            Duration::from_millis(5),
        ));

        writer.write_all(b"held").await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(rx.try_recv().is_err());

        paused.store(false, Ordering::SeqCst);
        let fragment = rx.recv().await.unwrap();
        assert_eq!(fragment, b"held");

        drop(writer);
        pump.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn feed_drops_units_read_while_paused() {
        let (mut source, source_reader) = tokio::io::duplex(64);
        let (sink_writer, mut sink) = tokio::io::duplex(64);
        let paused = Arc::new(AtomicBool::new(true));

        let feed = tokio::spawn(forward_feed(
            source_reader,
            sink_writer,
            4,
            Arc::clone(&paused),
        ));

        source.write_all(b"gone").await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        paused.store(false, Ordering::SeqCst);
        source.write_all(b"kept").await.unwrap();
        // Torn trailing unit
        source.write_all(b"xy").await.unwrap();
        drop(source);

        feed.await.unwrap().unwrap();
        let mut out = Vec::new();
        sink.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"kept");
    }

    fn spawn(program: &str, args: &[&str], stdin: Stdio) -> Child {
        Command::new(program)
            .args(args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    /// Counter source printing 4-digit numbers, `cat` standing in for the encoder
    fn counting_session() -> Box<FfmpegCaptureSession> {
        let mut encoder = spawn("cat", &[], Stdio::piped());
        let stdin = encoder.stdin.take().unwrap();
        let counter = spawn(
            "sh",
            &[
                "-c",
                "i=1000; while :; do printf %d $i; i=$((i+1)); sleep 0.005; done",
            ],
            Stdio::null(),
        );

        let session = FfmpegCaptureSession::spawn(
            encoder,
            vec![Feed::new(counter, stdin, 4)],
            Duration::from_millis(5),
        )
        .unwrap();
        Box::new(session)
    }

    fn numbers(bytes: &[u8]) -> Vec<u32> {
        assert_eq!(bytes.len() % 4, 0);
        bytes
            .chunks(4)
            .map(|n| std::str::from_utf8(n).unwrap().parse().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn paused_input_never_reaches_the_output() {
        let mut session = counting_session();
        let mut out = Vec::new();

        tokio::time::sleep(Duration::from_millis(100)).await;
        out.extend(session.pause().await.unwrap().concat());
        tokio::time::sleep(Duration::from_millis(300)).await;
        session.resume().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        out.extend(session.stop().await.unwrap().concat());

        let seen = numbers(&out);
        assert!(seen.len() > 2, "too little output: {:?}", seen);
        let gaps: Vec<u32> = seen
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|step| *step != 1)
            .collect();
        // One jump over the paused stretch, consecutive everywhere else
        assert_eq!(gaps.len(), 1, "unexpected sequence: {:?}", seen);
        assert!(gaps[0] >= 5, "pause skipped too little: {:?}", seen);
    }

    #[tokio::test]
    async fn stop_without_pause_keeps_everything() {
        let mut session = counting_session();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let out = session.stop().await.unwrap().concat();
        let seen = numbers(&out);
        assert!(!seen.is_empty());
        assert!(seen.windows(2).all(|w| w[1] == w[0] + 1), "{:?}", seen);
    }
}
