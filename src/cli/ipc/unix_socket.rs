//! Unix Domain Socket communication for recorder control

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;

use super::{IpcClient, IpcServer, StateFn, REPLY_OK, REPLY_UNKNOWN};
use crate::cli::signals::ControlSignal;
use crate::domain::recording::{Command, Notification};
use crate::infrastructure::BroadcastNotifier;

const SOCKET_NAME: &str = "screen-recorder.sock";
const REPLY_GONE: &str = "error: recorder is shutting down";

/// Socket path resolver
#[derive(Debug, Clone)]
pub struct SocketPath {
    path: PathBuf,
}

impl SocketPath {
    /// Create socket path, preferring XDG_RUNTIME_DIR
    pub fn new() -> Self {
        let path = std::env::var("XDG_RUNTIME_DIR")
            .map(|dir| PathBuf::from(dir).join(SOCKET_NAME))
            .unwrap_or_else(|_| std::env::temp_dir().join(SOCKET_NAME));
        Self { path }
    }

    /// Use an explicit socket path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the socket path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if socket file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Remove socket file if it exists
    pub fn cleanup(&self) -> io::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for SocketPath {
    fn default() -> Self {
        Self::new()
    }
}

/// Unix Domain Socket server for recorder requests
pub struct UnixSocketServer {
    socket_path: SocketPath,
    listener: Option<UnixListener>,
}

impl UnixSocketServer {
    /// Create a new socket server
    pub fn new(socket_path: SocketPath) -> Self {
        Self {
            socket_path,
            listener: None,
        }
    }
}

impl Drop for UnixSocketServer {
    fn drop(&mut self) {
        if self.listener.is_some() {
            self.cleanup();
        }
    }
}

#[async_trait]
impl IpcServer for UnixSocketServer {
    fn bind(&mut self) -> io::Result<()> {
        // Remove stale socket file if it exists
        self.socket_path.cleanup()?;

        let listener = UnixListener::bind(self.socket_path.path())?;
        self.listener = Some(listener);
        Ok(())
    }

    fn path(&self) -> String {
        self.socket_path.path().to_string_lossy().to_string()
    }

    async fn run(
        &self,
        tx: mpsc::Sender<ControlSignal>,
        state_fn: StateFn,
        notifier: BroadcastNotifier,
    ) -> io::Result<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "Socket not bound"))?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let tx = tx.clone();
                    let state_fn = state_fn.clone();
                    let notifier = notifier.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, tx, state_fn, notifier).await {
                            tracing::debug!(error = %e, "control connection failed");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "control socket accept failed");
                }
            }
        }
    }

    fn cleanup(&self) {
        let _ = self.socket_path.cleanup();
    }
}

/// Handle a single client connection
async fn handle_connection(
    stream: UnixStream,
    tx: mpsc::Sender<ControlSignal>,
    state_fn: StateFn,
    notifier: BroadcastNotifier,
) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    reader.read_line(&mut line).await?;
    let request = line.trim();
    tracing::debug!(request, "control request");

    if request == "watch" {
        return stream_notifications(reader, writer, notifier.subscribe()).await;
    }

    let reply = respond(request, &tx, &state_fn).await;
    writer.write_all(format!("{}\n", reply).as_bytes()).await?;
    writer.flush().await?;

    Ok(())
}

/// Reply line for a one-shot request
async fn respond(request: &str, tx: &mpsc::Sender<ControlSignal>, state_fn: &StateFn) -> String {
    if let Ok(command) = request.parse::<Command>() {
        let (signal, done) = ControlSignal::command(command);
        if tx.send(signal).await.is_err() || done.await.is_err() {
            return REPLY_GONE.to_string();
        }
        return REPLY_OK.to_string();
    }

    match request {
        "status" => state_fn().to_string(),
        "save" => {
            let (signal, result) = ControlSignal::save();
            if tx.send(signal).await.is_err() {
                return REPLY_GONE.to_string();
            }
            match result.await {
                Ok(Ok(path)) => format!("saved {}", path.display()),
                Ok(Err(e)) => format!("error: {}", e),
                Err(_) => REPLY_GONE.to_string(),
            }
        }
        _ => REPLY_UNKNOWN.to_string(),
    }
}

/// Write one line per notification until the client hangs up
async fn stream_notifications(
    mut reader: BufReader<OwnedReadHalf>,
    mut writer: OwnedWriteHalf,
    mut notifications: broadcast::Receiver<Notification>,
) -> io::Result<()> {
    let mut discard = String::new();
    loop {
        tokio::select! {
            received = notifications.recv() => match received {
                Ok(notification) => {
                    writer.write_all(format!("{}\n", notification).as_bytes()).await?;
                    writer.flush().await?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "watch client fell behind");
                }
                Err(RecvError::Closed) => return Ok(()),
            },
            read = reader.read_line(&mut discard) => match read {
                Ok(0) | Err(_) => return Ok(()),
                Ok(_) => discard.clear(),
            },
        }
    }
}

/// Unix Domain Socket client for talking to the recorder
pub struct UnixSocketClient {
    socket_path: SocketPath,
}

impl UnixSocketClient {
    /// Create a new socket client
    pub fn new(socket_path: SocketPath) -> Self {
        Self { socket_path }
    }

    /// Send a request line. The write half must outlive the exchange,
    /// dropping it tells the server the client hung up.
    async fn request(
        &self,
        request: &str,
    ) -> io::Result<(BufReader<OwnedReadHalf>, OwnedWriteHalf)> {
        let stream = UnixStream::connect(self.socket_path.path()).await?;
        let (reader, mut writer) = stream.into_split();

        writer.write_all(format!("{}\n", request).as_bytes()).await?;
        writer.flush().await?;

        Ok((BufReader::new(reader), writer))
    }
}

#[async_trait]
impl IpcClient for UnixSocketClient {
    fn is_recorder_running(&self) -> bool {
        self.socket_path.exists()
    }

    async fn send_command(&self, request: &str) -> io::Result<String> {
        let (mut reader, _writer) = self.request(request).await?;
        let mut response = String::new();
        reader.read_line(&mut response).await?;
        Ok(response)
    }

    async fn watch(
        &self,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> io::Result<()> {
        let (mut reader, _writer) = self.request("watch").await?;
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(());
            }
            on_line(line.trim());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::StateNotifier;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn socket_path_uses_xdg_runtime_dir() {
        let path = std::env::var("XDG_RUNTIME_DIR")
            .map(|dir| PathBuf::from(dir).join("screen-recorder.sock"))
            .unwrap_or_else(|_| std::env::temp_dir().join("screen-recorder.sock"));

        let socket_path = SocketPath::new();
        assert_eq!(socket_path.path(), path.as_path());
    }

    /// Bound server plus a stand-in event loop that acknowledges everything
    async fn serve(dir: &TempDir, notifier: BroadcastNotifier) -> (UnixSocketClient, SocketPath) {
        let socket_path = SocketPath::with_path(dir.path().join("test.sock"));
        let mut server = UnixSocketServer::new(socket_path.clone());
        server.bind().unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        tokio::spawn(async move {
            while let Some(signal) = rx.recv().await {
                match signal {
                    ControlSignal::Command { ack, .. } => {
                        let _ = ack.send(());
                    }
                    ControlSignal::Save { reply } => {
                        let _ = reply.send(Ok(PathBuf::from("/videos/a.webm")));
                    }
                    ControlSignal::Shutdown => break,
                }
            }
        });

        let state_fn: StateFn = Arc::new(|| "recording");
        tokio::spawn(async move {
            let _ = server.run(tx, state_fn, notifier).await;
        });

        (UnixSocketClient::new(socket_path.clone()), socket_path)
    }

    #[tokio::test]
    async fn one_shot_requests() {
        let dir = TempDir::new().unwrap();
        let (client, socket_path) = serve(&dir, BroadcastNotifier::default()).await;
        assert!(socket_path.exists());
        assert!(client.is_recorder_running());

        let reply = |r: io::Result<String>| r.unwrap().trim().to_string();
        assert_eq!(reply(client.send_command("startOrStop").await), "ok");
        assert_eq!(reply(client.send_command("pauseOrResume").await), "ok");
        assert_eq!(reply(client.send_command("status").await), "recording");
        assert_eq!(
            reply(client.send_command("save").await),
            "saved /videos/a.webm"
        );
        assert_eq!(
            reply(client.send_command("toggle").await),
            "error: unknown command"
        );
    }

    #[tokio::test]
    async fn watch_streams_notifications() {
        let dir = TempDir::new().unwrap();
        let notifier = BroadcastNotifier::default();
        let (client, _socket_path) = serve(&dir, notifier.clone()).await;

        let (lines_tx, mut lines_rx) = mpsc::unbounded_channel();
        let watcher = tokio::spawn(async move {
            let _ = client
                .watch(&mut |line: &str| {
                    let _ = lines_tx.send(line.to_string());
                })
                .await;
        });

        // Keep notifying until the subscription is in place
        let first = loop {
            notifier.notify(Notification::Recording);
            match tokio::time::timeout(Duration::from_millis(20), lines_rx.recv()).await {
                Ok(Some(line)) => break line,
                _ => continue,
            }
        };
        assert_eq!(first, "recording");

        notifier.notify(Notification::Paused);
        notifier.notify(Notification::Stopped);
        let mut rest = Vec::new();
        while rest.len() < 2 {
            let line = lines_rx.recv().await.unwrap();
            if line != "recording" {
                rest.push(line);
            }
        }
        assert_eq!(rest, vec!["paused", "stopped"]);

        watcher.abort();
    }

    #[tokio::test]
    async fn client_without_server() {
        let dir = TempDir::new().unwrap();
        let client = UnixSocketClient::new(SocketPath::with_path(dir.path().join("none.sock")));
        assert!(!client.is_recorder_running());
        assert!(client.send_command("status").await.is_err());
    }
}
