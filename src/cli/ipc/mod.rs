//! IPC (Inter-Process Communication) for controlling the recorder
//!
//! A line protocol over a Unix domain socket. Each connection sends one
//! request line and reads the reply; `watch` keeps the connection open and
//! streams one line per state notification.

mod unix_socket;

pub use unix_socket::{SocketPath, UnixSocketClient, UnixSocketServer};

use std::io;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::signals::ControlSignal;
use crate::infrastructure::BroadcastNotifier;

/// Reply to a command once the recorder handled it
pub const REPLY_OK: &str = "ok";
/// Reply to anything the protocol does not know
pub const REPLY_UNKNOWN: &str = "error: unknown command";

/// Current status name for `status` requests
pub type StateFn = Arc<dyn Fn() -> &'static str + Send + Sync>;

/// Trait for IPC servers that listen for recorder requests
#[async_trait::async_trait]
pub trait IpcServer: Send + Sync {
    /// Bind to the IPC endpoint
    fn bind(&mut self) -> io::Result<()>;

    /// Get the path/name of the IPC endpoint
    fn path(&self) -> String;

    /// Accept and handle connections.
    ///
    /// Commands and saves are forwarded on `tx` and answered once the event
    /// loop acknowledged them. `state_fn` answers `status`; `notifier` feeds
    /// `watch` subscribers.
    async fn run(
        &self,
        tx: mpsc::Sender<ControlSignal>,
        state_fn: StateFn,
        notifier: BroadcastNotifier,
    ) -> io::Result<()>;

    /// Cleanup IPC resources
    fn cleanup(&self);
}

/// Trait for IPC clients that talk to the running recorder
#[async_trait::async_trait]
pub trait IpcClient: Send + Sync {
    /// Check if a recorder appears to be running (endpoint exists)
    fn is_recorder_running(&self) -> bool;

    /// Send a request and receive the one-line reply
    async fn send_command(&self, request: &str) -> io::Result<String>;

    /// Subscribe and hand every notification line to `on_line` until the
    /// recorder goes away
    async fn watch(&self, on_line: &mut (dyn for<'a> FnMut(&'a str) + Send)) -> io::Result<()>;
}

/// Create the IPC server at the default endpoint
pub fn create_ipc_server() -> Box<dyn IpcServer> {
    Box::new(UnixSocketServer::new(SocketPath::new()))
}

/// Create the IPC client for the default endpoint
pub fn create_ipc_client() -> Box<dyn IpcClient> {
    Box::new(UnixSocketClient::new(SocketPath::new()))
}
