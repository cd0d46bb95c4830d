// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Interactive shell sessions.
//!
//! Lifecycle: Authenticated -> PtyAllocated -> ShellRunning -> Terminated.
//! Both background loops (keepalive, resize) start before the shell is
//! requested so the remote side is covered from its first byte, and both
//! are stopped before the channel closes so nothing sends on a dead
//! channel. Teardown order is fixed: resize loop, keepalive loop, input
//! reader, channel EOF, disconnect, terminal restore.

mod terminal;

pub use terminal::RawModeGuard;

use russh::{ChannelMsg, Pty};
use std::io::{self, Read, Write};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::ssh::{Connection, SshError};

const TERM_TYPE: &str = "xterm-256color";
const RESIZE_POLL: Duration = Duration::from_millis(3);
const KEEPALIVE_POLL: Duration = Duration::from_millis(10);

/// Where the session is in its lifecycle; kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Authenticated,
    PtyAllocated,
    ShellRunning,
    Terminated,
}

enum SessionMessage {
    Input(Vec<u8>),
    Resize { width: u32, height: u32 },
    Keepalive,
}

/// One interactive shell on an already-authenticated connection.
pub struct InteractiveSession {
    conn: Connection,
    heartbeat: Option<Duration>,
    state: SessionState,
}

impl InteractiveSession {
    pub fn new(conn: Connection, heartbeat: Option<Duration>) -> Self {
        Self {
            conn,
            heartbeat,
            state: SessionState::Authenticated,
        }
    }

    /// Run the shell until the remote side ends it. A session that ends
    /// because the user typed `exit` or killed the shell is a normal
    /// termination, not an application failure.
    pub async fn run(mut self) -> Result<(), SshError> {
        let mut channel = self.conn.open_channel().await?;

        // From here the local terminal is raw; the guard restores it on
        // every exit path including early returns below.
        let guard = RawModeGuard::new()?;

        let (width, height) = terminal::dimensions();
        let modes = pty_modes();
        channel
            .request_pty(false, TERM_TYPE, width, height, 0, 0, &modes)
            .await?;
        self.state = SessionState::PtyAllocated;
        tracing::debug!(host = self.conn.host(), width, height, state = ?self.state, "pty allocated");

        let (msg_tx, mut msg_rx) = mpsc::channel::<SessionMessage>(256);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let resize_task = spawn_resize_loop(
            msg_tx.clone(),
            cancel_rx.clone(),
            (width, height),
            terminal::query_dimensions,
        );
        let keepalive_task = spawn_keepalive_loop(msg_tx.clone(), cancel_rx, self.heartbeat);

        // A failed shell request must still go through the full teardown
        // below; only the happy path gets an input reader.
        let shell_err = match channel.request_shell(false).await {
            Ok(()) => {
                self.state = SessionState::ShellRunning;
                None
            }
            Err(e) => Some(SshError::from(e)),
        };
        let input_task = match shell_err {
            None => Some(spawn_input_reader(msg_tx)),
            Some(_) => {
                drop(msg_tx);
                None
            }
        };

        let mut last_dims = (width, height);
        let mut running = shell_err.is_none();
        while running {
            tokio::select! {
                msg = channel.wait() => match msg {
                    Some(ChannelMsg::Data { ref data }) => {
                        if write_stdout(data).is_err() {
                            running = false;
                        }
                    }
                    Some(ChannelMsg::ExtendedData { ref data, ext: 1 }) => {
                        if write_stderr(data).is_err() {
                            running = false;
                        }
                    }
                    Some(ChannelMsg::ExitStatus { exit_status }) => {
                        tracing::debug!(exit_status, "remote shell exited");
                    }
                    Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                        running = false;
                    }
                    Some(_) => {}
                },
                message = msg_rx.recv() => match message {
                    Some(SessionMessage::Input(data)) => {
                        if let Err(e) = channel.data(&data[..]).await {
                            tracing::error!("failed to forward input: {e}");
                            running = false;
                        }
                    }
                    Some(SessionMessage::Resize { width, height }) => {
                        last_dims = (width, height);
                        if let Err(e) = channel.window_change(width, height, 0, 0).await {
                            tracing::warn!("window change failed: {e}");
                        }
                    }
                    Some(SessionMessage::Keepalive) => {
                        // Re-announcing the unchanged window size is the
                        // no-op request keeping the connection warm.
                        if let Err(e) =
                            channel.window_change(last_dims.0, last_dims.1, 0, 0).await
                        {
                            tracing::debug!("keepalive failed: {e}");
                        }
                    }
                    None => running = false,
                },
            }
        }

        // Teardown. Both loops must be gone before the channel closes.
        stop_background_loops(&cancel_tx, resize_task, keepalive_task).await;
        // The input reader may be parked in a blocking read; abort it.
        if let Some(input_task) = input_task {
            input_task.abort();
        }

        if let Err(e) = channel.eof().await {
            tracing::debug!("channel eof: {e}");
        }
        self.conn.disconnect().await;
        self.state = SessionState::Terminated;
        tracing::debug!(host = self.conn.host(), state = ?self.state, "session terminated");

        drop(guard);
        let _ = io::stdout().flush();
        match shell_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Ordered stop: signal cancellation, wait for the resize loop, then the
/// keepalive loop. Runs on every exit path, so neither loop can outlive
/// the channel it sends on.
async fn stop_background_loops(
    cancel: &watch::Sender<bool>,
    resize: JoinHandle<()>,
    keepalive: JoinHandle<()>,
) {
    let _ = cancel.send(true);
    let _ = resize.await;
    let _ = keepalive.await;
}

/// Remote PTY modes: echo on, fixed nominal baud rates.
fn pty_modes() -> Vec<(Pty, u32)> {
    vec![
        (Pty::ECHO, 1),
        (Pty::TTY_OP_ISPEED, 14400),
        (Pty::TTY_OP_OSPEED, 14400),
    ]
}

fn write_stdout(data: &[u8]) -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(data)?;
    stdout.flush()
}

fn write_stderr(data: &[u8]) -> io::Result<()> {
    let mut stderr = io::stderr();
    stderr.write_all(data)?;
    stderr.flush()
}

/// Poll local terminal dimensions and push changes to the main loop.
/// A failed query counts as "no change", never as a fallback size.
fn spawn_resize_loop<F>(
    tx: mpsc::Sender<SessionMessage>,
    cancel: watch::Receiver<bool>,
    initial: (u32, u32),
    query: F,
) -> JoinHandle<()>
where
    F: Fn() -> Option<(u32, u32)> + Send + 'static,
{
    tokio::spawn(async move {
        let mut last = initial;
        loop {
            if *cancel.borrow() {
                break;
            }
            tokio::time::sleep(RESIZE_POLL).await;

            let Some(dims) = query() else { continue };
            if dims != last {
                if tx
                    .try_send(SessionMessage::Resize {
                        width: dims.0,
                        height: dims.1,
                    })
                    .is_err()
                {
                    break;
                }
                last = dims;
            }
        }
    })
}

/// Tick a no-op keepalive every `interval`. Disabled profiles still get
/// a task, which only waits for cancellation; the caller's teardown
/// stays uniform.
fn spawn_keepalive_loop(
    tx: mpsc::Sender<SessionMessage>,
    mut cancel: watch::Receiver<bool>,
    interval: Option<Duration>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let Some(interval) = interval else {
            let _ = cancel.changed().await;
            return;
        };

        let mut last_sent = tokio::time::Instant::now();
        loop {
            if *cancel.borrow() {
                break;
            }
            tokio::time::sleep(KEEPALIVE_POLL).await;

            if last_sent.elapsed() >= interval {
                if tx.try_send(SessionMessage::Keepalive).is_err() {
                    break;
                }
                last_sent = tokio::time::Instant::now();
            }
        }
    })
}

/// Read raw stdin bytes on the blocking pool and hand them to the main
/// loop. The read blocks with no timeout, so teardown aborts this task
/// instead of signalling it.
fn spawn_input_reader(tx: mpsc::Sender<SessionMessage>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut stdin = io::stdin();
        let mut buf = [0u8; 1024];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx
                        .blocking_send(SessionMessage::Input(buf[..n].to_vec()))
                        .is_err()
                    {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pty_modes_enable_echo_with_fixed_baud() {
        let modes = pty_modes();
        assert!(modes.contains(&(Pty::ECHO, 1)));
        assert!(modes.contains(&(Pty::TTY_OP_ISPEED, 14400)));
        assert!(modes.contains(&(Pty::TTY_OP_OSPEED, 14400)));
    }

    #[tokio::test]
    async fn background_loops_stop_on_teardown_signal() {
        let (tx, _rx) = mpsc::channel(4);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let resize = spawn_resize_loop(tx.clone(), cancel_rx.clone(), (80, 24), || Some((80, 24)));
        let keepalive = spawn_keepalive_loop(tx, cancel_rx, Some(Duration::from_secs(60)));

        // Both loops must be joinable promptly once the signal fires,
        // whichever transition the session failed in.
        tokio::time::timeout(
            Duration::from_secs(2),
            stop_background_loops(&cancel_tx, resize, keepalive),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn resize_loop_ignores_failed_size_queries() {
        let (tx, mut rx) = mpsc::channel(4);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let task = spawn_resize_loop(tx, cancel_rx, (80, 24), || None);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(rx.try_recv().is_err());

        cancel_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn resize_loop_reports_dimension_changes() {
        let (tx, mut rx) = mpsc::channel(4);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let task = spawn_resize_loop(tx, cancel_rx, (80, 24), || Some((120, 40)));
        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        match msg {
            Some(SessionMessage::Resize { width, height }) => {
                assert_eq!((width, height), (120, 40));
            }
            _ => panic!("expected a resize message"),
        }

        cancel_tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn keepalive_loop_without_interval_exits_on_cancel() {
        let (tx, mut rx) = mpsc::channel(4);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let task = spawn_keepalive_loop(tx, cancel_rx, None);
        cancel_tx.send(true).unwrap();
        task.await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn keepalive_loop_ticks_at_the_interval() {
        let (tx, mut rx) = mpsc::channel(4);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let task = spawn_keepalive_loop(tx, cancel_rx, Some(Duration::from_millis(20)));
        let tick = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(matches!(tick, Ok(Some(SessionMessage::Keepalive))));

        cancel_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
