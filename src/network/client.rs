//! Resilient bidirectional streaming client
//!
//! Owns exactly one logical WebSocket connection to the analysis server.
//! A background tokio task dials, pumps frames out and feedback in, and
//! re-dials on a fixed delay whenever the transport drops — forever, until
//! the owner calls `close()`.
//!
//! Delivery is at-most-once and best-effort: frames submitted while the
//! connection is down are dropped (logged, not queued) because stale audio
//! is worthless by the time connectivity returns. The receiver therefore
//! sees a possibly-gapped but never reordered subsequence of frames.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::audio::frame::AudioFrame;
use crate::constants::{ANALYSIS_PATH, RECONNECT_DELAY};
use crate::network::state::{ConnectionState, ReconnectPolicy};
use crate::protocol::{decode_feedback, FeedbackMessage};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Streaming client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full WebSocket URL of the analysis endpoint
    pub url: String,
    /// Delay between reconnection attempts
    pub reconnect_delay: Duration,
}

impl ClientConfig {
    /// Build the endpoint URL for a server base URL such as
    /// `ws://localhost:8000`.
    pub fn for_server(server_url: &str) -> Self {
        Self {
            url: format!("{}{}", server_url.trim_end_matches('/'), ANALYSIS_PATH),
            reconnect_delay: RECONNECT_DELAY,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

enum Command {
    Frame(AudioFrame),
    Close,
}

enum PumpExit {
    OwnerClosed,
    TransportLost,
}

/// Handle to the connection task
pub struct StreamingClient {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
    task: tokio::task::JoinHandle<()>,
}

impl StreamingClient {
    /// Spawn the connection task and start dialing immediately.
    ///
    /// Returns the client handle and the channel on which decoded feedback
    /// messages arrive, in the order the server sent them.
    pub fn connect(config: ClientConfig) -> (Self, mpsc::UnboundedReceiver<FeedbackMessage>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (feedback_tx, feedback_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run(config, cmd_rx, state_tx, feedback_tx));

        (
            Self {
                cmd_tx,
                state_rx,
                task,
            },
            feedback_rx,
        )
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch connection state transitions (for the connectivity indicator)
    pub fn state_watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// A cheap, cloneable sender the capture callback can own.
    pub fn frame_sink(&self) -> FrameSink {
        FrameSink {
            cmd_tx: self.cmd_tx.clone(),
            state_rx: self.state_rx.clone(),
        }
    }

    /// Owner-initiated shutdown: closes the transport, suppresses the
    /// automatic reconnect, and waits for the task to finish.
    pub async fn close(self) {
        let _ = self.cmd_tx.send(Command::Close);
        let _ = self.task.await;
    }
}

/// Sender half handed to the capture pipeline.
///
/// `send` is synchronous and non-blocking: when the client is not
/// connected the frame is dropped on the spot.
#[derive(Clone)]
pub struct FrameSink {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl FrameSink {
    pub fn send(&self, frame: AudioFrame) {
        let state = *self.state_rx.borrow();
        if state != ConnectionState::Connected {
            tracing::debug!(%state, "dropping audio frame while not connected");
            return;
        }
        if self.cmd_tx.send(Command::Frame(frame)).is_err() {
            tracing::debug!("dropping audio frame, client task is gone");
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }
}

/// Connection task: dial, pump, reconnect on a fixed delay.
async fn run(
    config: ClientConfig,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    state_tx: watch::Sender<ConnectionState>,
    feedback_tx: mpsc::UnboundedSender<FeedbackMessage>,
) {
    let mut reconnect = ReconnectPolicy::new(config.reconnect_delay);

    loop {
        let _ = state_tx.send(ConnectionState::Connecting);
        tracing::debug!(url = %config.url, "dialing analysis server");

        let attempt = tokio::select! {
            res = connect_async(config.url.as_str()) => Some(res),
            _ = drain_until_close(&mut cmd_rx) => None,
        };

        let Some(attempt) = attempt else {
            // Owner closed while dialing.
            break;
        };

        match attempt {
            Ok((ws, _response)) => {
                reconnect.cancel();
                let _ = state_tx.send(ConnectionState::Connected);
                tracing::info!("connected to analysis server");

                let exit = pump(ws, &mut cmd_rx, &feedback_tx).await;
                let _ = state_tx.send(ConnectionState::Disconnected);

                if matches!(exit, PumpExit::OwnerClosed) {
                    tracing::info!("connection closed");
                    return;
                }
                tracing::warn!("lost connection to analysis server");
            }
            Err(e) => {
                let _ = state_tx.send(ConnectionState::Disconnected);
                tracing::warn!("connection attempt failed: {e}");
            }
        }

        // Exactly one reconnect attempt per disconnect.
        let Some(delay) = reconnect.schedule() else {
            continue;
        };
        tracing::debug!(?delay, "reconnect scheduled");
        tokio::select! {
            _ = tokio::time::sleep(delay) => reconnect.fired(),
            _ = drain_until_close(&mut cmd_rx) => {
                reconnect.cancel();
                break;
            }
        }
    }

    let _ = state_tx.send(ConnectionState::Disconnected);
}

/// Drop frames while the transport is down; resolves when the owner closes
/// the client (or drops every handle).
async fn drain_until_close(cmd_rx: &mut mpsc::UnboundedReceiver<Command>) {
    loop {
        match cmd_rx.recv().await {
            Some(Command::Frame(frame)) => {
                tracing::debug!(samples = frame.len(), "dropping audio frame, transport down");
            }
            Some(Command::Close) | None => return,
        }
    }
}

/// Pump one live connection until it drops or the owner closes.
async fn pump(
    ws: WsStream,
    cmd_rx: &mut mpsc::UnboundedReceiver<Command>,
    feedback_tx: &mpsc::UnboundedSender<FeedbackMessage>,
) -> PumpExit {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Frame(frame)) => {
                    let payload = frame.into_wire_bytes();
                    if let Err(e) = sink.send(Message::Binary(payload.to_vec())).await {
                        tracing::warn!("frame send failed: {e}");
                        return PumpExit::TransportLost;
                    }
                }
                Some(Command::Close) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return PumpExit::OwnerClosed;
                }
            },
            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => match decode_feedback(&text) {
                    Ok(feedback) => {
                        let _ = feedback_tx.send(feedback);
                    }
                    Err(e) => tracing::warn!("discarding malformed feedback: {e}"),
                },
                Some(Ok(Message::Binary(payload))) => {
                    tracing::warn!(bytes = payload.len(), "discarding unexpected binary message");
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) => {
                    tracing::debug!("server sent close frame");
                    return PumpExit::TransportLost;
                }
                Some(Ok(_)) => {}
                // A transport error always resolves into a closed
                // connection; it is never surfaced to the owner directly.
                Some(Err(e)) => {
                    tracing::warn!("transport error: {e}");
                    return PumpExit::TransportLost;
                }
                None => return PumpExit::TransportLost,
            },
        }
    }
}
