//! Streaming client behavior against an in-process WebSocket server.
//!
//! No live microphone or real analysis service involved: a local
//! tokio-tungstenite acceptor plays the server so connection loss,
//! reconnection, and payload handling can be driven deterministically.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{accept_async, tungstenite::Message};

use speech_coach::audio::AudioFrame;
use speech_coach::network::{ClientConfig, ConnectionState, StreamingClient};

const RECONNECT: Duration = Duration::from_millis(100);
const WAIT: Duration = Duration::from_secs(2);

async fn bind_server() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, format!("ws://{addr}"))
}

fn fast_client(server_url: &str) -> ClientConfig {
    ClientConfig::for_server(server_url).with_reconnect_delay(RECONNECT)
}

async fn wait_for_state(rx: &mut watch::Receiver<ConnectionState>, want: ConnectionState) {
    timeout(WAIT, async {
        loop {
            if *rx.borrow_and_update() == want {
                return;
            }
            rx.changed().await.expect("client task ended");
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {want}"));
}

fn marker_frame(id: i16) -> AudioFrame {
    AudioFrame::new(vec![id; 4])
}

#[tokio::test]
async fn frames_arrive_in_order_without_duplication() {
    let (listener, url) = bind_server().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let mut received = Vec::new();
        while let Some(Ok(msg)) = ws.next().await {
            match msg {
                Message::Binary(payload) => received.push(payload),
                Message::Close(_) => break,
                _ => {}
            }
        }
        received
    });

    let (client, _feedback) = StreamingClient::connect(fast_client(&url));
    let mut state = client.state_watch();
    wait_for_state(&mut state, ConnectionState::Connected).await;

    let sink = client.frame_sink();
    for id in 0..5 {
        sink.send(marker_frame(id));
    }
    client.close().await;

    let received = timeout(WAIT, server).await.unwrap().unwrap();
    let expected: Vec<Vec<u8>> = (0..5)
        .map(|id| marker_frame(id).into_wire_bytes().to_vec())
        .collect();
    assert_eq!(received, expected);
}

#[tokio::test]
async fn frames_sent_while_disconnected_are_never_replayed() {
    let (listener, url) = bind_server().await;

    let (client, _feedback) = StreamingClient::connect(fast_client(&url));
    let sink = client.frame_sink();

    // Handshake is stalled (nothing accepts yet), so the client sits in
    // Connecting; everything sent now must be dropped, not queued.
    sleep(Duration::from_millis(50)).await;
    assert_ne!(sink.state(), ConnectionState::Connected);
    for id in 10..15 {
        sink.send(marker_frame(id));
    }

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let mut received = Vec::new();
        while let Some(Ok(msg)) = ws.next().await {
            match msg {
                Message::Binary(payload) => received.push(payload),
                Message::Close(_) => break,
                _ => {}
            }
        }
        received
    });

    let mut state = client.state_watch();
    wait_for_state(&mut state, ConnectionState::Connected).await;

    sink.send(marker_frame(99));
    client.close().await;

    let received = timeout(WAIT, server).await.unwrap().unwrap();
    assert_eq!(received, vec![marker_frame(99).into_wire_bytes().to_vec()]);
}

#[tokio::test]
async fn reconnects_after_transport_loss() {
    let (listener, url) = bind_server().await;

    let server = tokio::spawn(async move {
        // First connection: greet, then kill the transport.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text(r#"{"wpm": 1}"#.to_string()))
            .await
            .unwrap();
        drop(ws);

        // Second connection: greet and hold until the client closes.
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(Message::Text(r#"{"wpm": 2}"#.to_string()))
            .await
            .unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    let (client, mut feedback) = StreamingClient::connect(fast_client(&url));

    // Feedback from the first connection, then — after the transport is
    // torn down and one fixed-delay retry elapses — from the second.
    let first = timeout(WAIT, feedback.recv()).await.unwrap().unwrap();
    assert_eq!(first.wpm, Some(1));
    let second = timeout(WAIT, feedback.recv()).await.unwrap().unwrap();
    assert_eq!(second.wpm, Some(2));
    assert_eq!(client.state(), ConnectionState::Connected);

    client.close().await;
    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn malformed_feedback_is_discarded_without_breaking_the_connection() {
    let (listener, url) = bind_server().await;

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        ws.send(Message::Text("definitely not json".to_string()))
            .await
            .unwrap();
        ws.send(Message::Binary(vec![1, 2, 3])).await.unwrap();
        ws.send(Message::Text(r#"{"wpm": 142}"#.to_string()))
            .await
            .unwrap();

        while let Some(Ok(msg)) = ws.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    let (client, mut feedback) = StreamingClient::connect(fast_client(&url));
    let mut state = client.state_watch();
    wait_for_state(&mut state, ConnectionState::Connected).await;

    // Only the well-formed message comes through, and the connection
    // stays up throughout.
    let msg = timeout(WAIT, feedback.recv()).await.unwrap().unwrap();
    assert_eq!(msg.wpm, Some(142));
    assert_eq!(client.state(), ConnectionState::Connected);

    client.close().await;
    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn owner_close_suppresses_reconnect() {
    let (listener, url) = bind_server().await;

    let (client, _feedback) = StreamingClient::connect(fast_client(&url));
    let mut state = client.state_watch();

    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();
    wait_for_state(&mut state, ConnectionState::Connected).await;

    client.close().await;

    // The server sees the close frame, and no new connection shows up
    // even well past the reconnect delay.
    let closed = timeout(WAIT, async {
        while let Some(Ok(msg)) = ws.next().await {
            if matches!(msg, Message::Close(_)) {
                return true;
            }
        }
        false
    })
    .await
    .unwrap();
    assert!(closed);

    let redial = timeout(RECONNECT * 3, listener.accept()).await;
    assert!(redial.is_err(), "client reconnected after owner close");
}
