//! Speech Coach CLI
//!
//! Captures the default microphone, streams it to the analysis server,
//! and prints coaching feedback as it arrives. Ctrl+C stops the session.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use speech_coach::{
    audio::{capture::CapturePipeline, device::list_input_devices},
    config::AppConfig,
    network::client::{ClientConfig, StreamingClient},
    protocol::FeedbackMessage,
    session::{DisplayState, SessionController},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting speech coach client");

    let config = AppConfig::load()?;
    let server_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config.server_url.clone());

    println!("\n=== Available Input Devices ===");
    let devices = list_input_devices();
    if devices.is_empty() {
        println!("  (none found)");
    }
    for device in &devices {
        let default_marker = if device.is_default { " [DEFAULT]" } else { "" };
        println!("  {}{}", device.name, default_marker);
        println!("    Sample rates: {:?}", device.sample_rates);
        println!("    Channels: {:?}", device.channels);
    }
    println!();

    let client_config =
        ClientConfig::for_server(&server_url).with_reconnect_delay(config.reconnect_delay());
    tracing::info!("Analysis endpoint: {}", client_config.url);

    let (client, mut feedback_rx) = StreamingClient::connect(client_config);
    let mut state_rx = client.state_watch();

    let pipeline = CapturePipeline::new(config.capture.frame_samples);
    let mut controller = SessionController::new(pipeline, client.frame_sink());
    controller.start_recording()?;
    tracing::info!("Recording - press Ctrl+C to stop");

    loop {
        tokio::select! {
            Some(feedback) = feedback_rx.recv() => {
                controller.on_feedback(&feedback);
                render(&feedback, controller.display());
            }
            Ok(()) = state_rx.changed() => {
                let state = *state_rx.borrow();
                controller.on_connection_change(state);
                tracing::info!(%state, "connection state changed");
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }

        if let Some(err) = controller.check_capture_error() {
            tracing::warn!("capture error: {err}");
        }
    }

    controller.stop_recording();
    client.close().await;

    let display = controller.display();
    if !display.transcript.is_empty() {
        println!("\n=== Session Transcript ===\n{}\n", display.transcript);
    }

    Ok(())
}

/// Log one feedback update against the folded display state.
fn render(update: &FeedbackMessage, state: &DisplayState) {
    if let Some(fragment) = &update.transcript {
        tracing::info!("transcript: {fragment}");
    }
    if update.wpm.is_some() || update.confidence.is_some() {
        tracing::info!(
            wpm = state.wpm.unwrap_or(0),
            confidence = state.confidence.unwrap_or(0.0),
            tone = state.tone.as_deref().unwrap_or("neutral"),
            "analysis"
        );
    }
    if let Some(words) = &update.filler_words {
        if !words.is_empty() {
            tracing::info!("filler words: {}", words.join(", "));
        }
    }
    if let Some(tip) = &update.recommendation {
        tracing::info!("coach tip: {tip}");
    }
}
