//! Session controller
//!
//! Thin glue between the capture pipeline, the streaming client, and the
//! presentation layer: forwards frames into the client's sink, folds
//! feedback patches into a display model, and enforces the one-recording-
//! at-a-time discipline.

use crate::audio::capture::{CapturePipeline, RecordingSession};
use crate::error::{CaptureError, Result, SessionError};
use crate::network::client::FrameSink;
use crate::network::state::ConnectionState;
use crate::protocol::{FeedbackMessage, Sentiment};

/// Presented state, folded from feedback patches.
///
/// Transcript fragments accumulate; every other field holds the most
/// recent value the server reported.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    pub connection: ConnectionState,
    pub transcript: String,
    pub wpm: Option<u32>,
    pub confidence: Option<f32>,
    pub sentiment: Option<Sentiment>,
    pub tone: Option<String>,
    pub filler_words: Vec<String>,
    pub recommendation: Option<String>,
}

impl DisplayState {
    /// Fold one feedback patch in. Fields absent from the message leave
    /// the current value untouched.
    pub fn apply(&mut self, msg: &FeedbackMessage) {
        if let Some(fragment) = &msg.transcript {
            if !self.transcript.is_empty() {
                self.transcript.push(' ');
            }
            self.transcript.push_str(fragment);
        }
        if let Some(wpm) = msg.wpm {
            self.wpm = Some(wpm);
        }
        if let Some(confidence) = msg.confidence {
            self.confidence = Some(confidence);
        }
        if let Some(sentiment) = msg.sentiment {
            self.sentiment = Some(sentiment);
        }
        if let Some(tone) = &msg.tone {
            self.tone = Some(tone.clone());
        }
        if let Some(words) = &msg.filler_words {
            self.filler_words = words.clone();
        }
        if let Some(tip) = &msg.recommendation {
            self.recommendation = Some(tip.clone());
        }
    }
}

/// Wires capture output into the streaming client and client output into
/// the display model.
pub struct SessionController {
    pipeline: CapturePipeline,
    sink: FrameSink,
    recording: Option<RecordingSession>,
    display: DisplayState,
}

impl SessionController {
    pub fn new(pipeline: CapturePipeline, sink: FrameSink) -> Self {
        Self {
            pipeline,
            sink,
            recording: None,
            display: DisplayState::default(),
        }
    }

    /// Start capturing and forwarding frames. Fails with
    /// `AlreadyRecording` while a session is active — stop first.
    pub fn start_recording(&mut self) -> Result<()> {
        if self.recording.is_some() {
            return Err(SessionError::AlreadyRecording.into());
        }
        let sink = self.sink.clone();
        let session = self.pipeline.start(move |frame| sink.send(frame))?;
        self.recording = Some(session);
        Ok(())
    }

    /// Release the microphone. Safe to call at any time, including before
    /// any start or twice in a row.
    pub fn stop_recording(&mut self) {
        if let Some(mut session) = self.recording.take() {
            session.stop();
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Surface asynchronous capture errors from the active session.
    pub fn check_capture_error(&self) -> Option<CaptureError> {
        self.recording.as_ref().and_then(|s| s.check_error())
    }

    pub fn on_feedback(&mut self, msg: &FeedbackMessage) {
        self.display.apply(msg);
    }

    pub fn on_connection_change(&mut self, state: ConnectionState) {
        self.display.connection = state;
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(transcript: Option<&str>, wpm: Option<u32>) -> FeedbackMessage {
        FeedbackMessage {
            transcript: transcript.map(String::from),
            wpm,
            ..FeedbackMessage::default()
        }
    }

    #[test]
    fn transcript_fragments_append() {
        let mut display = DisplayState::default();
        display.apply(&patch(Some("hello"), None));
        display.apply(&patch(Some("world"), None));
        assert_eq!(display.transcript, "hello world");
    }

    #[test]
    fn metric_fields_replace() {
        let mut display = DisplayState::default();
        display.apply(&patch(None, Some(120)));
        display.apply(&patch(None, Some(150)));
        assert_eq!(display.wpm, Some(150));
    }

    #[test]
    fn absent_fields_leave_prior_values() {
        let mut display = DisplayState::default();
        display.apply(&FeedbackMessage {
            wpm: Some(130),
            recommendation: Some("Slow down.".to_string()),
            ..FeedbackMessage::default()
        });
        display.apply(&patch(Some("okay"), None));

        assert_eq!(display.wpm, Some(130));
        assert_eq!(display.recommendation.as_deref(), Some("Slow down."));
        assert_eq!(display.transcript, "okay");
    }

    #[test]
    fn filler_words_replace_as_a_set() {
        let mut display = DisplayState::default();
        display.apply(&FeedbackMessage {
            filler_words: Some(vec!["um".to_string(), "like".to_string()]),
            ..FeedbackMessage::default()
        });
        display.apply(&FeedbackMessage {
            filler_words: Some(vec![]),
            ..FeedbackMessage::default()
        });
        assert!(display.filler_words.is_empty());
    }

    #[tokio::test]
    async fn stop_without_start_is_a_noop() {
        let (client, _feedback) = crate::network::client::StreamingClient::connect(
            crate::network::client::ClientConfig::for_server("ws://127.0.0.1:1"),
        );
        let mut controller = SessionController::new(CapturePipeline::default(), client.frame_sink());

        assert!(!controller.is_recording());
        controller.stop_recording();
        controller.stop_recording();
        assert!(!controller.is_recording());
        assert!(controller.check_capture_error().is_none());

        client.close().await;
    }
}
