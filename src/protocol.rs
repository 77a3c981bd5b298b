//! Wire protocol types
//!
//! Outbound traffic is raw PCM (see `audio::frame`); this module covers
//! the inbound side: JSON feedback objects from the analysis server.
//! Every field is optional — a message is a patch, not a snapshot — and
//! unknown fields are ignored so the server can grow its schema without
//! breaking deployed clients.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Overall sentiment of the recently analyzed speech
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// One incremental feedback update from the analysis server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    /// Newly transcribed speech fragment (append, don't replace)
    pub transcript: Option<String>,
    /// Speaking pace in words per minute
    pub wpm: Option<u32>,
    /// Transcription confidence, 0.0..=1.0
    pub confidence: Option<f32>,
    pub sentiment: Option<Sentiment>,
    pub tone: Option<String>,
    /// Filler words detected in the fragment, in spoken order
    pub filler_words: Option<Vec<String>>,
    /// Free-text coaching tip
    pub recommendation: Option<String>,
}

impl FeedbackMessage {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Decode an inbound text payload.
///
/// Failure means the payload is discarded by the caller; it never affects
/// connection state.
pub fn decode_feedback(payload: &str) -> Result<FeedbackMessage, ProtocolError> {
    Ok(serde_json::from_str(payload)?)
}
