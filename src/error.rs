//! Error types for the coaching client

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capture pipeline errors
#[derive(Error, Debug)]
pub enum CaptureError {
    /// No input device present, or microphone access denied by the host.
    /// Surfaced synchronously from `start()`; never retried automatically.
    #[error("Microphone unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Unsupported capture format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to open input stream: {0}")]
    StreamError(String),
}

// Transport faults have no error type on purpose: the streaming client
// contains them, and the owner only ever observes a `ConnectionState`
// transition followed by automatic recovery.

/// Wire protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed feedback payload: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    #[error("Non-text payload on feedback channel")]
    NonTextPayload,
}

/// Session controller errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// A recording session is already active. Stop it before starting
    /// another one.
    #[error("Recording already in progress")]
    AlreadyRecording,
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
