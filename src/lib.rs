//! # Speech Coach Client
//!
//! Streams live microphone audio to a remote analysis service and surfaces
//! the incrementally arriving coaching feedback.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            CLIENT                                │
//! │  ┌────────────┐     ┌──────────────────┐     ┌───────────────┐  │
//! │  │ Microphone │ f32 │ Capture Pipeline │ i16 │   Streaming   │  │
//! │  │   (cpal)   ├────►│ downmix/resample ├────►│    Client     │  │
//! │  └────────────┘     │ 16 kHz, 4096/frm │     │  (WebSocket)  │  │
//! │                     └──────────────────┘     └───────┬───────┘  │
//! │  ┌────────────────┐     ┌──────────────────┐         │          │
//! │  │ Terminal view  │◄────┤Session Controller│◄────────┘          │
//! │  │  (bin/coach)   │     │ feedback folding │  JSON feedback     │
//! │  └────────────────┘     └──────────────────┘                    │
//! └─────────────────────────────────┬────────────────────────────────┘
//!                                   │ binary PCM out / JSON text in
//!                                   ▼
//!                      ws://<server>/ws/analysis
//! ```
//!
//! Outbound messages are raw little-endian signed 16-bit mono PCM at
//! 16 kHz; inbound messages are JSON patches (transcript fragments, pace,
//! sentiment, filler words, coaching tips). The client reconnects forever
//! on a fixed delay and silently drops frames while disconnected — stale
//! audio is worthless once connectivity is lost.

pub mod audio;
pub mod codec;
pub mod config;
pub mod error;
pub mod network;
pub mod protocol;
pub mod session;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    use std::time::Duration;

    /// Wire sample rate in Hz. All outbound audio is resampled to this.
    pub const WIRE_SAMPLE_RATE: u32 = 16_000;

    /// Wire channel count (mono)
    pub const WIRE_CHANNELS: u16 = 1;

    /// Samples per outbound frame. 4096 samples at 16 kHz is ~256 ms,
    /// a close approximation of the 200 ms analysis window.
    pub const FRAME_SAMPLES: usize = 4096;

    /// Delay before each automatic reconnection attempt
    pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

    /// Default analysis server
    pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8000";

    /// WebSocket endpoint path on the analysis server
    pub const ANALYSIS_PATH: &str = "/ws/analysis";
}
