//! Streaming client subsystem
//!
//! One logical WebSocket connection to the analysis server: binary PCM
//! frames out, JSON feedback in, with fixed-delay automatic reconnection.

pub mod client;
pub mod state;

pub use client::{ClientConfig, FrameSink, StreamingClient};
pub use state::{ConnectionState, ReconnectPolicy};
