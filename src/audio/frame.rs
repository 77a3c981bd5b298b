//! Fixed-format audio frames
//!
//! One frame is one transmission unit: a fixed-length run of mono signed
//! 16-bit PCM samples at the wire rate, produced by the capture pipeline
//! and consumed exactly once by the streaming client.

use bytes::Bytes;

use crate::codec::pcm::encode_wire_bytes;
use crate::constants::WIRE_SAMPLE_RATE;

/// A slice of captured audio in wire format (mono i16, 16 kHz)
#[derive(Clone, PartialEq, Eq)]
pub struct AudioFrame {
    samples: Vec<i16>,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Frame duration in milliseconds at the wire sample rate
    pub fn duration_ms(&self) -> f32 {
        self.samples.len() as f32 * 1000.0 / WIRE_SAMPLE_RATE as f32
    }

    /// Encode as the outbound wire payload (little-endian s16)
    pub fn into_wire_bytes(self) -> Bytes {
        encode_wire_bytes(&self.samples)
    }
}

impl std::fmt::Debug for AudioFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFrame")
            .field("samples", &self.samples.len())
            .field("duration_ms", &self.duration_ms())
            .finish()
    }
}
