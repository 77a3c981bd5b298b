//! PCM wire-format codec
//!
//! Converts whatever the capture device produces (interleaved f32 at the
//! device's native rate) into the fixed wire format: mono signed 16-bit
//! little-endian PCM at 16 kHz.

pub mod pcm;

pub use pcm::{downmix_to_mono, encode_wire_bytes, sample_to_i16, Resampler};
