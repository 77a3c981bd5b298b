//! PCM sample-format conversion
//!
//! The analysis server consumes raw s16le mono PCM at 16 kHz. Capture
//! devices hand us interleaved f32 in [-1.0, 1.0] at whatever rate and
//! channel count they natively run, so the conversion chain is:
//! downmix -> resample -> scale to i16 -> little-endian bytes.

use bytes::{BufMut, Bytes, BytesMut};

/// Convert a single f32 sample in [-1.0, 1.0] to signed 16-bit.
///
/// Out-of-range input is clamped first. Scaling is asymmetric (negative
/// samples scale by 32768, non-negative by 32767) so that exactly -1.0
/// maps to i16::MIN and exactly +1.0 maps to i16::MAX without overflow.
#[inline]
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Downmix interleaved multi-channel samples to mono by averaging.
///
/// A trailing partial frame (fewer samples than `channels`) is dropped.
pub fn downmix_to_mono(input: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return input.to_vec();
    }
    let ch = channels as usize;
    input
        .chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

/// Encode i16 samples as little-endian wire bytes.
pub fn encode_wire_bytes(samples: &[i16]) -> Bytes {
    let mut buf = BytesMut::with_capacity(samples.len() * 2);
    for &s in samples {
        buf.put_i16_le(s);
    }
    buf.freeze()
}

/// Streaming linear resampler.
///
/// Carries fractional read position and unconsumed tail samples across
/// calls, so feeding arbitrary chunk sizes produces the same output as
/// resampling the whole stream at once.
pub struct Resampler {
    /// Input samples advanced per output sample (in_rate / out_rate)
    step: f64,
    /// Fractional read position into `buf`
    pos: f64,
    /// Unconsumed input tail
    buf: Vec<f32>,
}

impl Resampler {
    pub fn new(in_rate: u32, out_rate: u32) -> Self {
        Self {
            step: in_rate as f64 / out_rate as f64,
            pos: 0.0,
            buf: Vec::new(),
        }
    }

    /// True when input and output rates match and samples pass through.
    pub fn is_passthrough(&self) -> bool {
        self.step == 1.0
    }

    /// Resample `input`, appending converted samples to `out`.
    pub fn process(&mut self, input: &[f32], out: &mut Vec<f32>) {
        if self.is_passthrough() {
            out.extend_from_slice(input);
            return;
        }

        self.buf.extend_from_slice(input);

        let mut pos = self.pos;
        loop {
            let idx = pos as usize;
            if idx + 1 >= self.buf.len() {
                break;
            }
            let frac = (pos - idx as f64) as f32;
            out.push(self.buf[idx] * (1.0 - frac) + self.buf[idx + 1] * frac);
            pos += self.step;
        }

        // Keep the last sample the next interpolation still needs.
        let consumed = (pos as usize).min(self.buf.len().saturating_sub(1));
        self.buf.drain(..consumed);
        self.pos = pos - consumed as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn scale_endpoints() {
        assert_eq!(sample_to_i16(-1.0), i16::MIN);
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(1.0), i16::MAX);
    }

    #[test]
    fn scale_clamps_out_of_range() {
        assert_eq!(sample_to_i16(1.5), i16::MAX);
        assert_eq!(sample_to_i16(-1.5), i16::MIN);
        assert_eq!(sample_to_i16(f32::INFINITY), i16::MAX);
        assert_eq!(sample_to_i16(f32::NEG_INFINITY), i16::MIN);
    }

    #[test]
    fn scale_is_asymmetric() {
        assert_eq!(sample_to_i16(-0.5), -16384);
        assert_eq!(sample_to_i16(0.5), 16383);
    }

    proptest! {
        #[test]
        fn scaled_output_in_i16_range(sample in -4.0f32..4.0) {
            let v = sample_to_i16(sample) as i32;
            prop_assert!((i16::MIN as i32..=i16::MAX as i32).contains(&v));
        }

        #[test]
        fn scaling_is_monotonic(a in -1.0f32..1.0, b in -1.0f32..1.0) {
            if a <= b {
                prop_assert!(sample_to_i16(a) <= sample_to_i16(b));
            }
        }
    }

    #[test]
    fn downmix_averages_channels() {
        let stereo = [0.5, -0.5, 1.0, 0.0, -1.0, -1.0];
        assert_eq!(downmix_to_mono(&stereo, 2), vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn downmix_mono_is_identity() {
        let mono = [0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&mono, 1), mono.to_vec());
    }

    #[test]
    fn wire_bytes_are_little_endian() {
        let bytes = encode_wire_bytes(&[1, -2, i16::MIN]);
        assert_eq!(&bytes[..], &[0x01, 0x00, 0xFE, 0xFF, 0x00, 0x80]);
    }

    #[test]
    fn resampler_passthrough() {
        let mut rs = Resampler::new(16_000, 16_000);
        let mut out = Vec::new();
        rs.process(&[0.1, 0.2, 0.3], &mut out);
        assert_eq!(out, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn resampler_downsamples_3_to_1() {
        let mut rs = Resampler::new(48_000, 16_000);
        let input: Vec<f32> = (0..48_000).map(|i| (i % 7) as f32 / 7.0).collect();
        let mut out = Vec::new();
        rs.process(&input, &mut out);
        // One second of input should yield close to one second of output.
        let expected = 16_000usize;
        assert!(out.len().abs_diff(expected) <= 2, "got {} samples", out.len());
    }

    #[test]
    fn resampler_chunking_matches_whole_stream() {
        let input: Vec<f32> = (0..4410).map(|i| ((i as f32) * 0.01).sin()).collect();

        let mut whole = Vec::new();
        Resampler::new(44_100, 16_000).process(&input, &mut whole);

        let mut chunked = Vec::new();
        let mut rs = Resampler::new(44_100, 16_000);
        for chunk in input.chunks(157) {
            rs.process(chunk, &mut chunked);
        }

        assert_eq!(whole.len(), chunked.len());
        for (a, b) in whole.iter().zip(&chunked) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
