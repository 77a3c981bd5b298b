//! Microphone capture pipeline
//!
//! Owns the input device for the lifetime of a recording: pulls native
//! samples from cpal, converts them to the wire format (mono i16 at
//! 16 kHz), and emits fixed-size frames through a callback, synchronously
//! from the device event.
//!
//! Stopping a session releases the device unconditionally; any device
//! callback that fires after `stop()` is a no-op.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::audio::device::default_input_device;
use crate::audio::frame::AudioFrame;
use crate::codec::pcm::{downmix_to_mono, sample_to_i16, Resampler};
use crate::constants::{FRAME_SAMPLES, WIRE_SAMPLE_RATE};
use crate::error::CaptureError;

/// Converts native interleaved samples into wire-format frames.
///
/// Split out from the device callback so the framing logic is testable
/// with synthetic buffers instead of a live microphone.
struct FrameAssembler {
    channels: u16,
    resampler: Resampler,
    pending: Vec<f32>,
    frame_samples: usize,
}

impl FrameAssembler {
    fn new(native_rate: u32, channels: u16, frame_samples: usize) -> Self {
        Self {
            channels,
            resampler: Resampler::new(native_rate, WIRE_SAMPLE_RATE),
            pending: Vec::with_capacity(frame_samples * 2),
            frame_samples,
        }
    }

    /// Feed one native buffer; emits zero or more complete frames.
    fn push(&mut self, interleaved: &[f32], emit: &mut dyn FnMut(AudioFrame)) {
        let mono = downmix_to_mono(interleaved, self.channels);
        self.resampler.process(&mono, &mut self.pending);

        while self.pending.len() >= self.frame_samples {
            let samples: Vec<i16> = self
                .pending
                .drain(..self.frame_samples)
                .map(sample_to_i16)
                .collect();
            emit(AudioFrame::new(samples));
        }
    }
}

/// Factory for recording sessions
pub struct CapturePipeline {
    frame_samples: usize,
}

impl CapturePipeline {
    pub fn new(frame_samples: usize) -> Self {
        Self { frame_samples }
    }

    /// Acquire the default microphone and start capturing.
    ///
    /// `on_frame` is invoked synchronously from the device callback for
    /// every complete wire-format frame, in capture order. Fails with
    /// `DeviceUnavailable` when no microphone is present or access is
    /// denied; in that case no device resources remain acquired.
    pub fn start<F>(&self, mut on_frame: F) -> Result<RecordingSession, CaptureError>
    where
        F: FnMut(AudioFrame) + Send + 'static,
    {
        let device = default_input_device()?;
        let native = device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceUnavailable(e.to_string()))?;

        let config: cpal::StreamConfig = native.config();
        let native_rate = config.sample_rate.0;
        let channels = config.channels;

        let mut assembler = FrameAssembler::new(native_rate, channels, self.frame_samples);
        let active = Arc::new(AtomicBool::new(true));
        let (error_tx, error_rx) = bounded::<CaptureError>(16);

        let callback_active = active.clone();
        let data_callback = move |samples: &[f32]| {
            if !callback_active.load(Ordering::Relaxed) {
                return;
            }
            assembler.push(samples, &mut on_frame);
        };

        let stream = match native.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, data_callback, error_tx),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, data_callback, error_tx),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, data_callback, error_tx),
            other => Err(CaptureError::UnsupportedFormat(format!(
                "sample format {other:?}"
            ))),
        }?;

        stream.play().map_err(|e| match e {
            cpal::PlayStreamError::DeviceNotAvailable => {
                CaptureError::DeviceUnavailable("device disappeared".to_string())
            }
            other => CaptureError::StreamError(other.to_string()),
        })?;

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
            native_rate,
            channels,
            frame_samples = self.frame_samples,
            "capture started"
        );

        Ok(RecordingSession {
            stream: Some(stream),
            active,
            error_rx,
        })
    }
}

impl Default for CapturePipeline {
    fn default() -> Self {
        Self::new(FRAME_SAMPLES)
    }
}

/// Build an input stream for the device's native sample type, converting
/// each buffer to f32 before it enters the assembler.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut data_callback: impl FnMut(&[f32]) + Send + 'static,
    error_tx: Sender<CaptureError>,
) -> Result<cpal::Stream, CaptureError>
where
    T: Sample + SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                scratch.clear();
                scratch.extend(data.iter().map(|&s| f32::from_sample(s)));
                data_callback(&scratch);
            },
            move |err| {
                let _ = error_tx.try_send(CaptureError::StreamError(err.to_string()));
            },
            None,
        )
        .map_err(|e| match e {
            cpal::BuildStreamError::DeviceNotAvailable => {
                CaptureError::DeviceUnavailable("device disappeared".to_string())
            }
            cpal::BuildStreamError::StreamConfigNotSupported => {
                CaptureError::UnsupportedFormat(format!(
                    "{} Hz / {} ch not supported",
                    config.sample_rate.0, config.channels
                ))
            }
            other => CaptureError::StreamError(other.to_string()),
        })
}

/// Live device handles for one recording. At most one session is expected
/// to exist at a time; the session controller enforces that.
pub struct RecordingSession {
    stream: Option<cpal::Stream>,
    active: Arc<AtomicBool>,
    error_rx: Receiver<CaptureError>,
}

impl RecordingSession {
    /// Release the device. Idempotent; in-flight device callbacks become
    /// no-ops before the stream handle is dropped.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if self.stream.take().is_some() {
            tracing::info!("capture stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Check for asynchronous stream errors reported by the device.
    pub fn check_error(&self) -> Option<CaptureError> {
        self.error_rx.try_recv().ok()
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        self.stop();
    }
}
