//! Audio subsystem module

pub mod capture;
pub mod device;
pub mod frame;

pub use capture::{CapturePipeline, RecordingSession};
pub use device::{default_input_device, list_input_devices, InputDeviceInfo};
pub use frame::AudioFrame;
