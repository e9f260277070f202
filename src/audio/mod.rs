//! Microphone capture and input-level analysis.
//!
//! The capture unit owns one cpal input stream, converts whatever the
//! device delivers to 16kHz mono PCM, and emits fixed-interval chunks to
//! a consumer channel. A rolling sample window feeds the FFT-based level
//! meter used for the dashboard's input indicator.

pub mod capture;
pub mod level;

pub use capture::{CaptureConfig, CaptureEvent, MicCapture};
pub use level::LevelMeter;
