//! Scope DSP - Waveform Analysis Primitives
//!
//! This crate provides the signal processing building blocks used by the
//! analysis engine, including:
//! - Window function library (14 tapers, plus a `(kind, length)` keyed cache)
//! - Real to half-complex FFT adapter with a single cached plan
//! - Trigger-based peak-to-peak and frequency measurement
//! - Math channel combination (A+B, A-B, B-A)
//! - Spectrum pipeline with calibrated dB scaling
//!
//! # Architecture
//!
//! Nothing in here spawns threads or takes locks. Every stateful type is
//! owned by a single analysis pass and driven sequentially.

mod buffer;
mod error;
mod math;
mod measurement;
mod spectrum;
mod transform;
mod window;

pub use buffer::SampleBuffer;
pub use error::{DspError, DspResult};
pub use math::MathMode;
pub use measurement::{measure, Measurement, Slope};
pub use spectrum::{decibel_offset, to_decibels, SpectrumPipeline, SpectrumSettings};
pub use transform::HalfComplexTransform;
pub use window::{WindowCache, WindowFunction};
